use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::auth::Principal;
use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{review::validate_review_fields, AppointmentStatus, Review};
use crate::services::policy::{self, Action};

#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub appointment_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub is_anonymous: bool,
}

/// Creates the one review an appointment may carry, then recomputes the
/// barber's aggregate. The recompute is an explicit call on this write
/// path, not a persistence hook.
pub fn submit_review(
    conn: &Connection,
    principal: &Principal,
    request: &ReviewRequest,
) -> Result<Review, AppError> {
    let errors = validate_review_fields(request.rating, request.comment.as_deref());
    if !errors.is_empty() {
        return Err(AppError::Fields(errors));
    }

    let appointment = queries::get_appointment(conn, &request.appointment_id)?
        .ok_or_else(|| AppError::NotFound("appointment".to_string()))?;
    policy::authorize(principal, &appointment, Action::Review)?;

    if appointment.status != AppointmentStatus::Completed {
        return Err(AppError::Validation(
            "Only completed appointments can be reviewed".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let review = Review {
        id: Uuid::new_v4().to_string(),
        customer_id: principal.user_id.clone(),
        barber_id: appointment.barber_id.clone(),
        appointment_id: appointment.id.clone(),
        rating: request.rating,
        comment: request
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from),
        is_anonymous: request.is_anonymous,
        created_at: now,
        updated_at: now,
    };

    if let Err(err) = queries::create_review(conn, &review) {
        if db::is_unique_violation(&err) {
            return Err(AppError::DuplicateReview);
        }
        return Err(AppError::Internal(err));
    }

    queries::set_appointment_rated(conn, &appointment.id, true)?;
    recompute_barber_rating(conn, &review.barber_id)?;

    Ok(review)
}

pub fn update_review(
    conn: &Connection,
    principal: &Principal,
    review_id: &str,
    rating: i64,
    comment: Option<&str>,
) -> Result<Review, AppError> {
    let errors = validate_review_fields(rating, comment);
    if !errors.is_empty() {
        return Err(AppError::Fields(errors));
    }

    let review = queries::get_review(conn, review_id)?
        .ok_or_else(|| AppError::NotFound("review".to_string()))?;
    if review.customer_id != principal.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to update this review".to_string(),
        ));
    }

    queries::update_review(conn, review_id, rating, comment)?;
    recompute_barber_rating(conn, &review.barber_id)?;

    queries::get_review(conn, review_id)?
        .ok_or_else(|| AppError::NotFound("review".to_string()))
}

/// Deletes the review, frees the appointment for re-rating, and
/// recomputes the aggregate over whatever reviews remain.
pub fn delete_review(
    conn: &Connection,
    principal: &Principal,
    review_id: &str,
) -> Result<(), AppError> {
    let review = queries::get_review(conn, review_id)?
        .ok_or_else(|| AppError::NotFound("review".to_string()))?;
    if review.customer_id != principal.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to delete this review".to_string(),
        ));
    }

    queries::delete_review(conn, review_id)?;
    queries::set_appointment_rated(conn, &review.appointment_id, false)?;
    recompute_barber_rating(conn, &review.barber_id)?;

    Ok(())
}

/// Rebuilds the barber's aggregate from the full review set: mean rating
/// rounded to one decimal plus the count. With no reviews left the
/// aggregate resets to zero rather than keeping the last value.
pub fn recompute_barber_rating(conn: &Connection, barber_user_id: &str) -> Result<(), AppError> {
    let (rating, total_reviews) = match queries::barber_rating_stats(conn, barber_user_id)? {
        Some((average, count)) => ((average * 10.0).round() / 10.0, count),
        None => (0.0, 0),
    };

    queries::update_barber_rating(conn, barber_user_id, rating, total_reviews)?;

    tracing::debug!(barber_id = barber_user_id, rating, total_reviews, "rating recomputed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::Role;
    use crate::test_support::{completed_appointment, seed_profile};

    fn customer(id: &str) -> Principal {
        Principal {
            user_id: id.to_string(),
            role: Role::Customer,
        }
    }

    fn review_request(appointment_id: &str, rating: i64) -> ReviewRequest {
        ReviewRequest {
            appointment_id: appointment_id.to_string(),
            rating,
            comment: None,
            is_anonymous: false,
        }
    }

    fn profile_aggregate(conn: &Connection, profile_id: &str) -> (f64, i64) {
        let profile = queries::get_barber_profile(conn, profile_id).unwrap().unwrap();
        (profile.rating, profile.total_reviews)
    }

    #[test]
    fn test_aggregate_over_review_set() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        // Four completed appointments from four customers, rated 5,5,4,3.
        let mut review_ids = vec![];
        for (i, rating) in [5, 5, 4, 3].into_iter().enumerate() {
            let customer_id = format!("cust-{i}");
            let appointment = completed_appointment(&conn, &customer_id, "barber-1", &profile.id, i);
            let review =
                submit_review(&conn, &customer(&customer_id), &review_request(&appointment.id, rating))
                    .unwrap();
            review_ids.push(review.id);
        }

        assert_eq!(profile_aggregate(&conn, &profile.id), (4.3, 4));

        // Dropping the 3-star review lifts the mean to 4.666... -> 4.7.
        delete_review(&conn, &customer("cust-3"), &review_ids[3]).unwrap();
        assert_eq!(profile_aggregate(&conn, &profile.id), (4.7, 3));
    }

    #[test]
    fn test_zero_reviews_resets_aggregate() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");
        let appointment = completed_appointment(&conn, "cust-1", "barber-1", &profile.id, 0);

        let review =
            submit_review(&conn, &customer("cust-1"), &review_request(&appointment.id, 5)).unwrap();
        assert_eq!(profile_aggregate(&conn, &profile.id), (5.0, 1));

        delete_review(&conn, &customer("cust-1"), &review.id).unwrap();
        assert_eq!(profile_aggregate(&conn, &profile.id), (0.0, 0));

        // The appointment may be rated again after the delete.
        let appointment = queries::get_appointment(&conn, &appointment.id).unwrap().unwrap();
        assert!(!appointment.is_rated);
        submit_review(&conn, &customer("cust-1"), &review_request(&appointment.id, 4)).unwrap();
    }

    #[test]
    fn test_duplicate_review_rejected() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");
        let appointment = completed_appointment(&conn, "cust-1", "barber-1", &profile.id, 0);

        submit_review(&conn, &customer("cust-1"), &review_request(&appointment.id, 5)).unwrap();
        let err = submit_review(&conn, &customer("cust-1"), &review_request(&appointment.id, 4))
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateReview));

        // The failed attempt did not disturb the aggregate.
        assert_eq!(profile_aggregate(&conn, &profile.id), (5.0, 1));
    }

    #[test]
    fn test_only_completed_appointments_reviewable() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        // Still pending.
        let appointment = crate::test_support::pending_appointment(
            &conn, "cust-1", "barber-1", &profile.id, 0,
        );
        let err = submit_review(&conn, &customer("cust-1"), &review_request(&appointment.id, 5))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_review_requires_owning_customer() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");
        let appointment = completed_appointment(&conn, "cust-1", "barber-1", &profile.id, 0);

        let err = submit_review(&conn, &customer("cust-2"), &review_request(&appointment.id, 5))
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_rating_out_of_range_collected() {
        let conn = db::init_db(":memory:").unwrap();
        let err = submit_review(&conn, &customer("cust-1"), &review_request("whatever", 9))
            .unwrap_err();
        assert!(matches!(err, AppError::Fields(_)));
    }

    #[test]
    fn test_update_review_recomputes() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");
        let appointment = completed_appointment(&conn, "cust-1", "barber-1", &profile.id, 0);

        let review =
            submit_review(&conn, &customer("cust-1"), &review_request(&appointment.id, 5)).unwrap();
        let updated =
            update_review(&conn, &customer("cust-1"), &review.id, 3, Some("changed my mind"))
                .unwrap();
        assert_eq!(updated.rating, 3);
        assert_eq!(profile_aggregate(&conn, &profile.id), (3.0, 1));
    }

    #[test]
    fn test_update_requires_owner() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");
        let appointment = completed_appointment(&conn, "cust-1", "barber-1", &profile.id, 0);
        let review =
            submit_review(&conn, &customer("cust-1"), &review_request(&appointment.id, 5)).unwrap();

        let err = update_review(&conn, &customer("cust-2"), &review.id, 1, None).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = delete_review(&conn, &customer("cust-2"), &review.id).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_half_up_rounding() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        // 4 + 5 -> 4.5 stays 4.5; 4 + 4 + 5 -> 4.333... -> 4.3.
        for (i, rating) in [4, 5].into_iter().enumerate() {
            let customer_id = format!("cust-{i}");
            let appointment = completed_appointment(&conn, &customer_id, "barber-1", &profile.id, i);
            submit_review(&conn, &customer(&customer_id), &review_request(&appointment.id, rating))
                .unwrap();
        }
        assert_eq!(profile_aggregate(&conn, &profile.id), (4.5, 2));

        let appointment = completed_appointment(&conn, "cust-2", "barber-1", &profile.id, 2);
        submit_review(&conn, &customer("cust-2"), &review_request(&appointment.id, 4)).unwrap();
        assert_eq!(profile_aggregate(&conn, &profile.id), (4.3, 3));
    }
}
