use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, PaymentStatus, ServiceSnapshot};
use crate::services::catalog;

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub barber_profile_id: String,
    pub service_names: Vec<String>,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub notes: Option<String>,
}

/// Validated outcome of a booking request, before anything is written:
/// the resolved barber, the priced snapshots, and their total.
#[derive(Debug, Clone)]
pub struct BookingQuote {
    pub barber_id: String,
    pub barber_profile_id: String,
    pub snapshots: Vec<ServiceSnapshot>,
    pub total_amount: f64,
}

/// Validates a booking request against the barber's catalog and the slot
/// table. All checks run before any write; the first failure is returned.
pub fn validate_and_price(
    conn: &Connection,
    barber_profile_id: &str,
    service_names: &[String],
    date: NaiveDate,
    time: &str,
    now: NaiveDateTime,
) -> Result<BookingQuote, AppError> {
    let catalog = catalog::lookup(conn, barber_profile_id)?;

    // Exact-name match against the current catalog, snapshots in request
    // order. Matching is case-sensitive.
    let mut snapshots = Vec::with_capacity(service_names.len());
    let mut total_amount = 0.0;
    for name in service_names {
        let service = catalog
            .services
            .iter()
            .find(|s| s.name == *name)
            .ok_or_else(|| AppError::InvalidService(name.clone()))?;
        total_amount += service.price;
        snapshots.push(ServiceSnapshot {
            name: service.name.clone(),
            price: service.price,
            duration_minutes: service.duration_minutes,
        });
    }

    let time_of_day = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| AppError::Validation("Appointment time must be in HH:MM format".to_string()))?;
    if date.and_time(time_of_day) <= now {
        return Err(AppError::PastDate);
    }

    if queries::slot_taken(conn, &catalog.barber_id, date, time)? {
        return Err(AppError::SlotConflict);
    }

    Ok(BookingQuote {
        barber_id: catalog.barber_id,
        barber_profile_id: catalog.profile_id,
        snapshots,
        total_amount,
    })
}

/// Validates, prices, and persists a new appointment in `pending` with
/// payment still owed. The active-slot unique index backs up the read
/// check: a violation on insert is reported as the same slot conflict.
pub fn book(
    conn: &Connection,
    customer_id: &str,
    request: &BookingRequest,
    now: NaiveDateTime,
) -> Result<Appointment, AppError> {
    let quote = validate_and_price(
        conn,
        &request.barber_profile_id,
        &request.service_names,
        request.appointment_date,
        &request.appointment_time,
        now,
    )?;

    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        customer_id: customer_id.to_string(),
        barber_id: quote.barber_id,
        barber_profile_id: quote.barber_profile_id,
        services: quote.snapshots,
        appointment_date: request.appointment_date,
        appointment_time: request.appointment_time.clone(),
        total_amount: quote.total_amount,
        status: AppointmentStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_id: None,
        notes: request.notes.clone(),
        cancellation_reason: None,
        cancelled_by: None,
        is_rated: false,
        created_at: Utc::now().naive_utc(),
        updated_at: Utc::now().naive_utc(),
    };

    if let Err(err) = queries::create_appointment(conn, &appointment) {
        if db::is_unique_violation(&err) {
            return Err(AppError::SlotConflict);
        }
        return Err(AppError::Internal(err));
    }

    tracing::info!(
        appointment_id = %appointment.id,
        barber_id = %appointment.barber_id,
        total_amount = appointment.total_amount,
        "appointment booked"
    );

    Ok(appointment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::test_support::{dt, seed_profile};

    const NOW: &str = "2025-06-01 09:00";

    fn request(profile_id: &str, names: &[&str], date: &str, time: &str) -> BookingRequest {
        BookingRequest {
            barber_profile_id: profile_id.to_string(),
            service_names: names.iter().map(|s| s.to_string()).collect(),
            appointment_date: date.parse().unwrap(),
            appointment_time: time.to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_total_is_sum_of_catalog_prices() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        let appointment = book(
            &conn,
            "cust-1",
            &request(&profile.id, &["Haircut", "Beard Trim"], "2025-06-02", "10:00"),
            dt(NOW),
        )
        .unwrap();

        assert_eq!(appointment.total_amount, 450.0);
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_snapshots_follow_request_order() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        // Reverse of catalog order.
        let quote = validate_and_price(
            &conn,
            &profile.id,
            &["Beard Trim".to_string(), "Haircut".to_string()],
            "2025-06-02".parse().unwrap(),
            "10:00",
            dt(NOW),
        )
        .unwrap();

        assert_eq!(quote.snapshots[0].name, "Beard Trim");
        assert_eq!(quote.snapshots[1].name, "Haircut");
        assert_eq!(quote.total_amount, 450.0);
    }

    #[test]
    fn test_unknown_service_rejected_without_write() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        let err = book(
            &conn,
            "cust-1",
            &request(&profile.id, &["Haircut", "Mullet"], "2025-06-02", "10:00"),
            dt(NOW),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidService(name) if name == "Mullet"));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_service_matching_is_case_sensitive() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        let err = validate_and_price(
            &conn,
            &profile.id,
            &["haircut".to_string()],
            "2025-06-02".parse().unwrap(),
            "10:00",
            dt(NOW),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidService(_)));
    }

    #[test]
    fn test_past_slot_rejected() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        let err = book(
            &conn,
            "cust-1",
            &request(&profile.id, &["Haircut"], "2025-05-31", "10:00"),
            dt(NOW),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::PastDate));

        // The boundary is strict: a slot exactly at "now" is in the past.
        let err = book(
            &conn,
            "cust-1",
            &request(&profile.id, &["Haircut"], "2025-06-01", "09:00"),
            dt(NOW),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::PastDate));
    }

    #[test]
    fn test_unknown_profile_rejected() {
        let conn = db::init_db(":memory:").unwrap();
        let err = book(
            &conn,
            "cust-1",
            &request("missing", &["Haircut"], "2025-06-02", "10:00"),
            dt(NOW),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_slot_conflict_on_active_appointment() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        book(
            &conn,
            "cust-1",
            &request(&profile.id, &["Haircut"], "2025-06-02", "10:00"),
            dt(NOW),
        )
        .unwrap();

        let err = book(
            &conn,
            "cust-2",
            &request(&profile.id, &["Beard Trim"], "2025-06-02", "10:00"),
            dt(NOW),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::SlotConflict));

        // A different time on the same day is fine.
        book(
            &conn,
            "cust-2",
            &request(&profile.id, &["Beard Trim"], "2025-06-02", "11:00"),
            dt(NOW),
        )
        .unwrap();
    }

    #[test]
    fn test_slot_released_by_cancellation() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        let first = book(
            &conn,
            "cust-1",
            &request(&profile.id, &["Haircut"], "2025-06-02", "10:00"),
            dt(NOW),
        )
        .unwrap();

        queries::update_appointment_status(
            &conn,
            &first.id,
            AppointmentStatus::Cancelled,
            None,
            None,
        )
        .unwrap();

        // The cancelled appointment no longer holds the slot.
        book(
            &conn,
            "cust-2",
            &request(&profile.id, &["Haircut"], "2025-06-02", "10:00"),
            dt(NOW),
        )
        .unwrap();
    }

    #[test]
    fn test_insert_constraint_reports_conflict() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        let quote = validate_and_price(
            &conn,
            &profile.id,
            &["Haircut".to_string()],
            "2025-06-02".parse().unwrap(),
            "10:00",
            dt(NOW),
        )
        .unwrap();

        // Two requests both passed validation against an empty slot table;
        // the unique index catches the second insert.
        let make = |customer: &str| Appointment {
            id: Uuid::new_v4().to_string(),
            customer_id: customer.to_string(),
            barber_id: quote.barber_id.clone(),
            barber_profile_id: quote.barber_profile_id.clone(),
            services: quote.snapshots.clone(),
            appointment_date: "2025-06-02".parse().unwrap(),
            appointment_time: "10:00".to_string(),
            total_amount: quote.total_amount,
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            is_rated: false,
            created_at: dt(NOW),
            updated_at: dt(NOW),
        };

        queries::create_appointment(&conn, &make("cust-1")).unwrap();
        let err = queries::create_appointment(&conn, &make("cust-2")).unwrap_err();
        assert!(db::is_unique_violation(&err));
    }

    #[test]
    fn test_snapshot_survives_catalog_edit() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        let appointment = book(
            &conn,
            "cust-1",
            &request(&profile.id, &["Haircut"], "2025-06-02", "10:00"),
            dt(NOW),
        )
        .unwrap();

        // Barber raises the price afterwards.
        let mut services = profile.services.clone();
        services[0].price = 999.0;
        queries::update_barber_services(&conn, &profile.id, &services).unwrap();

        let reloaded = queries::get_appointment(&conn, &appointment.id)
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.services[0].price, 300.0);
        assert_eq!(reloaded.total_amount, 300.0);
    }

    #[test]
    fn test_bad_time_format_rejected() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        let err = validate_and_price(
            &conn,
            &profile.id,
            &["Haircut".to_string()],
            "2025-06-02".parse().unwrap(),
            "10am",
            dt(NOW),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
