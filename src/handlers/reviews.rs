use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::Review;
use crate::services::ratings::{self, ReviewRequest};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub appointment_id: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

// POST /api/reviews
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let request = ReviewRequest {
        appointment_id: body.appointment_id,
        rating: body.rating,
        comment: body.comment,
        is_anonymous: body.is_anonymous,
    };

    let db = state.db.lock().unwrap();
    let review = ratings::submit_review(&db, &principal, &request)?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[derive(Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

// PUT /api/reviews/:id
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
    Json(body): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, AppError> {
    let db = state.db.lock().unwrap();
    let review = ratings::update_review(&db, &principal, &id, body.rating, body.comment.as_deref())?;
    Ok(Json(review))
}

// DELETE /api/reviews/:id
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    ratings::delete_review(&db, &principal, &id)?;
    Ok(Json(serde_json::json!({ "message": "Review deleted" })))
}

/// Public review listing. Anonymous reviews keep the author hidden.
#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub rating: i64,
    pub comment: Option<String>,
    pub is_anonymous: bool,
    pub created_at: NaiveDateTime,
}

// GET /api/reviews/barber/:barber_id
pub async fn barber_reviews(
    State(state): State<Arc<AppState>>,
    Path(barber_id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    let reviews = queries::list_reviews_for_barber(&db, &barber_id)?;

    let response = reviews
        .into_iter()
        .map(|r| ReviewResponse {
            id: r.id,
            customer_id: (!r.is_anonymous).then_some(r.customer_id),
            rating: r.rating,
            comment: r.comment,
            is_anonymous: r.is_anonymous,
            created_at: r.created_at,
        })
        .collect();

    Ok(Json(response))
}
