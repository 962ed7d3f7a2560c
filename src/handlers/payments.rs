use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, PaymentStatus};
use crate::services::payments::{self, OrderSummary};
use crate::services::policy::{self, Action};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub appointment_id: String,
}

// POST /api/payments/create-order
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<OrderSummary>, AppError> {
    let order = payments::create_order(&state, &principal, &body.appointment_id).await?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub appointment_id: String,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Serialize)]
pub struct PaymentConfirmation {
    pub message: String,
    pub appointment: Appointment,
}

// POST /api/payments/verify
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<PaymentConfirmation>, AppError> {
    let mut errors = Vec::new();
    for (label, value) in [
        ("Appointment ID", &body.appointment_id),
        ("Order ID", &body.order_id),
        ("Payment ID", &body.payment_id),
        ("Signature", &body.signature),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("{label} is required"));
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Fields(errors));
    }

    let appointment = payments::verify_payment(
        &state,
        &principal,
        &body.appointment_id,
        &body.order_id,
        &body.payment_id,
        &body.signature,
    )
    .await?;

    Ok(Json(PaymentConfirmation {
        message: "Payment verified successfully".to_string(),
        appointment,
    }))
}

#[derive(Deserialize)]
pub struct SimulateRequest {
    pub appointment_id: String,
}

// POST /api/payments/simulate
pub async fn simulate_payment(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<SimulateRequest>,
) -> Result<Json<PaymentConfirmation>, AppError> {
    let appointment = payments::simulate_payment(&state, &principal, &body.appointment_id).await?;

    Ok(Json(PaymentConfirmation {
        message: "Payment simulated successfully".to_string(),
        appointment,
    }))
}

#[derive(Serialize)]
pub struct PaymentStatusResponse {
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub total_amount: f64,
}

// GET /api/payments/status/:appointment_id
pub async fn payment_status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(appointment_id): Path<String>,
) -> Result<Json<PaymentStatusResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let appointment = queries::get_appointment(&db, &appointment_id)?
        .ok_or_else(|| AppError::NotFound("appointment".to_string()))?;
    policy::authorize(&principal, &appointment, Action::View)?;

    Ok(Json(PaymentStatusResponse {
        payment_status: appointment.payment_status,
        payment_id: appointment.payment_id,
        total_amount: appointment.total_amount,
    }))
}
