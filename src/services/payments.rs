use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::Principal;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, PaymentStatus};
use crate::services::policy::{self, Action};
use crate::state::AppState;

/// The two-call contract of the external gateway. Amounts cross this
/// boundary in minor units only.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<GatewayOrder>;

    async fn verify(
        &self,
        order_ref: &str,
        payment_ref: &str,
        signature: &str,
    ) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub order_ref: String,
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
}

/// Stand-in gateway: opaque order refs, signature check accepts
/// everything. A real deployment swaps this implementation out behind
/// the same trait.
pub struct SandboxGateway;

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<GatewayOrder> {
        Ok(GatewayOrder {
            order_ref: format!("order_{}", Uuid::new_v4().simple()),
            amount_minor,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        })
    }

    async fn verify(
        &self,
        _order_ref: &str,
        _payment_ref: &str,
        _signature: &str,
    ) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Currency-unit amount to gateway minor units (e.g. rupees to paise).
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub appointment_id: String,
}

pub async fn create_order(
    state: &AppState,
    principal: &Principal,
    appointment_id: &str,
) -> Result<OrderSummary, AppError> {
    let appointment = load_for_payment(state, principal, appointment_id)?;

    if appointment.payment_status != PaymentStatus::Pending {
        return Err(AppError::AlreadyPaid);
    }

    let order = state
        .payments
        .create_order(
            to_minor_units(appointment.total_amount),
            &state.config.currency,
            &format!("appointment_{}", appointment.id),
        )
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?;

    Ok(OrderSummary {
        order_id: order.order_ref,
        amount: order.amount_minor,
        currency: order.currency,
        appointment_id: appointment.id,
    })
}

pub async fn verify_payment(
    state: &AppState,
    principal: &Principal,
    appointment_id: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<Appointment, AppError> {
    let appointment = load_for_payment(state, principal, appointment_id)?;

    if appointment.payment_status != PaymentStatus::Pending {
        return Err(AppError::AlreadyPaid);
    }

    let valid = state
        .payments
        .verify(order_id, payment_id, signature)
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?;
    if !valid {
        return Err(AppError::VerificationFailed);
    }

    mark_paid(state, &appointment.id, payment_id)
}

/// Demo/test path: marks the appointment paid without any gateway round
/// trip. Disabled entirely when the config says so.
pub async fn simulate_payment(
    state: &AppState,
    principal: &Principal,
    appointment_id: &str,
) -> Result<Appointment, AppError> {
    if !state.config.allow_simulated_payments {
        return Err(AppError::Forbidden(
            "Simulated payments are disabled".to_string(),
        ));
    }

    let appointment = load_for_payment(state, principal, appointment_id)?;

    if appointment.payment_status != PaymentStatus::Pending {
        return Err(AppError::AlreadyPaid);
    }

    let payment_id = format!("sim_{}", Uuid::new_v4().simple());
    mark_paid(state, &appointment.id, &payment_id)
}

fn load_for_payment(
    state: &AppState,
    principal: &Principal,
    appointment_id: &str,
) -> Result<Appointment, AppError> {
    let db = state.db.lock().unwrap();
    let appointment = queries::get_appointment(&db, appointment_id)?
        .ok_or_else(|| AppError::NotFound("appointment".to_string()))?;
    policy::authorize(principal, &appointment, Action::Pay)?;
    Ok(appointment)
}

fn mark_paid(
    state: &AppState,
    appointment_id: &str,
    payment_id: &str,
) -> Result<Appointment, AppError> {
    let db = state.db.lock().unwrap();
    queries::update_payment(&db, appointment_id, PaymentStatus::Paid, Some(payment_id))?;

    tracing::info!(appointment_id, payment_id, "payment recorded");

    queries::get_appointment(&db, appointment_id)?
        .ok_or_else(|| AppError::NotFound("appointment".to_string()))
}
