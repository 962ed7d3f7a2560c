use rusqlite::Connection;

use crate::auth::Principal;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, CancelledBy};
use crate::services::policy::{self, Action};

/// Barber decision path: pending can be approved or rejected, approved
/// can be completed. The optional reason is stored verbatim. Transitions
/// never touch the service snapshots, the total, or payment fields.
pub fn update_status(
    conn: &Connection,
    principal: &Principal,
    appointment_id: &str,
    target: AppointmentStatus,
    reason: Option<&str>,
) -> Result<Appointment, AppError> {
    let appointment = load(conn, appointment_id)?;
    policy::authorize(principal, &appointment, Action::Transition)?;

    if !matches!(
        target,
        AppointmentStatus::Approved | AppointmentStatus::Rejected | AppointmentStatus::Completed
    ) {
        return Err(AppError::Validation(
            "Status must be approved, rejected or completed".to_string(),
        ));
    }

    transition(conn, &appointment, target, reason, None)
}

/// Customer cancellation path. Allowed exactly where the state machine
/// admits a move to cancelled (pending, approved); attributes the
/// cancellation to the customer.
pub fn cancel(
    conn: &Connection,
    principal: &Principal,
    appointment_id: &str,
    reason: Option<&str>,
) -> Result<Appointment, AppError> {
    let appointment = load(conn, appointment_id)?;
    policy::authorize(principal, &appointment, Action::Cancel)?;

    transition(
        conn,
        &appointment,
        AppointmentStatus::Cancelled,
        reason,
        Some(CancelledBy::Customer),
    )
}

fn transition(
    conn: &Connection,
    appointment: &Appointment,
    target: AppointmentStatus,
    reason: Option<&str>,
    cancelled_by: Option<CancelledBy>,
) -> Result<Appointment, AppError> {
    if !appointment.status.can_transition_to(target) {
        return Err(AppError::InvalidTransition {
            from: appointment.status.as_str(),
            to: target.as_str(),
        });
    }

    queries::update_appointment_status(conn, &appointment.id, target, reason, cancelled_by)?;

    tracing::info!(
        appointment_id = %appointment.id,
        from = appointment.status.as_str(),
        to = target.as_str(),
        "appointment status changed"
    );

    load(conn, &appointment.id)
}

fn load(conn: &Connection, appointment_id: &str) -> Result<Appointment, AppError> {
    queries::get_appointment(conn, appointment_id)?
        .ok_or_else(|| AppError::NotFound("appointment".to_string()))
}
