use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::db::queries::{self, AppointmentFilter};
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, Role};
use crate::services::booking::{self, BookingRequest};
use crate::services::lifecycle;
use crate::services::policy::{self, Action};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateAppointmentRequest {
    pub barber_profile_id: String,
    pub services: Vec<String>,
    pub appointment_date: String,
    pub appointment_time: String,
    #[serde(default)]
    pub notes: Option<String>,
}

// POST /api/appointments
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    if principal.role != Role::Customer {
        return Err(AppError::Forbidden(
            "Only customers can book appointments".to_string(),
        ));
    }

    let mut errors = Vec::new();
    if body.barber_profile_id.trim().is_empty() {
        errors.push("Valid barber profile ID is required".to_string());
    }
    if body.services.is_empty() {
        errors.push("At least one service is required".to_string());
    }
    let date = NaiveDate::parse_from_str(&body.appointment_date, "%Y-%m-%d").ok();
    if date.is_none() {
        errors.push("Valid appointment date is required".to_string());
    }
    if NaiveTime::parse_from_str(&body.appointment_time, "%H:%M").is_err() {
        errors.push("Valid appointment time (HH:MM) is required".to_string());
    }
    let date = match date {
        Some(date) if errors.is_empty() => date,
        _ => return Err(AppError::Fields(errors)),
    };

    let request = BookingRequest {
        barber_profile_id: body.barber_profile_id,
        service_names: body.services,
        appointment_date: date,
        appointment_time: body.appointment_time,
        notes: body
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from),
    };

    let db = state.db.lock().unwrap();
    let appointment = booking::book(&db, &principal.user_id, &request, Utc::now().naive_utc())?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<Appointment>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

// GET /api/appointments
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<AppointmentListResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let status = match query.status.as_deref() {
        Some(s) => Some(
            AppointmentStatus::parse(s)
                .ok_or_else(|| AppError::Validation("Valid status is required".to_string()))?,
        ),
        None => None,
    };

    // Customers see their own bookings, barbers their own schedule,
    // admins everything.
    let filter = AppointmentFilter {
        customer_id: (principal.role == Role::Customer).then(|| principal.user_id.clone()),
        barber_id: (principal.role == Role::Barber).then(|| principal.user_id.clone()),
        status,
    };

    let db = state.db.lock().unwrap();
    let appointments = queries::list_appointments(&db, &filter, limit, (page - 1) * limit)?;
    let total = queries::count_appointments(&db, &filter)?;

    Ok(Json(AppointmentListResponse {
        appointments,
        total,
        total_pages: (total + limit - 1) / limit,
        current_page: page,
    }))
}

// GET /api/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    let db = state.db.lock().unwrap();
    let appointment = queries::get_appointment(&db, &id)?
        .ok_or_else(|| AppError::NotFound("appointment".to_string()))?;
    policy::authorize(&principal, &appointment, Action::View)?;
    Ok(Json(appointment))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

// PUT /api/appointments/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Appointment>, AppError> {
    let target = AppointmentStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation("Valid status is required".to_string()))?;

    let db = state.db.lock().unwrap();
    let appointment = lifecycle::update_status(
        &db,
        &principal,
        &id,
        target,
        trimmed(body.cancellation_reason.as_deref()),
    )?;
    Ok(Json(appointment))
}

#[derive(Deserialize, Default)]
pub struct CancelRequest {
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

// PUT /api/appointments/:id/cancel
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<Appointment>, AppError> {
    let db = state.db.lock().unwrap();
    let appointment = lifecycle::cancel(
        &db,
        &principal,
        &id,
        trimmed(body.cancellation_reason.as_deref()),
    )?;
    Ok(Json(appointment))
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
