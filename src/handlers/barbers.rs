use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Principal;
use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{
    barber::validate_services, BarberProfile, Location, Role, Service, WorkingHours,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ProfileListResponse {
    pub barbers: Vec<BarberProfile>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

// GET /api/barbers
pub async fn list_barbers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProfileListResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let db = state.db.lock().unwrap();
    let barbers = queries::list_barber_profiles(&db, limit, (page - 1) * limit)?;
    let total = queries::count_barber_profiles(&db)?;

    Ok(Json(ProfileListResponse {
        barbers,
        total,
        total_pages: (total + limit - 1) / limit,
        current_page: page,
    }))
}

// GET /api/barbers/:id
pub async fn get_barber(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BarberProfile>, AppError> {
    let db = state.db.lock().unwrap();
    let profile = queries::get_barber_profile(&db, &id)?
        .ok_or_else(|| AppError::NotFound("barber profile".to_string()))?;
    Ok(Json(profile))
}

#[derive(Deserialize)]
pub struct CreateProfileRequest {
    pub shop_name: String,
    pub location: Location,
    pub services: Vec<Service>,
    #[serde(default)]
    pub experience_years: i64,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub working_hours: Option<WorkingHours>,
    #[serde(default)]
    pub description: Option<String>,
}

// POST /api/barbers
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<BarberProfile>), AppError> {
    if principal.role != Role::Barber {
        return Err(AppError::Forbidden(
            "Only barbers can create a profile".to_string(),
        ));
    }

    let mut errors = Vec::new();
    if body.shop_name.trim().len() < 2 {
        errors.push("Shop name is required".to_string());
    }
    for (label, value) in [
        ("Address", &body.location.address),
        ("City", &body.location.city),
        ("State", &body.location.state),
        ("Zip code", &body.location.zip_code),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("{label} is required"));
        }
    }
    errors.extend(validate_services(&body.services));
    if !errors.is_empty() {
        return Err(AppError::Fields(errors));
    }

    let db = state.db.lock().unwrap();
    if queries::get_barber_profile_by_user(&db, &principal.user_id)?.is_some() {
        return Err(AppError::Validation(
            "Barber profile already exists".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let profile = BarberProfile {
        id: Uuid::new_v4().to_string(),
        user_id: principal.user_id.clone(),
        shop_name: body.shop_name.trim().to_string(),
        location: body.location,
        services: body.services,
        rating: 0.0,
        total_reviews: 0,
        experience_years: body.experience_years,
        specialties: body.specialties,
        working_hours: body.working_hours.unwrap_or_default(),
        description: body.description,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    // The unique index on user_id is the backstop for concurrent
    // double-creation; report it the same way as the read check.
    if let Err(err) = queries::create_barber_profile(&db, &profile) {
        if db::is_unique_violation(&err) {
            return Err(AppError::Validation(
                "Barber profile already exists".to_string(),
            ));
        }
        return Err(AppError::Internal(err));
    }

    tracing::info!(profile_id = %profile.id, user_id = %profile.user_id, "barber profile created");

    Ok((StatusCode::CREATED, Json(profile)))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub shop_name: Option<String>,
    pub location: Option<Location>,
    pub services: Option<Vec<Service>>,
    pub experience_years: Option<i64>,
    pub specialties: Option<Vec<String>>,
    pub working_hours: Option<WorkingHours>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

// PUT /api/barbers/:id
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<BarberProfile>, AppError> {
    let mut errors = Vec::new();
    if let Some(shop_name) = &body.shop_name {
        if shop_name.trim().len() < 2 {
            errors.push("Shop name must be at least 2 characters".to_string());
        }
    }
    if let Some(services) = &body.services {
        errors.extend(validate_services(services));
    }
    if !errors.is_empty() {
        return Err(AppError::Fields(errors));
    }

    let db = state.db.lock().unwrap();
    let mut profile = owned_profile(&db, &principal, &id)?;

    if let Some(shop_name) = body.shop_name {
        profile.shop_name = shop_name.trim().to_string();
    }
    if let Some(location) = body.location {
        profile.location = location;
    }
    if let Some(services) = body.services {
        profile.services = services;
    }
    if let Some(experience_years) = body.experience_years {
        profile.experience_years = experience_years;
    }
    if let Some(specialties) = body.specialties {
        profile.specialties = specialties;
    }
    if let Some(working_hours) = body.working_hours {
        profile.working_hours = working_hours;
    }
    if let Some(description) = body.description {
        profile.description = Some(description);
    }
    if let Some(is_active) = body.is_active {
        profile.is_active = is_active;
    }

    queries::update_barber_profile(&db, &profile)?;

    let profile = queries::get_barber_profile(&db, &id)?
        .ok_or_else(|| AppError::NotFound("barber profile".to_string()))?;
    Ok(Json(profile))
}

#[derive(Deserialize)]
pub struct UpdateServicesRequest {
    pub services: Vec<Service>,
}

// PUT /api/barbers/:id/services
pub async fn update_services(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
    Json(body): Json<UpdateServicesRequest>,
) -> Result<Json<BarberProfile>, AppError> {
    let errors = validate_services(&body.services);
    if !errors.is_empty() {
        return Err(AppError::Fields(errors));
    }

    let db = state.db.lock().unwrap();
    owned_profile(&db, &principal, &id)?;

    queries::update_barber_services(&db, &id, &body.services)?;

    let profile = queries::get_barber_profile(&db, &id)?
        .ok_or_else(|| AppError::NotFound("barber profile".to_string()))?;
    Ok(Json(profile))
}

// GET /api/barbers/profile/me
pub async fn my_profile(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<BarberProfile>, AppError> {
    if principal.role != Role::Barber {
        return Err(AppError::Forbidden(
            "Only barbers have a barber profile".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    let profile = queries::get_barber_profile_by_user(&db, &principal.user_id)?
        .ok_or_else(|| AppError::NotFound("barber profile".to_string()))?;
    Ok(Json(profile))
}

fn owned_profile(
    db: &rusqlite::Connection,
    principal: &Principal,
    profile_id: &str,
) -> Result<BarberProfile, AppError> {
    let profile = queries::get_barber_profile(db, profile_id)?
        .ok_or_else(|| AppError::NotFound("barber profile".to_string()))?;
    if principal.role != Role::Barber || profile.user_id != principal.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to update this profile".to_string(),
        ));
    }
    Ok(profile)
}
