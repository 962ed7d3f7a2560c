//! Shared fixtures for the unit tests. Everything here works against an
//! in-memory database opened through the normal migration path.

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::{self, queries};
use crate::models::{
    Appointment, AppointmentStatus, BarberProfile, Location, PaymentStatus, Service,
    ServiceSnapshot, WorkingHours,
};
use crate::services::payments::SandboxGateway;
use crate::state::AppState;

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

/// Profile with a two-service catalog: Haircut 300 / 30min and
/// Beard Trim 150 / 15min.
pub fn seed_profile(conn: &Connection, barber_user_id: &str) -> BarberProfile {
    let now = dt("2025-01-01 00:00");
    let profile = BarberProfile {
        id: Uuid::new_v4().to_string(),
        user_id: barber_user_id.to_string(),
        shop_name: "Fade Factory".to_string(),
        location: Location {
            address: "12 Main St".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            zip_code: "411001".to_string(),
            coordinates: None,
        },
        services: vec![
            Service {
                name: "Haircut".to_string(),
                price: 300.0,
                duration_minutes: 30,
                description: None,
            },
            Service {
                name: "Beard Trim".to_string(),
                price: 150.0,
                duration_minutes: 15,
                description: None,
            },
        ],
        rating: 0.0,
        total_reviews: 0,
        experience_years: 5,
        specialties: vec!["fades".to_string()],
        working_hours: WorkingHours::default(),
        description: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    queries::create_barber_profile(conn, &profile).unwrap();
    profile
}

/// In-memory appointment for tests that never touch the database.
pub fn make_appointment(customer_id: &str, barber_id: &str, profile_id: &str) -> Appointment {
    let now = dt("2025-01-01 00:00");
    Appointment {
        id: Uuid::new_v4().to_string(),
        customer_id: customer_id.to_string(),
        barber_id: barber_id.to_string(),
        barber_profile_id: profile_id.to_string(),
        services: vec![
            ServiceSnapshot {
                name: "Haircut".to_string(),
                price: 300.0,
                duration_minutes: 30,
            },
            ServiceSnapshot {
                name: "Beard Trim".to_string(),
                price: 150.0,
                duration_minutes: 15,
            },
        ],
        appointment_date: "2025-06-02".parse().unwrap(),
        appointment_time: "10:00".to_string(),
        total_amount: 450.0,
        status: AppointmentStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_id: None,
        notes: None,
        cancellation_reason: None,
        cancelled_by: None,
        is_rated: false,
        created_at: now,
        updated_at: now,
    }
}

fn insert_appointment(
    conn: &Connection,
    customer_id: &str,
    barber_id: &str,
    profile_id: &str,
    slot: usize,
    status: AppointmentStatus,
) -> Appointment {
    let mut appointment = make_appointment(customer_id, barber_id, profile_id);
    appointment.appointment_time = format!("{:02}:00", 9 + slot);
    appointment.status = status;
    queries::create_appointment(conn, &appointment).unwrap();
    appointment
}

pub fn pending_appointment(
    conn: &Connection,
    customer_id: &str,
    barber_id: &str,
    profile_id: &str,
    slot: usize,
) -> Appointment {
    insert_appointment(conn, customer_id, barber_id, profile_id, slot, AppointmentStatus::Pending)
}

pub fn completed_appointment(
    conn: &Connection,
    customer_id: &str,
    barber_id: &str,
    profile_id: &str,
    slot: usize,
) -> Appointment {
    insert_appointment(
        conn,
        customer_id,
        barber_id,
        profile_id,
        slot,
        AppointmentStatus::Completed,
    )
}

pub fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        currency: "INR".to_string(),
        allow_simulated_payments: true,
    }
}

pub fn test_state() -> AppState {
    let conn = db::init_db(":memory:").unwrap();
    AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        payments: Box::new(SandboxGateway),
    }
}

/// Seeds a profile and a pending appointment (450.0 total) through the
/// state's connection; used by the payment coordinator tests.
pub fn seed_booked_appointment(
    state: &AppState,
    customer_id: &str,
    barber_user_id: &str,
) -> Appointment {
    let db = state.db.lock().unwrap();
    let profile = seed_profile(&db, barber_user_id);
    pending_appointment(&db, customer_id, barber_user_id, &profile.id, 0)
}
