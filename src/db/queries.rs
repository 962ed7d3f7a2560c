use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Appointment, AppointmentStatus, BarberProfile, CancelledBy, Coordinates, Location,
    PaymentStatus, Review, Service, ServiceSnapshot,
};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn now_string() -> String {
    Utc::now().naive_utc().format(DATETIME_FORMAT).to_string()
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Barber profiles ──

pub fn create_barber_profile(conn: &Connection, profile: &BarberProfile) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO barber_profiles
         (id, user_id, shop_name, address, city, state, zip_code, latitude, longitude,
          services, rating, total_reviews, experience_years, specialties, working_hours,
          description, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            profile.id,
            profile.user_id,
            profile.shop_name,
            profile.location.address,
            profile.location.city,
            profile.location.state,
            profile.location.zip_code,
            profile.location.coordinates.as_ref().map(|c| c.lat),
            profile.location.coordinates.as_ref().map(|c| c.lng),
            serde_json::to_string(&profile.services)?,
            profile.rating,
            profile.total_reviews,
            profile.experience_years,
            serde_json::to_string(&profile.specialties)?,
            serde_json::to_string(&profile.working_hours)?,
            profile.description,
            profile.is_active as i32,
            profile.created_at.format(DATETIME_FORMAT).to_string(),
            profile.updated_at.format(DATETIME_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

const PROFILE_COLUMNS: &str = "id, user_id, shop_name, address, city, state, zip_code, \
     latitude, longitude, services, rating, total_reviews, experience_years, specialties, \
     working_hours, description, is_active, created_at, updated_at";

pub fn get_barber_profile(conn: &Connection, id: &str) -> anyhow::Result<Option<BarberProfile>> {
    let result = conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM barber_profiles WHERE id = ?1"),
        params![id],
        |row| Ok(parse_profile_row(row)),
    );

    match result {
        Ok(profile) => Ok(Some(profile?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_barber_profile_by_user(
    conn: &Connection,
    user_id: &str,
) -> anyhow::Result<Option<BarberProfile>> {
    let result = conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM barber_profiles WHERE user_id = ?1"),
        params![user_id],
        |row| Ok(parse_profile_row(row)),
    );

    match result {
        Ok(profile) => Ok(Some(profile?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_barber_profiles(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<BarberProfile>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFILE_COLUMNS} FROM barber_profiles WHERE is_active = 1
         ORDER BY rating DESC, total_reviews DESC LIMIT ?1 OFFSET ?2"
    ))?;

    let rows = stmt.query_map(params![limit, offset], |row| Ok(parse_profile_row(row)))?;

    let mut profiles = vec![];
    for row in rows {
        profiles.push(row??);
    }
    Ok(profiles)
}

pub fn count_barber_profiles(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM barber_profiles WHERE is_active = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn update_barber_profile(conn: &Connection, profile: &BarberProfile) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE barber_profiles SET
           shop_name = ?1, address = ?2, city = ?3, state = ?4, zip_code = ?5,
           latitude = ?6, longitude = ?7, services = ?8, experience_years = ?9,
           specialties = ?10, working_hours = ?11, description = ?12, is_active = ?13,
           updated_at = ?14
         WHERE id = ?15",
        params![
            profile.shop_name,
            profile.location.address,
            profile.location.city,
            profile.location.state,
            profile.location.zip_code,
            profile.location.coordinates.as_ref().map(|c| c.lat),
            profile.location.coordinates.as_ref().map(|c| c.lng),
            serde_json::to_string(&profile.services)?,
            profile.experience_years,
            serde_json::to_string(&profile.specialties)?,
            serde_json::to_string(&profile.working_hours)?,
            profile.description,
            profile.is_active as i32,
            now_string(),
            profile.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn update_barber_services(
    conn: &Connection,
    profile_id: &str,
    services: &[Service],
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE barber_profiles SET services = ?1, updated_at = ?2 WHERE id = ?3",
        params![serde_json::to_string(services)?, now_string(), profile_id],
    )?;
    Ok(count > 0)
}

/// Writes the recomputed aggregate onto the profile, keyed by the barber
/// user id (the key reviews carry).
pub fn update_barber_rating(
    conn: &Connection,
    barber_user_id: &str,
    rating: f64,
    total_reviews: i64,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE barber_profiles SET rating = ?1, total_reviews = ?2, updated_at = ?3
         WHERE user_id = ?4",
        params![rating, total_reviews, now_string(), barber_user_id],
    )?;
    Ok(count > 0)
}

fn parse_profile_row(row: &rusqlite::Row) -> anyhow::Result<BarberProfile> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let shop_name: String = row.get(2)?;
    let address: String = row.get(3)?;
    let city: String = row.get(4)?;
    let state: String = row.get(5)?;
    let zip_code: String = row.get(6)?;
    let latitude: Option<f64> = row.get(7)?;
    let longitude: Option<f64> = row.get(8)?;
    let services_json: String = row.get(9)?;
    let rating: f64 = row.get(10)?;
    let total_reviews: i64 = row.get(11)?;
    let experience_years: i64 = row.get(12)?;
    let specialties_json: String = row.get(13)?;
    let working_hours_json: String = row.get(14)?;
    let description: Option<String> = row.get(15)?;
    let is_active: bool = row.get::<_, i32>(16)? != 0;
    let created_at: String = row.get(17)?;
    let updated_at: String = row.get(18)?;

    let coordinates = match (latitude, longitude) {
        (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
        _ => None,
    };

    Ok(BarberProfile {
        id,
        user_id,
        shop_name,
        location: Location {
            address,
            city,
            state,
            zip_code,
            coordinates,
        },
        services: serde_json::from_str(&services_json).unwrap_or_default(),
        rating,
        total_reviews,
        experience_years,
        specialties: serde_json::from_str(&specialties_json).unwrap_or_default(),
        working_hours: serde_json::from_str(&working_hours_json).unwrap_or_default(),
        description,
        is_active,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

// ── Appointments ──

pub fn create_appointment(conn: &Connection, appointment: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments
         (id, customer_id, barber_id, barber_profile_id, services, appointment_date,
          appointment_time, total_amount, status, payment_status, payment_id, notes,
          cancellation_reason, cancelled_by, is_rated, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            appointment.id,
            appointment.customer_id,
            appointment.barber_id,
            appointment.barber_profile_id,
            serde_json::to_string(&appointment.services)?,
            appointment.appointment_date.format(DATE_FORMAT).to_string(),
            appointment.appointment_time,
            appointment.total_amount,
            appointment.status.as_str(),
            appointment.payment_status.as_str(),
            appointment.payment_id,
            appointment.notes,
            appointment.cancellation_reason,
            appointment.cancelled_by.map(|c| c.as_str()),
            appointment.is_rated as i32,
            appointment.created_at.format(DATETIME_FORMAT).to_string(),
            appointment.updated_at.format(DATETIME_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

const APPOINTMENT_COLUMNS: &str = "id, customer_id, barber_id, barber_profile_id, services, \
     appointment_date, appointment_time, total_amount, status, payment_status, payment_id, \
     notes, cancellation_reason, cancelled_by, is_rated, created_at, updated_at";

pub fn get_appointment(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let result = conn.query_row(
        &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
        params![id],
        |row| Ok(parse_appointment_row(row)),
    );

    match result {
        Ok(appointment) => Ok(Some(appointment?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read-side check for the slot-uniqueness invariant: an appointment in
/// pending or approved holds the (barber, date, time) slot. The partial
/// unique index enforces the same rule at insert time.
pub fn slot_taken(
    conn: &Connection,
    barber_id: &str,
    date: NaiveDate,
    time: &str,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE barber_id = ?1 AND appointment_date = ?2 AND appointment_time = ?3
           AND status IN ('pending', 'approved')",
        params![barber_id, date.format(DATE_FORMAT).to_string(), time],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[derive(Debug, Default)]
pub struct AppointmentFilter {
    pub customer_id: Option<String>,
    pub barber_id: Option<String>,
    pub status: Option<AppointmentStatus>,
}

pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let (where_clause, mut values) = filter_clause(filter);
    values.push(Box::new(limit));
    values.push(Box::new(offset));

    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments {where_clause}
         ORDER BY appointment_date DESC, appointment_time DESC
         LIMIT ?{} OFFSET ?{}",
        values.len() - 1,
        values.len(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let value_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(value_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn count_appointments(conn: &Connection, filter: &AppointmentFilter) -> anyhow::Result<i64> {
    let (where_clause, values) = filter_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM appointments {where_clause}");

    let value_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let count: i64 = conn.query_row(&sql, value_refs.as_slice(), |row| row.get(0))?;
    Ok(count)
}

fn filter_clause(
    filter: &AppointmentFilter,
) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
    let mut conditions: Vec<String> = vec![];
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(customer_id) = &filter.customer_id {
        values.push(Box::new(customer_id.clone()));
        conditions.push(format!("customer_id = ?{}", values.len()));
    }
    if let Some(barber_id) = &filter.barber_id {
        values.push(Box::new(barber_id.clone()));
        conditions.push(format!("barber_id = ?{}", values.len()));
    }
    if let Some(status) = filter.status {
        values.push(Box::new(status.as_str().to_string()));
        conditions.push(format!("status = ?{}", values.len()));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (clause, values)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
    cancellation_reason: Option<&str>,
    cancelled_by: Option<CancelledBy>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET
           status = ?1,
           cancellation_reason = COALESCE(?2, cancellation_reason),
           cancelled_by = COALESCE(?3, cancelled_by),
           updated_at = ?4
         WHERE id = ?5",
        params![
            status.as_str(),
            cancellation_reason,
            cancelled_by.map(|c| c.as_str()),
            now_string(),
            id
        ],
    )?;
    Ok(count > 0)
}

pub fn update_payment(
    conn: &Connection,
    id: &str,
    payment_status: PaymentStatus,
    payment_id: Option<&str>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET payment_status = ?1, payment_id = ?2, updated_at = ?3
         WHERE id = ?4",
        params![payment_status.as_str(), payment_id, now_string(), id],
    )?;
    Ok(count > 0)
}

pub fn set_appointment_rated(conn: &Connection, id: &str, rated: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET is_rated = ?1, updated_at = ?2 WHERE id = ?3",
        params![rated as i32, now_string(), id],
    )?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let id: String = row.get(0)?;
    let customer_id: String = row.get(1)?;
    let barber_id: String = row.get(2)?;
    let barber_profile_id: String = row.get(3)?;
    let services_json: String = row.get(4)?;
    let date_str: String = row.get(5)?;
    let appointment_time: String = row.get(6)?;
    let total_amount: f64 = row.get(7)?;
    let status_str: String = row.get(8)?;
    let payment_status_str: String = row.get(9)?;
    let payment_id: Option<String> = row.get(10)?;
    let notes: Option<String> = row.get(11)?;
    let cancellation_reason: Option<String> = row.get(12)?;
    let cancelled_by_str: Option<String> = row.get(13)?;
    let is_rated: bool = row.get::<_, i32>(14)? != 0;
    let created_at: String = row.get(15)?;
    let updated_at: String = row.get(16)?;

    let services: Vec<ServiceSnapshot> =
        serde_json::from_str(&services_json).unwrap_or_default();

    Ok(Appointment {
        id,
        customer_id,
        barber_id,
        barber_profile_id,
        services,
        appointment_date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .unwrap_or_else(|_| Utc::now().date_naive()),
        appointment_time,
        total_amount,
        status: AppointmentStatus::parse(&status_str).unwrap_or(AppointmentStatus::Pending),
        payment_status: PaymentStatus::parse(&payment_status_str)
            .unwrap_or(PaymentStatus::Pending),
        payment_id,
        notes,
        cancellation_reason,
        cancelled_by: cancelled_by_str.as_deref().and_then(CancelledBy::parse),
        is_rated,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

// ── Reviews ──

pub fn create_review(conn: &Connection, review: &Review) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reviews
         (id, customer_id, barber_id, appointment_id, rating, comment, is_anonymous,
          created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            review.id,
            review.customer_id,
            review.barber_id,
            review.appointment_id,
            review.rating,
            review.comment,
            review.is_anonymous as i32,
            review.created_at.format(DATETIME_FORMAT).to_string(),
            review.updated_at.format(DATETIME_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

const REVIEW_COLUMNS: &str =
    "id, customer_id, barber_id, appointment_id, rating, comment, is_anonymous, created_at, updated_at";

pub fn get_review(conn: &Connection, id: &str) -> anyhow::Result<Option<Review>> {
    let result = conn.query_row(
        &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"),
        params![id],
        |row| Ok(parse_review_row(row)),
    );

    match result {
        Ok(review) => Ok(Some(review?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_review(
    conn: &Connection,
    id: &str,
    rating: i64,
    comment: Option<&str>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE reviews SET rating = ?1, comment = ?2, updated_at = ?3 WHERE id = ?4",
        params![rating, comment, now_string(), id],
    )?;
    Ok(count > 0)
}

pub fn delete_review(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_reviews_for_barber(
    conn: &Connection,
    barber_user_id: &str,
) -> anyhow::Result<Vec<Review>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE barber_id = ?1 ORDER BY created_at DESC"
    ))?;

    let rows = stmt.query_map(params![barber_user_id], |row| Ok(parse_review_row(row)))?;

    let mut reviews = vec![];
    for row in rows {
        reviews.push(row??);
    }
    Ok(reviews)
}

/// Mean rating and count over every review for the barber, or None when
/// the barber has no reviews at all.
pub fn barber_rating_stats(
    conn: &Connection,
    barber_user_id: &str,
) -> anyhow::Result<Option<(f64, i64)>> {
    let (avg, count): (Option<f64>, i64) = conn.query_row(
        "SELECT AVG(rating), COUNT(*) FROM reviews WHERE barber_id = ?1",
        params![barber_user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(avg.map(|avg| (avg, count)))
}

fn parse_review_row(row: &rusqlite::Row) -> anyhow::Result<Review> {
    let id: String = row.get(0)?;
    let customer_id: String = row.get(1)?;
    let barber_id: String = row.get(2)?;
    let appointment_id: String = row.get(3)?;
    let rating: i64 = row.get(4)?;
    let comment: Option<String> = row.get(5)?;
    let is_anonymous: bool = row.get::<_, i32>(6)? != 0;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(Review {
        id,
        customer_id,
        barber_id,
        appointment_id,
        rating,
        comment,
        is_anonymous,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}
