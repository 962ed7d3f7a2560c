use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A bookable service as published in a barber's catalog. Prices are in
/// whole currency units; minor-unit conversion happens only at the
/// payment gateway boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub name: String,
    pub price: f64,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_duration() -> i64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
    pub is_open: bool,
}

impl DayHours {
    fn weekday() -> Self {
        DayHours {
            open: "09:00".to_string(),
            close: "18:00".to_string(),
            is_open: true,
        }
    }

    fn closed() -> Self {
        DayHours {
            open: "09:00".to_string(),
            close: "18:00".to_string(),
            is_open: false,
        }
    }
}

/// Weekly opening table. Sundays default to closed, matching how most
/// shops onboard before editing their hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHours {
    pub monday: DayHours,
    pub tuesday: DayHours,
    pub wednesday: DayHours,
    pub thursday: DayHours,
    pub friday: DayHours,
    pub saturday: DayHours,
    pub sunday: DayHours,
}

impl Default for WorkingHours {
    fn default() -> Self {
        WorkingHours {
            monday: DayHours::weekday(),
            tuesday: DayHours::weekday(),
            wednesday: DayHours::weekday(),
            thursday: DayHours::weekday(),
            friday: DayHours::weekday(),
            saturday: DayHours::weekday(),
            sunday: DayHours::closed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarberProfile {
    pub id: String,
    pub user_id: String,
    pub shop_name: String,
    pub location: Location,
    pub services: Vec<Service>,
    pub rating: f64,
    pub total_reviews: i64,
    pub experience_years: i64,
    pub specialties: Vec<String>,
    pub working_hours: WorkingHours,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Field-level validation for a submitted service catalog. Returns every
/// problem at once so the caller can report them together.
pub fn validate_services(services: &[Service]) -> Vec<String> {
    let mut errors = Vec::new();

    if services.is_empty() {
        errors.push("At least one service is required".to_string());
    }

    for (i, service) in services.iter().enumerate() {
        if service.name.trim().is_empty() {
            errors.push(format!("Service #{}: name is required", i + 1));
        }
        if service.price < 0.0 {
            errors.push(format!(
                "Service '{}': price must be a positive number",
                service.name
            ));
        }
        if service.duration_minutes < 15 {
            errors.push(format!(
                "Service '{}': duration must be at least 15 minutes",
                service.name
            ));
        }
    }

    // Catalog names are the booking key, so they must be unique.
    for (i, service) in services.iter().enumerate() {
        if services[..i].iter().any(|s| s.name == service.name) {
            errors.push(format!("Service '{}': duplicate name", service.name));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, price: f64, duration: i64) -> Service {
        Service {
            name: name.to_string(),
            price,
            duration_minutes: duration,
            description: None,
        }
    }

    #[test]
    fn test_valid_catalog() {
        let services = vec![service("Haircut", 300.0, 30), service("Beard Trim", 150.0, 15)];
        assert!(validate_services(&services).is_empty());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let errors = validate_services(&[]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("At least one service"));
    }

    #[test]
    fn test_negative_price_rejected() {
        let errors = validate_services(&[service("Haircut", -1.0, 30)]);
        assert!(errors.iter().any(|e| e.contains("positive number")));
    }

    #[test]
    fn test_short_duration_rejected() {
        let errors = validate_services(&[service("Haircut", 300.0, 10)]);
        assert!(errors.iter().any(|e| e.contains("at least 15 minutes")));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let services = vec![service("Haircut", 300.0, 30), service("Haircut", 200.0, 30)];
        let errors = validate_services(&services);
        assert!(errors.iter().any(|e| e.contains("duplicate name")));
    }

    #[test]
    fn test_default_duration_applied_on_parse() {
        let parsed: Service =
            serde_json::from_str(r#"{"name":"Haircut","price":300.0}"#).unwrap();
        assert_eq!(parsed.duration_minutes, 30);
    }

    #[test]
    fn test_default_working_hours_sunday_closed() {
        let hours = WorkingHours::default();
        assert!(hours.monday.is_open);
        assert!(!hours.sunday.is_open);
    }
}
