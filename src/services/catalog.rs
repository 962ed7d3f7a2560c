use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Service, WorkingHours};

/// A barber's published catalog as seen by the booking path: the owning
/// barber, the current service list, and the weekly hours. Service
/// prices are resolved here so a client can never supply its own.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub profile_id: String,
    pub barber_id: String,
    pub services: Vec<Service>,
    pub working_hours: WorkingHours,
}

pub fn lookup(conn: &Connection, barber_profile_id: &str) -> Result<Catalog, AppError> {
    let profile = queries::get_barber_profile(conn, barber_profile_id)?
        .ok_or_else(|| AppError::NotFound("barber profile".to_string()))?;

    Ok(Catalog {
        profile_id: profile.id,
        barber_id: profile.user_id,
        services: profile.services,
        working_hours: profile.working_hours,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::test_support::seed_profile;

    #[test]
    fn test_lookup_resolves_catalog() {
        let conn = db::init_db(":memory:").unwrap();
        let profile = seed_profile(&conn, "barber-1");

        let catalog = lookup(&conn, &profile.id).unwrap();
        assert_eq!(catalog.barber_id, "barber-1");
        assert_eq!(catalog.services.len(), 2);
        assert_eq!(catalog.services[0].name, "Haircut");
    }

    #[test]
    fn test_lookup_missing_profile() {
        let conn = db::init_db(":memory:").unwrap();
        let err = lookup(&conn, "nope").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
