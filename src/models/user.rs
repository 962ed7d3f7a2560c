use serde::{Deserialize, Serialize};

/// Role assigned by the upstream identity provider. Users themselves are
/// owned by that provider; the booking core only sees id + role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Barber,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Barber => "barber",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Role::Customer),
            "barber" => Some(Role::Barber),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}
