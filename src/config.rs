use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Currency reported to the payment gateway. Amounts are converted to
    /// minor units (× 100) only at that boundary.
    pub currency: String,
    /// When false the /api/payments/simulate endpoint is disabled; the
    /// simulate path exists for demos and tests only.
    pub allow_simulated_payments: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "barberbook.db".to_string()),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            allow_simulated_payments: env::var("ALLOW_SIMULATED_PAYMENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}
