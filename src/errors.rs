use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("{0}")]
    Validation(String),

    /// Multi-field request validation failure. Every field problem is
    /// reported together, before any write is attempted.
    #[error("validation failed")]
    Fields(Vec<String>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("Service {0} not found for this barber")]
    InvalidService(String),

    #[error("Appointment date must be in the future")]
    PastDate,

    #[error("This time slot is already booked")]
    SlotConflict,

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("A review already exists for this appointment")]
    DuplicateReview,

    #[error("Payment already processed for this appointment")]
    AlreadyPaid,

    #[error("Invalid payment verification")]
    VerificationFailed,

    #[error("payment gateway error: {0}")]
    Payment(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_)
            | AppError::Fields(_)
            | AppError::InvalidService(_)
            | AppError::PastDate
            | AppError::VerificationFailed => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::SlotConflict
            | AppError::InvalidTransition { .. }
            | AppError::DuplicateReview
            | AppError::AlreadyPaid => StatusCode::CONFLICT,
            AppError::Payment(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = match &self {
            AppError::Fields(errors) => serde_json::json!({ "errors": errors }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
