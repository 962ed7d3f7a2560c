use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const MAX_COMMENT_LENGTH: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub customer_id: String,
    pub barber_id: String,
    pub appointment_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub is_anonymous: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Field-level validation shared by review creation and update.
pub fn validate_review_fields(rating: i64, comment: Option<&str>) -> Vec<String> {
    let mut errors = Vec::new();

    if !(1..=5).contains(&rating) {
        errors.push("Rating must be between 1 and 5".to_string());
    }
    if let Some(comment) = comment {
        if comment.chars().count() > MAX_COMMENT_LENGTH {
            errors.push(format!(
                "Comment must be at most {MAX_COMMENT_LENGTH} characters"
            ));
        }
    }

    errors
}
