//! Error types shared by storage, the REST layer and the scripts.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Which rule a field broke.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    Required,
    MinLength,
    Enum,
    Email,
    NonNegative,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub constraint: Constraint,
    pub message: String,
}

/// Every field-level violation found in one payload.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn push(&mut self, field: &str, constraint: Constraint, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            constraint,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn constraint_for(&self, field: &str) -> Option<Constraint> {
        self.errors.iter().find(|e| e.field == field).map(|e| e.constraint)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.errors.iter().map(|e| e.field.as_str()).collect();
        write!(f, "{} invalid field(s): {}", self.errors.len(), fields.join(", "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {field} is taken")]
    Conflict { entity: &'static str, field: &'static str },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub type CrmResult<T> = Result<T, CrmError>;

// Malformed or mistyped bodies get the same JSON error shape as everything else.
impl From<JsonRejection> for CrmError {
    fn from(rejection: JsonRejection) -> Self {
        CrmError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for CrmError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unauthorized | Self::Token(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            Self::Validation(err) => json!({
                "message": "Validation failed",
                "errors": err.errors,
            }),
            Self::Token(_) => json!({ "message": "Unauthorized" }),
            other if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %other, "request failed");
                json!({ "message": "Internal server error" })
            }
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_fields() {
        let mut err = ValidationError::default();
        err.push("email", Constraint::Email, "Invalid email address");
        err.push("price", Constraint::NonNegative, "Price must be 0 or more");

        assert!(err.has_field("price"));
        assert_eq!(err.constraint_for("email"), Some(Constraint::Email));
        assert_eq!(err.to_string(), "2 invalid field(s): email, price");
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let not_found = CrmError::NotFound { entity: "Lead", id: "x".into() }.into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict = CrmError::Conflict { entity: "User", field: "username" }.into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let invalid = CrmError::Validation(ValidationError::default()).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
