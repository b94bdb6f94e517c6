use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Domain error taxonomy. Every variant renders as the
/// `{ "success": false, "message": ... }` envelope; validation failures
/// additionally enumerate all violated constraints.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Validation error")]
    Validation(#[from] ValidationErrors),

    #[error("Internal server error")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let ApiError::Database(ref e) = self {
            tracing::error!("Persistence failure: {}", e);
        }
        if let ApiError::Internal(ref e) = self {
            tracing::error!("Internal error: {:#}", e);
        }

        let body = match &self {
            ApiError::Validation(errors) => json!({
                "success": false,
                "message": "Validation error",
                "errors": validation_messages(errors),
            }),
            other => json!({
                "success": false,
                "message": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Flatten validator output into one message per violated constraint so a
/// single response reports every invalid field at once.
fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |e| match &e.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{}: invalid value ({})", field, e.code),
            })
        })
        .collect();
    messages.sort();
    messages
}

/// Parse a path segment as an ObjectId, mapping failures to a 400 with a
/// resource-specific message.
pub fn parse_object_id(id: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} ID format", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
        #[validate(email(message = "Invalid email format"))]
        email: String,
    }

    #[test]
    fn validation_reports_all_fields_at_once() {
        let probe = Probe {
            name: "ab".to_string(),
            email: "not-an-email".to_string(),
        };
        let errors = probe.validate().unwrap_err();
        let messages = validation_messages(&errors);
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.contains("too short")));
        assert!(messages.iter().any(|m| m.contains("Invalid email format")));
    }

    #[test]
    fn bad_object_id_maps_to_bad_request() {
        let err = parse_object_id("nope", "quiz").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid quiz ID format");
    }
}
