//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a caller can observe is one of five kinds: validation, conflict,
//! unauthorized, not found, or internal. Each kind maps to exactly one HTTP status and
//! is rendered with the common `{ "success": false, "message": ... }` envelope.
//!
//! Internal failures never carry driver or library details to the client. The cause is
//! logged through `log::error!` at the point of conversion and the client only sees the
//! context message (for example "Failed to create task").

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use validator::ValidationErrors;

use crate::auth::token::TokenError;
use crate::response::ApiResponse;
use crate::store::StoreError;

/// Reported when a still-valid token belongs to a deleted account.
pub const ACCOUNT_GONE: &str = "Account no longer exists";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing or malformed input, including ill-formed identities (HTTP 400).
    ValidationError(String),
    /// The write would violate a uniqueness rule, e.g. a duplicate email (HTTP 400).
    Conflict(String),
    /// Missing/invalid credentials, token, or pre-shared key (HTTP 401).
    Unauthorized(String),
    /// The resource does not exist or is not owned by the caller (HTTP 404).
    NotFound(String),
    /// Storage or other unexpected failure (HTTP 500).
    /// The message is safe to show to clients; the cause has already been logged.
    InternalError(String),
}

impl AppError {
    /// Logs `cause` for operators and returns an `InternalError` carrying only `context`.
    pub fn internal(context: &str, cause: impl fmt::Display) -> AppError {
        log::error!("{}: {}", context, cause);
        AppError::InternalError(context.to_string())
    }

    /// Maps a storage failure, naming the operation that was attempted.
    /// Uniqueness violations stay visible to the client as conflicts.
    pub fn from_store(context: &str, error: StoreError) -> AppError {
        match error {
            StoreError::DuplicateEmail => AppError::Conflict("Email already registered".into()),
            StoreError::UnknownOwner => AppError::Unauthorized(ACCOUNT_GONE.into()),
            other => AppError::internal(context, other),
        }
    }

    /// The client-facing message for this error.
    pub fn message(&self) -> &str {
        match self {
            AppError::ValidationError(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::InternalError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Conflicts are reported as 400, not 409.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::failure(self.message()))
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// Only the first message of each failing field is kept, in field-name order,
/// so the response is stable across runs.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        let messages: Vec<String> = fields
            .into_iter()
            .map(|(field, errs)| {
                errs.first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
            .collect();

        if messages.is_empty() {
            AppError::ValidationError("Invalid input".into())
        } else {
            AppError::ValidationError(messages.join("; "))
        }
    }
}

/// Storage failures are internal unless they describe a uniqueness violation.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        AppError::from_store("Storage operation failed", error)
    }
}

/// Every token failure collapses into the same client-facing message.
/// The precise cause is only logged.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        log::debug!("rejected bearer token: {}", error);
        AppError::Unauthorized("Invalid or expired token".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("Invalid token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::ValidationError("Invalid input".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::Conflict("Email already registered".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::NotFound("Task not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::InternalError("Server error".into());
        assert_eq!(error.error_response().status(), 500);
    }

    #[actix_rt::test]
    async fn test_error_body_is_envelope() {
        let response = AppError::NotFound("Task not found".into()).error_response();
        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Task not found");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_internal_hides_cause() {
        let error = AppError::internal("Failed to create task", "connection reset by peer");
        assert_eq!(error.message(), "Failed to create task");
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        match AppError::from(StoreError::DuplicateEmail) {
            AppError::Conflict(msg) => assert_eq!(msg, "Email already registered"),
            other => panic!("unexpected error: {:?}", other),
        }
        match AppError::from(StoreError::UnknownOwner) {
            AppError::Unauthorized(msg) => assert_eq!(msg, ACCOUNT_GONE),
            other => panic!("unexpected error: {:?}", other),
        }
        match AppError::from(StoreError::NotInitialized) {
            AppError::InternalError(msg) => assert_eq!(msg, "Storage operation failed"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_token_errors_are_indistinguishable() {
        let messages: Vec<String> = [
            TokenError::InvalidSignature,
            TokenError::Expired,
            TokenError::Malformed("bad base64".into()),
        ]
        .into_iter()
        .map(|e| AppError::from(e).message().to_string())
        .collect();

        assert!(messages.iter().all(|m| m == "Invalid or expired token"));
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "title is required"))]
        title: String,
        #[validate(length(min = 1, message = "subject is required"))]
        subject: String,
    }

    #[test]
    fn test_validation_messages_are_joined_in_field_order() {
        let sample = Sample {
            title: String::new(),
            subject: String::new(),
        };
        let err = AppError::from(sample.validate().unwrap_err());
        assert_eq!(err.message(), "subject is required; title is required");
    }
}
