//! Authentication and authorization error types
//!
//! HTTP bodies carry a stable machine-readable code plus a generic
//! message. Anything more specific (which roles were required, what the
//! hashing backend said) stays in the `Display` output for logs; response
//! bodies never echo passwords or token material.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use shopdir_db::Role;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing or malformed authorization header")]
    MissingCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Insufficient role: requires one of {required:?}, current role is {actual}")]
    InsufficientRole {
        required: &'static [Role],
        actual: Role,
    },

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Stable code carried in the response body
    ///
    /// `TOKEN_EXPIRED` is distinct from `INVALID_TOKEN` so a client can
    /// tell "go refresh" apart from "re-authenticate".
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidInput(_) => "INVALID_INPUT",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingCredentials => "MISSING_CREDENTIALS",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InsufficientRole { .. } => "FORBIDDEN",
            AuthError::PasswordHash(_) | AuthError::Jwt(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::MissingCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            AuthError::PasswordHash(_) | AuthError::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::InvalidInput(detail) => detail.clone(),
            AuthError::InvalidCredentials => "Invalid credentials".to_string(),
            AuthError::MissingCredentials => "Missing or malformed authorization header".to_string(),
            AuthError::InvalidToken => "Invalid token".to_string(),
            AuthError::TokenExpired => "Token expired".to_string(),
            AuthError::InsufficientRole { .. } => "Insufficient role".to_string(),
            AuthError::PasswordHash(_) | AuthError::Jwt(_) => "Internal error".to_string(),
        };

        match &self {
            AuthError::InsufficientRole { .. } => warn!("Authorization denied: {}", self),
            AuthError::PasswordHash(_) | AuthError::Jwt(_) => error!("Auth backend error: {}", self),
            _ => {}
        }

        let body = axum::Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::InvalidInput("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::MissingCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InsufficientRole { required: &[Role::Admin], actual: Role::User }.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_expired_code_distinct_from_invalid() {
        assert_ne!(AuthError::TokenExpired.code(), AuthError::InvalidToken.code());
    }

    #[test]
    fn test_denial_display_names_roles() {
        let err = AuthError::InsufficientRole { required: &[Role::Admin], actual: Role::User };
        let text = err.to_string();
        assert!(text.contains("Admin"));
        assert!(text.contains("user"));
    }
}
