//! Authentication error types.
//!
//! Every failure of the core is returned as an [`AuthError`] value that maps
//! 1:1 to an HTTP status and a machine-readable code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use super::codec::FormatError;
use super::replay::ReplayRejection;
use super::store::StoreError;

/// Authentication and key-linking failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    // === Client format errors ===
    #[error("{0}")]
    InvalidFormat(String),

    #[error("Replay check failed: {0}")]
    Replay(ReplayRejection),

    /// Body or timer signature did not verify. The cause is never exposed.
    #[error("Invalid signature")]
    SignatureInvalid,

    // === Registry / token errors ===
    #[error("User not found")]
    UnknownKey,

    /// Merges never-issued, consumed, revoked and expired tokens.
    #[error("Invalid or expired token")]
    TokenInvalid,

    #[error("Public key is already linked to an account")]
    DuplicateBinding,

    #[error("Cannot delete the current public key")]
    SelfRevocationDenied,

    #[error("Public key not found for this account")]
    BindingNotFound,

    // === Registration ===
    #[error("Name must be 1-64 alphanumeric characters")]
    InvalidName,

    #[error("Name already exists, please choose another name")]
    NameTaken,

    // === System ===
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Backing store failed its health ping
    #[error("Service unavailable")]
    Unavailable,
}

impl AuthError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidFormat(_) => "INVALID_FORMAT",
            AuthError::Replay(_) => "REPLAY_REJECTED",
            AuthError::SignatureInvalid => "INVALID_SIGNATURE",
            AuthError::UnknownKey => "UNKNOWN_KEY",
            AuthError::TokenInvalid => "TOKEN_INVALID",
            AuthError::DuplicateBinding => "DUPLICATE_BINDING",
            AuthError::SelfRevocationDenied => "SELF_REVOCATION_DENIED",
            AuthError::BindingNotFound => "BINDING_NOT_FOUND",
            AuthError::InvalidName => "INVALID_NAME",
            AuthError::NameTaken => "NAME_TAKEN",
            AuthError::Storage(_) => "INTERNAL_ERROR",
            AuthError::Unavailable => "UNAVAILABLE",
        }
    }

    /// HTTP status code.
    pub fn http_status(&self) -> StatusCode {
        match self {
            AuthError::InvalidFormat(_)
            | AuthError::Replay(_)
            | AuthError::SignatureInvalid
            | AuthError::SelfRevocationDenied
            | AuthError::InvalidName => StatusCode::BAD_REQUEST,
            AuthError::UnknownKey | AuthError::TokenInvalid | AuthError::BindingNotFound => {
                StatusCode::NOT_FOUND
            }
            AuthError::DuplicateBinding | AuthError::NameTaken => StatusCode::CONFLICT,
            AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to return to the caller; storage details stay in logs.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Storage(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        AuthError::InvalidFormat(msg.into())
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation => AuthError::DuplicateBinding,
            StoreError::MissingIdentity => {
                AuthError::Storage(StoreError::MissingIdentity.to_string())
            }
            StoreError::Backend(msg) => AuthError::Storage(msg),
        }
    }
}

impl From<FormatError> for AuthError {
    fn from(e: FormatError) -> Self {
        AuthError::InvalidFormat(e.to_string())
    }
}

/// JSON body for rejected requests.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub success: bool,
    pub code: &'static str,
    pub error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Storage(detail) = &self {
            tracing::error!(error = %detail, "Storage failure while handling request");
        }
        let body = AuthErrorResponse {
            success: false,
            code: self.code(),
            error: self.public_message(),
        };
        (self.http_status(), Json(body)).into_response()
    }
}
