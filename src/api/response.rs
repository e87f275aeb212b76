//! API response envelope and DTOs
//!
//! Success bodies are `{"success": true, "data": ...}`. Failures are
//! rendered by [`AuthError`](crate::auth::AuthError) as
//! `{"success": false, "code": ..., "error": ...}`.

use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, IdentityId, LinkingToken};

/// Unified success wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AuthError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

/// Parse a request body that has already been signature-checked.
pub fn parse_body<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, AuthError> {
    serde_json::from_slice(body).map_err(|e| AuthError::format(format!("Invalid request body: {e}")))
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct NameCheckQuery {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeKeyRequest {
    pub public_key: String,
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub identity: IdentityId,
    pub name: String,
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct NameCheckData {
    pub exist: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysData {
    pub keys: Vec<String>,
    /// Key that signed this request
    pub current: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedKeyData {
    pub identity: IdentityId,
    pub public_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedKeyData {
    pub revoked: String,
}

#[derive(Debug, Serialize)]
pub struct TokensData {
    pub tokens: Vec<LinkingToken>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub timestamp_ms: i64,
    pub store: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let json = serde_json::to_value(ApiResponse::success(RevokedKeyData {
            revoked: "abc".into(),
        }))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "data": {"revoked": "abc"}})
        );
    }

    #[test]
    fn test_parse_body() {
        let req: RevokeKeyRequest = parse_body(br#"{"publicKey":"K"}"#).unwrap();
        assert_eq!(req.public_key, "K");

        let err = parse_body::<TokenRequest>(b"{}").unwrap_err();
        assert_eq!(err.code(), "INVALID_FORMAT");
        assert!(parse_body::<RegisterRequest>(b"not json").is_err());
    }
}
