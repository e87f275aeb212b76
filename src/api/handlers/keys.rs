//! Key listing, linking and revocation

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;

use super::super::response::{
    ApiResult, KeysData, LinkedKeyData, RevokeKeyRequest, RevokedKeyData, TokenRequest, created,
    ok, parse_body,
};
use super::super::state::AppState;
use crate::auth::AuthHeaders;

/// GET /api/keys
pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<KeysData> {
    let headers = AuthHeaders::from_header_map(&headers);
    let caller = state.auth.gateway.require_identity(&headers, &body).await?;
    let keys = state.auth.registry.list_keys(caller.identity).await?;

    ok(KeysData {
        keys,
        current: caller.public_key,
    })
}

/// POST /api/keys
///
/// Signed by the new, unbound key. The body names the linking token issued
/// from an already registered device.
pub async fn link_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<LinkedKeyData> {
    let req: TokenRequest = parse_body(&body)?;
    let headers = AuthHeaders::from_header_map(&headers);
    let binding = state
        .auth
        .gateway
        .link_key(&headers, &body, &req.token)
        .await?;

    created(LinkedKeyData {
        identity: binding.identity,
        public_key: binding.public_key,
    })
}

/// DELETE /api/keys
pub async fn revoke_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<RevokedKeyData> {
    let headers = AuthHeaders::from_header_map(&headers);
    let caller = state.auth.gateway.require_identity(&headers, &body).await?;
    let req: RevokeKeyRequest = parse_body(&body)?;

    state
        .auth
        .registry
        .revoke(caller.identity, &req.public_key, &caller.public_key)
        .await?;

    ok(RevokedKeyData {
        revoked: req.public_key,
    })
}
