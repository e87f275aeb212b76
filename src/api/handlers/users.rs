//! Identity registration and profile

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;

use super::super::response::{
    ApiResult, NameCheckData, NameCheckQuery, ProfileData, RegisterRequest, created, ok,
    parse_body,
};
use super::super::state::AppState;
use crate::auth::{AuthError, AuthHeaders, Registered};

/// POST /api/users
///
/// The signing key must be verified but not yet bound; it becomes the first
/// key of the new identity. Repeating the call with the same name and key
/// returns the existing identity.
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<ProfileData> {
    let headers = AuthHeaders::from_header_map(&headers);
    let public_key = state.auth.gateway.require_signed(&headers, &body)?;
    let req: RegisterRequest = parse_body(&body)?;

    let registered = state.auth.registrar.register(&req.name, &public_key).await?;
    let data = ProfileData {
        identity: registered.identity(),
        name: req.name,
        public_key,
    };
    match registered {
        Registered::Created(_) => created(data),
        Registered::Existing(_) => ok(data),
    }
}

/// GET /api/users
pub async fn profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<ProfileData> {
    let headers = AuthHeaders::from_header_map(&headers);
    let caller = state.auth.gateway.require_identity(&headers, &body).await?;
    let name = state.auth.registrar.profile(caller.identity).await?;

    ok(ProfileData {
        identity: caller.identity,
        name,
        public_key: caller.public_key,
    })
}

/// GET /api/users/check?name=
///
/// Unauthenticated availability check used before registering.
pub async fn check_name(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameCheckQuery>,
) -> ApiResult<NameCheckData> {
    let name = query
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AuthError::format("Missing name"))?;
    let exist = state.auth.registrar.name_exists(&name).await?;
    ok(NameCheckData { exist })
}
