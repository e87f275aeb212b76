//! Linking token management

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;

use super::super::response::{ApiResult, TokenRequest, TokensData, created, ok, parse_body};
use super::super::state::AppState;
use crate::auth::{AuthError, AuthHeaders, LinkingToken};

/// POST /api/tokens
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<LinkingToken> {
    let headers = AuthHeaders::from_header_map(&headers);
    let caller = state.auth.gateway.require_identity(&headers, &body).await?;
    created(state.auth.tokens.issue(caller.identity).await?)
}

/// GET /api/tokens
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<TokensData> {
    let headers = AuthHeaders::from_header_map(&headers);
    let caller = state.auth.gateway.require_identity(&headers, &body).await?;
    let tokens = state.auth.tokens.list_live(caller.identity).await?;
    ok(TokensData { tokens })
}

/// DELETE /api/tokens
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<TokenRequest> {
    let headers = AuthHeaders::from_header_map(&headers);
    let caller = state.auth.gateway.require_identity(&headers, &body).await?;
    let req: TokenRequest = parse_body(&body)?;

    if !state.auth.tokens.revoke(caller.identity, &req.token).await? {
        return Err(AuthError::TokenInvalid);
    }
    ok(req)
}
