//! HTTP surface over the authentication core.

pub mod handlers;
pub mod response;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

pub use response::ApiResponse;
pub use state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/users", get(handlers::profile).post(handlers::register))
        .route("/users/check", get(handlers::check_name))
        .route(
            "/keys",
            get(handlers::list_keys)
                .post(handlers::link_key)
                .delete(handlers::revoke_key),
        )
        .route(
            "/tokens",
            get(handlers::list_tokens)
                .post(handlers::issue_token)
                .delete(handlers::revoke_token),
        );

    Router::new().nest("/api", api_routes).with_state(state)
}
