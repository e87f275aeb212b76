use std::sync::Arc;

use crate::auth::AuthContext;
use crate::db::Database;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthContext,
    /// Present when running against PostgreSQL; used by the health check
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(auth: AuthContext, pg_db: Option<Arc<Database>>) -> Self {
        Self { auth, pg_db }
    }
}
