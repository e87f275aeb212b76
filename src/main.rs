//! keylink server
//!
//! Usage: keylink [--env <name>] [--port <port>]
//!
//! Reads `config/<env>.yaml` (default `dev`).

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use keylink::api::{self, AppState};
use keylink::auth::{AuthContext, KeyStore, MemoryStore, PgKeyStore, SystemClock};
use keylink::config::AppConfig;
use keylink::db::Database;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = keylink::logging::init_logging(&app_config);

    tracing::info!("Starting keylink in {} mode", env);

    let (store, pg_db): (Arc<dyn KeyStore>, Option<Arc<Database>>) =
        match &app_config.postgres_url {
            Some(url) => {
                let db = Database::connect(url, app_config.postgres_max_connections)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                db.init_schema()
                    .await
                    .context("Failed to initialize schema")?;
                let db = Arc::new(db);
                let store: Arc<dyn KeyStore> = Arc::new(PgKeyStore::new(db.clone()));
                (store, Some(db))
            }
            None => {
                tracing::warn!("No postgres_url configured, key bindings live in memory only");
                let store: Arc<dyn KeyStore> = Arc::new(MemoryStore::new());
                (store, None)
            }
        };

    let auth = AuthContext::new(store, Arc::new(SystemClock), &app_config.auth);
    tracing::info!(
        store = auth.store_name(),
        replay_window_ms = app_config.auth.replay_window_ms,
        token_ttl_secs = app_config.auth.token_ttl_secs,
        "Authentication configured"
    );

    let app = api::router(Arc::new(AppState::new(auth, pg_db)));

    let port = get_port_override().unwrap_or(app_config.server.port);
    let addr = format!("{}:{}", app_config.server.host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port in use?)", addr))?;

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
