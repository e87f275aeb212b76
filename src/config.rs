use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::auth::replay::DEFAULT_REPLAY_WINDOW_MS;
use crate::auth::tokens::DEFAULT_TOKEN_TTL_SECS;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// PostgreSQL connection URL; the in-memory store is used when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub postgres_max_connections: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Accepted distance between `X-Timer` and server time
    pub replay_window_ms: u64,
    /// Lifetime of a linking token
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            replay_window_ms: DEFAULT_REPLAY_WINDOW_MS,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: keylink.log
use_json: false
rotation: daily
server:
  host: 127.0.0.1
  port: 8080
"#;

    #[test]
    fn test_auth_defaults_when_section_absent() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.auth, AuthConfig::default());
        assert_eq!(config.auth.replay_window_ms, 60_000);
        assert_eq!(config.auth.token_ttl_secs, 300);
        assert!(config.postgres_url.is_none());
        assert_eq!(config.postgres_max_connections, 10);
    }

    #[test]
    fn test_auth_section_overrides() {
        let yaml = format!(
            "{MINIMAL}auth:\n  replay_window_ms: 5000\n  token_ttl_secs: 60\npostgres_url: postgresql://localhost/keylink\n"
        );
        let config = AppConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.auth.replay_window_ms, 5_000);
        assert_eq!(config.auth.token_ttl_secs, 60);
        assert_eq!(
            config.postgres_url.as_deref(),
            Some("postgresql://localhost/keylink")
        );
    }

    #[test]
    fn test_missing_server_section_fails() {
        let yaml = "log_level: info\nlog_dir: .\nlog_file: x\nuse_json: true\nrotation: never\n";
        assert!(AppConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("does-not-exist").unwrap_err();
        assert!(err.to_string().contains("config/does-not-exist.yaml"));
    }
}
