use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// HTTP stack targets that are noisy at debug level.
const QUIET_TARGETS: &str = "hyper=info,tower_http=info";

pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let schedule = rotation(&config.rotation);
    let file_appender =
        RollingFileAppender::new(schedule.clone(), &config.log_dir, &config.log_file);

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    tracing::info!(
        level = %config.log_level,
        dir = %config.log_dir,
        file = %config.log_file,
        rotation = ?schedule,
        json = config.use_json,
        store = store_kind(config),
        "Logging initialized"
    );

    guard
}

/// Unknown names never rotate.
fn rotation(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

fn store_kind(config: &AppConfig) -> &'static str {
    if config.postgres_url.is_some() {
        "postgres"
    } else {
        "memory"
    }
}

/// sqlx is silenced entirely when keys live in memory.
fn filter_directives(config: &AppConfig) -> String {
    let sqlx = match store_kind(config) {
        "postgres" => "sqlx=warn",
        _ => "sqlx=off",
    };
    format!("{},{},{}", config.log_level, sqlx, QUIET_TARGETS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &str) -> AppConfig {
        let yaml = format!(
            "log_level: debug\nlog_dir: ./logs\nlog_file: keylink.log\nuse_json: false\nrotation: daily\nserver:\n  host: 127.0.0.1\n  port: 8080\n{extra}"
        );
        AppConfig::from_yaml(&yaml).unwrap()
    }

    #[test]
    fn test_filter_directives_follow_store() {
        let memory = filter_directives(&config(""));
        assert!(memory.starts_with("debug,sqlx=off,"));
        assert!(EnvFilter::try_new(&memory).is_ok());

        let postgres = filter_directives(&config("postgres_url: postgresql://localhost/keylink\n"));
        assert!(postgres.starts_with("debug,sqlx=warn,"));
        assert!(EnvFilter::try_new(&postgres).is_ok());
    }

    #[test]
    fn test_store_kind() {
        assert_eq!(store_kind(&config("")), "memory");
        assert_eq!(
            store_kind(&config("postgres_url: postgresql://localhost/keylink\n")),
            "postgres"
        );
    }

    #[test]
    fn test_rotation_names() {
        assert_eq!(rotation("hourly"), Rotation::HOURLY);
        assert_eq!(rotation("daily"), Rotation::DAILY);
        assert_eq!(rotation("weekly"), Rotation::NEVER);
    }
}
