/*!
 * Logging Module
 * Subscriber setup and per-request logging
 */
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Config;

const LOG_DIR: &str = "logs";

/// Directive used when `RUST_LOG` is not set.
fn default_directive(config: &Config) -> String {
    let level = config.log_level.clone().unwrap_or_else(|| {
        if config.is_production() {
            "info".to_string()
        } else {
            "debug".to_string()
        }
    });
    format!("portfolio_api={level},tower_http=debug,axum=debug")
}

/// Initialize the logging system.
///
/// The returned guards flush the background writers; hold them until exit.
pub fn init(config: &Config) -> Vec<WorkerGuard> {
    std::fs::create_dir_all(LOG_DIR).ok();

    let (file_writer, file_guard) = non_blocking(rolling::daily(LOG_DIR, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(LOG_DIR, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.is_production() {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_target(true)
            .with_ansi(false)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    }

    tracing::info!("Logging initialized for {} environment", config.environment);
    vec![file_guard, error_guard, console_guard]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_follows_environment() {
        let dev = Config::default();
        assert_eq!(
            default_directive(&dev),
            "portfolio_api=debug,tower_http=debug,axum=debug"
        );

        let prod = Config {
            environment: "production".to_string(),
            ..Config::default()
        };
        assert!(default_directive(&prod).starts_with("portfolio_api=info"));

        let explicit = Config {
            log_level: Some("warn".to_string()),
            ..Config::default()
        };
        assert!(default_directive(&explicit).starts_with("portfolio_api=warn"));
    }
}
