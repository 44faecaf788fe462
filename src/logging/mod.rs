/*!
 * Logging Module
 * Subscriber setup and HTTP request logging
 */
pub mod config;
pub mod middleware;

pub use config::LogConfig;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter, Layer,
};

/// Installs the global subscriber: console plus daily rolling `app.log` and
/// `error.log`. The returned guards flush the background writers and must
/// live until the process exits.
pub fn init(config: &LogConfig) -> Result<Vec<WorkerGuard>, TryInitError> {
    if let Err(e) = std::fs::create_dir_all(&config.directory) {
        eprintln!(
            "Could not create log directory {}: {}",
            config.directory.display(),
            e
        );
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(&config.directory, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(&config.directory, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.is_production() {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
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
            .try_init()?;
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
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
            .try_init()?;
    }

    tracing::info!("Logging initialized for {} environment", config.environment);
    Ok(vec![file_guard, error_guard, console_guard])
}
