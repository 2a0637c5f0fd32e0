use std::path::Path;

use tracing::{Span, Subscriber, level_filters::LevelFilter};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt};

use crate::config::{AppConfig, Env};

/// Value of the `service` field carried by every record.
pub const SERVICE_NAME: &str = "user-accounts-api";

/// Directory the file sinks write to, relative to the working directory.
pub const LOG_DIR: &str = "logs";

/// Flushes the file sinks when dropped. Hold it for the lifetime of the process.
pub struct LogGuards {
    _error: WorkerGuard,
    _combined: WorkerGuard,
}

/// env_filter
///
/// `RUST_LOG` if set, otherwise `LOG_LEVEL` for this crate and `info` for `tower_http`.
pub fn env_filter(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("user_accounts_api={},tower_http=info", config.log_level).into()
    })
}

/// subscriber
///
/// Builds the process subscriber:
/// - `combined.log`: every record that passes the filter, as JSON lines.
/// - `error.log`: ERROR records only, as JSON lines.
/// - stdout: a pretty console layer, outside production only.
///
/// Files are appended to and never rotated.
pub fn subscriber(
    config: &AppConfig,
    log_dir: impl AsRef<Path>,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogGuards), InitError> {
    let (error_writer, error_guard) = tracing_appender::non_blocking(file_appender(
        log_dir.as_ref(),
        "error.log",
    )?);
    let (combined_writer, combined_guard) = tracing_appender::non_blocking(file_appender(
        log_dir.as_ref(),
        "combined.log",
    )?);

    let console = (config.env == Env::Local).then(|| fmt::layer().pretty());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(combined_writer),
        )
        .with(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(error_writer)
                .with_filter(LevelFilter::ERROR),
        )
        .with(console);

    Ok((
        subscriber,
        LogGuards {
            _error: error_guard,
            _combined: combined_guard,
        },
    ))
}

fn file_appender(dir: &Path, file_name: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
}

/// root_span
///
/// Span that tags records with `service`. `main` enters it for startup events and the
/// per-request spans carry the same field.
pub fn root_span() -> Span {
    tracing::info_span!("app", service = SERVICE_NAME)
}
