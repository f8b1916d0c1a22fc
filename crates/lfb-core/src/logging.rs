//! Logging integration for the lfb backend.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-request spans.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{LfbError, LfbResult};
use crate::settings::Settings;

/// File name prefix of the rotating log file.
pub const LOG_FILE_PREFIX: &str = "lfb.log";

/// Number of rotated log files kept on disk.
pub const LOG_FILES_KEPT: usize = 3;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level`. In debug mode a pretty,
/// human-readable console format is used, and when `settings.log_dir` is set
/// the same events also go to a daily-rotating file. In production a
/// structured JSON console format is used.
///
/// Installing a subscriber when one already exists is not an error; the
/// existing subscriber is kept.
///
/// # Errors
///
/// Returns [`LfbError::Configuration`] if the rotating log file cannot be created.
pub fn setup_logging(settings: &Settings) -> LfbResult<()> {
    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if !settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
        return Ok(());
    }

    match settings.log_dir.as_deref() {
        Some(dir) => {
            let appender = rolling_file_appender(dir)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).pretty())
                .with(
                    fmt::layer()
                        .with_writer(appender)
                        .with_ansi(false)
                        .with_target(true),
                )
                .try_init()
                .ok();
        }
        None => {
            fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .try_init()
                .ok();
        }
    }

    Ok(())
}

/// Builds the daily-rotating file appender used in debug mode.
///
/// # Errors
///
/// Returns [`LfbError::Configuration`] if the directory or file cannot be created.
pub fn rolling_file_appender(dir: &Path) -> LfbResult<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(LOG_FILES_KEPT)
        .build(dir)
        .map_err(|e| {
            LfbError::Configuration(format!(
                "Failed to create log file in '{}': {e}",
                dir.display()
            ))
        })
}

/// Creates a tracing span for an HTTP request.
///
/// # Examples
///
/// ```
/// use lfb_core::logging::request_span;
///
/// let span = request_span("abc-123");
/// let _guard = span.enter();
/// tracing::info!("handling request");
/// ```
pub fn request_span(request_id: &str) -> tracing::Span {
    tracing::info_span!("request", id = request_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_file_appender_in_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(rolling_file_appender(dir.path()).is_ok());
    }

    #[test]
    fn test_setup_logging_with_log_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            log_dir: Some(dir.path().to_path_buf()),
            log_level: "debug".to_string(),
            ..Settings::default()
        };
        assert!(setup_logging(&settings).is_ok());
        assert!(setup_logging(&settings).is_ok());
    }

    #[test]
    fn test_setup_logging_bad_filter_falls_back() {
        let settings = Settings {
            debug: false,
            log_level: "[[not a filter".to_string(),
            ..Settings::default()
        };
        assert!(setup_logging(&settings).is_ok());
    }

    #[test]
    fn test_request_span_name() {
        let span = request_span("req-1");
        let _guard = span.enter();
        tracing::info!("inside span");
    }
}
