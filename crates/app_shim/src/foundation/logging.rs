//! Logging setup and structured log channels
//!
//! The shim logs through the `log` facade; `env_logger` is the backend.
//! Output is timestamped to the millisecond and, unless overridden, only
//! enabled in debug builds. Vulkan validation messages go to their own
//! target so they can be filtered (`RUST_LOG=validation=warn`).

use std::fs::File;
use std::str::FromStr;

pub use log::{debug, error, info, trace, warn, LevelFilter};

use crate::config::{LogConfig, LogTarget};

/// Log target used for validation-layer output
pub const VALIDATION_TARGET: &str = "validation";

/// Log a validation message (warning level, `validation` target)
#[macro_export]
macro_rules! validation {
    ($($arg:tt)+) => {
        $crate::foundation::logging::warn!(
            target: $crate::foundation::logging::VALIDATION_TARGET,
            $($arg)+
        )
    };
}

/// Logging initialization errors
#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    /// Level string did not name a level
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    /// Log file could not be opened
    #[error("Failed to open log file: {0}")]
    File(#[from] std::io::Error),

    /// A global logger was already installed
    #[error("Logger already initialized")]
    AlreadyInitialized,
}

/// Initialize the logging system with default settings
pub fn init() {
    let _ = init_with(&LogConfig::default());
}

/// Initialize the logging system from configuration
///
/// Returns `Ok(false)` when logging is disabled for this build, in which case
/// no logger is installed and every log call is a no-op.
pub fn init_with(config: &LogConfig) -> Result<bool, LoggingError> {
    if !config.is_enabled() {
        return Ok(false);
    }

    let level = parse_level(&config.level)?;

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp_millis();

    if let Some(filters) = &config.filters {
        builder.parse_filters(filters);
    }
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    match &config.target {
        LogTarget::Stdout => {
            builder.target(env_logger::Target::Stdout);
        }
        LogTarget::Stderr => {
            builder.target(env_logger::Target::Stderr);
        }
        LogTarget::File(path) => {
            let file = File::create(path)?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }

    builder
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;
    Ok(true)
}

/// Parse a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`)
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    LevelFilter::from_str(level.trim()).map_err(|_| LoggingError::UnknownLevel(level.to_string()))
}
