//! # Framework Configuration
//!
//! Configuration for the shim's subsystems: logging, the event router, input
//! buffering, renderer bootstrap and the fatal-error policy. Every section
//! has defaults, so a config file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::{Config, ConfigError};

/// Upper bound for the text-input buffer
pub const MAX_TEXT_BUFFER_CAPACITY: usize = 4096;

/// What to do when an OS or GPU call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalPolicy {
    /// Log a diagnostic and terminate the process
    Terminate,
    /// Return the error to the caller
    Propagate,
}

impl Default for FatalPolicy {
    fn default() -> Self {
        Self::Terminate
    }
}

/// Where log output is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
    /// Append to a file (created or truncated at init)
    File(PathBuf),
}

impl Default for LogTarget {
    fn default() -> Self {
        Self::Stdout
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level for the shim
    pub level: String,
    /// Extra `env_logger` filter directives (e.g. `app_shim::router=trace`)
    pub filters: Option<String>,
    /// Force logging on or off; `None` enables it in debug builds only
    pub enabled: Option<bool>,
    /// Output destination
    pub target: LogTarget,
}

impl LogConfig {
    /// Create a new logging configuration
    pub fn new() -> Self {
        Self {
            level: "info".to_string(),
            filters: None,
            enabled: None,
            target: LogTarget::Stdout,
        }
    }

    /// Set log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set output target
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Force logging on or off regardless of build type
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Whether logging is active for this build
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(cfg!(debug_assertions))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Event Router Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Longest time the router blocks in the native pump before checking commands
    pub poll_interval_ms: u64,
}

impl RouterConfig {
    /// Pump timeout as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 4 }
    }
}

/// # Input Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum number of characters held by the text-input buffer
    pub text_buffer_capacity: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            text_buffer_capacity: 256,
        }
    }
}

/// # Renderer Bootstrap Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Application version (major, minor, patch)
    pub application_version: (u32, u32, u32),
    /// Whether to enable Vulkan validation layers; `None` follows the build type
    pub enable_validation: Option<bool>,
}

impl RendererConfig {
    /// Create a new renderer configuration
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            application_version: (1, 0, 0),
            enable_validation: None,
        }
    }

    /// Enable or disable validation layers
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = Some(enabled);
        self
    }

    /// Whether validation is requested; always off in release builds
    pub fn validation_enabled(&self) -> bool {
        cfg!(debug_assertions) && self.enable_validation.unwrap_or(true)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new("App Shim Application")
    }
}

/// # Framework Configuration
///
/// Top-level configuration handed to [`crate::Framework`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Application name, used in logs and as the default renderer name
    pub application_name: String,
    /// Handling of OS/GPU failures
    pub fatal_policy: FatalPolicy,
    /// Logging settings
    pub logging: LogConfig,
    /// Event router settings
    pub router: RouterConfig,
    /// Input buffering settings
    pub input: InputConfig,
    /// Renderer bootstrap settings
    pub renderer: RendererConfig,
}

impl FrameworkConfig {
    /// Create a configuration for the named application
    pub fn new(app_name: impl Into<String>) -> Self {
        let application_name = app_name.into();
        Self {
            renderer: RendererConfig::new(application_name.clone()),
            application_name,
            logging: LogConfig::default(),
            router: RouterConfig::default(),
            input: InputConfig::default(),
            fatal_policy: FatalPolicy::default(),
        }
    }

    /// Set logging configuration
    pub fn with_logging(mut self, logging: LogConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Set the router pump timeout
    pub fn with_poll_interval_ms(mut self, interval: u64) -> Self {
        self.router.poll_interval_ms = interval;
        self
    }

    /// Set the text-input buffer capacity
    pub fn with_text_buffer_capacity(mut self, capacity: usize) -> Self {
        self.input.text_buffer_capacity = capacity;
        self
    }

    /// Set renderer configuration
    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    /// Set the fatal-error policy
    pub fn with_fatal_policy(mut self, policy: FatalPolicy) -> Self {
        self.fatal_policy = policy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid("Application name cannot be empty".to_string()));
        }

        if self.router.poll_interval_ms == 0 || self.router.poll_interval_ms > 1000 {
            return Err(ConfigError::Invalid(format!(
                "Poll interval must be within 1..=1000 ms, got {}",
                self.router.poll_interval_ms
            )));
        }

        if self.input.text_buffer_capacity == 0
            || self.input.text_buffer_capacity > MAX_TEXT_BUFFER_CAPACITY
        {
            return Err(ConfigError::Invalid(format!(
                "Text buffer capacity must be within 1..={MAX_TEXT_BUFFER_CAPACITY}, got {}",
                self.input.text_buffer_capacity
            )));
        }

        crate::foundation::logging::parse_level(&self.logging.level)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self::new("App Shim Application")
    }
}

impl Config for FrameworkConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FrameworkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let config = FrameworkConfig::default().with_poll_interval_ms(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let config =
            FrameworkConfig::default().with_logging(LogConfig::default().with_level("chatty"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_renderer_name_follows_application() {
        let config = FrameworkConfig::new("Asteroids");
        assert_eq!(config.renderer.application_name, "Asteroids");
    }

    #[test]
    fn test_validation_never_in_release() {
        let renderer = RendererConfig::default().with_validation(true);
        assert_eq!(renderer.validation_enabled(), cfg!(debug_assertions));
    }
}
