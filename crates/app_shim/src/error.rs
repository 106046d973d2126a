//! Framework error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::foundation::logging::LoggingError;
use crate::platform::PlatformError;
use crate::render::VulkanError;
use crate::window::{RegistryError, WindowId};

/// Errors surfaced by [`crate::Framework`]
#[derive(Error, Debug)]
pub enum FrameworkError {
    /// A caller-supplied argument was rejected
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No live window has this handle
    #[error("Invalid window handle: {0}")]
    InvalidHandle(WindowId),

    /// Every window handle has been issued; the window opened without one
    #[error("Window handle space exhausted; window opened without a handle")]
    HandleSpaceExhausted,

    /// Registry invariant violated
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Window system failure
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// GPU bootstrap failure
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] VulkanError),

    /// Configuration failure
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging setup failure
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// The event router stopped before answering
    #[error("Event router is not running")]
    RouterUnavailable,

    /// A blocking framework call was made from the event router thread
    #[error("Blocking framework call from the event router thread")]
    ReentrantCall,

    /// The framework has been shut down
    #[error("Framework has been shut down")]
    ShutDown,
}

impl FrameworkError {
    /// Whether this error belongs to the fatal (OS/GPU) category
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Platform(_)
                | Self::Vulkan(_)
                | Self::Registry(RegistryError::DuplicateId(_) | RegistryError::DuplicateNative(_))
        )
    }
}

/// Result type for framework operations
pub type FrameworkResult<T> = Result<T, FrameworkError>;
