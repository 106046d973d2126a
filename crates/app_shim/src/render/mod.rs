//! GPU bootstrap
//!
//! One-shot Vulkan setup: load the loader, create an instance with a fixed
//! extension set, pick the best physical device and open a logical device
//! with a single graphics queue. There is no render loop and no device-loss
//! handling; the context lives until the framework drops it.

mod device;
mod instance;

pub use device::{DeviceCandidate, DeviceKind, LogicalDevice, PhysicalDeviceInfo};
pub use instance::{VulkanInstance, VALIDATION_LAYER};

use ash::vk;
use thiserror::Error;

use crate::config::RendererConfig;

/// Vulkan bootstrap errors
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Vulkan loader or instance setup failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Validation was requested but the layer is not installed
    #[error("Validation layer {0} is not available")]
    MissingValidationLayer(String),

    /// The instance reported no physical devices
    #[error("No Vulkan physical device found")]
    NoPhysicalDevice,

    /// A name passed to Vulkan contained an interior NUL
    #[error("Invalid name for Vulkan: {0:?}")]
    InvalidName(String),
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Bootstrapped GPU: instance, selected device and logical device
///
/// Fields drop in declaration order, so the device goes before the instance.
pub struct GpuContext {
    /// Logical device and its graphics queue
    pub device: LogicalDevice,
    /// The selected physical device
    pub physical: PhysicalDeviceInfo,
    /// Vulkan instance and debug messenger
    pub instance: VulkanInstance,
}

impl GpuContext {
    /// Run the bootstrap sequence
    pub fn bootstrap(config: &RendererConfig) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(config)?;
        let physical = PhysicalDeviceInfo::select(&instance.instance)?;
        let device = LogicalDevice::new(&instance.instance, &physical)?;

        log::info!(
            "GPU ready: {} ({:?}, score {}), graphics queue family {}",
            physical.candidate.name,
            physical.candidate.kind,
            physical.candidate.score(),
            physical.graphics_family,
        );
        Ok(Self {
            device,
            physical,
            instance,
        })
    }

    /// Name of the selected GPU
    pub fn device_name(&self) -> &str {
        &self.physical.candidate.name
    }

    /// Whether the validation debug messenger is installed
    pub fn validation_active(&self) -> bool {
        self.instance.debug_messenger.is_some()
    }
}
