//! Vulkan instance creation

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::Surface;
use ash::{vk, Entry, Instance};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use super::{VulkanError, VulkanResult};
use crate::config::RendererConfig;
use crate::foundation::logging::VALIDATION_TARGET;

/// Khronos validation layer name
pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

const ENGINE_NAME: &str = "app_shim";

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    /// Debug utilities extension, when validating
    pub debug_utils: Option<DebugUtils>,
    /// Debug messenger handle, when validating
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanInstance {
    /// Load Vulkan and create an instance
    pub fn new(config: &RendererConfig) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to load Vulkan: {e}")))?;

        let validate = config.validation_enabled();
        if validate {
            ensure_layer_available(&entry, VALIDATION_LAYER)?;
        }

        let app_name = c_string(&config.application_name)?;
        let engine_name = c_string(ENGINE_NAME)?;
        let (major, minor, patch) = config.application_version;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let extensions: Vec<*const c_char> = instance_extensions(validate)
            .iter()
            .map(|name| name.as_ptr())
            .collect();

        let layer_names = if validate {
            vec![c_string(VALIDATION_LAYER)?]
        } else {
            Vec::new()
        };
        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_ptrs);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        let (debug_utils, debug_messenger) = if validate {
            let debug_utils = DebugUtils::new(&entry, &instance);
            match setup_debug_messenger(&debug_utils) {
                Ok(messenger) => (Some(debug_utils), Some(messenger)),
                Err(error) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(error);
                }
            }
        } else {
            (None, None)
        };

        log::debug!(
            "Vulkan instance created ({} extensions, validation {})",
            extensions.len(),
            if validate { "on" } else { "off" }
        );
        Ok(Self {
            entry,
            instance,
            debug_utils,
            debug_messenger,
        })
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils, self.debug_messenger) {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// The fixed instance extension set for this platform
pub fn instance_extensions(validate: bool) -> Vec<&'static CStr> {
    let mut extensions = vec![Surface::name()];
    extensions.extend(platform_surface_extensions());
    if validate {
        extensions.push(DebugUtils::name());
    }
    extensions
}

#[cfg(target_os = "windows")]
fn platform_surface_extensions() -> Vec<&'static CStr> {
    vec![ash::extensions::khr::Win32Surface::name()]
}

#[cfg(target_os = "macos")]
fn platform_surface_extensions() -> Vec<&'static CStr> {
    vec![ash::extensions::ext::MetalSurface::name()]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn platform_surface_extensions() -> Vec<&'static CStr> {
    vec![
        ash::extensions::khr::XlibSurface::name(),
        ash::extensions::khr::WaylandSurface::name(),
    ]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn platform_surface_extensions() -> Vec<&'static CStr> {
    Vec::new()
}

fn ensure_layer_available(entry: &Entry, layer: &str) -> VulkanResult<()> {
    #[allow(unused_unsafe)]
    let layers = unsafe { entry.enumerate_instance_layer_properties() }.map_err(VulkanError::Api)?;

    let found = layers
        .iter()
        .any(|properties| fixed_str(&properties.layer_name) == layer);
    if found {
        Ok(())
    } else {
        log::error!("{layer} requested but not installed");
        Err(VulkanError::MissingValidationLayer(layer.to_string()))
    }
}

fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback));

    unsafe {
        debug_utils
            .create_debug_utils_messenger(&create_info, None)
            .map_err(VulkanError::Api)
    }
}

/// Routes validation-layer messages to the `validation` log target
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!(target: VALIDATION_TARGET, "{message_type:?} - {message}");
    } else {
        crate::validation!("{message_type:?} - {message}");
    }

    vk::FALSE
}

fn c_string(name: &str) -> VulkanResult<CString> {
    CString::new(name).map_err(|_| VulkanError::InvalidName(name.to_string()))
}

/// Decode a fixed-size, NUL-terminated Vulkan name array
pub(crate) fn fixed_str(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_str_stops_at_nul() {
        let mut raw = [0 as c_char; 16];
        for (slot, byte) in raw.iter_mut().zip(b"GeForce") {
            *slot = *byte as c_char;
        }
        assert_eq!(fixed_str(&raw), "GeForce");
        assert_eq!(fixed_str(&[0; 4]), "");
    }

    #[test]
    fn test_extension_set() {
        let plain = instance_extensions(false);
        assert_eq!(plain[0], Surface::name());
        assert!(!plain.contains(&DebugUtils::name()));

        let validating = instance_extensions(true);
        assert_eq!(validating.last(), Some(&DebugUtils::name()));
        assert_eq!(validating.len(), plain.len() + 1);
    }

    #[test]
    fn test_interior_nul_rejected() {
        assert!(matches!(c_string("bad\0name"), Err(VulkanError::InvalidName(_))));
    }
}
