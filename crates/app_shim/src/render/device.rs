//! Physical device scoring and logical device creation

use ash::{vk, Device, Instance};

use super::instance::fixed_str;
use super::{VulkanError, VulkanResult};

/// Coarse GPU category, the dominant term of the score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Dedicated GPU
    Discrete,
    /// GPU exposed through a hypervisor
    Virtual,
    /// GPU sharing the CPU package
    Integrated,
    /// CPU rasterizers and anything unrecognized
    Other,
}

impl DeviceKind {
    /// Map a Vulkan device type
    pub fn from_vk(device_type: vk::PhysicalDeviceType) -> Self {
        match device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => Self::Discrete,
            vk::PhysicalDeviceType::VIRTUAL_GPU => Self::Virtual,
            vk::PhysicalDeviceType::INTEGRATED_GPU => Self::Integrated,
            _ => Self::Other,
        }
    }

    fn tier(self) -> u32 {
        match self {
            Self::Discrete => 300,
            Self::Virtual => 200,
            Self::Integrated => 100,
            Self::Other => 0,
        }
    }
}

/// What the selector knows about one enumerated device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCandidate {
    /// Driver-reported device name
    pub name: String,
    /// Device category
    pub kind: DeviceKind,
    /// Geometry shader support
    pub geometry_shader: bool,
    /// Tessellation shader support
    pub tessellation_shader: bool,
    /// Multiple viewport support
    pub multi_viewport: bool,
}

impl DeviceCandidate {
    /// Build a candidate from queried properties and features
    pub fn from_properties(
        properties: &vk::PhysicalDeviceProperties,
        features: &vk::PhysicalDeviceFeatures,
    ) -> Self {
        Self {
            name: fixed_str(&properties.device_name),
            kind: DeviceKind::from_vk(properties.device_type),
            geometry_shader: features.geometry_shader == vk::TRUE,
            tessellation_shader: features.tessellation_shader == vk::TRUE,
            multi_viewport: features.multi_viewport == vk::TRUE,
        }
    }

    /// Tier plus feature bonuses; no feature set outweighs a tier
    pub fn score(&self) -> u32 {
        let mut score = self.kind.tier();
        if self.geometry_shader {
            score += 4;
        }
        if self.tessellation_shader {
            score += 4;
        }
        if self.multi_viewport {
            score += 1;
        }
        score
    }
}

/// Index of the highest-scoring candidate; ties keep the earliest
pub fn select_best(candidates: &[DeviceCandidate]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = candidate.score();
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

/// The selected physical device
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Scored description
    pub candidate: DeviceCandidate,
    /// Index of the graphics queue family
    pub graphics_family: u32,
}

impl PhysicalDeviceInfo {
    /// Enumerate, score and pick one device
    pub fn select(instance: &Instance) -> VulkanResult<Self> {
        let devices = unsafe { instance.enumerate_physical_devices().map_err(VulkanError::Api)? };
        if devices.is_empty() {
            return Err(VulkanError::NoPhysicalDevice);
        }

        let candidates: Vec<DeviceCandidate> = devices
            .iter()
            .map(|&device| {
                let properties = unsafe { instance.get_physical_device_properties(device) };
                let features = unsafe { instance.get_physical_device_features(device) };
                DeviceCandidate::from_properties(&properties, &features)
            })
            .collect();
        for candidate in &candidates {
            log::debug!("GPU candidate '{}' ({:?}) scores {}", candidate.name, candidate.kind, candidate.score());
        }

        let index = select_best(&candidates).ok_or(VulkanError::NoPhysicalDevice)?;
        let device = devices[index];
        let graphics_family = Self::find_graphics_family(instance, device)?;

        Ok(Self {
            device,
            candidate: candidates[index].clone(),
            graphics_family,
        })
    }

    fn find_graphics_family(instance: &Instance, device: vk::PhysicalDevice) -> VulkanResult<u32> {
        let families = unsafe { instance.get_physical_device_queue_family_properties(device) };
        families
            .iter()
            .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            .and_then(|index| u32::try_from(index).ok())
            .ok_or_else(|| VulkanError::InitializationFailed("No graphics queue family found".to_string()))
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Index of the graphics queue family
    pub graphics_family: u32,
}

impl LogicalDevice {
    /// Create a device with one graphics queue
    pub fn new(instance: &Instance, physical: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let priorities = [1.0_f32];
        let queue_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(physical.graphics_family)
            .queue_priorities(&priorities)
            .build();
        let queue_infos = [queue_info];

        let create_info = vk::DeviceCreateInfo::builder().queue_create_infos(&queue_infos);

        let device = unsafe {
            instance
                .create_device(physical.device, &create_info, None)
                .map_err(VulkanError::Api)?
        };
        let graphics_queue = unsafe { device.get_device_queue(physical.graphics_family, 0) };

        Ok(Self {
            device,
            graphics_queue,
            graphics_family: physical.graphics_family,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, kind: DeviceKind, features: (bool, bool, bool)) -> DeviceCandidate {
        DeviceCandidate {
            name: name.to_string(),
            kind,
            geometry_shader: features.0,
            tessellation_shader: features.1,
            multi_viewport: features.2,
        }
    }

    #[test]
    fn test_scores() {
        assert_eq!(candidate("d", DeviceKind::Discrete, (false, false, false)).score(), 300);
        assert_eq!(candidate("i", DeviceKind::Integrated, (true, true, true)).score(), 109);
        assert_eq!(candidate("v", DeviceKind::Virtual, (true, false, false)).score(), 204);
        assert_eq!(candidate("c", DeviceKind::Other, (false, false, true)).score(), 1);
    }

    #[test]
    fn test_discrete_beats_featureful_integrated() {
        let candidates = [
            candidate("igpu", DeviceKind::Integrated, (true, true, true)),
            candidate("dgpu", DeviceKind::Discrete, (false, false, false)),
        ];
        assert_eq!(select_best(&candidates), Some(1));
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let candidates = [
            candidate("first", DeviceKind::Discrete, (true, false, false)),
            candidate("second", DeviceKind::Discrete, (false, true, false)),
        ];
        assert_eq!(select_best(&candidates), Some(0));
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_device_kind_mapping() {
        assert_eq!(DeviceKind::from_vk(vk::PhysicalDeviceType::DISCRETE_GPU), DeviceKind::Discrete);
        assert_eq!(DeviceKind::from_vk(vk::PhysicalDeviceType::CPU), DeviceKind::Other);
    }

    #[test]
    fn test_candidate_from_properties() {
        let mut properties = vk::PhysicalDeviceProperties::default();
        properties.device_type = vk::PhysicalDeviceType::INTEGRATED_GPU;
        for (slot, byte) in properties.device_name.iter_mut().zip(b"Iris") {
            *slot = *byte as std::os::raw::c_char;
        }
        let features = vk::PhysicalDeviceFeatures {
            geometry_shader: vk::TRUE,
            ..Default::default()
        };

        let candidate = DeviceCandidate::from_properties(&properties, &features);
        assert_eq!(candidate.name, "Iris");
        assert_eq!(candidate.kind, DeviceKind::Integrated);
        assert!(candidate.geometry_shader && !candidate.multi_viewport);
        assert_eq!(candidate.score(), 104);
    }
}
