use std::collections::HashSet;
use std::sync::Arc;

use log::*;
use thiserror::Error;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::KhrSurfaceExtension;

use super::constants;
use super::error::BootstrapError;
use super::instance::VulkanInstance;
use super::surface::VulkanSurface;
use super::swapchain::SwapchainSupportDetails;

#[derive(Debug, Error)]
#[error("Missing {0}.")]
pub struct SuitabilityError(pub &'static str);

/// Queue family indices resolved against a physical device and surface.
///
/// The same family may serve both roles.
#[derive(Copy, Clone, Debug, Default)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    /// The distinct families among the resolved indices, graphics first.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = self
            .graphics
            .iter()
            .chain(self.present.iter())
            .copied()
            .collect::<Vec<_>>();
        families.dedup();
        families
    }

    unsafe fn query(
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<QueueFamilyIndices, vk::ErrorCode> {
        let properties = instance.get_physical_device_queue_family_properties(physical_device);

        let mut indices = QueueFamilyIndices::default();
        for (index, family) in properties.iter().enumerate() {
            let index = index as u32;
            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                indices.graphics = Some(index);
            }
            if instance.get_physical_device_surface_support_khr(physical_device, index, surface)? {
                indices.present = Some(index);
            }
            if indices.is_complete() {
                break;
            }
        }

        Ok(indices)
    }
}

/// One enumerated physical device with everything the selection
/// predicate needs. Discarded once a winner is chosen.
#[derive(Debug)]
struct DeviceCandidate {
    physical_device: vk::PhysicalDevice,
    name: String,
    indices: QueueFamilyIndices,
    support: SwapchainSupportDetails,
    extensions_supported: bool,
}

impl DeviceCandidate {
    // Predicates are evaluated in this order and short-circuited.
    fn suitability(&self) -> Result<(), SuitabilityError> {
        if !self.indices.is_complete() {
            return Err(SuitabilityError("required queue families"));
        }
        if !self.extensions_supported {
            return Err(SuitabilityError("required device extensions"));
        }
        if !self.support.is_adequate() {
            return Err(SuitabilityError("adequate swapchain support"));
        }
        Ok(())
    }
}

/// First-fit over driver enumeration order; ties are broken by that
/// order, which is not guaranteed stable across runs.
fn select_device(candidates: Vec<DeviceCandidate>) -> Result<DeviceCandidate, BootstrapError> {
    for candidate in candidates {
        match candidate.suitability() {
            Ok(()) => {
                info!("Selected physical device (`{}`).", candidate.name);
                return Ok(candidate);
            }
            Err(error) => {
                warn!("Skipping physical device (`{}`): {}", candidate.name, error);
            }
        }
    }

    Err(BootstrapError::NoSuitableDevice)
}

unsafe fn enumerate_candidates(
    instance: &Instance,
    surface: vk::SurfaceKHR,
) -> Result<Vec<DeviceCandidate>, BootstrapError> {
    let mut candidates = Vec::new();
    for physical_device in instance.enumerate_physical_devices()? {
        let properties = instance.get_physical_device_properties(physical_device);
        candidates.push(DeviceCandidate {
            physical_device,
            name: properties.device_name.to_string(),
            indices: QueueFamilyIndices::query(instance, physical_device, surface)?,
            support: SwapchainSupportDetails::query(instance, physical_device, surface)?,
            extensions_supported: check_device_extensions(instance, physical_device)?,
        });
    }

    Ok(candidates)
}

unsafe fn check_device_extensions(
    instance: &Instance,
    physical_device: vk::PhysicalDevice,
) -> Result<bool, vk::ErrorCode> {
    let extensions = instance
        .enumerate_device_extension_properties(physical_device, None)?
        .iter()
        .map(|e| e.extension_name)
        .collect::<HashSet<_>>();

    Ok(constants::DEVICE_EXTENSIONS
        .iter()
        .all(|e| extensions.contains(e)))
}

/// The selected physical device and the logical device built on it.
#[derive(Debug)]
pub struct VulkanDevice {
    _instance: Arc<VulkanInstance>,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) graphics_family: u32,
    pub(crate) present_family: u32,
    pub(crate) swapchain_support: SwapchainSupportDetails,
    pub(crate) vk_device: Device,
    pub(crate) graphics_queue: vk::Queue,
    pub(crate) present_queue: vk::Queue,
}

impl VulkanDevice {
    pub(crate) unsafe fn new(
        instance: Arc<VulkanInstance>,
        surface: &VulkanSurface,
    ) -> Result<VulkanDevice, BootstrapError> {
        let candidates = enumerate_candidates(&instance.vk_instance, surface.handle())?;
        let winner = select_device(candidates)?;

        let (graphics_family, present_family) = match (winner.indices.graphics, winner.indices.present)
        {
            (Some(graphics), Some(present)) => (graphics, present),
            _ => return Err(BootstrapError::NoSuitableDevice),
        };

        // One queue per distinct family, at maximum priority.
        let queue_priorities = &[1.0];
        let queue_infos = winner
            .indices
            .unique_families()
            .into_iter()
            .map(|index| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(index)
                    .queue_priorities(queue_priorities)
            })
            .collect::<Vec<_>>();

        // Older drivers require device-level layer enablement; modern
        // drivers ignore the list.
        let layers = if instance.diagnostics_enabled {
            vec![constants::VALIDATION_LAYER.as_ptr()]
        } else {
            vec![]
        };

        let mut extensions = constants::DEVICE_EXTENSIONS
            .iter()
            .map(|e| e.as_ptr())
            .collect::<Vec<_>>();

        // Required by Vulkan SDK on macOS since 1.3.216.
        if cfg!(target_os = "macos")
            && instance.entry.version()? >= constants::PORTABILITY_MACOS_VERSION
        {
            extensions.push(vk::KHR_PORTABILITY_SUBSET_EXTENSION.name.as_ptr());
        }

        let features = vk::PhysicalDeviceFeatures::builder();

        let info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions)
            .enabled_features(&features);

        let vk_device = instance
            .vk_instance
            .create_device(winner.physical_device, &info, None)
            .map_err(BootstrapError::DeviceCreationFailed)?;

        // These may alias the same underlying queue.
        let graphics_queue = vk_device.get_device_queue(graphics_family, 0);
        let present_queue = vk_device.get_device_queue(present_family, 0);

        Ok(VulkanDevice {
            _instance: instance,
            physical_device: winner.physical_device,
            graphics_family,
            present_family,
            swapchain_support: winner.support,
            vk_device,
            graphics_queue,
            present_queue,
        })
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            self.vk_device.destroy_device(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulkanalia::vk::Handle;

    fn adequate_support() -> SwapchainSupportDetails {
        SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        }
    }

    fn candidate(name: &str) -> DeviceCandidate {
        DeviceCandidate {
            physical_device: vk::PhysicalDevice::null(),
            name: name.to_string(),
            indices: QueueFamilyIndices {
                graphics: Some(0),
                present: Some(0),
            },
            support: adequate_support(),
            extensions_supported: true,
        }
    }

    #[test]
    fn completeness_requires_both_roles() {
        let mut indices = QueueFamilyIndices::default();
        assert!(!indices.is_complete());
        indices.graphics = Some(1);
        assert!(!indices.is_complete());
        indices.present = Some(1);
        assert!(indices.is_complete());
    }

    #[test]
    fn shared_family_is_deduplicated() {
        let indices = QueueFamilyIndices {
            graphics: Some(2),
            present: Some(2),
        };
        assert_eq!(indices.unique_families(), vec![2]);

        let indices = QueueFamilyIndices {
            graphics: Some(0),
            present: Some(1),
        };
        assert_eq!(indices.unique_families(), vec![0, 1]);
    }

    #[test]
    fn selection_is_first_fit() {
        let first = candidate("first");
        let second = candidate("second");
        let selected = select_device(vec![first, second]).unwrap();
        assert_eq!(selected.name, "first");
    }

    #[test]
    fn failing_extension_check_skips_to_next_candidate() {
        let mut first = candidate("first");
        first.extensions_supported = false;
        let second = candidate("second");
        let selected = select_device(vec![first, second]).unwrap();
        assert_eq!(selected.name, "second");
    }

    #[test]
    fn no_candidate_reports_no_suitable_device() {
        let mut only = candidate("only");
        only.indices.present = None;
        let result = select_device(vec![only]);
        assert!(matches!(result, Err(BootstrapError::NoSuitableDevice)));

        let result = select_device(Vec::new());
        assert!(matches!(result, Err(BootstrapError::NoSuitableDevice)));
    }

    #[test]
    fn queue_predicate_is_checked_before_extensions() {
        let mut both_fail = candidate("both");
        both_fail.indices.graphics = None;
        both_fail.extensions_supported = false;
        let error = both_fail.suitability().unwrap_err();
        assert_eq!(error.0, "required queue families");
    }

    #[test]
    fn empty_format_or_present_mode_set_is_inadequate() {
        let mut no_formats = candidate("no formats");
        no_formats.support.formats.clear();
        assert!(no_formats.suitability().is_err());

        let mut no_modes = candidate("no modes");
        no_modes.support.present_modes.clear();
        assert!(no_modes.suitability().is_err());
    }
}
