use std::collections::HashSet;

use log::*;
use vulkanalia::loader::{LibloadingLoader, LIBRARY};
use vulkanalia::prelude::v1_0::*;
use vulkanalia::window as vk_window;
use winit::window::Window;

use super::constants;
use super::debug;
use super::error::BootstrapError;

/// The root connection to the Vulkan driver.
///
/// Owns the dynamically loaded entry points and the instance handle.
/// Everything else in the bootstrap chain is created through this and
/// must be released before it drops.
#[derive(Debug)]
pub struct VulkanInstance {
    pub(crate) entry: Entry,
    pub(crate) vk_instance: Instance,
    pub(crate) diagnostics_enabled: bool,
}

impl VulkanInstance {
    pub(crate) unsafe fn new(
        window: &Window,
        diagnostics_enabled: bool,
    ) -> Result<VulkanInstance, BootstrapError> {
        let loader = LibloadingLoader::new(LIBRARY)
            .map_err(|b| BootstrapError::DriverUnavailable(b.to_string()))?;
        let entry =
            Entry::new(loader).map_err(|b| BootstrapError::DriverUnavailable(b.to_string()))?;

        // Application Info
        let application_info = vk::ApplicationInfo::builder()
            .application_name(b"Borealis\0")
            .application_version(vk::make_version(1, 0, 0))
            .engine_name(b"Borealis\0")
            .engine_version(vk::make_version(1, 0, 0))
            .api_version(vk::make_version(1, 0, 0));

        // Layers
        let available_layers = entry
            .enumerate_instance_layer_properties()?
            .iter()
            .map(|l| l.layer_name)
            .collect::<HashSet<_>>();

        if diagnostics_enabled && !available_layers.contains(&constants::VALIDATION_LAYER) {
            return Err(BootstrapError::LayerUnavailable(
                constants::VALIDATION_LAYER.to_string(),
            ));
        }

        let layers = if diagnostics_enabled {
            vec![constants::VALIDATION_LAYER.as_ptr()]
        } else {
            Vec::new()
        };

        // Extensions
        let mut required = vk_window::get_required_instance_extensions(window)
            .iter()
            .map(|e| **e)
            .collect::<Vec<vk::ExtensionName>>();

        // Required by Vulkan SDK on macOS since 1.3.216.
        let flags = if cfg!(target_os = "macos")
            && entry.version()? >= constants::PORTABILITY_MACOS_VERSION
        {
            info!("Enabling extensions for macOS portability.");
            required.push(vk::KHR_GET_PHYSICAL_DEVICE_PROPERTIES2_EXTENSION.name);
            required.push(vk::KHR_PORTABILITY_ENUMERATION_EXTENSION.name);
            vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
        } else {
            vk::InstanceCreateFlags::empty()
        };

        if diagnostics_enabled {
            required.push(vk::EXT_DEBUG_UTILS_EXTENSION.name);
        }

        // Every required extension is checked up front so a missing one
        // is reported by name instead of surfacing as a failed create.
        let available_extensions = entry
            .enumerate_instance_extension_properties(None)?
            .iter()
            .map(|e| e.extension_name)
            .collect::<HashSet<_>>();

        for extension in &required {
            if !available_extensions.contains(extension) {
                return Err(BootstrapError::ExtensionUnavailable(extension.to_string()));
            }
        }

        let extensions = required.iter().map(|e| e.as_ptr()).collect::<Vec<_>>();

        // Create
        let mut info = vk::InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions)
            .flags(flags);

        // Chaining the messenger info here covers instance creation and
        // destruction, which the hook itself cannot observe.
        let mut debug_info = debug::messenger_create_info();
        if diagnostics_enabled {
            info = info.push_next(&mut debug_info);
        }

        let vk_instance = entry.create_instance(&info, None)?;

        Ok(VulkanInstance {
            entry,
            vk_instance,
            diagnostics_enabled,
        })
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            self.vk_instance.destroy_instance(None);
        }
    }
}
