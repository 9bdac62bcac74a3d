use std::sync::Arc;

use vulkanalia::vk::{self, KhrSurfaceExtension};
use vulkanalia::window as vk_window;
use winit::window::Window;

use super::error::BootstrapError;
use super::instance::VulkanInstance;

/// Binds the rendering context to a platform window.
#[derive(Debug)]
pub struct VulkanSurface {
    instance: Arc<VulkanInstance>,
    surface: vk::SurfaceKHR,
}

impl VulkanSurface {
    pub(crate) unsafe fn new(
        instance: Arc<VulkanInstance>,
        window: &Window,
    ) -> Result<VulkanSurface, BootstrapError> {
        let surface = vk_window::create_surface(&instance.vk_instance, &window, &window)
            .map_err(BootstrapError::SurfaceCreationFailed)?;

        Ok(VulkanSurface { instance, surface })
    }

    pub(crate) fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        unsafe {
            self.instance
                .vk_instance
                .destroy_surface_khr(self.surface, None);
        }
    }
}
