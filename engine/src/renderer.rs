use anyhow::Result;
use winit::window::Window;

use crate::vulkan::VulkanContext;

/// Facade over the bootstrapped Vulkan context. A frame-rendering
/// stage would consume the handles exposed by [`VulkanContext`].
pub struct Renderer {
    pub context: VulkanContext,
}

impl Renderer {
    pub unsafe fn create(window: &Window, diagnostics_enabled: bool) -> Result<Renderer> {
        let context = VulkanContext::new(window, diagnostics_enabled)?;

        Ok(Renderer { context })
    }
}
