use std::sync::Arc;

use vulkanalia::prelude::v1_0::*;
use winit::window::Window;

mod constants;
mod debug;
mod device;
mod error;
mod image;
mod instance;
mod render_pass;
mod surface;
mod swapchain;

pub use device::QueueFamilyIndices;
pub use error::BootstrapError;
pub use swapchain::{SwapchainConfig, SwapchainSupportDetails};

use debug::DiagnosticsHook;
use device::VulkanDevice;
use image::VulkanImageViews;
use instance::VulkanInstance;
use render_pass::VulkanRenderPass;
use surface::VulkanSurface;
use swapchain::VulkanSwapchain;

/// Owns the whole bootstrap chain, from instance to render pass.
///
/// Fields are declared in reverse creation order: dropping the context
/// releases the render pass first and the instance last, and a failure
/// partway through `new` releases exactly the stages that were built,
/// in the same reverse order. Each handle has exactly one owner, so
/// nothing is released twice and the context cannot be cloned.
#[derive(Debug)]
pub struct VulkanContext {
    render_pass: VulkanRenderPass,
    image_views: VulkanImageViews,
    swapchain: VulkanSwapchain,
    device: Arc<VulkanDevice>,
    surface: Arc<VulkanSurface>,
    diagnostics: Option<DiagnosticsHook>,
    instance: Arc<VulkanInstance>,
}

impl VulkanContext {
    /// Runs the bootstrap sequence to completion or to the first fatal
    /// error. Strictly linear; each stage blocks on the driver before
    /// the next one starts.
    pub unsafe fn new(
        window: &Window,
        diagnostics_enabled: bool,
    ) -> Result<VulkanContext, BootstrapError> {
        let instance = Arc::new(VulkanInstance::new(window, diagnostics_enabled)?);

        let diagnostics = if diagnostics_enabled {
            Some(DiagnosticsHook::new(instance.clone())?)
        } else {
            None
        };

        let surface = Arc::new(VulkanSurface::new(instance.clone(), window)?);
        let device = Arc::new(VulkanDevice::new(instance.clone(), &surface)?);

        let size = window.inner_size();
        let swapchain =
            VulkanSwapchain::new(device.clone(), surface.clone(), size.width, size.height)?;
        let image_views =
            VulkanImageViews::new(device.clone(), &swapchain.images, swapchain.format)?;
        let render_pass = VulkanRenderPass::new(device.clone(), swapchain.format)?;

        Ok(VulkanContext {
            render_pass,
            image_views,
            swapchain,
            device,
            surface,
            diagnostics,
            instance,
        })
    }

    // Handles consumed by a frame-rendering stage built on top of this.

    pub fn instance(&self) -> &Instance {
        &self.instance.vk_instance
    }

    pub fn device(&self) -> &Device {
        &self.device.vk_device
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.device.physical_device
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.device.graphics_queue
    }

    pub fn present_queue(&self) -> vk::Queue {
        self.device.present_queue
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface.handle()
    }

    pub fn swapchain(&self) -> vk::SwapchainKHR {
        self.swapchain.swapchain
    }

    pub fn swapchain_images(&self) -> &[vk::Image] {
        &self.swapchain.images
    }

    pub fn swapchain_format(&self) -> vk::Format {
        self.swapchain.format
    }

    pub fn swapchain_extent(&self) -> vk::Extent2D {
        self.swapchain.extent
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views.views
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass.render_pass
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics.is_some()
    }

    pub unsafe fn device_wait_idle(&self) -> Result<(), BootstrapError> {
        self.device.vk_device.device_wait_idle()?;
        Ok(())
    }
}
