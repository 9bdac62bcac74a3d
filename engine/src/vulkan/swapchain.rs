use std::sync::Arc;

use log::*;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::{KhrSurfaceExtension, KhrSwapchainExtension};

use super::device::VulkanDevice;
use super::error::BootstrapError;
use super::surface::VulkanSurface;

/// What the surface can do on a given physical device.
#[derive(Clone, Debug, Default)]
pub struct SwapchainSupportDetails {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    pub(crate) unsafe fn query(
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<SwapchainSupportDetails, vk::ErrorCode> {
        Ok(SwapchainSupportDetails {
            capabilities: instance
                .get_physical_device_surface_capabilities_khr(physical_device, surface)?,
            formats: instance.get_physical_device_surface_formats_khr(physical_device, surface)?,
            present_modes: instance
                .get_physical_device_surface_present_modes_khr(physical_device, surface)?,
        })
    }

    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// The resolved outcome of surface negotiation, consumed verbatim by
/// swapchain creation.
#[derive(Copy, Clone, Debug)]
pub struct SwapchainConfig {
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
}

impl SwapchainConfig {
    /// Pure function of the support details and the window's current
    /// framebuffer size. The details must be adequate (checked during
    /// device selection).
    pub fn negotiate(
        support: &SwapchainSupportDetails,
        framebuffer_width: u32,
        framebuffer_height: u32,
    ) -> SwapchainConfig {
        let surface_format = choose_surface_format(&support.formats);

        SwapchainConfig {
            format: surface_format.format,
            color_space: surface_format.color_space,
            present_mode: choose_present_mode(&support.present_modes),
            extent: choose_extent(&support.capabilities, framebuffer_width, framebuffer_height),
            image_count: choose_image_count(&support.capabilities),
        }
    }
}

const PREFERRED_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_SRGB,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == PREFERRED_FORMAT.format && f.color_space == PREFERRED_FORMAT.color_space
        })
        .or_else(|| formats.first().copied())
        // Adequate support details always carry at least one format;
        // the preferred pair stands in rather than a panic if not.
        .unwrap_or(PREFERRED_FORMAT)
}

fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .copied()
        .find(|m| *m == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    framebuffer_width: u32,
    framebuffer_height: u32,
) -> vk::Extent2D {
    // u32::MAX width is the driver's "window manager decides" sentinel.
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D::builder()
            .width(framebuffer_width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ))
            .height(framebuffer_height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ))
            .build()
    }
}

fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    // One more than the minimum so the driver never blocks on us;
    // max_image_count of zero means unbounded.
    let mut image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count != 0 && image_count > capabilities.max_image_count {
        image_count = capabilities.max_image_count;
    }
    image_count
}

/// The driver-managed ring of presentable images bound to the surface.
///
/// The images are owned by the swapchain handle, not by this wrapper.
#[derive(Debug)]
pub struct VulkanSwapchain {
    device: Arc<VulkanDevice>,
    _surface: Arc<VulkanSurface>,
    pub(crate) swapchain: vk::SwapchainKHR,
    pub(crate) images: Vec<vk::Image>,
    pub(crate) format: vk::Format,
    pub(crate) extent: vk::Extent2D,
}

impl VulkanSwapchain {
    pub(crate) unsafe fn new(
        device: Arc<VulkanDevice>,
        surface: Arc<VulkanSurface>,
        framebuffer_width: u32,
        framebuffer_height: u32,
    ) -> Result<VulkanSwapchain, BootstrapError> {
        let config = SwapchainConfig::negotiate(
            &device.swapchain_support,
            framebuffer_width,
            framebuffer_height,
        );

        debug!(
            "Negotiated swapchain: {:?} / {:?}, {:?}, {}x{}, {} images.",
            config.format,
            config.color_space,
            config.present_mode,
            config.extent.width,
            config.extent.height,
            config.image_count
        );

        let queue_family_indices = [device.graphics_family, device.present_family];
        let info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle())
            .min_image_count(config.image_count)
            .image_format(config.format)
            .image_color_space(config.color_space)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(vk::SurfaceTransformFlagsKHR::IDENTITY)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        let info = if device.graphics_family == device.present_family {
            info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        } else {
            info.image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&queue_family_indices)
        };

        let handle = device
            .vk_device
            .create_swapchain_khr(&info, None)
            .map_err(BootstrapError::SwapchainCreationFailed)?;

        // Wrap the handle before the image query so a failure there
        // still releases the swapchain.
        let mut swapchain = VulkanSwapchain {
            device,
            _surface: surface,
            swapchain: handle,
            images: Vec::new(),
            format: config.format,
            extent: config.extent,
        };
        swapchain.images = swapchain.device.vk_device.get_swapchain_images_khr(handle)?;

        Ok(swapchain)
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            self.device
                .vk_device
                .destroy_swapchain_khr(self.swapchain, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFERRED: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };
    const LINEAR_RGBA: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
        format: vk::Format::R8G8B8A8_UNORM,
        color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
    };

    fn capabilities(
        min_image_count: u32,
        max_image_count: u32,
        current_extent: vk::Extent2D,
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count,
            max_image_count,
            current_extent,
            ..Default::default()
        }
    }

    #[test]
    fn preferred_format_wins_regardless_of_position() {
        let chosen = choose_surface_format(&[LINEAR_RGBA, PREFERRED]);
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);

        let chosen = choose_surface_format(&[PREFERRED, LINEAR_RGBA]);
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn missing_preferred_format_falls_back_to_first_supported() {
        let other = vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        let chosen = choose_surface_format(&[LINEAR_RGBA, other]);
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT);
    }

    #[test]
    fn empty_format_set_resolves_to_preferred_pair_without_panicking() {
        let chosen = choose_surface_format(&[]);
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn mailbox_preferred_fifo_otherwise() {
        let chosen = choose_present_mode(&[
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
        ]);
        assert_eq!(chosen, vk::PresentModeKHR::MAILBOX);

        let chosen = choose_present_mode(&[
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::IMMEDIATE,
        ]);
        assert_eq!(chosen, vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn defined_current_extent_is_used_verbatim() {
        let capabilities = capabilities(2, 4, vk::Extent2D { width: 1024, height: 768 });
        let extent = choose_extent(&capabilities, 1920, 1080);
        assert_eq!(extent.width, 1024);
        assert_eq!(extent.height, 768);
    }

    #[test]
    fn undefined_current_extent_clamps_framebuffer_size() {
        let mut capabilities = capabilities(
            2,
            4,
            vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
        );
        capabilities.min_image_extent = vk::Extent2D { width: 200, height: 200 };
        capabilities.max_image_extent = vk::Extent2D { width: 1600, height: 900 };

        let extent = choose_extent(&capabilities, 1920, 100);
        assert_eq!(extent.width, 1600);
        assert_eq!(extent.height, 200);

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);
    }

    #[test]
    fn image_count_is_one_over_minimum_clamped_to_maximum() {
        let unbounded = capabilities(2, 0, vk::Extent2D::default());
        assert_eq!(choose_image_count(&unbounded), 3);

        let roomy = capabilities(2, 4, vk::Extent2D::default());
        assert_eq!(choose_image_count(&roomy), 3);

        let tight = capabilities(3, 3, vk::Extent2D::default());
        assert_eq!(choose_image_count(&tight), 3);
    }

    #[test]
    fn negotiation_scenario_resolves_expected_config() {
        let support = SwapchainSupportDetails {
            capabilities: capabilities(2, 4, vk::Extent2D { width: 1024, height: 768 }),
            formats: vec![LINEAR_RGBA, PREFERRED],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
        };

        let config = SwapchainConfig::negotiate(&support, 800, 600);
        assert_eq!(config.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(config.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
        assert_eq!(config.present_mode, vk::PresentModeKHR::MAILBOX);
        assert_eq!(config.extent.width, 1024);
        assert_eq!(config.extent.height, 768);
        assert_eq!(config.image_count, 3);
    }

    #[test]
    fn negotiation_scenario_clamps_image_count_to_maximum() {
        let support = SwapchainSupportDetails {
            capabilities: capabilities(3, 3, vk::Extent2D { width: 1024, height: 768 }),
            formats: vec![LINEAR_RGBA, PREFERRED],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
        };

        let config = SwapchainConfig::negotiate(&support, 800, 600);
        assert_eq!(config.image_count, 3);
    }
}
