use std::sync::Arc;

use vulkanalia::prelude::v1_0::*;

use super::device::VulkanDevice;
use super::error::BootstrapError;

/// One 2D color view per swapchain image, in image order.
#[derive(Debug)]
pub struct VulkanImageViews {
    device: Arc<VulkanDevice>,
    pub(crate) views: Vec<vk::ImageView>,
}

impl VulkanImageViews {
    pub(crate) unsafe fn new(
        device: Arc<VulkanDevice>,
        images: &[vk::Image],
        format: vk::Format,
    ) -> Result<VulkanImageViews, BootstrapError> {
        let mut views = Vec::with_capacity(images.len());
        for image in images {
            let components = vk::ComponentMapping::builder()
                .r(vk::ComponentSwizzle::IDENTITY)
                .g(vk::ComponentSwizzle::IDENTITY)
                .b(vk::ComponentSwizzle::IDENTITY)
                .a(vk::ComponentSwizzle::IDENTITY);

            let subresource_range = vk::ImageSubresourceRange::builder()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .base_mip_level(0)
                .level_count(1)
                .base_array_layer(0)
                .layer_count(1);

            let info = vk::ImageViewCreateInfo::builder()
                .image(*image)
                .view_type(vk::ImageViewType::_2D)
                .format(format)
                .components(components)
                .subresource_range(subresource_range);

            match device.vk_device.create_image_view(&info, None) {
                Ok(view) => views.push(view),
                Err(error) => {
                    // A single failed view aborts the bootstrap; release
                    // the ones already created before propagating.
                    for view in views {
                        device.vk_device.destroy_image_view(view, None);
                    }
                    return Err(BootstrapError::ImageViewCreationFailed(error));
                }
            }
        }

        Ok(VulkanImageViews { device, views })
    }
}

impl Drop for VulkanImageViews {
    fn drop(&mut self) {
        unsafe {
            for view in &self.views {
                self.device.vk_device.destroy_image_view(*view, None);
            }
        }
    }
}
