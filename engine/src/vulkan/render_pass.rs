use std::sync::Arc;

use vulkanalia::prelude::v1_0::*;

use super::device::VulkanDevice;
use super::error::BootstrapError;

/// A single-attachment, single-subpass render pass targeting the
/// swapchain images. The terminal artifact of the bootstrap.
#[derive(Debug)]
pub struct VulkanRenderPass {
    device: Arc<VulkanDevice>,
    pub(crate) render_pass: vk::RenderPass,
}

impl VulkanRenderPass {
    pub(crate) unsafe fn new(
        device: Arc<VulkanDevice>,
        format: vk::Format,
    ) -> Result<VulkanRenderPass, BootstrapError> {
        let color_attachment = vk::AttachmentDescription::builder()
            .format(format)
            .samples(vk::SampleCountFlags::_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

        let color_attachment_ref = vk::AttachmentReference::builder()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

        let color_attachments = &[color_attachment_ref];
        let subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(color_attachments);

        // Makes the subpass wait for the presentation engine to release
        // the image before color output begins.
        let dependency = vk::SubpassDependency::builder()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            );

        let attachments = &[color_attachment];
        let subpasses = &[subpass];
        let dependencies = &[dependency];
        let info = vk::RenderPassCreateInfo::builder()
            .attachments(attachments)
            .subpasses(subpasses)
            .dependencies(dependencies);

        let render_pass = device
            .vk_device
            .create_render_pass(&info, None)
            .map_err(BootstrapError::RenderPassCreationFailed)?;

        Ok(VulkanRenderPass {
            device,
            render_pass,
        })
    }
}

impl Drop for VulkanRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device
                .vk_device
                .destroy_render_pass(self.render_pass, None);
        }
    }
}
