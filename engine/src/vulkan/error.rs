use thiserror::Error;
use vulkanalia::vk;

/// A fatal bootstrap failure.
///
/// Every variant aborts the remaining bootstrap sequence. Handles
/// created before the failure are released in reverse creation order
/// before the error reaches the caller; nothing is retried.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("required instance extension unavailable: {0}")]
    ExtensionUnavailable(String),

    #[error("validation layer unavailable: {0}")]
    LayerUnavailable(String),

    #[error("diagnostics entry point missing: {0}")]
    EntryPointMissing(&'static str),

    #[error("failed to bind surface to window: {0}")]
    SurfaceCreationFailed(vk::ErrorCode),

    #[error("no suitable physical device found")]
    NoSuitableDevice,

    #[error("failed to create logical device: {0}")]
    DeviceCreationFailed(vk::ErrorCode),

    #[error("failed to create swapchain: {0}")]
    SwapchainCreationFailed(vk::ErrorCode),

    #[error("failed to create image view: {0}")]
    ImageViewCreationFailed(vk::ErrorCode),

    #[error("failed to create render pass: {0}")]
    RenderPassCreationFailed(vk::ErrorCode),

    #[error("failed to load Vulkan library: {0}")]
    DriverUnavailable(String),

    #[error("driver call failed: {0}")]
    Driver(#[from] vk::ErrorCode),
}
