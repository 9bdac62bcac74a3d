use std::ffi::CStr;
use std::os::raw::c_void;
use std::sync::Arc;

use log::*;
use vulkanalia::vk::{self, ExtDebugUtilsExtension, HasBuilder};

use super::error::BootstrapError;
use super::instance::VulkanInstance;

/// Receives validation and performance messages from the driver.
///
/// Only created when diagnostics are enabled; always dropped before the
/// instance it is registered on.
#[derive(Debug)]
pub struct DiagnosticsHook {
    instance: Arc<VulkanInstance>,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DiagnosticsHook {
    pub(crate) unsafe fn new(instance: Arc<VulkanInstance>) -> Result<DiagnosticsHook, BootstrapError> {
        let info = messenger_create_info();

        let messenger = instance
            .vk_instance
            .create_debug_utils_messenger_ext(&info, None)
            .map_err(|error| match error {
                // The driver reports an unresolved entry point for the
                // messenger functions this way.
                vk::ErrorCode::EXTENSION_NOT_PRESENT => {
                    BootstrapError::EntryPointMissing("vkCreateDebugUtilsMessengerEXT")
                }
                error => BootstrapError::Driver(error),
            })?;

        Ok(DiagnosticsHook {
            instance,
            messenger,
        })
    }
}

impl Drop for DiagnosticsHook {
    fn drop(&mut self) {
        unsafe {
            self.instance
                .vk_instance
                .destroy_debug_utils_messenger_ext(self.messenger, None);
        }
    }
}

pub(crate) fn messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXTBuilder<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .user_callback(Some(diagnostics_callback))
}

// May be invoked from any driver thread; must only do thread-safe work
// and must never abort the program.
extern "system" fn diagnostics_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    type_: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: *mut c_void,
) -> vk::Bool32 {
    let data = unsafe { *data };
    let message = unsafe { CStr::from_ptr(data.message) }.to_string_lossy();

    if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        error!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        warn!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::INFO {
        debug!("({:?}) {}", type_, message);
    } else {
        trace!("({:?}) {}", type_, message);
    }

    vk::FALSE
}
