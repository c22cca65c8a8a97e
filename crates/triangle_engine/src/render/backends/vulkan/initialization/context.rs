//! Vulkan context management
//!
//! Owns the process-wide Vulkan entry points and instance, plus the error
//! taxonomy shared by every stage of the backend.

use ash::{vk, Entry, Instance};
use std::ffi::CString;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::config::VulkanRendererConfig;
use crate::render::backends::vulkan::state::lifetime::{record_destruction, ResourceKind};
use crate::render::window::WindowError;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// A query that must return at least one entry returned none
    #[error("No {what} available")]
    EnumerationEmpty {
        /// What was being enumerated (GPUs, surface formats, ...)
        what: &'static str,
    },

    /// No physical device satisfies the queue and extension requirements
    #[error("Device selection failed: {0}")]
    SelectionFailed(String),

    /// An object-creation call returned a non-success status
    #[error("Failed to create {resource}: {result:?}")]
    ResourceCreation {
        /// Kind of object that was being created
        resource: &'static str,
        /// Status returned by the driver
        result: vk::Result,
    },

    /// A shader binary could not be read from disk
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A shader binary was read but is not valid SPIR-V
    #[error("Invalid shader {}: {reason}", path.display())]
    InvalidShader {
        /// Path of the offending blob
        path: PathBuf,
        /// Why the blob was rejected
        reason: String,
    },

    /// Vulkan library loading or window integration failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// The windowing collaborator failed
    #[error("Window error: {0}")]
    Window(#[from] WindowError),
}

impl VulkanError {
    /// Build a `map_err` adapter tagging a creation failure with its resource kind
    pub fn creation(resource: &'static str) -> impl Fn(vk::Result) -> Self {
        move |result| Self::ResourceCreation { resource, result }
    }
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Vulkan instance wrapper with RAII cleanup
///
/// This is the first object created and the last destroyed; everything else
/// in the backend borrows from it.
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    enabled_extensions: Vec<String>,
}

impl VulkanInstance {
    /// Create a new Vulkan instance enabling the extensions the window asks for
    pub fn new(required_extensions: &[String], config: &VulkanRendererConfig) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to load Vulkan: {e}")))?;

        let app_name = to_cstring(&config.application_name)?;
        let engine_name = to_cstring(&config.engine_name)?;
        let (major, minor, patch) = config.application_version;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let cstr_extensions = required_extensions
            .iter()
            .map(|ext| to_cstring(ext))
            .collect::<VulkanResult<Vec<_>>>()?;
        let extension_ptrs: Vec<*const std::os::raw::c_char> =
            cstr_extensions.iter().map(|ext| ext.as_ptr()).collect();

        // No layers: the window's presentation extensions are all we enable
        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(VulkanError::creation("instance"))?
        };

        log::debug!("Vulkan instance created with extensions: {:?}", required_extensions);

        Ok(Self {
            entry,
            instance,
            enabled_extensions: required_extensions.to_vec(),
        })
    }

    /// Instance extensions that were enabled at creation
    pub fn enabled_extensions(&self) -> &[String] {
        &self.enabled_extensions
    }

    /// Raw instance handle, as the window system expects it
    pub fn handle(&self) -> vk::Instance {
        self.instance.handle()
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        log::debug!("Destroying Vulkan instance");
        unsafe {
            self.instance.destroy_instance(None);
        }
        record_destruction(ResourceKind::Instance);
    }
}

fn to_cstring(value: &str) -> VulkanResult<CString> {
    CString::new(value).map_err(|_| {
        VulkanError::InitializationFailed(format!("String contains an interior nul byte: {value:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_error_carries_resource_name() {
        let err = VulkanError::creation("render pass")(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        assert!(matches!(
            err,
            VulkanError::ResourceCreation { resource: "render pass", result: vk::Result::ERROR_OUT_OF_DEVICE_MEMORY }
        ));
        assert!(err.to_string().contains("render pass"));
    }

    #[test]
    fn test_interior_nul_is_rejected() {
        assert!(to_cstring("Hello Triangle").is_ok());
        assert!(matches!(to_cstring("bad\0name"), Err(VulkanError::InitializationFailed(_))));
    }
}
