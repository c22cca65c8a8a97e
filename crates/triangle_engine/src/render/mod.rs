//! # Rendering
//!
//! The window collaborator and the Vulkan backend that draws into it.

/// GLFW window wrapper
pub mod window;

/// Graphics backend implementations
pub mod backends;

pub use backends::vulkan::{Renderer, VulkanError, VulkanResult};
pub use window::{Window, WindowError, WindowResult};
