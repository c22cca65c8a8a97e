// Vulkan state management

pub mod framebuffer;
pub mod lifetime;
pub mod swapchain;
pub mod sync;

pub use framebuffer::*;
pub use lifetime::*;
pub use swapchain::*;
pub use sync::*;
