//! Vulkan backend implementation
//!
//! Organized into initialization, state and rendering modules, composed by
//! [`Renderer`].

/// Vulkan initialization types (instance, surface, device selection, logical device)
pub mod initialization;

/// Vulkan rendering operations (shaders, pipelines, render passes, commands)
pub mod rendering;

/// Vulkan state management (swapchain, framebuffers, sync, teardown ledger)
pub mod state;

/// Per-frame recording and submission
pub mod frame;

/// Main Vulkan renderer implementation
pub mod renderer;

// Re-export main renderer
pub use renderer::Renderer;
pub use frame::{drive_frame, FrameExecutor, FrameSteps};

// Re-export core initialization types
pub use initialization::context::{VulkanError, VulkanInstance, VulkanResult};
pub use initialization::device_selection::{PhysicalDeviceInfo, QueueFamilyIndices};
pub use initialization::logical_device::LogicalDevice;
pub use initialization::surface::Surface;

// Re-export rendering types
pub use rendering::commands::{ActiveRenderPass, CommandPool, CommandRecorder};
pub use rendering::pipeline::{GraphicsPipeline, RenderPipeline};
pub use rendering::render_pass::RenderPass;
pub use rendering::shader::{ShaderBinaries, ShaderModule};

// Re-export state types
pub use state::framebuffer::{Framebuffer, Framebuffers};
pub use state::lifetime::{record_destruction, record_teardown, verify_destruction_order, OrderViolation, ResourceKind};
pub use state::swapchain::{Swapchain, SwapchainConfig, SwapchainSupport};
pub use state::sync::{Fence, FrameSync, Semaphore};
