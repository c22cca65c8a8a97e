// Vulkan initialization components

pub mod context;
pub mod device_selection;
pub mod logical_device;
pub mod surface;

pub use context::*;
pub use device_selection::*;
pub use logical_device::*;
pub use surface::*;
