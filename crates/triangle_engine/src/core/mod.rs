//! # Core
//!
//! Shared configuration types used by the window, the renderer and the
//! application loop.

pub mod config;

// Re-export commonly used config types
pub use config::{ApplicationConfig, Config, ConfigError, ShaderConfig, VulkanRendererConfig, WindowConfig};
