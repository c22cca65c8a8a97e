//! # Triangle Engine
//!
//! Brings a Vulkan context up from nothing and presents a single hardcoded
//! triangle to a GLFW window.
//!
//! ## Stages
//!
//! - **Initialization**: instance, surface, GPU selection and logical device
//! - **Swapchain**: format, present mode, extent and image count negotiation
//! - **Pipeline**: render pass, shader modules and a fixed graphics pipeline
//! - **Frames**: one frame in flight, acquire, record, submit, present
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use triangle_engine::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     triangle_engine::foundation::logging::init(log::LevelFilter::Info);
//!     run(&ApplicationConfig::default())?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;

mod application;

pub use application::{run, AppError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{ApplicationConfig, Config, ShaderConfig, VulkanRendererConfig, WindowConfig},
        render::{Renderer, VulkanError, VulkanResult, Window, WindowError},
        run, AppError,
    };
}
