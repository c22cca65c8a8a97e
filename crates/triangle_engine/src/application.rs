//! Application lifecycle: window, renderer and the main loop

use thiserror::Error;

use crate::core::config::{ApplicationConfig, ConfigError};
use crate::render::backends::vulkan::{Renderer, ShaderBinaries, VulkanError};
use crate::render::window::{Window, WindowError};

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Window creation or event handling failed
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Vulkan bring-up or frame submission failed
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] VulkanError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Open the window, bring up Vulkan and draw until the window is closed
///
/// Returns the number of frames presented.
pub fn run(config: &ApplicationConfig) -> Result<u64, AppError> {
    config.validate().map_err(ConfigError::Invalid)?;

    // Missing or malformed shaders fail here, before any window opens
    let shaders = ShaderBinaries::load(&config.renderer.shaders)?;

    let window = Window::new(config.window.width, config.window.height, &config.window.title)?;
    let mut renderer = Renderer::new(window, &config.renderer, &shaders)?;
    log::info!("Instance extensions: {}", renderer.enabled_extensions().join(", "));

    while !renderer.window().should_close() {
        renderer.window_mut().poll_events();
        renderer.draw_frame()?;
    }

    renderer.wait_idle()?;
    let frames = renderer.frames_submitted();
    log::info!("Main loop finished after {frames} frame(s)");
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ShaderConfig;

    #[test]
    fn test_invalid_config_fails_before_opening_a_window() {
        let mut config = ApplicationConfig::default();
        config.window.width = 0;
        match run(&config) {
            Err(AppError::Config(ConfigError::Invalid(reason))) => assert!(reason.contains("non-zero")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_shader_is_io_not_found() {
        let mut config = ApplicationConfig::default();
        config.renderer.shaders = ShaderConfig::new("does/not/exist.vert.spv", "does/not/exist.frag.spv");
        match run(&config) {
            Err(AppError::Vulkan(VulkanError::Io { path, source })) => {
                assert_eq!(path, std::path::Path::new("does/not/exist.vert.spv"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected shader Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_errors_convert_into_app_error() {
        let err: AppError = VulkanError::EnumerationEmpty { what: "GPUs" }.into();
        assert!(err.to_string().contains("No GPUs available"));
        let err: AppError = WindowError::CreationFailed.into();
        assert!(matches!(err, AppError::Window(_)));
    }
}
