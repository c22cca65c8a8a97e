//! # Configuration
//!
//! Window, renderer and shader settings. Every type has working defaults and
//! can also be read from TOML or RON through [`Config`].

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use crate::config::{Config, ConfigError};

/// Directories searched, in order, for compiled shaders
const SHADER_SEARCH_DIRS: [&str; 4] = ["shaders/", "target/shaders/", "../shaders/", "./"];

/// # Shader Configuration
///
/// Locations of the precompiled SPIR-V binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to the vertex shader SPIR-V file
    pub vertex_shader_path: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }

    /// Look for the shader files in the usual output directories
    ///
    /// Falls back to `shaders/<name>` when a file is found nowhere, so the
    /// eventual load error names the conventional location.
    pub fn with_path_resolution(vertex_name: &str, fragment_name: &str) -> Self {
        Self {
            vertex_shader_path: resolve_shader_path(vertex_name),
            fragment_shader_path: resolve_shader_path(fragment_name),
        }
    }

    /// Validate that both paths are set
    ///
    /// Whether the files exist is left to loading, which reports a missing
    /// binary as an I/O error naming the path.
    pub fn validate(&self) -> Result<(), String> {
        if self.vertex_shader_path.is_empty() {
            return Err("Vertex shader path cannot be empty".to_string());
        }
        if self.fragment_shader_path.is_empty() {
            return Err("Fragment shader path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::with_path_resolution("triangle.vert.spv", "triangle.frag.spv")
    }
}

fn resolve_shader_path(name: &str) -> String {
    SHADER_SEARCH_DIRS
        .iter()
        .map(|dir| format!("{dir}{name}"))
        .find(|candidate| Path::new(candidate).exists())
        .unwrap_or_else(|| format!("shaders/{name}"))
}

/// # Vulkan Renderer Configuration
///
/// Application metadata reported to the driver, shader locations and the
/// clear color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulkanRendererConfig {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Application version (major, minor, patch)
    pub application_version: (u32, u32, u32),
    /// Engine name for Vulkan instance creation
    pub engine_name: String,
    /// Shader configuration
    pub shaders: ShaderConfig,
    /// RGBA color the framebuffer is cleared to each frame
    pub clear_color: [f32; 4],
}

impl VulkanRendererConfig {
    /// Create a new renderer configuration
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            application_version: (1, 0, 0),
            engine_name: "No Engine".to_string(),
            shaders: ShaderConfig::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Set custom shader configuration
    pub fn with_shaders(mut self, shaders: ShaderConfig) -> Self {
        self.shaders = shaders;
        self
    }

    /// Set the clear color
    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.application_name.is_empty() {
            return Err("Application name cannot be empty".to_string());
        }
        if self.application_name.contains('\0') || self.engine_name.contains('\0') {
            return Err("Application and engine names cannot contain nul bytes".to_string());
        }
        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(format!("Clear color components must be in [0, 1]: {:?}", self.clear_color));
        }

        self.shaders.validate()?;

        Ok(())
    }
}

impl Default for VulkanRendererConfig {
    fn default() -> Self {
        Self::new("Hello Triangle")
    }
}

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Width in screen coordinates
    pub width: u32,
    /// Height in screen coordinates
    pub height: u32,
    /// Title bar text
    pub title: String,
}

impl WindowConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("Window size must be non-zero: {}x{}", self.width, self.height));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Vulkan window".to_string(),
        }
    }
}

/// # Application Configuration
///
/// Everything the hello-triangle binary needs to start.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Rendering system configuration
    pub renderer: VulkanRendererConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.window.validate()?;
        self.renderer.validate()
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApplicationConfig::default();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.window.title, "Vulkan window");
        assert_eq!(config.renderer.application_name, "Hello Triangle");
        assert_eq!(config.renderer.engine_name, "No Engine");
        assert_eq!(config.renderer.application_version, (1, 0, 0));
        assert_eq!(config.renderer.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert!(config.renderer.shaders.vertex_shader_path.ends_with("triangle.vert.spv"));
        assert!(config.renderer.shaders.fragment_shader_path.ends_with("triangle.frag.spv"));
    }

    #[test]
    fn test_unresolved_shader_falls_back_to_shaders_dir() {
        let shaders = ShaderConfig::with_path_resolution("missing_stage.vert.spv", "missing_stage.frag.spv");
        assert_eq!(shaders.vertex_shader_path, "shaders/missing_stage.vert.spv");
        assert_eq!(shaders.fragment_shader_path, "shaders/missing_stage.frag.spv");
    }

    #[test]
    fn test_missing_shader_files_pass_validation() {
        let shaders = ShaderConfig::new("nowhere/a.vert.spv", "nowhere/a.frag.spv");
        assert!(shaders.validate().is_ok());
        assert!(VulkanRendererConfig::new("Test").with_shaders(shaders).validate().is_ok());
    }

    #[test]
    fn test_empty_shader_path_is_rejected() {
        let shaders = ShaderConfig::new("", "a.frag.spv");
        assert!(shaders.validate().unwrap_err().contains("Vertex shader"));
        let shaders = ShaderConfig::new("a.vert.spv", "");
        assert!(shaders.validate().unwrap_err().contains("Fragment shader"));
    }

    #[test]
    fn test_renderer_validation() {
        let shaders = ShaderConfig::new("a.vert.spv", "a.frag.spv");
        let config = VulkanRendererConfig::new("Test").with_shaders(shaders);
        assert!(config.validate().is_ok());

        let empty_name = VulkanRendererConfig { application_name: String::new(), ..config.clone() };
        assert!(empty_name.validate().is_err());

        let bad_color = config.clone().with_clear_color([0.0, 1.5, 0.0, 1.0]);
        assert!(bad_color.validate().is_err());

        let nul_engine = VulkanRendererConfig { engine_name: "a\0b".to_string(), ..config };
        assert!(nul_engine.validate().is_err());
    }

    #[test]
    fn test_zero_sized_window_is_rejected() {
        let window = WindowConfig { width: 0, ..WindowConfig::default() };
        assert!(window.validate().is_err());
        assert!(WindowConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            [window]
            width = 1024
            height = 768
            title = "Triangle"

            [renderer]
            application_name = "Parsed"
            application_version = [2, 1, 0]
            engine_name = "No Engine"
            clear_color = [0.1, 0.2, 0.3, 1.0]

            [renderer.shaders]
            vertex_shader_path = "out/a.vert.spv"
            fragment_shader_path = "out/a.frag.spv"
        "#;
        let config = ApplicationConfig::from_toml_str(text).unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.renderer.application_version, (2, 1, 0));
        assert_eq!(config.renderer.shaders.fragment_shader_path, "out/a.frag.spv");
        assert!((config.renderer.clear_color[2] - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_ron() {
        let text = r#"(
            window: (width: 640, height: 480, title: "Ron"),
            renderer: (
                application_name: "Parsed",
                application_version: (0, 3, 1),
                engine_name: "No Engine",
                shaders: (vertex_shader_path: "v.spv", fragment_shader_path: "f.spv"),
                clear_color: (0.0, 0.0, 0.0, 1.0),
            ),
        )"#;
        let config = ApplicationConfig::from_ron_str(text).unwrap();
        assert_eq!(config.window.title, "Ron");
        assert_eq!(config.renderer.application_version, (0, 3, 1));
        assert_eq!(config.renderer.shaders.vertex_shader_path, "v.spv");
    }

    #[test]
    fn test_malformed_text_is_parse_error() {
        assert!(matches!(ApplicationConfig::from_toml_str("window = 3"), Err(ConfigError::Parse(_))));
        assert!(matches!(ApplicationConfig::from_ron_str("(window: ["), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_file_round_trip_through_ron() {
        let path = std::env::temp_dir().join(format!("triangle_engine_config_{}.ron", std::process::id()));
        let mut config = ApplicationConfig::default();
        config.window.title = "Saved".to_string();
        config.save_to_file(&path).unwrap();
        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
