//! Shader loading
//!
//! Shaders arrive as precompiled SPIR-V blobs on disk; this module reads them
//! and wraps the resulting `VkShaderModule`s.

use ash::{vk, Device};
use std::ffi::CStr;
use std::fs::File;
use std::path::Path;

use crate::core::config::ShaderConfig;
use crate::render::backends::vulkan::{record_destruction, ResourceKind, VulkanError, VulkanResult};

/// First word of every SPIR-V module
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Entry point name shared by both shader stages
pub fn entry_point() -> &'static CStr {
    // SAFETY: literal is nul-terminated with no interior nul
    unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") }
}

/// Read a SPIR-V file into 32-bit words
pub fn load_spirv(path: &Path) -> VulkanResult<Vec<u32>> {
    let mut file = File::open(path).map_err(|source| VulkanError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let words = ash::util::read_spv(&mut file).map_err(|e| VulkanError::InvalidShader {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match words.first() {
        Some(&SPIRV_MAGIC) => Ok(words),
        Some(_) => Err(VulkanError::InvalidShader {
            path: path.to_path_buf(),
            reason: "missing SPIR-V magic number".to_string(),
        }),
        None => Err(VulkanError::InvalidShader {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        }),
    }
}

/// SPIR-V words for both stages, read before any Vulkan object exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderBinaries {
    /// Vertex stage words
    pub vertex: Vec<u32>,
    /// Fragment stage words
    pub fragment: Vec<u32>,
}

impl ShaderBinaries {
    /// Read the vertex and fragment binaries named by `config`
    pub fn load(config: &ShaderConfig) -> VulkanResult<Self> {
        let vertex = load_spirv(Path::new(&config.vertex_shader_path))?;
        let fragment = load_spirv(Path::new(&config.fragment_shader_path))?;
        log::debug!(
            "Loaded shaders {} ({} words) and {} ({} words)",
            config.vertex_shader_path,
            vertex.len(),
            config.fragment_shader_path,
            fragment.len()
        );
        Ok(Self { vertex, fragment })
    }
}

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create shader module from SPIR-V words
    pub fn from_words(device: Device, words: &[u32]) -> VulkanResult<Self> {
        let create_info = vk::ShaderModuleCreateInfo::builder().code(words);

        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::creation("shader module"))?
        };

        Ok(Self { device, module })
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Create shader stage create info
    pub fn create_stage_info(&self, stage: vk::ShaderStageFlags) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(entry_point())
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
        record_destruction(ResourceKind::ShaderModule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("triangle_engine_{}_{}.spv", name, std::process::id()));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn words_to_bytes(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_valid_blob_loads_as_words() {
        let words = [SPIRV_MAGIC, 0x0001_0000, 0, 8, 0];
        let path = write_temp("valid", &words_to_bytes(&words));
        let loaded = load_spirv(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, words);
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let path = Path::new("shaders/definitely_missing.vert.spv");
        match load_spirv(path) {
            Err(VulkanError::Io { path: reported, source }) => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_blob_is_rejected() {
        let path = write_temp("truncated", &[0x03, 0x02, 0x23, 0x07, 0x00, 0x00]);
        let result = load_spirv(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(VulkanError::InvalidShader { .. })));
    }

    #[test]
    fn test_wrong_magic_is_rejected() {
        let path = write_temp("magic", &words_to_bytes(&[0xDEAD_BEEF, 0]));
        let result = load_spirv(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(VulkanError::InvalidShader { reason, .. }) if reason.contains("magic")));
    }

    #[test]
    fn test_empty_blob_is_rejected() {
        let path = write_temp("empty", &[]);
        let result = load_spirv(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(VulkanError::InvalidShader { .. })));
    }

    #[test]
    fn test_binaries_load_both_stages() {
        let vertex = [SPIRV_MAGIC, 0x0001_0000, 0, 8, 0];
        let fragment = [SPIRV_MAGIC, 0x0001_0000, 0, 9, 0];
        let vertex_path = write_temp("pair_vert", &words_to_bytes(&vertex));
        let fragment_path = write_temp("pair_frag", &words_to_bytes(&fragment));
        let config = ShaderConfig::new(vertex_path.to_string_lossy(), fragment_path.to_string_lossy());

        let binaries = ShaderBinaries::load(&config);
        std::fs::remove_file(&vertex_path).ok();
        std::fs::remove_file(&fragment_path).ok();

        let binaries = binaries.unwrap();
        assert_eq!(binaries.vertex, vertex);
        assert_eq!(binaries.fragment, fragment);
    }

    #[test]
    fn test_missing_fragment_binary_names_its_path() {
        let vertex_path = write_temp("lonely_vert", &words_to_bytes(&[SPIRV_MAGIC, 0]));
        let config = ShaderConfig::new(vertex_path.to_string_lossy(), "shaders/absent.frag.spv");

        let result = ShaderBinaries::load(&config);
        std::fs::remove_file(&vertex_path).ok();

        match result {
            Err(VulkanError::Io { path, source }) => {
                assert_eq!(path, Path::new("shaders/absent.frag.spv"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_entry_point_is_main() {
        assert_eq!(entry_point().to_str().unwrap(), "main");
    }
}
