//! Vulkan swapchain negotiation and management
//!
//! Negotiation is split from creation: [`SwapchainConfig::negotiate`] turns a
//! [`SwapchainSupport`] query into concrete parameters without touching the
//! device, and [`Swapchain::new`] consumes those parameters.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};

use crate::render::backends::vulkan::{
    record_destruction, LogicalDevice, QueueFamilyIndices, ResourceKind, Surface, VulkanError, VulkanResult,
};

/// Preferred surface format: 8-bit BGRA in the sRGB nonlinear colorspace
pub const PREFERRED_SURFACE_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_SRGB,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Everything the surface reports about presenting from one GPU
#[derive(Debug, Clone)]
pub struct SwapchainSupport {
    /// Image count/extent limits and current transform
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported format/colorspace pairs
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported presentation modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    /// Query the surface, rejecting an empty format or present-mode list
    pub fn query(surface: &Surface, physical_device: vk::PhysicalDevice) -> VulkanResult<Self> {
        let support = Self {
            capabilities: surface.capabilities(physical_device)?,
            formats: surface.formats(physical_device)?,
            present_modes: surface.present_modes(physical_device)?,
        };

        if support.formats.is_empty() {
            return Err(VulkanError::EnumerationEmpty { what: "surface formats" });
        }
        if support.present_modes.is_empty() {
            return Err(VulkanError::EnumerationEmpty { what: "present modes" });
        }

        Ok(support)
    }
}

/// How swapchain images are shared between queue families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSharing {
    /// Owned by a single queue family
    Exclusive,
    /// Accessed concurrently by the graphics and present families
    Concurrent([u32; 2]),
}

impl ImageSharing {
    /// Concurrent when the families differ, exclusive otherwise
    pub fn for_families(indices: &QueueFamilyIndices) -> Self {
        if indices.is_shared() {
            Self::Exclusive
        } else {
            Self::Concurrent([indices.graphics_family, indices.present_family])
        }
    }

    /// Vulkan sharing mode
    pub fn mode(&self) -> vk::SharingMode {
        match self {
            Self::Exclusive => vk::SharingMode::EXCLUSIVE,
            Self::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    /// Queue families allowed to access the images; empty when exclusive
    pub fn queue_family_indices(&self) -> &[u32] {
        match self {
            Self::Exclusive => &[],
            Self::Concurrent(families) => families,
        }
    }
}

/// Pick the preferred format if offered, otherwise the first one listed
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|sf| {
            sf.format == PREFERRED_SURFACE_FORMAT.format && sf.color_space == PREFERRED_SURFACE_FORMAT.color_space
        })
        .or_else(|| formats.first().copied())
}

/// Mailbox when available, FIFO otherwise (FIFO is always supported)
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .copied()
        .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Use the surface's current extent unless it reports the `u32::MAX` sentinel,
/// in which case clamp the framebuffer size into the supported range.
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, framebuffer_size: (u32, u32)) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let (width, height) = framebuffer_size;
    vk::Extent2D {
        width: width
            .max(capabilities.min_image_extent.width)
            .min(capabilities.max_image_extent.width),
        height: height
            .max(capabilities.min_image_extent.height)
            .min(capabilities.max_image_extent.height),
    }
}

/// One more than the minimum, capped by the maximum when there is one
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        desired.min(capabilities.max_image_count)
    } else {
        desired
    }
}

/// Concrete presentation parameters derived from a support query
#[derive(Debug, Clone, Copy)]
pub struct SwapchainConfig {
    /// Image format and colorspace
    pub surface_format: vk::SurfaceFormatKHR,
    /// Presentation mode
    pub present_mode: vk::PresentModeKHR,
    /// Image size in pixels
    pub extent: vk::Extent2D,
    /// Minimum number of images requested
    pub image_count: u32,
    /// Queue family sharing
    pub sharing: ImageSharing,
    /// Transform applied on presentation
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainConfig {
    /// Derive swapchain parameters; has no side effects
    pub fn negotiate(
        support: &SwapchainSupport,
        framebuffer_size: (u32, u32),
        indices: &QueueFamilyIndices,
    ) -> VulkanResult<Self> {
        let surface_format = choose_surface_format(&support.formats)
            .ok_or(VulkanError::EnumerationEmpty { what: "surface formats" })?;

        Ok(Self {
            surface_format,
            present_mode: choose_present_mode(&support.present_modes),
            extent: choose_extent(&support.capabilities, framebuffer_size),
            image_count: choose_image_count(&support.capabilities),
            sharing: ImageSharing::for_families(indices),
            pre_transform: support.capabilities.current_transform,
        })
    }
}

/// Swapchain management wrapper with RAII cleanup
///
/// Owns the swapchain handle and one image view per swapchain image.
pub struct Swapchain {
    device: Device,
    swapchain_loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    config: SwapchainConfig,
}

impl Swapchain {
    /// Create the swapchain and its image views from a negotiated config
    pub fn new(device: &LogicalDevice, surface: &Surface, config: SwapchainConfig) -> VulkanResult<Self> {
        let swapchain_create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle())
            .min_image_count(config.image_count)
            .image_format(config.surface_format.format)
            .image_color_space(config.surface_format.color_space)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(config.sharing.mode())
            .queue_family_indices(config.sharing.queue_family_indices())
            .pre_transform(config.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        let swapchain_loader = device.swapchain_loader.clone();
        let swapchain = unsafe {
            swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(VulkanError::creation("swapchain"))?
        };

        // From here on a failure drops `this`, releasing whatever was created
        let mut this = Self {
            device: device.device.clone(),
            swapchain_loader,
            swapchain,
            images: Vec::new(),
            image_views: Vec::new(),
            config,
        };

        this.images = unsafe {
            this.swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(VulkanError::Api)?
        };

        for &image in &this.images {
            let create_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(config.surface_format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = unsafe {
                this.device
                    .create_image_view(&create_info, None)
                    .map_err(VulkanError::creation("image view"))?
            };
            this.image_views.push(view);
        }

        log::info!(
            "Swapchain created: {} image(s), {}x{}, {:?}, {:?}",
            this.images.len(),
            config.extent.width,
            config.extent.height,
            config.surface_format.format,
            config.present_mode
        );

        Ok(this)
    }

    /// Get swapchain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.config.extent
    }

    /// Get surface format
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.config.surface_format
    }

    /// Get image views
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Get swapchain handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Get swapchain loader
    pub fn loader(&self) -> &SwapchainLoader {
        &self.swapchain_loader
    }

    /// Number of images actually created by the driver
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        log::debug!("Destroying {} image view(s) and swapchain", self.image_views.len());
        for &image_view in &self.image_views {
            unsafe {
                self.device.destroy_image_view(image_view, None);
            }
            record_destruction(ResourceKind::ImageView);
        }
        unsafe {
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
        record_destruction(ResourceKind::Swapchain);
    }
}
