//! Framebuffer management
//!
//! One framebuffer per swapchain image view, all bound to the same render pass.

use ash::{vk, Device};

use crate::render::backends::vulkan::{record_destruction, RenderPass, ResourceKind, Swapchain, VulkanError, VulkanResult};

/// Framebuffer wrapper with RAII cleanup
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Create a new framebuffer
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let framebuffer_create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe {
            device
                .create_framebuffer(&framebuffer_create_info, None)
                .map_err(VulkanError::creation("framebuffer"))?
        };

        Ok(Self { device, framebuffer })
    }

    /// Get the framebuffer handle
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
        record_destruction(ResourceKind::Framebuffer);
    }
}

/// The render targets for every swapchain image, indexed by image index
pub struct Framebuffers {
    framebuffers: Vec<Framebuffer>,
}

impl Framebuffers {
    /// Create one framebuffer per swapchain image view
    pub fn new(device: &Device, render_pass: &RenderPass, swapchain: &Swapchain) -> VulkanResult<Self> {
        let framebuffers = swapchain
            .image_views()
            .iter()
            .map(|&view| Framebuffer::new(device.clone(), render_pass.handle(), &[view], swapchain.extent()))
            .collect::<VulkanResult<Vec<_>>>()?;

        log::debug!("Created {} framebuffer(s)", framebuffers.len());
        Ok(Self { framebuffers })
    }

    /// Framebuffer targeting the given swapchain image
    pub fn get(&self, image_index: u32) -> VulkanResult<vk::Framebuffer> {
        self.framebuffers
            .get(image_index as usize)
            .map(Framebuffer::handle)
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: format!(
                    "No framebuffer for swapchain image {image_index} ({} available)",
                    self.framebuffers.len()
                ),
            })
    }

    /// Number of framebuffers
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    /// Whether there are no framebuffers
    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }
}
