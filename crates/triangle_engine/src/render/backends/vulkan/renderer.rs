//! Vulkan renderer
//!
//! Brings up every stage in dependency order and owns the results, the window
//! included. Field declaration order is the teardown order.

use std::mem::ManuallyDrop;

use super::frame::FrameExecutor;
use super::initialization::{LogicalDevice, PhysicalDeviceInfo, Surface, VulkanInstance};
use super::rendering::{RenderPipeline, ShaderBinaries};
use super::state::{record_teardown, verify_destruction_order, Framebuffers, Swapchain, SwapchainConfig, SwapchainSupport};
use super::VulkanResult;
use crate::core::config::VulkanRendererConfig;
use crate::render::window::Window;

/// Everything the renderer owns, dropped top to bottom
struct RendererObjects {
    frame_executor: FrameExecutor,
    framebuffers: Framebuffers,
    render_pipeline: RenderPipeline,
    swapchain: Swapchain,
    device: LogicalDevice,
    surface: Surface,
    instance: VulkanInstance,
    window: Window,
}

/// Owns the whole Vulkan object graph and the window it presents to
///
/// Dropping the renderer waits for the device to go idle, destroys every
/// object and checks the order the wrappers actually reported.
pub struct Renderer {
    objects: ManuallyDrop<RendererObjects>,
}

impl Renderer {
    /// Initialize Vulkan for `window`, taking ownership of it
    ///
    /// On failure, whatever was already created is destroyed before the
    /// error is returned, the window last.
    pub fn new(mut window: Window, config: &VulkanRendererConfig, shaders: &ShaderBinaries) -> VulkanResult<Self> {
        let extensions = window.required_instance_extensions()?;
        let instance = VulkanInstance::new(&extensions, config)?;
        log::info!("Vulkan instance created");

        let surface = Surface::new(&instance, &mut window)?;

        let physical_device = PhysicalDeviceInfo::select_suitable_device(&instance.instance, &surface)?;
        let device = LogicalDevice::new(&instance.instance, &physical_device)?;
        log::info!("Logical device created");

        let support = SwapchainSupport::query(&surface, physical_device.device)?;
        let swapchain_config = SwapchainConfig::negotiate(&support, window.framebuffer_size(), &device.indices)?;
        log::debug!("Negotiated swapchain: {:?}", swapchain_config);
        let swapchain = Swapchain::new(&device, &surface, swapchain_config)?;

        let render_pipeline =
            RenderPipeline::build(&device.device, swapchain.format().format, swapchain.extent(), shaders)?;

        let framebuffers = Framebuffers::new(&device.device, render_pipeline.render_pass(), &swapchain)?;
        let frame_executor = FrameExecutor::new(&device, config.clear_color)?;
        log::info!(
            "Renderer ready: {} framebuffer(s) over {} swapchain image(s)",
            framebuffers.len(),
            swapchain.image_count()
        );

        Ok(Self {
            objects: ManuallyDrop::new(RendererObjects {
                frame_executor,
                framebuffers,
                render_pipeline,
                swapchain,
                device,
                surface,
                instance,
                window,
            }),
        })
    }

    /// Render and present one frame
    pub fn draw_frame(&mut self) -> VulkanResult<()> {
        let objects = &mut *self.objects;
        objects
            .frame_executor
            .draw_frame(&objects.swapchain, &objects.framebuffers, &objects.render_pipeline)
    }

    /// Block until the GPU has finished all submitted work
    pub fn wait_idle(&self) -> VulkanResult<()> {
        self.objects.device.wait_idle()
    }

    /// Number of frames submitted so far
    pub fn frames_submitted(&self) -> u64 {
        self.objects.frame_executor.frames_submitted()
    }

    /// Instance extensions enabled at creation
    pub fn enabled_extensions(&self) -> &[String] {
        self.objects.instance.enabled_extensions()
    }

    /// The window being rendered to
    pub fn window(&self) -> &Window {
        &self.objects.window
    }

    /// Mutable access to the window, for event polling
    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.objects.window
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.objects.device.wait_idle() {
            log::error!("Failed to wait for device idle during teardown: {e}");
        }
        log::info!("Destroying renderer after {} frame(s)", self.frames_submitted());

        // SAFETY: `objects` is dropped exactly once and never touched afterwards
        let sequence = record_teardown(|| unsafe { ManuallyDrop::drop(&mut self.objects) });
        log::debug!("Teardown destroyed {} object(s)", sequence.len());

        let verdict = verify_destruction_order(&sequence);
        if let Err(violation) = &verdict {
            log::error!("Renderer teardown out of order: {violation}");
        }
        debug_assert_eq!(verdict, Ok(()));
    }
}
