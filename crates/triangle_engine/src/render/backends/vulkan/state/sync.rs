//! Vulkan synchronization primitives for GPU/CPU coordination
//!
//! Binary semaphores order the acquire → render → present chain on the GPU;
//! the fence lets the CPU know the single command buffer is free again.
//! Exactly one [`FrameSync`] exists, so at most one frame is in flight.

use ash::{vk, Device};

use crate::render::backends::vulkan::{record_destruction, ResourceKind, VulkanError, VulkanResult};

/// GPU-GPU synchronization primitive with automatic resource management
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create a new binary semaphore
    pub fn new(device: Device) -> VulkanResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();

        let semaphore = unsafe {
            device
                .create_semaphore(&create_info, None)
                .map_err(VulkanError::creation("semaphore"))?
        };

        Ok(Self { device, semaphore })
    }

    /// Get the semaphore handle
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
        record_destruction(ResourceKind::Semaphore);
    }
}

/// Fence wrapper with RAII cleanup
pub struct Fence {
    device: Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a new fence
    pub fn new(device: Device, signaled: bool) -> VulkanResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::builder().flags(flags);

        let fence = unsafe {
            device
                .create_fence(&create_info, None)
                .map_err(VulkanError::creation("fence"))?
        };

        Ok(Self { device, fence })
    }

    /// Block until the fence is signaled; there is no timeout
    pub fn wait(&self) -> VulkanResult<()> {
        unsafe {
            self.device
                .wait_for_fences(&[self.fence], true, u64::MAX)
                .map_err(VulkanError::Api)
        }
    }

    /// Return the fence to the unsignaled state
    pub fn reset(&self) -> VulkanResult<()> {
        unsafe { self.device.reset_fences(&[self.fence]).map_err(VulkanError::Api) }
    }

    /// Get the fence handle
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
        record_destruction(ResourceKind::Fence);
    }
}

/// Synchronization objects for the single frame in flight
pub struct FrameSync {
    /// Signaled when the acquired swapchain image is ready to be rendered to
    pub image_available: Semaphore,
    /// Signaled when rendering finishes; presentation waits on it
    pub render_finished: Semaphore,
    /// Signaled when the submitted command buffer has completed
    pub in_flight: Fence,
}

impl FrameSync {
    /// Create frame synchronization objects
    ///
    /// The fence starts signaled so the first frame does not wait forever.
    pub fn new(device: &Device) -> VulkanResult<Self> {
        let image_available = Semaphore::new(device.clone())?;
        let render_finished = Semaphore::new(device.clone())?;
        let in_flight = Fence::new(device.clone(), true)?;

        Ok(Self {
            image_available,
            render_finished,
            in_flight,
        })
    }
}
