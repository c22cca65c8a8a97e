//! Logical device creation
//!
//! Builds the `VkDevice` for the selected GPU and fetches the graphics and
//! present queues from the families chosen during selection.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device, Instance};

use super::device_selection::{required_device_extensions, PhysicalDeviceInfo, QueueFamilyIndices};
use crate::render::backends::vulkan::{record_destruction, ResourceKind, VulkanError, VulkanResult};

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue
    pub present_queue: vk::Queue,
    /// Queue families the queues were taken from
    pub indices: QueueFamilyIndices,
    /// Swapchain extension loader
    pub swapchain_loader: SwapchainLoader,
}

impl LogicalDevice {
    /// Create a new logical device with one queue per unique family
    pub fn new(instance: &Instance, physical_device: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let indices = physical_device.indices;
        let priorities = [1.0_f32];

        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = indices
            .unique_families()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let extension_ptrs: Vec<*const std::os::raw::c_char> = required_device_extensions()
            .iter()
            .map(|name| name.as_ptr())
            .collect();

        let device_features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&device_features);

        let device = unsafe {
            instance
                .create_device(physical_device.device, &create_info, None)
                .map_err(VulkanError::creation("logical device"))?
        };

        let graphics_queue = unsafe { device.get_device_queue(indices.graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(indices.present_family, 0) };

        let swapchain_loader = SwapchainLoader::new(instance, &device);

        log::debug!(
            "Logical device created with {} queue family(ies)",
            queue_infos.len()
        );

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            indices,
            swapchain_loader,
        })
    }

    /// Block until the device has no outstanding work
    pub fn wait_idle(&self) -> VulkanResult<()> {
        unsafe { self.device.device_wait_idle().map_err(VulkanError::Api) }
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        log::debug!("Destroying logical device");
        unsafe {
            // Ensure device is idle before destruction
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
        record_destruction(ResourceKind::Device);
    }
}
