//! Physical device selection
//!
//! Walks the enumerated GPUs in order and keeps the first one that exposes a
//! graphics queue family, a family able to present to the window surface and
//! every required device extension. The selection logic is written against
//! the [`DeviceCandidate`] trait so it can be exercised without a GPU.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Instance};
use std::collections::HashSet;
use std::ffi::{CStr, CString};

use crate::render::backends::vulkan::{Surface, VulkanError, VulkanResult};

/// Device extensions every selected GPU must expose
pub fn required_device_extensions() -> [&'static CStr; 1] {
    [SwapchainLoader::name()]
}

/// Queue families chosen for graphics and presentation
///
/// Only ever constructed with both families resolved; a candidate whose scan
/// leaves either one unset is rejected instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// Family used for graphics command submission
    pub graphics_family: u32,
    /// Family used for presentation to the surface
    pub present_family: u32,
}

impl QueueFamilyIndices {
    /// Whether graphics and presentation share one queue family
    pub fn is_shared(&self) -> bool {
        self.graphics_family == self.present_family
    }

    /// Distinct family indices, graphics first
    pub fn unique_families(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics_family]
        } else {
            vec![self.graphics_family, self.present_family]
        }
    }
}

/// What the selector needs to know about one enumerated GPU
pub trait DeviceCandidate {
    /// Human readable device name, used for logging
    fn name(&self) -> String;

    /// Queue family properties in family-index order
    fn queue_families(&self) -> &[vk::QueueFamilyProperties];

    /// Whether the given queue family can present to the target surface
    fn supports_present(&self, family_index: u32) -> VulkanResult<bool>;

    /// Names of every device extension the candidate exposes
    fn extension_names(&self) -> VulkanResult<Vec<CString>>;
}

/// Scan queue families in index order, recording the first graphics family
/// and the first present family and stopping once both are known.
pub fn find_queue_families<C>(candidate: &C) -> VulkanResult<Option<QueueFamilyIndices>>
where
    C: DeviceCandidate + ?Sized,
{
    let mut graphics_family = None;
    let mut present_family = None;

    for (index, family) in (0u32..).zip(candidate.queue_families()) {
        if graphics_family.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            graphics_family = Some(index);
        }

        if present_family.is_none() && candidate.supports_present(index)? {
            present_family = Some(index);
        }

        if graphics_family.is_some() && present_family.is_some() {
            break;
        }
    }

    Ok(match (graphics_family, present_family) {
        (Some(graphics_family), Some(present_family)) => Some(QueueFamilyIndices {
            graphics_family,
            present_family,
        }),
        _ => None,
    })
}

/// True when removing every available name from the required set leaves it empty
pub fn has_required_extensions<'a, I>(required: &[&CStr], available: I) -> bool
where
    I: IntoIterator<Item = &'a CStr>,
{
    let mut missing: HashSet<&CStr> = required.iter().copied().collect();
    for name in available {
        missing.remove(name);
    }
    missing.is_empty()
}

/// Check one candidate; `None` means it does not qualify
pub fn evaluate_candidate<C>(candidate: &C) -> VulkanResult<Option<QueueFamilyIndices>>
where
    C: DeviceCandidate + ?Sized,
{
    let Some(indices) = find_queue_families(candidate)? else {
        log::debug!("Rejecting {}: missing graphics or present queue family", candidate.name());
        return Ok(None);
    };

    let extensions = candidate.extension_names()?;
    if !has_required_extensions(&required_device_extensions(), extensions.iter().map(CString::as_c_str)) {
        log::debug!("Rejecting {}: required device extensions not supported", candidate.name());
        return Ok(None);
    }

    Ok(Some(indices))
}

/// Return the first qualifying candidate together with its queue families
pub fn select_device<C, I>(candidates: I) -> VulkanResult<(C, QueueFamilyIndices)>
where
    C: DeviceCandidate,
    I: IntoIterator<Item = C>,
{
    let mut seen = 0usize;
    for candidate in candidates {
        seen += 1;
        if let Some(indices) = evaluate_candidate(&candidate)? {
            return Ok((candidate, indices));
        }
    }

    if seen == 0 {
        return Err(VulkanError::EnumerationEmpty { what: "GPUs with Vulkan support" });
    }
    Err(VulkanError::SelectionFailed(format!(
        "no suitable GPU among {seen} candidate(s)"
    )))
}

/// A physical device enumerated from a live instance
pub struct PhysicalDeviceCandidate<'a> {
    instance: &'a Instance,
    surface: &'a Surface,
    device: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    queue_families: Vec<vk::QueueFamilyProperties>,
}

impl<'a> PhysicalDeviceCandidate<'a> {
    /// Query the properties the selector needs for `device`
    pub fn new(instance: &'a Instance, surface: &'a Surface, device: vk::PhysicalDevice) -> Self {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(device) };
        Self {
            instance,
            surface,
            device,
            properties,
            queue_families,
        }
    }
}

impl DeviceCandidate for PhysicalDeviceCandidate<'_> {
    fn name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    fn queue_families(&self) -> &[vk::QueueFamilyProperties] {
        &self.queue_families
    }

    fn supports_present(&self, family_index: u32) -> VulkanResult<bool> {
        self.surface.supports_present(self.device, family_index)
    }

    fn extension_names(&self) -> VulkanResult<Vec<CString>> {
        let extensions = unsafe {
            self.instance
                .enumerate_device_extension_properties(self.device)
                .map_err(VulkanError::Api)?
        };
        Ok(extensions
            .iter()
            .map(|ext| unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) }.to_owned())
            .collect())
    }
}

/// The GPU chosen for rendering
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Available queue families
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    /// Resolved graphics and present queue families
    pub indices: QueueFamilyIndices,
}

impl PhysicalDeviceInfo {
    /// Select a suitable physical device for rendering to `surface`
    pub fn select_suitable_device(instance: &Instance, surface: &Surface) -> VulkanResult<Self> {
        let devices = unsafe { instance.enumerate_physical_devices().map_err(VulkanError::Api)? };
        log::debug!("Found {} physical device(s)", devices.len());

        let candidates = devices
            .into_iter()
            .map(|device| PhysicalDeviceCandidate::new(instance, surface, device));
        let (candidate, indices) = select_device(candidates)?;

        log::info!(
            "Selected GPU: {} (graphics family {}, present family {})",
            candidate.name(),
            indices.graphics_family,
            indices.present_family
        );

        Ok(Self {
            device: candidate.device,
            properties: candidate.properties,
            queue_families: candidate.queue_families,
            indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct MockCandidate {
        name: &'static str,
        families: Vec<vk::QueueFamilyProperties>,
        present: Vec<bool>,
        extensions: Vec<CString>,
        present_queries: RefCell<Vec<u32>>,
    }

    impl MockCandidate {
        fn new(name: &'static str, flags: &[vk::QueueFlags], present: &[bool]) -> Self {
            Self {
                name,
                families: flags
                    .iter()
                    .map(|&queue_flags| vk::QueueFamilyProperties {
                        queue_flags,
                        queue_count: 1,
                        ..Default::default()
                    })
                    .collect(),
                present: present.to_vec(),
                extensions: vec![SwapchainLoader::name().to_owned()],
                present_queries: RefCell::new(Vec::new()),
            }
        }

        fn without_extensions(mut self) -> Self {
            self.extensions.clear();
            self
        }
    }

    impl DeviceCandidate for MockCandidate {
        fn name(&self) -> String {
            self.name.to_string()
        }

        fn queue_families(&self) -> &[vk::QueueFamilyProperties] {
            &self.families
        }

        fn supports_present(&self, family_index: u32) -> VulkanResult<bool> {
            self.present_queries.borrow_mut().push(family_index);
            Ok(self.present[family_index as usize])
        }

        fn extension_names(&self) -> VulkanResult<Vec<CString>> {
            Ok(self.extensions.clone())
        }
    }

    const G: vk::QueueFlags = vk::QueueFlags::GRAPHICS;
    const T: vk::QueueFlags = vk::QueueFlags::TRANSFER;

    #[test]
    fn test_single_family_serves_both_roles() {
        let gpu = MockCandidate::new("gpu", &[G], &[true]);
        let (chosen, indices) = select_device(vec![gpu]).unwrap();
        assert_eq!(chosen.name, "gpu");
        assert_eq!(indices, QueueFamilyIndices { graphics_family: 0, present_family: 0 });
        assert!(indices.is_shared());
        assert_eq!(indices.unique_families(), vec![0]);
    }

    #[test]
    fn test_split_families_are_both_resolved_in_range() {
        let gpu = MockCandidate::new("gpu", &[T, G], &[true, false]);
        let family_count = gpu.families.len() as u32;
        let (_, indices) = select_device(vec![gpu]).unwrap();
        assert_eq!(indices.graphics_family, 1);
        assert_eq!(indices.present_family, 0);
        assert!(indices.graphics_family < family_count);
        assert!(indices.present_family < family_count);
        assert_eq!(indices.unique_families(), vec![1, 0]);
    }

    #[test]
    fn test_scan_stops_once_both_families_found() {
        let gpu = MockCandidate::new("gpu", &[G, G, G], &[true, true, true]);
        let indices = find_queue_families(&gpu).unwrap().unwrap();
        assert_eq!(indices.graphics_family, 0);
        assert_eq!(*gpu.present_queries.borrow(), vec![0]);
    }

    #[test]
    fn test_first_match_wins_for_each_role() {
        let gpu = MockCandidate::new("gpu", &[T, G, G], &[false, false, true]);
        let indices = find_queue_families(&gpu).unwrap().unwrap();
        assert_eq!(indices.graphics_family, 1);
        assert_eq!(indices.present_family, 2);
    }

    #[test]
    fn test_missing_present_family_rejects_candidate() {
        let gpu = MockCandidate::new("headless", &[G, T], &[false, false]);
        assert_eq!(find_queue_families(&gpu).unwrap(), None);
        assert!(matches!(select_device(vec![gpu]), Err(VulkanError::SelectionFailed(_))));
    }

    #[test]
    fn test_missing_graphics_family_rejects_candidate() {
        let gpu = MockCandidate::new("compute-only", &[T], &[true]);
        assert_eq!(find_queue_families(&gpu).unwrap(), None);
    }

    #[test]
    fn test_first_fully_qualified_candidate_is_chosen() {
        let candidates = vec![
            MockCandidate::new("no-swapchain", &[G], &[true]).without_extensions(),
            MockCandidate::new("no-present", &[G], &[false]),
            MockCandidate::new("good", &[T, G], &[false, true]),
            MockCandidate::new("also-good", &[G], &[true]),
        ];
        let (chosen, indices) = select_device(candidates).unwrap();
        assert_eq!(chosen.name, "good");
        assert_eq!(indices, QueueFamilyIndices { graphics_family: 1, present_family: 1 });
    }

    #[test]
    fn test_no_qualifying_candidate_fails_selection() {
        let candidates = vec![
            MockCandidate::new("a", &[G], &[true]).without_extensions(),
            MockCandidate::new("b", &[T], &[true]),
        ];
        assert!(matches!(select_device(candidates), Err(VulkanError::SelectionFailed(_))));
    }

    #[test]
    fn test_empty_enumeration_is_reported_separately() {
        let result = select_device(Vec::<MockCandidate>::new());
        assert!(matches!(result, Err(VulkanError::EnumerationEmpty { .. })));
    }

    #[test]
    fn test_extension_check_is_order_independent() {
        let a = CString::new("VK_KHR_a").unwrap();
        let b = CString::new("VK_KHR_b").unwrap();
        let extra = CString::new("VK_EXT_extra").unwrap();
        let required = [a.as_c_str(), b.as_c_str()];

        assert!(has_required_extensions(&required, [extra.as_c_str(), b.as_c_str(), a.as_c_str()]));
        assert!(!has_required_extensions(&required, [a.as_c_str(), extra.as_c_str()]));
        assert!(has_required_extensions(&[], std::iter::empty()));
    }
}
