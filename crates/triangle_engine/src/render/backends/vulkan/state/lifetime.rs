//! Resource dependency ledger
//!
//! Every object kind the renderer owns, together with the kinds it
//! references. A destruction sequence is valid when no object is destroyed
//! while something still alive references it.
//!
//! Each RAII wrapper reports its destruction through [`record_destruction`];
//! [`record_teardown`] collects those reports so the real drop order can be
//! checked with [`verify_destruction_order`].

use std::cell::RefCell;
use std::fmt;
use thiserror::Error;

thread_local! {
    static RECORDING: RefCell<Option<Vec<ResourceKind>>> = RefCell::new(None);
}

/// Note that an object of `kind` has just been destroyed
///
/// Does nothing unless a [`record_teardown`] is in progress on this thread.
pub fn record_destruction(kind: ResourceKind) {
    RECORDING.with(|recording| {
        if let Some(sequence) = recording.borrow_mut().as_mut() {
            sequence.push(kind);
        }
    });
}

/// Run `teardown` and return every destruction reported while it ran, in order
pub fn record_teardown<F: FnOnce()>(teardown: F) -> Vec<ResourceKind> {
    let outer = RECORDING.with(|recording| recording.replace(Some(Vec::new())));
    teardown();
    RECORDING
        .with(|recording| recording.replace(outer))
        .unwrap_or_default()
}

/// Kinds of objects owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// The native window the surface presents to
    Window,
    /// `VkInstance`
    Instance,
    /// `VkSurfaceKHR`
    Surface,
    /// `VkDevice`
    Device,
    /// `VkSwapchainKHR`
    Swapchain,
    /// `VkImageView` of a swapchain image
    ImageView,
    /// `VkShaderModule`
    ShaderModule,
    /// `VkRenderPass`
    RenderPass,
    /// `VkPipelineLayout`
    PipelineLayout,
    /// `VkPipeline`
    Pipeline,
    /// `VkFramebuffer`
    Framebuffer,
    /// `VkCommandPool` (frees its command buffers with it)
    CommandPool,
    /// `VkSemaphore`
    Semaphore,
    /// `VkFence`
    Fence,
}

impl ResourceKind {
    /// Kinds that must still be alive while an object of this kind exists
    pub fn references(self) -> &'static [ResourceKind] {
        use self::ResourceKind::*;
        match self {
            Window | Instance => &[],
            Surface => &[Instance, Window],
            Device => &[Instance],
            Swapchain => &[Device, Surface],
            ImageView => &[Device, Swapchain],
            ShaderModule | RenderPass | PipelineLayout | CommandPool | Semaphore | Fence => &[Device],
            Pipeline => &[Device, RenderPass, PipelineLayout, ShaderModule],
            Framebuffer => &[Device, RenderPass, ImageView],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A destruction sequence destroyed something too early
#[derive(Error, Debug, PartialEq, Eq)]
#[error("{destroyed} destroyed at position {position} while {dependent} at position {dependent_position} still references it")]
pub struct OrderViolation {
    /// Object destroyed too early
    pub destroyed: ResourceKind,
    /// Where it was destroyed
    pub position: usize,
    /// Later-destroyed object that references it
    pub dependent: ResourceKind,
    /// Where the dependent was destroyed
    pub dependent_position: usize,
}

/// Check that every object outlives everything that references it
pub fn verify_destruction_order(sequence: &[ResourceKind]) -> Result<(), OrderViolation> {
    for (position, &destroyed) in sequence.iter().enumerate() {
        let later = sequence.iter().enumerate().skip(position + 1);
        for (dependent_position, &dependent) in later {
            if dependent.references().contains(&destroyed) {
                return Err(OrderViolation {
                    destroyed,
                    position,
                    dependent,
                    dependent_position,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::ResourceKind::*;

    /// Stand-in for a wrapper: reports its kind when dropped
    struct Tracked(ResourceKind);

    impl Drop for Tracked {
        fn drop(&mut self) {
            record_destruction(self.0);
        }
    }

    #[allow(dead_code)]
    struct ImageTargets {
        framebuffer: Tracked,
        image_view: Tracked,
        swapchain: Tracked,
    }

    #[allow(dead_code)]
    struct MisorderedImageTargets {
        image_view: Tracked,
        framebuffer: Tracked,
        swapchain: Tracked,
    }

    #[test]
    fn test_recording_follows_field_order() {
        let targets = ImageTargets {
            swapchain: Tracked(Swapchain),
            image_view: Tracked(ImageView),
            framebuffer: Tracked(Framebuffer),
        };
        let sequence = record_teardown(|| drop(targets));
        assert_eq!(sequence, vec![Framebuffer, ImageView, Swapchain]);
        assert_eq!(verify_destruction_order(&sequence), Ok(()));
    }

    #[test]
    fn test_recording_catches_swapped_fields() {
        let targets = MisorderedImageTargets {
            image_view: Tracked(ImageView),
            framebuffer: Tracked(Framebuffer),
            swapchain: Tracked(Swapchain),
        };
        let sequence = record_teardown(|| drop(targets));
        let err = verify_destruction_order(&sequence).unwrap_err();
        assert_eq!((err.destroyed, err.dependent), (ImageView, Framebuffer));
    }

    #[test]
    fn test_destruction_outside_recording_is_ignored() {
        drop(Tracked(Fence));
        let sequence = record_teardown(|| drop(Tracked(Semaphore)));
        assert_eq!(sequence, vec![Semaphore]);
        drop(Tracked(Fence));
        assert!(record_teardown(|| {}).is_empty());
    }

    #[test]
    fn test_nested_recording_restores_outer() {
        let sequence = record_teardown(|| {
            drop(Tracked(Framebuffer));
            let inner = record_teardown(|| drop(Tracked(Pipeline)));
            assert_eq!(inner, vec![Pipeline]);
            drop(Tracked(RenderPass));
        });
        assert_eq!(sequence, vec![Framebuffer, RenderPass]);
    }

    #[test]
    fn test_reverse_creation_order_is_valid() {
        let sequence = [
            Fence, Semaphore, Semaphore, CommandPool, Framebuffer, Framebuffer, Pipeline, PipelineLayout,
            RenderPass, ShaderModule, ShaderModule, ImageView, ImageView, Swapchain, Device, Surface, Instance,
            Window,
        ];
        assert_eq!(verify_destruction_order(&sequence), Ok(()));
    }

    #[test]
    fn test_render_pass_before_pipeline_is_rejected() {
        let err = verify_destruction_order(&[RenderPass, Pipeline]).unwrap_err();
        assert_eq!(err.destroyed, RenderPass);
        assert_eq!(err.dependent, Pipeline);
        assert_eq!((err.position, err.dependent_position), (0, 1));
    }

    #[test]
    fn test_image_views_before_framebuffers_is_rejected() {
        let err = verify_destruction_order(&[ImageView, Framebuffer, Swapchain]).unwrap_err();
        assert_eq!(err.destroyed, ImageView);
        assert_eq!(err.dependent, Framebuffer);
    }

    #[test]
    fn test_device_before_surface_is_allowed() {
        // Surface and device both hang off the instance only
        assert!(verify_destruction_order(&[Device, Surface, Instance]).is_ok());
        assert!(verify_destruction_order(&[Instance, Surface]).is_err());
    }

    #[test]
    fn test_window_must_outlive_surface() {
        let err = verify_destruction_order(&[Device, Window, Surface, Instance]).unwrap_err();
        assert_eq!((err.destroyed, err.dependent), (Window, Surface));
        assert!(verify_destruction_order(&[Device, Surface, Instance, Window]).is_ok());
    }

    #[test]
    fn test_recording_catches_window_dropped_before_surface() {
        #[allow(dead_code)]
        struct Presentation {
            window: Tracked,
            surface: Tracked,
            instance: Tracked,
        }

        let presentation = Presentation {
            window: Tracked(Window),
            surface: Tracked(Surface),
            instance: Tracked(Instance),
        };
        let sequence = record_teardown(|| drop(presentation));
        assert_eq!(sequence, vec![Window, Surface, Instance]);
        assert!(verify_destruction_order(&sequence).is_err());
    }

    #[test]
    fn test_references_never_point_to_self() {
        let all = [
            Instance, Surface, Device, Swapchain, ImageView, ShaderModule, RenderPass, PipelineLayout, Pipeline,
            Framebuffer, CommandPool, Semaphore, Fence, Window,
        ];
        for kind in all {
            assert!(!kind.references().contains(&kind), "{kind} references itself");
        }
    }
}
