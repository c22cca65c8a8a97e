//! Per-frame command recording and submission
//!
//! A single frame is in flight at a time. Each frame waits for the previous
//! submission, acquires a swapchain image, re-records the one command buffer,
//! submits it and queues the image for presentation.

use ash::{vk, Device};

use super::initialization::LogicalDevice;
use super::rendering::{CommandPool, CommandRecorder, RenderPipeline};
use super::state::{FrameSync, Framebuffers, Swapchain};
use super::{VulkanError, VulkanResult};

/// The individual steps of one frame, in the order [`drive_frame`] runs them
pub trait FrameSteps {
    /// Block until the previous submission has signaled the in-flight fence
    fn wait_for_previous(&mut self) -> VulkanResult<()>;

    /// Acquire the next swapchain image; returns `(index, suboptimal)`
    fn acquire(&mut self) -> VulkanResult<(u32, bool)>;

    /// Reset and re-record the command buffer for `image_index`
    fn record(&mut self, image_index: u32) -> VulkanResult<vk::CommandBuffer>;

    /// Return the in-flight fence to the unsignaled state
    fn reset_fence(&mut self) -> VulkanResult<()>;

    /// Submit `command_buffer` with the in-flight fence attached
    fn submit(&mut self, command_buffer: vk::CommandBuffer) -> VulkanResult<()>;

    /// Queue `image_index` for presentation; returns whether the swapchain is suboptimal
    fn present(&mut self, image_index: u32) -> VulkanResult<bool>;
}

/// Run one frame and return the presented image index
///
/// The fence is reset only once recording has succeeded and the submit that
/// signals it is next. Any earlier failure leaves it signaled, so the next
/// wait cannot block forever.
pub fn drive_frame<S: FrameSteps + ?Sized>(steps: &mut S) -> VulkanResult<u32> {
    steps.wait_for_previous()?;

    let (image_index, suboptimal) = steps.acquire()?;
    if suboptimal {
        log::warn!("Acquired image {image_index} from a suboptimal swapchain");
    }

    let command_buffer = steps.record(image_index)?;

    steps.reset_fence()?;
    steps.submit(command_buffer)?;

    if steps.present(image_index)? {
        log::warn!("Presented image {image_index} to a suboptimal swapchain");
    }

    Ok(image_index)
}

/// Records and submits frames
///
/// Fields drop top to bottom: sync objects, then the command pool, which frees
/// the command buffer with it.
pub struct FrameExecutor {
    sync: FrameSync,
    recorder: CommandRecorder,
    #[allow(dead_code)] // Owns the recorder's command buffer
    command_pool: CommandPool,
    device: Device,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    clear_color: [f32; 4],
    frames_submitted: u64,
}

impl FrameExecutor {
    /// Create the command pool, command buffer and sync objects
    pub fn new(device: &LogicalDevice, clear_color: [f32; 4]) -> VulkanResult<Self> {
        let command_pool = CommandPool::new(device.device.clone(), device.indices.graphics_family)?;
        let command_buffer = command_pool.allocate_primary()?;
        let recorder = CommandRecorder::new(command_buffer, device.device.clone());
        let sync = FrameSync::new(&device.device)?;

        Ok(Self {
            sync,
            recorder,
            command_pool,
            device: device.device.clone(),
            graphics_queue: device.graphics_queue,
            present_queue: device.present_queue,
            clear_color,
            frames_submitted: 0,
        })
    }

    /// Record the triangle draw targeting one swapchain image
    pub fn record_frame(
        &mut self,
        image_index: u32,
        swapchain: &Swapchain,
        framebuffers: &Framebuffers,
        pipeline: &RenderPipeline,
    ) -> VulkanResult<vk::CommandBuffer> {
        let framebuffer = framebuffers.get(image_index)?;
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: swapchain.extent(),
        };
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: self.clear_color,
            },
        }];

        self.recorder.begin()?;
        {
            let mut pass = self.recorder.begin_render_pass(
                pipeline.render_pass().handle(),
                framebuffer,
                render_area,
                &clear_values,
            )?;
            pass.bind_graphics_pipeline(pipeline.pipeline().handle());
            pass.draw(3, 1, 0, 0);
        }
        self.recorder.end()
    }

    /// Render and present one frame
    ///
    /// A suboptimal swapchain is reported and otherwise ignored; an
    /// out-of-date swapchain surfaces as [`VulkanError::Api`].
    pub fn draw_frame(
        &mut self,
        swapchain: &Swapchain,
        framebuffers: &Framebuffers,
        pipeline: &RenderPipeline,
    ) -> VulkanResult<()> {
        let image_index = drive_frame(&mut LiveFrame {
            executor: &mut *self,
            swapchain,
            framebuffers,
            pipeline,
        })?;

        self.frames_submitted += 1;
        log::trace!("Frame {} presented on image {image_index}", self.frames_submitted);
        Ok(())
    }

    /// Number of frames submitted so far
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }
}

/// [`FrameSteps`] against the real device and swapchain
struct LiveFrame<'a> {
    executor: &'a mut FrameExecutor,
    swapchain: &'a Swapchain,
    framebuffers: &'a Framebuffers,
    pipeline: &'a RenderPipeline,
}

impl FrameSteps for LiveFrame<'_> {
    fn wait_for_previous(&mut self) -> VulkanResult<()> {
        self.executor.sync.in_flight.wait()
    }

    fn acquire(&mut self) -> VulkanResult<(u32, bool)> {
        unsafe {
            self.swapchain
                .loader()
                .acquire_next_image(
                    self.swapchain.handle(),
                    u64::MAX,
                    self.executor.sync.image_available.handle(),
                    vk::Fence::null(),
                )
                .map_err(VulkanError::Api)
        }
    }

    fn record(&mut self, image_index: u32) -> VulkanResult<vk::CommandBuffer> {
        self.executor.recorder.reset()?;
        self.executor
            .record_frame(image_index, self.swapchain, self.framebuffers, self.pipeline)
    }

    fn reset_fence(&mut self) -> VulkanResult<()> {
        self.executor.sync.in_flight.reset()
    }

    fn submit(&mut self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        let sync = &self.executor.sync;
        let wait_semaphores = [sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [sync.render_finished.handle()];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.executor
                .device
                .queue_submit(self.executor.graphics_queue, &[submit_info.build()], sync.in_flight.handle())
                .map_err(VulkanError::Api)
        }
    }

    fn present(&mut self, image_index: u32) -> VulkanResult<bool> {
        let wait_semaphores = [self.executor.sync.render_finished.handle()];
        let swapchains = [self.swapchain.handle()];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            self.swapchain
                .loader()
                .queue_present(self.executor.present_queue, &present_info)
                .map_err(VulkanError::Api)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Step {
        Wait,
        Acquire,
        Record,
        ResetFence,
        Submit,
        Present,
    }

    /// Logs every step and fails the one named in `fail_at`
    #[derive(Default)]
    struct ScriptedFrame {
        steps: Vec<Step>,
        fail_at: Option<Step>,
        suboptimal: bool,
    }

    impl ScriptedFrame {
        fn failing_at(step: Step) -> Self {
            Self { fail_at: Some(step), ..Self::default() }
        }

        fn step(&mut self, step: Step) -> VulkanResult<()> {
            self.steps.push(step);
            if self.fail_at == Some(step) {
                return Err(VulkanError::Api(vk::Result::ERROR_DEVICE_LOST));
            }
            Ok(())
        }
    }

    impl FrameSteps for ScriptedFrame {
        fn wait_for_previous(&mut self) -> VulkanResult<()> {
            self.step(Step::Wait)
        }

        fn acquire(&mut self) -> VulkanResult<(u32, bool)> {
            self.step(Step::Acquire)?;
            Ok((2, self.suboptimal))
        }

        fn record(&mut self, image_index: u32) -> VulkanResult<vk::CommandBuffer> {
            assert_eq!(image_index, 2);
            self.step(Step::Record)?;
            Ok(vk::CommandBuffer::null())
        }

        fn reset_fence(&mut self) -> VulkanResult<()> {
            self.step(Step::ResetFence)
        }

        fn submit(&mut self, _command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
            self.step(Step::Submit)
        }

        fn present(&mut self, image_index: u32) -> VulkanResult<bool> {
            assert_eq!(image_index, 2);
            self.step(Step::Present)?;
            Ok(self.suboptimal)
        }
    }

    #[test]
    fn test_fence_reset_immediately_precedes_submit() {
        let mut frame = ScriptedFrame::default();
        assert_eq!(drive_frame(&mut frame).unwrap(), 2);
        assert_eq!(
            frame.steps,
            [Step::Wait, Step::Acquire, Step::Record, Step::ResetFence, Step::Submit, Step::Present]
        );
    }

    #[test]
    fn test_failed_recording_leaves_fence_signaled() {
        let mut frame = ScriptedFrame::failing_at(Step::Record);
        assert!(drive_frame(&mut frame).is_err());
        assert!(!frame.steps.contains(&Step::ResetFence));
        assert_eq!(frame.steps.last(), Some(&Step::Record));
    }

    #[test]
    fn test_failed_acquire_stops_before_recording() {
        let mut frame = ScriptedFrame::failing_at(Step::Acquire);
        assert!(matches!(drive_frame(&mut frame), Err(VulkanError::Api(vk::Result::ERROR_DEVICE_LOST))));
        assert_eq!(frame.steps, [Step::Wait, Step::Acquire]);
    }

    #[test]
    fn test_suboptimal_swapchain_still_presents() {
        let mut frame = ScriptedFrame { suboptimal: true, ..ScriptedFrame::default() };
        assert_eq!(drive_frame(&mut frame).unwrap(), 2);
        assert_eq!(frame.steps.last(), Some(&Step::Present));
    }
}
