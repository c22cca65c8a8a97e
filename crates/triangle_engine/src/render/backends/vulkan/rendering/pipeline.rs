//! Fixed-function graphics pipeline
//!
//! The pipeline draws a hardcoded triangle: vertex positions live in the
//! vertex shader, so there is no vertex input, no descriptor set and no push
//! constant. Viewport and scissor are baked in at the swapchain extent.

use ash::{vk, Device};

use super::render_pass::RenderPass;
use super::shader::{ShaderBinaries, ShaderModule};
use crate::render::backends::vulkan::{record_destruction, ResourceKind, VulkanError, VulkanResult};

/// Pipeline layout wrapper with RAII cleanup
pub struct PipelineLayout {
    device: Device,
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Create a layout with no descriptor sets and no push constants
    pub fn empty(device: Device) -> VulkanResult<Self> {
        let layout_info = vk::PipelineLayoutCreateInfo::builder();
        let layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::creation("pipeline layout"))?
        };
        Ok(Self { device, layout })
    }

    /// Get layout handle
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline_layout(self.layout, None);
        }
        record_destruction(ResourceKind::PipelineLayout);
    }
}

/// Graphics pipeline wrapper with RAII cleanup
pub struct GraphicsPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    // Dropped after the pipeline handle is destroyed
    layout: PipelineLayout,
}

impl GraphicsPipeline {
    /// Create the triangle pipeline
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        vertex_shader: &ShaderModule,
        fragment_shader: &ShaderModule,
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let shader_stages = [
            vertex_shader.create_stage_info(vk::ShaderStageFlags::VERTEX),
            fragment_shader.create_stage_info(vk::ShaderStageFlags::FRAGMENT),
        ];

        // Positions are generated in the vertex shader
        let vertex_input_info = vk::PipelineVertexInputStateCreateInfo::builder();

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewport = vk::Viewport::builder()
            .x(0.0)
            .y(0.0)
            .width(extent.width as f32)
            .height(extent.height as f32)
            .min_depth(0.0)
            .max_depth(1.0)
            .build();

        let scissor = vk::Rect2D::builder()
            .offset(vk::Offset2D { x: 0, y: 0 })
            .extent(extent)
            .build();

        let viewports = [viewport];
        let scissors = [scissor];
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build();

        let color_blend_attachments = [color_blend_attachment];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let layout = PipelineLayout::empty(device.clone())?;

        // No depth/stencil state: the render pass has no depth attachment
        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_info)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .color_blend_state(&color_blending)
            .layout(layout.handle())
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info.build()], None)
                .map_err(|(_, err)| VulkanError::creation("graphics pipeline")(err))?
        };

        let pipeline = pipelines.into_iter().next().ok_or(VulkanError::ResourceCreation {
            resource: "graphics pipeline",
            result: vk::Result::ERROR_UNKNOWN,
        })?;

        Ok(Self {
            device,
            pipeline,
            layout,
        })
    }

    /// Get pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout.handle()
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
        }
        record_destruction(ResourceKind::Pipeline);
    }
}

/// The fixed rendering recipe: render pass, pipeline and the shader modules
/// the pipeline was built from.
///
/// Fields drop top to bottom: pipeline, render pass, then shader modules.
pub struct RenderPipeline {
    pipeline: GraphicsPipeline,
    render_pass: RenderPass,
    fragment_shader: ShaderModule,
    vertex_shader: ShaderModule,
}

impl RenderPipeline {
    /// Build the render pass and pipeline for a swapchain format and extent
    pub fn build(
        device: &Device,
        color_format: vk::Format,
        extent: vk::Extent2D,
        shaders: &ShaderBinaries,
    ) -> VulkanResult<Self> {
        let render_pass = RenderPass::new_present_pass(device.clone(), color_format)?;
        let vertex_shader = ShaderModule::from_words(device.clone(), &shaders.vertex)?;
        let fragment_shader = ShaderModule::from_words(device.clone(), &shaders.fragment)?;

        let pipeline = GraphicsPipeline::new(
            device.clone(),
            render_pass.handle(),
            &vertex_shader,
            &fragment_shader,
            extent,
        )?;

        log::info!("Graphics pipeline created for {:?} at {}x{}", color_format, extent.width, extent.height);

        Ok(Self {
            pipeline,
            render_pass,
            fragment_shader,
            vertex_shader,
        })
    }

    /// The graphics pipeline
    pub fn pipeline(&self) -> &GraphicsPipeline {
        &self.pipeline
    }

    /// The render pass the pipeline was built against
    pub fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }
}
