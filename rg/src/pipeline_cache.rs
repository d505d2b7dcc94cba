//! Pipeline objects for transient render passes are expensive to create and
//! cheap to key by their shape, so they are cached by a hash of that shape
//! rather than recreated every frame.

use std::collections::HashMap;

use ash::vk;
use ash::vk::Handle;

use crate::error::Result;
use crate::shader::Shader;

/// The shape of a raster pipeline built for dynamic rendering: enough to
/// uniquely determine the `VkPipeline` that would be created for it.
#[derive(Clone)]
pub struct PipelineDescriptor {
    pub vertex_shader: vk::ShaderModule,
    pub fragment_shader: Option<vk::ShaderModule>,
    pub sample_count: vk::SampleCountFlags,
    pub color_formats: Vec<vk::Format>,
    pub depth_format: Option<vk::Format>,
    pub stencil_format: Option<vk::Format>,
}

/// Fixed-size, POD view of a [`PipelineDescriptor`]'s non-variable-length
/// fields, so they can be hashed via a single `bytemuck::bytes_of` rather
/// than pushed one primitive at a time.
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct PipelineDescriptorHeader {
    vertex_shader: u64,
    fragment_shader: u64,
    sample_count: u32,
    depth_format: i32,
    stencil_format: i32,
    _pad: u32,
}

impl PipelineDescriptor {
    pub fn hash(&self) -> u64 {
        let header = PipelineDescriptorHeader {
            vertex_shader: self.vertex_shader.as_raw(),
            fragment_shader: self.fragment_shader.map(|m| m.as_raw()).unwrap_or(0),
            sample_count: self.sample_count.as_raw(),
            depth_format: self.depth_format.map(|f| f.as_raw()).unwrap_or(-1),
            stencil_format: self.stencil_format.map(|f| f.as_raw()).unwrap_or(-1),
            _pad: 0,
        };
        let color_formats: Vec<i32> = self.color_formats.iter().map(|f| f.as_raw()).collect();

        let mut bytes = Vec::with_capacity(64);
        bytes.extend_from_slice(bytemuck::bytes_of(&header));
        bytes.extend_from_slice(bytemuck::cast_slice(&color_formats));
        wyhash::wyhash(&bytes, 0x5EED)
    }
}

/// Caches raster pipelines for dynamic rendering, keyed by
/// [`PipelineDescriptor::hash`]. Pipelines live until the cache is dropped.
pub struct PipelineCache {
    pipelines: HashMap<u64, vk::Pipeline>,
    layout: vk::PipelineLayout,
}

impl PipelineCache {
    pub fn new(layout: vk::PipelineLayout) -> Self {
        Self {
            pipelines: HashMap::new(),
            layout,
        }
    }

    /// Returns the cached pipeline for `descriptor`, building it with
    /// dynamic rendering + mostly-dynamic raster state if it isn't cached
    /// yet.
    pub fn get_or_create(
        &mut self,
        device: &ash::Device,
        name: &str,
        descriptor: &PipelineDescriptor,
        vertex_entry: &Shader,
        fragment_entry: Option<&Shader>,
    ) -> Result<vk::Pipeline> {
        let key = descriptor.hash();
        if let Some(&pipeline) = self.pipelines.get(&key) {
            return Ok(pipeline);
        }

        log::debug!("creating new pipeline for `{}` ({:x})", name, key);
        let pipeline = self.create_pipeline(device, descriptor, vertex_entry, fragment_entry)?;
        self.pipelines.insert(key, pipeline);
        Ok(pipeline)
    }

    fn create_pipeline(
        &self,
        device: &ash::Device,
        descriptor: &PipelineDescriptor,
        vertex_entry: &Shader,
        fragment_entry: Option<&Shader>,
    ) -> Result<vk::Pipeline> {
        let entry_name = std::ffi::CString::new("main").unwrap();

        let mut stages = vec![vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex_entry.module)
            .name(&entry_name)
            .build()];
        if let Some(frag) = fragment_entry {
            stages.push(
                vk::PipelineShaderStageCreateInfo::builder()
                    .stage(vk::ShaderStageFlags::FRAGMENT)
                    .module(frag.module)
                    .name(&entry_name)
                    .build(),
            );
        }

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST);
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);
        let rasterization = vk::PipelineRasterizationStateCreateInfo::builder()
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0);
        let multisample = vk::PipelineMultisampleStateCreateInfo::builder()
            .rasterization_samples(descriptor.sample_count);
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS);
        let color_blend_attachments: Vec<_> = descriptor
            .color_formats
            .iter()
            .map(|_| {
                vk::PipelineColorBlendAttachmentState::builder()
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
                    .build()
            })
            .collect();
        let color_blend =
            vk::PipelineColorBlendStateCreateInfo::builder().attachments(&color_blend_attachments);

        let dynamic_states = [
            vk::DynamicState::VIEWPORT,
            vk::DynamicState::SCISSOR,
            vk::DynamicState::CULL_MODE,
            vk::DynamicState::DEPTH_TEST_ENABLE,
            vk::DynamicState::DEPTH_WRITE_ENABLE,
            vk::DynamicState::DEPTH_COMPARE_OP,
        ];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let mut rendering_info = vk::PipelineRenderingCreateInfo::builder()
            .color_attachment_formats(&descriptor.color_formats)
            .depth_attachment_format(descriptor.depth_format.unwrap_or(vk::Format::UNDEFINED))
            .stencil_attachment_format(descriptor.stencil_format.unwrap_or(vk::Format::UNDEFINED));

        let create_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(self.layout)
            .push_next(&mut rendering_info);

        let pipelines = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info.build()], None)
        }
        .map_err(|(_, e)| e)?;

        Ok(pipelines[0])
    }

    pub fn destroy(&mut self, device: &ash::Device) {
        for (_, pipeline) in self.pipelines.drain() {
            unsafe { device.destroy_pipeline(pipeline, None) };
        }
    }
}
