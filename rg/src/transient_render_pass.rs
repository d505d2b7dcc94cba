//! Dynamic-rendering (`VK_KHR_dynamic_rendering`) based render passes that
//! live for exactly one task: no `VkRenderPass`/`VkFramebuffer` objects, just
//! a begin/end pair around the task's draw commands.

use ash::vk;

use crate::error::{FramegraphError, Result};
use crate::pipeline_cache::{PipelineCache, PipelineDescriptor};
use crate::shader::Shader;
use crate::texture::TransientTextureHandle;
use crate::texture_manager::TextureManager;

/// Load/store policy and clear value for one attachment.
#[derive(Clone, Copy)]
pub struct AttachmentKind {
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub clear_value: vk::ClearValue,
}

impl AttachmentKind {
    pub fn clear_color(color: [f32; 4]) -> Self {
        Self {
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            clear_value: vk::ClearValue {
                color: vk::ClearColorValue { float32: color },
            },
        }
    }

    pub fn clear_depth(depth: f32) -> Self {
        Self {
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            clear_value: vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth, stencil: 0 },
            },
        }
    }

    pub fn load_store() -> Self {
        Self {
            load_op: vk::AttachmentLoadOp::LOAD,
            store_op: vk::AttachmentStoreOp::STORE,
            clear_value: vk::ClearValue::default(),
        }
    }
}

/// Assembled during the declare phase, consumed at `begin()` during
/// execution once the texture manager has concrete images/views to offer.
pub struct TransientRenderPassBuilder {
    name: String,
    color_attachments: Vec<(TransientTextureHandle, AttachmentKind)>,
    depth_attachment: Option<(TransientTextureHandle, AttachmentKind)>,
    stencil_attachment: Option<(TransientTextureHandle, AttachmentKind)>,
}

impl TransientRenderPassBuilder {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            color_attachments: Vec::new(),
            depth_attachment: None,
            stencil_attachment: None,
        }
    }

    pub fn attach(mut self, handle: TransientTextureHandle, kind: AttachmentKind) -> Self {
        self.color_attachments.push((handle, kind));
        self
    }

    pub fn attach_depth(mut self, handle: TransientTextureHandle, kind: AttachmentKind) -> Self {
        self.depth_attachment = Some((handle, kind));
        self
    }

    pub fn attach_stencil(mut self, handle: TransientTextureHandle, kind: AttachmentKind) -> Self {
        self.stencil_attachment = Some((handle, kind));
        self
    }

    pub fn finish(self) -> TransientRenderPassInfo {
        TransientRenderPassInfo {
            name: self.name,
            color_attachments: self.color_attachments,
            depth_attachment: self.depth_attachment,
            stencil_attachment: self.stencil_attachment,
            render_area: None,
        }
    }
}

/// A configured-but-not-yet-begun transient render pass.
pub struct TransientRenderPassInfo {
    pub name: String,
    pub color_attachments: Vec<(TransientTextureHandle, AttachmentKind)>,
    pub depth_attachment: Option<(TransientTextureHandle, AttachmentKind)>,
    pub stencil_attachment: Option<(TransientTextureHandle, AttachmentKind)>,
    pub render_area: Option<vk::Rect2D>,
}

/// A render pass that has been `begin()`-ed and not yet `end()`-ed.
pub struct TransientRenderPass {
    name: String,
    has_begun: bool,
    pipeline: vk::Pipeline,
}

impl TransientRenderPass {
    /// The pipeline bound for this pass, in case a task needs to rebind it
    /// (e.g. after an intervening `vkCmdBindDescriptorSets`).
    pub fn pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl TransientRenderPassInfo {
    /// Builds the attachment infos, resolves (or builds) the pipeline for
    /// this pass's shape, and issues `vkCmdBeginRendering`.
    pub fn begin(
        &self,
        device: &ash::Device,
        cmd: vk::CommandBuffer,
        textures: &TextureManager,
        pipelines: &mut PipelineCache,
        vertex_shader: &Shader,
        fragment_shader: Option<&Shader>,
    ) -> Result<TransientRenderPass> {
        let sample_count = self.determine_sample_count(textures)?;
        let render_area = match self.render_area {
            Some(area) => area,
            None => self.determine_render_area(textures)?,
        };

        let mut color_infos = Vec::with_capacity(self.color_attachments.len());
        let mut color_formats = Vec::with_capacity(self.color_attachments.len());
        for (handle, kind) in &self.color_attachments {
            let texture = crate::texture::TextureHandle::new(handle.texture);
            let info = textures.info(texture)?;
            color_formats.push(info.format.as_vk());
            let layout = textures.state(texture)?.last_access.image_layout;
            color_infos.push(
                vk::RenderingAttachmentInfo::builder()
                    .image_view(textures.image_view(texture)?)
                    .image_layout(layout)
                    .load_op(kind.load_op)
                    .store_op(kind.store_op)
                    .clear_value(kind.clear_value)
                    .build(),
            );
        }

        let mut depth_info = None;
        let mut depth_format = None;
        if let Some((handle, kind)) = &self.depth_attachment {
            let texture = crate::texture::TextureHandle::new(handle.texture);
            depth_format = Some(textures.info(texture)?.format.as_vk());
            let layout = textures.state(texture)?.last_access.image_layout;
            depth_info = Some(
                vk::RenderingAttachmentInfo::builder()
                    .image_view(textures.image_view(texture)?)
                    .image_layout(layout)
                    .load_op(kind.load_op)
                    .store_op(kind.store_op)
                    .clear_value(kind.clear_value)
                    .build(),
            );
        }

        let stencil_format = match &self.stencil_attachment {
            Some((handle, _)) => {
                let texture = crate::texture::TextureHandle::new(handle.texture);
                Some(textures.info(texture)?.format.as_vk())
            }
            None => None,
        };

        let descriptor = PipelineDescriptor {
            vertex_shader: vertex_shader.module,
            fragment_shader: fragment_shader.map(|s| s.module),
            sample_count,
            color_formats,
            depth_format,
            stencil_format,
        };
        let pipeline = pipelines.get_or_create(device, &self.name, &descriptor, vertex_shader, fragment_shader)?;

        let mut rendering_info = vk::RenderingInfo::builder()
            .render_area(render_area)
            .layer_count(1)
            .color_attachments(&color_infos);
        if let Some(depth) = depth_info.as_ref() {
            rendering_info = rendering_info.depth_attachment(depth);
        }
        let rendering_info = rendering_info.build();

        unsafe {
            device.cmd_begin_rendering(cmd, &rendering_info);
            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline);
        }

        Ok(TransientRenderPass {
            name: self.name.clone(),
            has_begun: true,
            pipeline,
        })
    }

    fn determine_sample_count(&self, textures: &TextureManager) -> Result<vk::SampleCountFlags> {
        let handles = self
            .color_attachments
            .iter()
            .map(|(h, _)| *h)
            .chain(self.depth_attachment.iter().map(|(h, _)| *h))
            .chain(self.stencil_attachment.iter().map(|(h, _)| *h));

        let mut sample_count = None;
        for handle in handles {
            let texture = crate::texture::TextureHandle::new(handle.texture);
            let count = textures.info(texture)?.sample_count;
            match sample_count {
                None => sample_count = Some(count),
                Some(expected) if expected != count => {
                    return Err(FramegraphError::AllocationFailed(format!(
                        "render pass `{}` has inconsistent sample counts across attachments ({:?} vs {:?})",
                        self.name, expected, count
                    )))
                }
                Some(_) => {}
            }
        }

        sample_count.ok_or_else(|| {
            FramegraphError::AllocationFailed(format!(
                "render pass `{}` has no attachments to determine sample count from",
                self.name
            ))
        })
    }

    fn determine_render_area(&self, textures: &TextureManager) -> Result<vk::Rect2D> {
        let handle = self
            .color_attachments
            .first()
            .map(|(h, _)| *h)
            .or_else(|| self.depth_attachment.as_ref().map(|(h, _)| *h))
            .ok_or_else(|| {
                FramegraphError::AllocationFailed(format!(
                    "render pass `{}` has no attachments to determine render area from",
                    self.name
                ))
            })?;
        let texture = crate::texture::TextureHandle::new(handle.texture);
        let (width, height, _) = textures.info(texture)?.size;
        Ok(vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D { width, height },
        })
    }
}

impl TransientRenderPass {
    pub fn end(mut self, device: &ash::Device, cmd: vk::CommandBuffer) {
        unsafe { device.cmd_end_rendering(cmd) };
        self.has_begun = false;
    }
}

impl Drop for TransientRenderPass {
    fn drop(&mut self) {
        if self.has_begun {
            log::warn!("transient render pass `{}` dropped without end()", self.name);
        }
    }
}
