//! The bundle of references a task's execution-phase closure receives: the
//! device context, the texture manager (to resolve images/views and begin
//! transient render passes), the pipeline cache, and the command buffer the
//! whole frame is being recorded into.

use ash::vk;

use crate::context::Context;
use crate::pipeline_cache::PipelineCache;
use crate::texture_manager::TextureManager;

pub struct RenderInput<'a> {
    pub context: &'a Context,
    pub textures: &'a mut TextureManager,
    pub pipelines: &'a mut PipelineCache,
    pub command_buffer: vk::CommandBuffer,
}
