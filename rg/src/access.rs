//! Named pipeline-stage/access-mask/layout triples used to derive Vulkan barriers.
//!
//! Modeled on the `ImageAccessType`/`BufferAccessType` enums used by render graphs
//! in the wild (rather than hand-deriving stage/access masks at every call site):
//! each [`AccessType`] bakes in the `VkPipelineStageFlags2`/`VkAccessFlags2`/`VkImageLayout`
//! triple for one well-known way a resource is touched on the GPU timeline.

use ash::vk;

/// A named way a resource can be accessed by the GPU. Carries enough information
/// to build one side of a `VkImageMemoryBarrier2`/`VkBufferMemoryBarrier2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// No access at all; the initial state of a freshly allocated resource.
    Nothing,

    // -- command buffer / host --
    HostRead,
    HostWrite,

    // -- indirect / input --
    IndirectBuffer,
    IndexBuffer,
    VertexBuffer,

    // -- vertex stage --
    VertexShaderReadUniformBuffer,
    VertexShaderReadSampledImage,
    VertexShaderReadOther,

    // -- tessellation / geometry, read-only, coarse-grained --
    TessellationControlShaderReadUniformBuffer,
    TessellationControlShaderReadSampledImage,
    TessellationControlShaderReadOther,
    TessellationEvaluationShaderReadUniformBuffer,
    TessellationEvaluationShaderReadSampledImage,
    TessellationEvaluationShaderReadOther,
    GeometryShaderReadUniformBuffer,
    GeometryShaderReadSampledImage,
    GeometryShaderReadOther,

    // -- fragment stage --
    FragmentShaderReadUniformBuffer,
    FragmentShaderReadSampledImage,
    FragmentShaderReadColorInputAttachment,
    FragmentShaderReadDepthStencilInputAttachment,
    FragmentShaderReadOther,

    // -- color / depth attachments --
    ColorAttachmentRead,
    ColorAttachmentWrite,
    DepthStencilAttachmentRead,
    DepthStencilAttachmentWrite,
    DepthAttachmentWriteStencilReadOnly,
    StencilAttachmentWriteDepthReadOnly,

    // -- compute --
    ComputeShaderReadUniformBuffer,
    ComputeShaderReadSampledImage,
    ComputeShaderReadOther,
    ComputeShaderWrite,

    // -- any-shader, generic --
    AnyShaderReadUniformBuffer,
    AnyShaderReadUniformBufferOrVertexBuffer,
    AnyShaderReadSampledImage,
    AnyShaderReadOther,
    AnyShaderWrite,

    // -- transfer --
    TransferRead,
    TransferWrite,

    // -- presentation --
    Present,

    // -- raster/color resolve --
    ColorAttachmentReadWrite,

    /// Force the resource's layout to `GENERAL` regardless of the access itself;
    /// used by storage-image style read/write-in-place shaders.
    General,
}

/// The static metadata one [`AccessType`] carries: the pipeline stage(s) and
/// memory access(es) it performs, the image layout it requires (if any), and
/// whether it writes.
#[derive(Debug, Clone, Copy)]
pub struct AccessInfo {
    pub stage_mask: vk::PipelineStageFlags2,
    pub access_mask: vk::AccessFlags2,
    pub image_layout: vk::ImageLayout,
    pub is_write: bool,
}

impl AccessType {
    /// Returns the static stage/access/layout metadata for this access type.
    pub fn info(self) -> AccessInfo {
        use vk::AccessFlags2 as A;
        use vk::ImageLayout as L;
        use vk::PipelineStageFlags2 as S;

        let (stage_mask, access_mask, image_layout, is_write) = match self {
            AccessType::Nothing => (S::NONE, A::NONE, L::UNDEFINED, false),

            AccessType::HostRead => (S::HOST, A::HOST_READ, L::GENERAL, false),
            AccessType::HostWrite => (S::HOST, A::HOST_WRITE, L::GENERAL, true),

            AccessType::IndirectBuffer => {
                (S::DRAW_INDIRECT, A::INDIRECT_COMMAND_READ, L::UNDEFINED, false)
            }
            AccessType::IndexBuffer => (S::INDEX_INPUT, A::INDEX_READ, L::UNDEFINED, false),
            AccessType::VertexBuffer => {
                (S::VERTEX_ATTRIBUTE_INPUT, A::VERTEX_ATTRIBUTE_READ, L::UNDEFINED, false)
            }

            AccessType::VertexShaderReadUniformBuffer => {
                (S::VERTEX_SHADER, A::UNIFORM_READ, L::UNDEFINED, false)
            }
            AccessType::VertexShaderReadSampledImage => {
                (S::VERTEX_SHADER, A::SHADER_READ, L::SHADER_READ_ONLY_OPTIMAL, false)
            }
            AccessType::VertexShaderReadOther => (S::VERTEX_SHADER, A::SHADER_READ, L::GENERAL, false),

            AccessType::TessellationControlShaderReadUniformBuffer => {
                (S::TESSELLATION_CONTROL_SHADER, A::UNIFORM_READ, L::UNDEFINED, false)
            }
            AccessType::TessellationControlShaderReadSampledImage => (
                S::TESSELLATION_CONTROL_SHADER,
                A::SHADER_READ,
                L::SHADER_READ_ONLY_OPTIMAL,
                false,
            ),
            AccessType::TessellationControlShaderReadOther => {
                (S::TESSELLATION_CONTROL_SHADER, A::SHADER_READ, L::GENERAL, false)
            }
            AccessType::TessellationEvaluationShaderReadUniformBuffer => {
                (S::TESSELLATION_EVALUATION_SHADER, A::UNIFORM_READ, L::UNDEFINED, false)
            }
            AccessType::TessellationEvaluationShaderReadSampledImage => (
                S::TESSELLATION_EVALUATION_SHADER,
                A::SHADER_READ,
                L::SHADER_READ_ONLY_OPTIMAL,
                false,
            ),
            AccessType::TessellationEvaluationShaderReadOther => {
                (S::TESSELLATION_EVALUATION_SHADER, A::SHADER_READ, L::GENERAL, false)
            }
            AccessType::GeometryShaderReadUniformBuffer => {
                (S::GEOMETRY_SHADER, A::UNIFORM_READ, L::UNDEFINED, false)
            }
            AccessType::GeometryShaderReadSampledImage => {
                (S::GEOMETRY_SHADER, A::SHADER_READ, L::SHADER_READ_ONLY_OPTIMAL, false)
            }
            AccessType::GeometryShaderReadOther => {
                (S::GEOMETRY_SHADER, A::SHADER_READ, L::GENERAL, false)
            }

            AccessType::FragmentShaderReadUniformBuffer => {
                (S::FRAGMENT_SHADER, A::UNIFORM_READ, L::UNDEFINED, false)
            }
            AccessType::FragmentShaderReadSampledImage => {
                (S::FRAGMENT_SHADER, A::SHADER_READ, L::SHADER_READ_ONLY_OPTIMAL, false)
            }
            AccessType::FragmentShaderReadColorInputAttachment => (
                S::FRAGMENT_SHADER,
                A::INPUT_ATTACHMENT_READ,
                L::SHADER_READ_ONLY_OPTIMAL,
                false,
            ),
            AccessType::FragmentShaderReadDepthStencilInputAttachment => (
                S::FRAGMENT_SHADER,
                A::INPUT_ATTACHMENT_READ,
                L::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
                false,
            ),
            AccessType::FragmentShaderReadOther => {
                (S::FRAGMENT_SHADER, A::SHADER_READ, L::GENERAL, false)
            }

            AccessType::ColorAttachmentRead => (
                S::COLOR_ATTACHMENT_OUTPUT,
                A::COLOR_ATTACHMENT_READ,
                L::COLOR_ATTACHMENT_OPTIMAL,
                false,
            ),
            AccessType::ColorAttachmentWrite => (
                S::COLOR_ATTACHMENT_OUTPUT,
                A::COLOR_ATTACHMENT_WRITE,
                L::COLOR_ATTACHMENT_OPTIMAL,
                true,
            ),
            AccessType::ColorAttachmentReadWrite => (
                S::COLOR_ATTACHMENT_OUTPUT,
                A::COLOR_ATTACHMENT_READ | A::COLOR_ATTACHMENT_WRITE,
                L::COLOR_ATTACHMENT_OPTIMAL,
                true,
            ),
            AccessType::DepthStencilAttachmentRead => (
                S::EARLY_FRAGMENT_TESTS | S::LATE_FRAGMENT_TESTS,
                A::DEPTH_STENCIL_ATTACHMENT_READ,
                L::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
                false,
            ),
            AccessType::DepthStencilAttachmentWrite => (
                S::EARLY_FRAGMENT_TESTS | S::LATE_FRAGMENT_TESTS,
                A::DEPTH_STENCIL_ATTACHMENT_READ | A::DEPTH_STENCIL_ATTACHMENT_WRITE,
                L::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                true,
            ),
            AccessType::DepthAttachmentWriteStencilReadOnly => (
                S::EARLY_FRAGMENT_TESTS | S::LATE_FRAGMENT_TESTS,
                A::DEPTH_STENCIL_ATTACHMENT_READ | A::DEPTH_STENCIL_ATTACHMENT_WRITE,
                L::DEPTH_ATTACHMENT_STENCIL_READ_ONLY_OPTIMAL,
                true,
            ),
            AccessType::StencilAttachmentWriteDepthReadOnly => (
                S::EARLY_FRAGMENT_TESTS | S::LATE_FRAGMENT_TESTS,
                A::DEPTH_STENCIL_ATTACHMENT_READ | A::DEPTH_STENCIL_ATTACHMENT_WRITE,
                L::STENCIL_ATTACHMENT_OPTIMAL,
                true,
            ),

            AccessType::ComputeShaderReadUniformBuffer => {
                (S::COMPUTE_SHADER, A::UNIFORM_READ, L::UNDEFINED, false)
            }
            AccessType::ComputeShaderReadSampledImage => {
                (S::COMPUTE_SHADER, A::SHADER_READ, L::SHADER_READ_ONLY_OPTIMAL, false)
            }
            AccessType::ComputeShaderReadOther => (S::COMPUTE_SHADER, A::SHADER_READ, L::GENERAL, false),
            AccessType::ComputeShaderWrite => (S::COMPUTE_SHADER, A::SHADER_WRITE, L::GENERAL, true),

            AccessType::AnyShaderReadUniformBuffer => {
                (S::ALL_COMMANDS, A::UNIFORM_READ, L::UNDEFINED, false)
            }
            AccessType::AnyShaderReadUniformBufferOrVertexBuffer => (
                S::ALL_COMMANDS,
                A::UNIFORM_READ | A::VERTEX_ATTRIBUTE_READ,
                L::UNDEFINED,
                false,
            ),
            AccessType::AnyShaderReadSampledImage => {
                (S::ALL_COMMANDS, A::SHADER_READ, L::SHADER_READ_ONLY_OPTIMAL, false)
            }
            AccessType::AnyShaderReadOther => (S::ALL_COMMANDS, A::SHADER_READ, L::GENERAL, false),
            AccessType::AnyShaderWrite => (S::ALL_COMMANDS, A::SHADER_WRITE, L::GENERAL, true),

            AccessType::TransferRead => (S::TRANSFER, A::TRANSFER_READ, L::TRANSFER_SRC_OPTIMAL, false),
            AccessType::TransferWrite => (S::TRANSFER, A::TRANSFER_WRITE, L::TRANSFER_DST_OPTIMAL, true),

            AccessType::Present => (S::NONE, A::NONE, L::PRESENT_SRC_KHR, false),

            AccessType::General => (S::ALL_COMMANDS, A::MEMORY_READ | A::MEMORY_WRITE, L::GENERAL, true),
        };

        AccessInfo {
            stage_mask,
            access_mask,
            image_layout,
            is_write,
        }
    }

    /// Union of the access/stage masks of several access types touching the same
    /// resource in one task, used to coalesce multiple reads into a single barrier.
    pub fn union(accesses: impl IntoIterator<Item = AccessType>) -> AccessInfo {
        let mut iter = accesses.into_iter();
        let first = iter.next().map(AccessType::info).unwrap_or(AccessInfo {
            stage_mask: vk::PipelineStageFlags2::NONE,
            access_mask: vk::AccessFlags2::NONE,
            image_layout: vk::ImageLayout::UNDEFINED,
            is_write: false,
        });
        iter.fold(first, |acc, ty| {
            let info = ty.info();
            AccessInfo {
                stage_mask: acc.stage_mask | info.stage_mask,
                access_mask: acc.access_mask | info.access_mask,
                image_layout: info.image_layout,
                is_write: acc.is_write || info.is_write,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_accesses_are_flagged() {
        assert!(AccessType::ColorAttachmentWrite.info().is_write);
        assert!(!AccessType::ColorAttachmentRead.info().is_write);
    }

    #[test]
    fn union_combines_masks() {
        let info = AccessType::union([
            AccessType::FragmentShaderReadSampledImage,
            AccessType::VertexShaderReadSampledImage,
        ]);
        assert!(info.stage_mask.contains(vk::PipelineStageFlags2::FRAGMENT_SHADER));
        assert!(info.stage_mask.contains(vk::PipelineStageFlags2::VERTEX_SHADER));
        assert!(!info.is_write);
    }
}
