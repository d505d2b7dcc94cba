//! Translates the abstract [`AccessType`] barriers the texture manager
//! computes into `VkImageMemoryBarrier2`s, and issues them grouped into one
//! `vkCmdPipelineBarrier2` call per task.

use ash::vk;

use crate::texture_manager::ImageBarrier;

/// Records one pipeline barrier covering every image transition a task
/// needs before it runs.
pub fn emit_barriers(device: &ash::Device, cmd: vk::CommandBuffer, barriers: &[ImageBarrier]) {
    if barriers.is_empty() {
        return;
    }

    let image_barriers: Vec<vk::ImageMemoryBarrier2> = barriers
        .iter()
        .map(|b| {
            let prev = b.prev_access;
            let next = b.next_access;
            vk::ImageMemoryBarrier2::builder()
                .src_stage_mask(prev.stage_mask)
                .src_access_mask(prev.access_mask)
                .dst_stage_mask(next.stage_mask)
                .dst_access_mask(next.access_mask)
                .old_layout(if b.discard_contents {
                    vk::ImageLayout::UNDEFINED
                } else {
                    prev.image_layout
                })
                .new_layout(next.image_layout)
                .image(b.image)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: b.aspect_mask,
                    base_mip_level: 0,
                    level_count: vk::REMAINING_MIP_LEVELS,
                    base_array_layer: 0,
                    layer_count: vk::REMAINING_ARRAY_LAYERS,
                })
                .build()
        })
        .collect();

    let dependency_info = vk::DependencyInfo::builder().image_memory_barriers(&image_barriers);

    unsafe { device.cmd_pipeline_barrier2(cmd, &dependency_info) };
}
