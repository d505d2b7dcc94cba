//! The device-level handles the framegraph borrows for the duration of a
//! `record()` call. Construction of the underlying `ash::Instance`/`Device`
//! (physical device selection, queue family discovery, surface/swapchain
//! setup) happens in application code; this crate only consumes the result.

use std::sync::Mutex;

use ash::vk;
use gpu_allocator::vulkan::Allocator;

/// Borrowed GPU handles the framegraph needs during execution: a device to
/// issue commands and create resources against, a graphics queue, and an
/// allocator for transient texture memory.
pub struct Context {
    pub device: ash::Device,
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub command_pool: vk::CommandPool,
    pub allocator: Mutex<Allocator>,
}

impl Context {
    pub fn new(
        device: ash::Device,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        command_pool: vk::CommandPool,
        allocator: Allocator,
    ) -> Self {
        Self {
            device,
            graphics_queue,
            graphics_queue_family,
            command_pool,
            allocator: Mutex::new(allocator),
        }
    }
}
