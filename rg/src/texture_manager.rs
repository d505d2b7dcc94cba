//! Owns the catalog of textures referenced within a framegraph: declares
//! virtual textures, wraps external ones (e.g. swapchain images), allocates
//! backing memory on demand, and tracks each texture's last GPU access so
//! the resolver can compute correct barriers.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;

use crate::access::AccessInfo;
use crate::context::Context;
use crate::error::{FramegraphError, Result};
use crate::slot_map::{SlotMap, SlotMapHandle};
use crate::texture::{PixelFormat, TextureHandle, TextureInfo, TextureMemoryStatus, TextureState};

/// Contents policy for a barrier: whether the previous contents of the image
/// need to survive the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierContents {
    Keep,
    Discard,
}

/// Everything needed to record one `VkImageMemoryBarrier2`.
#[derive(Debug, Clone, Copy)]
pub struct ImageBarrier {
    pub image: vk::Image,
    pub aspect_mask: vk::ImageAspectFlags,
    pub prev_access: AccessInfo,
    pub next_access: AccessInfo,
    pub discard_contents: bool,
}

enum Backing {
    Virtual,
    Allocated { image: vk::Image, allocation: Allocation },
    External { image: vk::Image },
}

struct TextureResource {
    info: TextureInfo,
    state: TextureState,
    backing: Backing,
    view: Option<vk::ImageView>,
}

/// Declares, allocates, and tracks the lifetime/access state of textures
/// used within one framegraph.
pub struct TextureManager {
    textures: SlotMap<TextureResource>,
}

impl TextureManager {
    pub fn new() -> Self {
        Self {
            textures: SlotMap::new(),
        }
    }

    /// Declares a texture with no backing memory yet.
    pub fn declare_texture(&mut self, info: TextureInfo) -> TextureHandle {
        let handle = self.textures.insert(TextureResource {
            info,
            state: TextureState {
                last_access: crate::access::AccessType::Nothing.info(),
                status: TextureMemoryStatus::Virtual,
            },
            backing: Backing::Virtual,
            view: None,
        });
        TextureHandle::new(handle)
    }

    /// Wraps a pre-existing, externally owned image (e.g. a swapchain image)
    /// as a framegraph texture. The manager never allocates or destroys its
    /// backing memory or view.
    pub fn register_external(
        &mut self,
        info: TextureInfo,
        last_access: crate::access::AccessType,
        image: vk::Image,
        view: vk::ImageView,
    ) -> TextureHandle {
        let handle = self.textures.insert(TextureResource {
            info,
            state: TextureState {
                last_access: last_access.info(),
                status: TextureMemoryStatus::External,
            },
            backing: Backing::External { image },
            view: Some(view),
        });
        TextureHandle::new(handle)
    }

    /// Materializes backing memory and a view for a declared texture.
    /// A no-op if the texture is already allocated or external.
    pub fn allocate(&mut self, ctx: &Context, handle: TextureHandle) -> Result<()> {
        let raw = handle.raw();
        let resource = self
            .textures
            .get_mut(raw)
            .map_err(|_| FramegraphError::StaleHandle(raw))?;

        if !matches!(resource.backing, Backing::Virtual) {
            return Ok(());
        }

        let (width, height, depth) = resource.info.size;
        let format = resource.info.format.as_vk();
        let usage = image_usage(resource.info.format);

        let image_info = vk::ImageCreateInfo::builder()
            .image_type(if depth > 1 { vk::ImageType::TYPE_3D } else { vk::ImageType::TYPE_2D })
            .format(format)
            .extent(vk::Extent3D { width, height, depth })
            .mip_levels(1)
            .array_layers(1)
            .samples(resource.info.sample_count)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { ctx.device.create_image(&image_info, None) }?;
        let requirements = unsafe { ctx.device.get_image_memory_requirements(image) };

        let mut allocator = ctx
            .allocator
            .lock()
            .map_err(|_| FramegraphError::AllocationFailed("allocator mutex poisoned".into()))?;
        let allocation = allocator
            .allocate(&AllocationCreateDesc {
                name: &resource.info.name,
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| FramegraphError::AllocationFailed(e.to_string()))?;

        unsafe {
            ctx.device
                .bind_image_memory(image, allocation.memory(), allocation.offset())?;
        }

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: resource.info.format.aspect_mask(),
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        let view = unsafe { ctx.device.create_image_view(&view_info, None) }?;

        resource.backing = Backing::Allocated { image, allocation };
        resource.view = Some(view);
        resource.state.status = TextureMemoryStatus::Allocated;
        log::debug!("allocated transient texture `{}` ({}x{}x{})", resource.info.name, width, height, depth);
        Ok(())
    }

    /// Allocates every handle in `handles`, skipping those already backed.
    pub fn allocate_all(&mut self, ctx: &Context, handles: &[TextureHandle]) -> Result<()> {
        for &h in handles {
            self.allocate(ctx, h)?;
        }
        Ok(())
    }

    /// Computes the barrier needed to transition `handle` to `next_access`
    /// and updates the tracked access state to match. The caller is
    /// responsible for actually recording the barrier before resuming the
    /// task that depends on it.
    pub fn synchronize_texture(
        &mut self,
        handle: TextureHandle,
        next_access: AccessInfo,
        contents: BarrierContents,
    ) -> Result<ImageBarrier> {
        let raw = handle.raw();
        let resource = self
            .textures
            .get_mut(raw)
            .map_err(|_| FramegraphError::StaleHandle(raw))?;

        let image = match resource.backing {
            Backing::Allocated { image, .. } => image,
            Backing::External { image } => image,
            Backing::Virtual => {
                return Err(FramegraphError::AllocationFailed(format!(
                    "texture `{}` was never allocated before use",
                    resource.info.name
                )))
            }
        };

        let barrier = ImageBarrier {
            image,
            aspect_mask: resource.info.format.aspect_mask(),
            prev_access: resource.state.last_access,
            next_access,
            discard_contents: contents == BarrierContents::Discard,
        };
        resource.state.last_access = next_access;
        Ok(barrier)
    }

    pub fn info(&self, handle: TextureHandle) -> Result<&TextureInfo> {
        Ok(&self.texture(handle)?.info)
    }

    pub fn state(&self, handle: TextureHandle) -> Result<TextureState> {
        Ok(self.texture(handle)?.state)
    }

    pub fn image(&self, handle: TextureHandle) -> Result<vk::Image> {
        match self.texture(handle)?.backing {
            Backing::Allocated { image, .. } => Ok(image),
            Backing::External { image } => Ok(image),
            Backing::Virtual => Err(FramegraphError::AllocationFailed(
                "texture has no backing image yet".into(),
            )),
        }
    }

    pub fn image_view(&self, handle: TextureHandle) -> Result<vk::ImageView> {
        self.texture(handle)?
            .view
            .ok_or_else(|| FramegraphError::AllocationFailed("texture has no view yet".into()))
    }

    fn texture(&self, handle: TextureHandle) -> Result<&TextureResource> {
        self.textures
            .get(handle.raw())
            .map_err(|_| FramegraphError::StaleHandle(handle.raw()))
    }

    /// Releases every framegraph-owned image and view. External textures are
    /// left untouched. Must only be called once the GPU has finished
    /// consuming the owning frame's command buffer.
    pub fn clear(&mut self, ctx: &Context) {
        let handles: Vec<SlotMapHandle> = self.textures.iter().map(|(h, _)| h).collect();
        for h in handles {
            if let Ok(resource) = self.textures.get_mut(h) {
                if let Backing::Allocated { image, allocation } =
                    std::mem::replace(&mut resource.backing, Backing::Virtual)
                {
                    if let Some(view) = resource.view.take() {
                        unsafe { ctx.device.destroy_image_view(view, None) };
                    }
                    unsafe { ctx.device.destroy_image(image, None) };
                    if let Ok(mut allocator) = ctx.allocator.lock() {
                        let _ = allocator.free(allocation);
                    }
                }
            }
        }
        self.textures.clear();
    }
}

impl Default for TextureManager {
    fn default() -> Self {
        Self::new()
    }
}

fn image_usage(format: PixelFormat) -> vk::ImageUsageFlags {
    let mut usage = vk::ImageUsageFlags::SAMPLED
        | vk::ImageUsageFlags::TRANSFER_SRC
        | vk::ImageUsageFlags::TRANSFER_DST
        | vk::ImageUsageFlags::INPUT_ATTACHMENT;
    usage |= if format.is_depth() {
        vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
    } else {
        vk::ImageUsageFlags::COLOR_ATTACHMENT
    };
    usage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_texture_starts_virtual() {
        let mut mgr = TextureManager::new();
        let h = mgr.declare_texture(TextureInfo::new("color", (64, 64, 1), PixelFormat::Rgba8Unorm));
        assert_eq!(mgr.state(h).unwrap().status, TextureMemoryStatus::Virtual);
    }

    #[test]
    fn synchronize_before_allocate_fails() {
        let mut mgr = TextureManager::new();
        let h = mgr.declare_texture(TextureInfo::new("color", (64, 64, 1), PixelFormat::Rgba8Unorm));
        let err = mgr.synchronize_texture(
            h,
            crate::access::AccessType::ColorAttachmentWrite.info(),
            BarrierContents::Discard,
        );
        assert!(err.is_err());
    }
}
