//! Texture-shaped data that the framegraph and texture manager pass around:
//! format/layout helpers, the public `TextureHandle`, and the versioned
//! `TransientTextureHandle` tasks declare reads and writes against.

use ash::vk;

use crate::access::AccessInfo;
use crate::slot_map::{SlotMapHandle, TypedHandle};

/// Pixel format of a framegraph texture. A thin, explicit subset of
/// `VkFormat` covering the formats the framegraph itself needs to reason
/// about (attachments, sampled images); callers that need an exotic format
/// can still pass a raw `vk::Format` through [`PixelFormat::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8Unorm,
    Rgba8Srgb,
    Bgra8Unorm,
    Rgba16Float,
    Rgba32Float,
    R32Float,
    D32Float,
    D24UnormS8Uint,
    D32FloatS8Uint,
    Other(vk::Format),
}

impl PixelFormat {
    pub fn as_vk(self) -> vk::Format {
        match self {
            PixelFormat::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
            PixelFormat::Rgba8Srgb => vk::Format::R8G8B8A8_SRGB,
            PixelFormat::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
            PixelFormat::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
            PixelFormat::Rgba32Float => vk::Format::R32G32B32A32_SFLOAT,
            PixelFormat::R32Float => vk::Format::R32_SFLOAT,
            PixelFormat::D32Float => vk::Format::D32_SFLOAT,
            PixelFormat::D24UnormS8Uint => vk::Format::D24_UNORM_S8_UINT,
            PixelFormat::D32FloatS8Uint => vk::Format::D32_SFLOAT_S8_UINT,
            PixelFormat::Other(fmt) => fmt,
        }
    }

    pub fn is_depth(self) -> bool {
        matches!(
            self,
            PixelFormat::D32Float | PixelFormat::D24UnormS8Uint | PixelFormat::D32FloatS8Uint
        )
    }

    pub fn is_stencil(self) -> bool {
        matches!(self, PixelFormat::D24UnormS8Uint | PixelFormat::D32FloatS8Uint)
    }

    pub fn is_color(self) -> bool {
        !self.is_depth() && !self.is_stencil()
    }

    pub fn aspect_mask(self) -> vk::ImageAspectFlags {
        match (self.is_depth(), self.is_stencil()) {
            (true, true) => vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
            (true, false) => vk::ImageAspectFlags::DEPTH,
            (false, _) => vk::ImageAspectFlags::COLOR,
        }
    }
}

/// Whether a texture's backing memory is managed by the framegraph, owned
/// externally (e.g. a swapchain image), or merely declared so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMemoryStatus {
    Virtual,
    Allocated,
    External,
}

/// Static description of a texture: name, extent, format, sample count.
#[derive(Debug, Clone)]
pub struct TextureInfo {
    pub name: String,
    pub size: (u32, u32, u32),
    pub format: PixelFormat,
    pub sample_count: vk::SampleCountFlags,
}

impl TextureInfo {
    pub fn new(name: impl Into<String>, size: (u32, u32, u32), format: PixelFormat) -> Self {
        Self {
            name: name.into(),
            size,
            format,
            sample_count: vk::SampleCountFlags::TYPE_1,
        }
    }
}

/// Mutable per-texture tracking state: the most recently emitted access and
/// whether the texture is backed by real memory yet.
#[derive(Debug, Clone, Copy)]
pub struct TextureState {
    pub last_access: AccessInfo,
    pub status: TextureMemoryStatus,
}

/// Marker type distinguishing texture handles from other registries' handles.
pub struct TextureKind;

/// A handle into the texture manager's catalog of declared/registered
/// textures. Stable for the lifetime of the owning framegraph.
pub type TextureHandle = TypedHandle<TextureInfo, TextureKind>;

/// A versioned reference to a texture: `version` counts how many writes have
/// been declared against the texture so far. Reading version `v` means
/// "the value produced by the `v`-th write" (version 0 is the value the
/// texture was created or registered with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransientTextureHandle {
    pub texture: SlotMapHandle,
    pub version: u32,
}

impl TransientTextureHandle {
    pub fn new(texture: SlotMapHandle, version: u32) -> Self {
        Self { texture, version }
    }

    /// The handle produced by declaring a write against `self`.
    pub fn next_version(self) -> Self {
        Self {
            texture: self.texture,
            version: self.version + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_increments_are_contiguous() {
        let base = TransientTextureHandle::new(SlotMapHandle::invalid(), 0);
        let v1 = base.next_version();
        let v2 = v1.next_version();
        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
    }

    #[test]
    fn depth_formats_report_depth_aspect() {
        assert!(PixelFormat::D32Float.aspect_mask().contains(vk::ImageAspectFlags::DEPTH));
        assert!(!PixelFormat::D32Float.aspect_mask().contains(vk::ImageAspectFlags::COLOR));
        assert!(PixelFormat::D24UnormS8Uint.aspect_mask().contains(vk::ImageAspectFlags::STENCIL));
    }
}
