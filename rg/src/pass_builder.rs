//! The scratchpad a task's declare phase writes into: declares new
//! textures, records reads/writes of existing ones, and optionally
//! configures a transient render pass.

use crate::access::AccessType;
use crate::error::{FramegraphError, Result};
use crate::resource_registry::RenderInput;
use crate::task::{Dependency, DependencyKind, RenderTaskInfo, TaskDeclaration};
use crate::texture::{PixelFormat, TextureInfo, TransientTextureHandle};
use crate::texture_manager::TextureManager;
use crate::transient_render_pass::TransientRenderPassBuilder;

/// Accumulates one task's declared dependencies during the declare phase.
pub struct RenderTaskBuilder<'a> {
    info: RenderTaskInfo,
    textures: &'a mut TextureManager,
}

impl<'a> RenderTaskBuilder<'a> {
    pub(crate) fn new(name: impl Into<String>, textures: &'a mut TextureManager) -> Self {
        Self {
            info: RenderTaskInfo::new(name.into()),
            textures,
        }
    }

    /// Declares that this task creates a brand new texture, version 0.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        size: (u32, u32, u32),
        format: PixelFormat,
        write_access: AccessType,
    ) -> TransientTextureHandle {
        let texture_handle = self.textures.declare_texture(TextureInfo::new(name, size, format));
        let handle = TransientTextureHandle::new(texture_handle.raw(), 0);
        self.push(DependencyKind::CreateWrite, handle, write_access);
        handle
    }

    /// Declares a read dependency on `handle`, returning its static info.
    pub fn read(&mut self, handle: TransientTextureHandle, access: AccessType) -> Result<TextureInfo> {
        self.check_not_declared(DependencyKind::Read, handle);
        self.push(DependencyKind::Read, handle, access);
        self.textures.info(texture_handle(handle)).map(|info| info.clone())
    }

    /// Declares a write dependency, bumping the version. Returns the new
    /// handle (pointing at the post-write value) and the texture's info.
    ///
    /// Each call to `write`/`read_write` bumps the version independently of
    /// any other write the task declares against the same base handle.
    pub fn write(
        &mut self,
        handle: TransientTextureHandle,
        write_access: AccessType,
    ) -> Result<(TransientTextureHandle, TextureInfo)> {
        let next = handle.next_version();
        self.check_not_declared(DependencyKind::Write, next);
        self.push(DependencyKind::Write, next, write_access);
        let info = self.textures.info(texture_handle(handle))?.clone();
        Ok((next, info))
    }

    /// Declares both a read of `handle` and a write producing its next
    /// version.
    pub fn read_write(
        &mut self,
        handle: TransientTextureHandle,
        read_access: AccessType,
        write_access: AccessType,
    ) -> Result<(TransientTextureHandle, TextureInfo)> {
        self.push(DependencyKind::Read, handle, read_access);
        let next = handle.next_version();
        self.push(DependencyKind::ReadWrite, next, write_access);
        let info = self.textures.info(texture_handle(handle))?.clone();
        Ok((next, info))
    }

    /// Starts configuring a transient render pass for this task.
    pub fn declare_render_pass(&mut self, name: impl Into<String>) -> TransientRenderPassBuilder {
        TransientRenderPassBuilder::new(name.into())
    }

    /// Records the closure that will run during this task's execution
    /// phase, if the resolver decides to schedule it.
    pub fn render(
        &mut self,
        render_fn: impl FnOnce(&mut RenderInput) -> anyhow::Result<()> + 'static,
    ) {
        let prev = self.info.execute.replace(Box::new(render_fn));
        assert!(prev.is_none(), "task `{}` called render() more than once", self.info.name);
    }

    /// Finishes declaration, pairing the builder's recorded dependencies
    /// with the caller's output value. Reinterprets `finishDeclaration`'s
    /// suspend point: since this builder runs synchronously, "suspending"
    /// is simply returning the completed declaration for the framegraph to
    /// decide whether to resume (execute) or drop (cull) later.
    pub(crate) fn finish<Output>(self, output: Output) -> Result<TaskDeclaration<Output>> {
        if self.info.execute.is_none() {
            return Err(FramegraphError::MissingYield(self.info.name));
        }
        Ok(TaskDeclaration { output, info: self.info })
    }

    fn push(&mut self, kind: DependencyKind, handle: TransientTextureHandle, access: AccessType) {
        self.info.dependencies.push(Dependency { kind, handle, access });
    }

    fn check_not_declared(&self, kind: DependencyKind, handle: TransientTextureHandle) {
        let clashes = self
            .info
            .dependencies
            .iter()
            .any(|d| d.kind == kind && d.handle == handle);
        assert!(
            !clashes,
            "task `{}` declared {:?} of {:?} more than once",
            self.info.name, kind, handle
        );
    }
}

fn texture_handle(handle: TransientTextureHandle) -> crate::texture::TextureHandle {
    crate::texture::TextureHandle::new(handle.texture)
}
