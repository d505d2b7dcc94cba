pub mod access;
pub mod command_list;
pub mod context;
pub mod dot;
pub mod error;
pub mod framegraph;
pub mod pass_builder;
pub mod pipeline_cache;
pub mod resource_registry;
pub mod shader;
pub mod slot_map;
pub mod task;
pub mod texture;
pub mod texture_manager;

mod transient_render_pass;

pub use access::{AccessInfo, AccessType};
pub use context::Context;
pub use error::{FramegraphError, Result};
pub use framegraph::{ExecutionInfo, Framegraph};
pub use pass_builder::RenderTaskBuilder;
pub use pipeline_cache::{PipelineCache, PipelineDescriptor};
pub use resource_registry::RenderInput;
pub use shader::{DescriptorBinding, Shader};
pub use slot_map::{SlotMap, SlotMapHandle, TypedHandle};
pub use task::{Dependency, DependencyKind, RenderTaskInfo, TaskDeclaration, TaskState};
pub use texture::{PixelFormat, TextureHandle, TextureInfo, TextureMemoryStatus, TextureState, TransientTextureHandle};
pub use texture_manager::{BarrierContents, ImageBarrier, TextureManager};
pub use transient_render_pass::{AttachmentKind, TransientRenderPass, TransientRenderPassBuilder, TransientRenderPassInfo};
