use crate::slot_map::SlotMapHandle;

/// Errors that can be raised while declaring, resolving or executing a framegraph.
#[derive(Debug, thiserror::Error)]
pub enum FramegraphError {
    #[error("handle {0:?} refers to a slot that has since been released or replaced")]
    StaleHandle(SlotMapHandle),

    #[error("handle index {0} is out of range")]
    OutOfRange(u32),

    #[error("task `{task}` reads texture {texture:?} version {version} which no task produces")]
    UnboundRead {
        task: String,
        texture: SlotMapHandle,
        version: u32,
    },

    #[error("dependency cycle detected among render tasks: {0}")]
    CyclicGraph(String),

    #[error("task `{0}` finished declaration without yielding an output")]
    MissingYield(String),

    #[error("task `{0}` yielded more than one output during declaration")]
    DuplicateOutput(String),

    #[error("failed to allocate transient resource: {0}")]
    AllocationFailed(String),

    #[error("task `{task}` failed: {source}")]
    TaskCoroutineFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    VulkanError(#[from] ash::vk::Result),
}

pub type Result<T> = std::result::Result<T, FramegraphError>;
