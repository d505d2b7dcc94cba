//! Render task declaration and the two-phase lifecycle every task goes
//! through: declare (record dependencies, yield an output) then, if the
//! resolver decides the task is needed, execute (record GPU commands).
//!
//! The source this crate's algorithms are modeled on drives this lifecycle
//! with C++ coroutines suspended at two points. Rust has no equivalent
//! primitive available here, so the same two-phase contract is realized as a
//! small state machine: the declare phase runs eagerly to completion when
//! the task is declared (there is nothing to suspend until the dependencies
//! are known), and the execute phase is captured as a boxed closure that the
//! resolver either calls once or drops, depending on whether the task was
//! scheduled.

use crate::access::AccessType;
use crate::error::{FramegraphError, Result};
use crate::resource_registry::RenderInput;
use crate::texture::TransientTextureHandle;

/// The role a dependency plays in a task's declared inputs/outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    CreateWrite,
    Read,
    Write,
    ReadWrite,
}

#[derive(Debug, Clone, Copy)]
pub struct Dependency {
    pub kind: DependencyKind,
    pub handle: TransientTextureHandle,
    pub access: AccessType,
}

/// Bookkeeping state of a task, tracked mainly for diagnostics and for the
/// DOT visualizer; the actual control-flow decision (execute vs. cull) is
/// made by the resolver in `framegraph.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Declared,
    Scheduled,
    Executed,
    Culled,
}

/// Everything the resolver needs to know about one declared render task.
pub struct RenderTaskInfo {
    pub name: String,
    pub dependencies: Vec<Dependency>,
    pub execution_priority: i32,
    pub(crate) execute: Option<Box<dyn FnOnce(&mut RenderInput) -> anyhow::Result<()>>>,
    pub(crate) state: TaskState,
}

impl RenderTaskInfo {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            dependencies: Vec::new(),
            execution_priority: -1,
            execute: None,
            state: TaskState::Declared,
        }
    }

    pub fn creates(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| d.kind == DependencyKind::CreateWrite)
    }

    pub fn reads(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies
            .iter()
            .filter(|d| matches!(d.kind, DependencyKind::Read | DependencyKind::ReadWrite))
    }

    pub fn writes(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| {
            matches!(d.kind, DependencyKind::CreateWrite | DependencyKind::Write | DependencyKind::ReadWrite)
        })
    }

    /// Resumes the execution phase: must only be called once, and only for
    /// tasks the resolver has scheduled. Leaves the closure consumed either
    /// way, so a second call is a no-op returning `MissingYield`.
    pub(crate) fn execute(&mut self, input: &mut RenderInput) -> Result<()> {
        let execute = self
            .execute
            .take()
            .ok_or_else(|| FramegraphError::MissingYield(self.name.clone()))?;
        self.state = TaskState::Executed;
        execute(input).map_err(|source| FramegraphError::TaskCoroutineFailed {
            task: self.name.clone(),
            source,
        })
    }
}

/// The result of declaring a task: its user-visible output plus the
/// bookkeeping the framegraph owns. `Output` is typically a struct of
/// `TransientTextureHandle`s the caller uses to chain further tasks.
pub struct TaskDeclaration<Output> {
    pub output: Output,
    pub(crate) info: RenderTaskInfo,
}
