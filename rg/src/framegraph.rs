//! The framegraph itself: collects declared tasks, resolves which of them
//! are actually needed, allocates their transient textures, emits the
//! barriers between them, and resumes their execution closures in
//! dependency order.

use std::collections::{HashMap, HashSet};

use ash::vk;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::context::Context;
use crate::error::{FramegraphError, Result};
use crate::pass_builder::RenderTaskBuilder;
use crate::pipeline_cache::PipelineCache;
use crate::resource_registry::RenderInput;
use crate::slot_map::SlotMapHandle;
use crate::task::{DependencyKind, RenderTaskInfo, TaskState};
use crate::texture::{TextureHandle, TextureInfo, TransientTextureHandle};
use crate::texture_manager::{BarrierContents, TextureManager};

/// Summary of one `record()` call: which tasks actually ran, and which
/// textures they touched. Consumed by the DOT visualizer.
pub struct ExecutionInfo {
    pub tasks: Vec<usize>,
    pub resources: Vec<SlotMapHandle>,
}

/// Owns the declared task list and the transient texture catalog for one
/// frame's worth of work.
pub struct Framegraph {
    textures: TextureManager,
    pipelines: PipelineCache,
    tasks: Vec<RenderTaskInfo>,
    external_inputs: HashSet<TransientTextureHandle>,
    outputs: Vec<TransientTextureHandle>,
}

impl Framegraph {
    pub fn new(pipeline_layout: vk::PipelineLayout) -> Self {
        Self {
            textures: TextureManager::new(),
            pipelines: PipelineCache::new(pipeline_layout),
            tasks: Vec::new(),
            external_inputs: HashSet::new(),
            outputs: Vec::new(),
        }
    }

    pub fn textures(&self) -> &TextureManager {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureManager {
        &mut self.textures
    }

    /// Registers an externally owned texture (e.g. a swapchain image) as a
    /// framegraph input, at version 0.
    pub fn register_external(
        &mut self,
        info: TextureInfo,
        last_access: crate::access::AccessType,
        image: vk::Image,
        view: vk::ImageView,
    ) -> TransientTextureHandle {
        let handle = self.textures.register_external(info, last_access, image, view);
        let versioned = TransientTextureHandle::new(handle.raw(), 0);
        self.external_inputs.insert(versioned);
        versioned
    }

    /// Declares a render task: `declare` runs synchronously, recording the
    /// task's dependencies through the builder and returning a caller-chosen
    /// output. Whether the task ever executes is decided later, in
    /// [`Framegraph::record`].
    pub fn add_task<Output>(
        &mut self,
        name: impl Into<String>,
        declare: impl FnOnce(&mut RenderTaskBuilder) -> Output,
    ) -> Result<Output> {
        let mut builder = RenderTaskBuilder::new(name, &mut self.textures);
        let output = declare(&mut builder);
        let declaration = builder.finish(output)?;
        self.tasks.push(declaration.info);
        Ok(declaration.output)
    }

    /// Marks `handle` as a result the caller will consume outside the
    /// framegraph (e.g. the final swapchain color image).
    pub fn declare_output(&mut self, handle: TransientTextureHandle) {
        self.outputs.push(handle);
    }

    /// Resolves the dependency graph, allocates transient textures, emits
    /// barriers, and runs every scheduled task's execution closure into
    /// `command_buffer`.
    pub fn record(&mut self, ctx: &Context, command_buffer: vk::CommandBuffer) -> Result<ExecutionInfo> {
        let producers = self.build_producer_map();
        let scheduled = self.find_scheduled_tasks(&producers)?;
        let order = self.topological_order(&scheduled, &producers)?;

        let to_allocate: Vec<TextureHandle> = scheduled
            .iter()
            .flat_map(|&idx| self.tasks[idx].writes().map(|d| TextureHandle::new(d.handle.texture)))
            .collect();
        self.textures.allocate_all(ctx, &to_allocate)?;

        let mut resources: Vec<SlotMapHandle> = Vec::new();

        for &task_idx in &order {
            let barriers = self.compute_task_barriers(task_idx)?;
            crate::command_list::emit_barriers(&ctx.device, command_buffer, &barriers);

            for dep in &self.tasks[task_idx].dependencies {
                resources.push(dep.handle.texture);
            }

            let mut input = RenderInput {
                context: ctx,
                textures: &mut self.textures,
                pipelines: &mut self.pipelines,
                command_buffer,
            };
            self.tasks[task_idx].execute(&mut input)?;
        }

        for (idx, task) in self.tasks.iter_mut().enumerate() {
            if !order.contains(&idx) {
                task.state = TaskState::Culled;
                task.execute = None;
            }
        }

        resources.sort_by_key(|h| (h.index(), h.version()));
        resources.dedup();

        Ok(ExecutionInfo { tasks: order, resources })
    }

    /// Releases every transient texture this framegraph allocated. The
    /// caller must ensure the GPU has finished consuming the recorded
    /// command buffer first.
    pub fn retire_immediate(&mut self, ctx: &Context) {
        self.textures.clear(ctx);
        for task in &mut self.tasks {
            task.execute = None;
        }
        self.tasks.clear();
        self.outputs.clear();
        self.external_inputs.clear();
    }

    pub fn tasks(&self) -> &[RenderTaskInfo] {
        &self.tasks
    }

    pub fn outputs(&self) -> &[TransientTextureHandle] {
        &self.outputs
    }

    pub fn external_inputs(&self) -> impl Iterator<Item = &TransientTextureHandle> {
        self.external_inputs.iter()
    }

    fn build_producer_map(&self) -> HashMap<(SlotMapHandle, u32), usize> {
        let mut producers = HashMap::new();
        for (idx, task) in self.tasks.iter().enumerate() {
            for dep in task.writes() {
                producers.insert((dep.handle.texture, dep.handle.version), idx);
            }
        }
        producers
    }

    fn find_scheduled_tasks(
        &self,
        producers: &HashMap<(SlotMapHandle, u32), usize>,
    ) -> Result<HashSet<usize>> {
        let mut scheduled = HashSet::new();
        let mut queue: Vec<usize> = self
            .outputs
            .iter()
            .filter_map(|h| producers.get(&(h.texture, h.version)).copied())
            .collect();

        while let Some(task_idx) = queue.pop() {
            if !scheduled.insert(task_idx) {
                continue;
            }
            for dep in self.tasks[task_idx].reads() {
                let key = (dep.handle.texture, dep.handle.version);
                if self.external_inputs.contains(&dep.handle) {
                    continue;
                }
                match producers.get(&key) {
                    Some(&producer_idx) => queue.push(producer_idx),
                    None => {
                        return Err(FramegraphError::UnboundRead {
                            task: self.tasks[task_idx].name.clone(),
                            texture: dep.handle.texture,
                            version: dep.handle.version,
                        })
                    }
                }
            }
        }
        Ok(scheduled)
    }

    fn topological_order(
        &self,
        scheduled: &HashSet<usize>,
        producers: &HashMap<(SlotMapHandle, u32), usize>,
    ) -> Result<Vec<usize>> {
        let mut graph = DiGraph::<usize, ()>::new();
        let mut nodes: HashMap<usize, NodeIndex> = HashMap::new();
        for &idx in scheduled {
            nodes.insert(idx, graph.add_node(idx));
        }
        for &idx in scheduled {
            for dep in self.tasks[idx].reads() {
                if let Some(&producer_idx) = producers.get(&(dep.handle.texture, dep.handle.version)) {
                    if producer_idx != idx {
                        graph.add_edge(nodes[&producer_idx], nodes[&idx], ());
                    }
                }
            }
        }
        toposort(&graph, None)
            .map(|order| order.into_iter().map(|n| graph[n]).collect())
            .map_err(|_| FramegraphError::CyclicGraph("cycle among scheduled render tasks".into()))
    }

    fn compute_task_barriers(&mut self, task_idx: usize) -> Result<Vec<crate::texture_manager::ImageBarrier>> {
        let mut barriers = Vec::new();
        let task = &self.tasks[task_idx];

        // Coalesce every read of the same texture within this task into a
        // single barrier whose stage/access masks are the union of the
        // individual reads.
        let mut reads_by_texture: HashMap<SlotMapHandle, Vec<crate::access::AccessType>> = HashMap::new();
        for dep in task.reads() {
            reads_by_texture.entry(dep.handle.texture).or_default().push(dep.access);
        }
        for (texture, accesses) in reads_by_texture {
            let info = crate::access::AccessType::union(accesses);
            let handle = TextureHandle::new(texture);
            barriers.push(self.textures.synchronize_texture(handle, info, BarrierContents::Keep)?);
        }

        for dep in task.dependencies.iter().filter(|d| {
            matches!(d.kind, DependencyKind::CreateWrite | DependencyKind::Write | DependencyKind::ReadWrite)
        }) {
            let handle = TextureHandle::new(dep.handle.texture);
            let contents = if dep.kind == DependencyKind::ReadWrite {
                BarrierContents::Keep
            } else {
                BarrierContents::Discard
            };
            barriers.push(self.textures.synchronize_texture(handle, dep.access.info(), contents)?);
        }

        Ok(barriers)
    }
}
