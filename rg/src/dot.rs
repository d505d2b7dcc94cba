//! Renders a resolved framegraph as a Graphviz DOT graph: oval task nodes
//! (gray if culled, red if scheduled but it never produced any of its
//! declared outputs, black otherwise), rectangular texture-version nodes,
//! solid edges for reads, dashed edges for writes (green "creates" label
//! when the write is a brand new texture).

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::framegraph::{ExecutionInfo, Framegraph};
use crate::task::{DependencyKind, TaskState};
use crate::texture::{PixelFormat, TextureHandle, TextureMemoryStatus, TransientTextureHandle};

pub fn generate_dot_graph(graph: &Framegraph, execution: &ExecutionInfo) -> String {
    let mut out = String::from(
        "digraph G {\nrankdir=LR;\nnode [fontsize=12,fontname=\"Courier New\"]\nedge [fontsize=10,fontname=\"Courier New\"]\n",
    );

    let mut texture_labels: HashMap<TransientTextureHandle, String> = HashMap::new();
    for task in graph.tasks() {
        for dep in &task.dependencies {
            texture_labels.entry(dep.handle).or_insert_with(|| {
                match graph.textures().info(TextureHandle::new(dep.handle.texture)) {
                    Ok(info) => format!("{} v{}", info.name, dep.handle.version),
                    Err(_) => format!("{:?} v{}", dep.handle.texture, dep.handle.version),
                }
            });
        }
    }

    for (idx, task) in graph.tasks().iter().enumerate() {
        let executed = execution.tasks.contains(&idx);
        let produced_output = task.writes().any(|dep| execution.resources.contains(&dep.handle.texture));
        let color = match (task.state, executed, produced_output) {
            (TaskState::Culled, _, _) => "gray",
            (_, true, false) => "red",
            (_, true, true) => "black",
            (_, false, _) => "gray",
        };
        let _ = writeln!(out, "  \"{}\" [shape=ellipse,color={},fontcolor={}]", task.name, color, color);

        for dep in task.reads() {
            let label = &texture_labels[&dep.handle];
            let _ = writeln!(out, "  \"{}\" -> \"{}\"", label, task.name);
        }
        for dep in task.writes() {
            let label = &texture_labels[&dep.handle];
            let (color, edge_label) = if dep.kind == DependencyKind::CreateWrite {
                ("darkgreen", "creates")
            } else {
                ("black", "")
            };
            let _ = writeln!(
                out,
                "  \"{}\" -> \"{}\" [style=dashed,color={},label=\"{}\"]",
                task.name, label, color, edge_label
            );
        }
    }

    for (handle, label) in &texture_labels {
        let texture_handle = TextureHandle::new(handle.texture);
        let info = graph.textures().info(texture_handle).ok();
        let state = graph.textures().state(texture_handle).ok();

        let is_external = graph.external_inputs().any(|h| h == handle);
        let is_output = graph.outputs().contains(handle);
        let is_used = execution.resources.contains(&handle.texture);

        let color = if is_external {
            "blue"
        } else if is_used {
            "black"
        } else {
            "gray"
        };
        let pen_width = if is_output { 3.0 } else { 1.0 };
        let ext_suffix = match state.map(|s| s.status) {
            Some(TextureMemoryStatus::External) => " (ext)",
            _ => "",
        };
        let (size, format) = info
            .map(|i| (i.size, i.format))
            .unwrap_or(((0, 0, 0), PixelFormat::Rgba8Unorm));

        let _ = writeln!(
            out,
            "  \"{}\" [shape=rectangle,label=\"{}{}\\n[{:?} {:?}]\",color={},fontcolor={},penwidth={}]",
            label, label, ext_suffix, size, format, color, color, pen_width
        );
    }

    out.push_str("}\n");
    out
}
