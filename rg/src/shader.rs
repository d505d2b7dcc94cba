//! Shader source compilation and descriptor reflection.
//!
//! Source is compiled to SPIR-V with `hassle-rs` (the DXC wrapper), then
//! reflected with `spirv-reflect` to recover the descriptor bindings the
//! shader expects, following the same `enumerate_descriptor_sets` pattern
//! the original shader cache used.

use std::path::Path;

use ash::vk;

use crate::error::{FramegraphError, Result};

/// One descriptor binding a shader module expects, recovered via reflection.
#[derive(Debug, Clone)]
pub struct DescriptorBinding {
    pub set: u32,
    pub binding: u32,
    pub name: String,
    pub is_uav: bool,
}

/// A compiled shader module plus the reflection data needed to build
/// descriptor set layouts and pipelines against it.
pub struct Shader {
    pub stage: vk::ShaderStageFlags,
    pub module: vk::ShaderModule,
    pub entry_point: String,
    pub bindings: Vec<DescriptorBinding>,
}

/// Infers a shader stage from a conventional file extension, matching the
/// `.vert`/`.geom`/`.frag`/`.comp` convention.
pub fn stage_from_extension(path: &Path) -> Result<vk::ShaderStageFlags> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("vert") => Ok(vk::ShaderStageFlags::VERTEX),
        Some("geom") => Ok(vk::ShaderStageFlags::GEOMETRY),
        Some("frag") => Ok(vk::ShaderStageFlags::FRAGMENT),
        Some("comp") => Ok(vk::ShaderStageFlags::COMPUTE),
        other => Err(FramegraphError::AllocationFailed(format!(
            "cannot infer shader stage from extension {:?}",
            other
        ))),
    }
}

fn hlsl_profile(stage: vk::ShaderStageFlags) -> &'static str {
    match stage {
        vk::ShaderStageFlags::VERTEX => "vs_6_0",
        vk::ShaderStageFlags::GEOMETRY => "gs_6_0",
        vk::ShaderStageFlags::FRAGMENT => "ps_6_0",
        vk::ShaderStageFlags::COMPUTE => "cs_6_0",
        _ => "lib_6_0",
    }
}

/// Compiles HLSL `source` for `stage`, creates a `VkShaderModule`, and
/// reflects its descriptor bindings.
pub fn compile(
    device: &ash::Device,
    name: &str,
    source: &str,
    entry_point: &str,
    stage: vk::ShaderStageFlags,
) -> Result<Shader> {
    let profile = hlsl_profile(stage);
    let spirv = hassle_rs::compile_hlsl(name, source, entry_point, profile, &["-spirv"], &[])
        .map_err(|e| FramegraphError::AllocationFailed(format!("shader compile failed: {e}")))?;

    let bindings = reflect_bindings(&spirv)?;

    let create_info = vk::ShaderModuleCreateInfo {
        code_size: spirv.len(),
        p_code: spirv.as_ptr() as *const u32,
        ..Default::default()
    };
    let module = unsafe { device.create_shader_module(&create_info, None) }?;

    log::debug!("compiled shader `{}` ({} bindings)", name, bindings.len());

    Ok(Shader {
        stage,
        module,
        entry_point: entry_point.to_string(),
        bindings,
    })
}

fn reflect_bindings(spirv: &[u8]) -> Result<Vec<DescriptorBinding>> {
    let reflect_module = spirv_reflect::ShaderModule::load_u8_data(spirv)
        .map_err(|e| FramegraphError::AllocationFailed(format!("reflection failed: {e}")))?;

    let mut bindings = Vec::new();
    for set in reflect_module
        .enumerate_descriptor_sets(None)
        .map_err(|e| FramegraphError::AllocationFailed(format!("reflection failed: {e}")))?
    {
        for binding in set.bindings {
            let is_uav = matches!(
                binding.resource_type,
                spirv_reflect::types::ReflectResourceType::UnorderedAccessView
            );
            bindings.push(DescriptorBinding {
                set: set.set,
                binding: binding.binding,
                name: binding.name,
                is_uav,
            });
        }
    }
    Ok(bindings)
}
