//! Shader compilation and program linking.
//!
//! wgpu reports both through the device's error scopes rather than return
//! values, so each step runs inside a validation scope and turns whatever
//! comes out of it into a [`FireError`].

use wgpu::{
    BindGroupLayout, CompilationMessageType, Device, ErrorFilter, FragmentState,
    MultisampleState, PipelineLayoutDescriptor, PrimitiveState, PrimitiveTopology,
    RenderPipeline, RenderPipelineDescriptor, ShaderModule, ShaderModuleDescriptor, ShaderSource,
    TextureFormat, VertexBufferLayout, VertexState, VertexStepMode,
};

use crate::error::FireError;

/// Corners of the full-viewport quad, drawn as a triangle strip.
pub const QUAD: [[f32; 2]; 4] = [
    [-1.0, 1.0],  // upper left
    [-1.0, -1.0], // lower left
    [1.0, 1.0],   // upper right
    [1.0, -1.0],  // lower right
];

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

pub fn quad_layout() -> VertexBufferLayout<'static> {
    VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
        step_mode: VertexStepMode::Vertex,
        attributes: &QUAD_ATTRIBUTES,
    }
}

/// Compile WGSL source, failing with the compiler's log on any error.
pub async fn compile_shader(
    device: &Device,
    label: &'static str,
    source: &str,
) -> Result<ShaderModule, FireError> {
    device.push_error_scope(ErrorFilter::Validation);
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(label),
        source: ShaderSource::Wgsl(source.into()),
    });
    let info = module.get_compilation_info().await;
    let scope_error = device.pop_error_scope().await;

    let log = info
        .messages
        .iter()
        .filter(|m| matches!(m.message_type, CompilationMessageType::Error))
        .map(|m| match &m.location {
            Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, m.message),
            None => m.message.clone(),
        })
        .collect::<Vec<_>>();

    if !log.is_empty() || scope_error.is_some() {
        let mut log = log.join("\n");
        if let Some(e) = scope_error {
            if !log.is_empty() {
                log.push('\n');
            }
            log.push_str(&e.to_string());
        }
        return Err(FireError::ShaderCompile { label, log });
    }
    log::debug!("compiled shader `{label}`");
    Ok(module)
}

/// Link a full-screen program: the quad vertex stage plus `module`'s
/// fragment stage, writing one color target of `target_format`.
pub async fn link_program(
    device: &Device,
    label: &'static str,
    module: &ShaderModule,
    bind_group_layout: &BindGroupLayout,
    target_format: TextureFormat,
) -> Result<RenderPipeline, FireError> {
    device.push_error_scope(ErrorFilter::Validation);
    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[quad_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    });
    if let Some(e) = device.pop_error_scope().await {
        return Err(FireError::ProgramLink {
            label,
            log: e.to_string(),
        });
    }
    log::debug!("linked program `{label}`");
    Ok(pipeline)
}
