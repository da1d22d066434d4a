use anyhow::{Context, Result};

use crate::compile::{
    compile_background_shader, compile_overlay_shader, compile_text_shader, compile_vertex_shader,
};

/// The background and overlay passes bind a single uniform buffer at
/// `set = 0, binding = 0`.
pub(crate) fn uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("uniform layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// The text layer texture at `binding = 0` and its sampler at `binding = 1`.
pub(crate) fn text_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("text layer layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub(crate) struct Pipelines {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub text_layout: wgpu::BindGroupLayout,
    pub background: wgpu::RenderPipeline,
    pub overlay: wgpu::RenderPipeline,
    pub text: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Result<Self> {
        let uniform_layout = uniform_layout(device);
        let vertex_module = compile_vertex_shader(device)?;
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("colorbends pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let background_module =
            compile_background_shader(device).context("background shader rejected")?;
        let background = fullscreen_pipeline(
            device,
            "background pipeline",
            &pipeline_layout,
            &vertex_module,
            &background_module,
            surface_format,
            sample_count,
            None,
        );

        let overlay_module =
            compile_overlay_shader(device).context("overlay shader rejected")?;
        let overlay = fullscreen_pipeline(
            device,
            "overlay pipeline",
            &pipeline_layout,
            &vertex_module,
            &overlay_module,
            surface_format,
            sample_count,
            Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
        );

        let text_layout = text_layout(device);
        let text_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("text pipeline layout"),
            bind_group_layouts: &[&text_layout],
            push_constant_ranges: &[],
        });
        let text_module = compile_text_shader(device).context("text shader rejected")?;
        let text = fullscreen_pipeline(
            device,
            "text pipeline",
            &text_pipeline_layout,
            &vertex_module,
            &text_module,
            surface_format,
            sample_count,
            Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
        );

        Ok(Self {
            uniform_layout,
            text_layout,
            background,
            overlay,
            text,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    vertex_module: &wgpu::ShaderModule,
    fragment_module: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex_module,
            entry_point: Some("main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}
