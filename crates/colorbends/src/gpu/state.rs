use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::overlay::OverlayUniforms;
use crate::text::TextLayer;
use crate::types::{Antialiasing, GpuPowerPreference};
use crate::uniforms::ColorBendsUniforms;

use super::context::GpuContext;
use super::pipeline::Pipelines;

struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformSlot {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        size: usize,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Surface-sized texture holding the rasterised overlay text.
struct TextTarget {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl TextTarget {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: PhysicalSize<u32>,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("text layer"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("text layer"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        Self {
            texture,
            bind_group,
        }
    }

    fn upload(&self, queue: &wgpu::Queue, layer: &TextLayer) {
        let extent = self.texture.size();
        if (layer.width, layer.height) != (extent.width, extent.height) {
            tracing::debug!(
                layer_width = layer.width,
                layer_height = layer.height,
                "text layer does not match the surface; skipping upload"
            );
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &layer.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(layer.width * 4),
                rows_per_image: Some(layer.height),
            },
            extent,
        );
    }
}

/// Everything the window needs to put one frame on screen. Dropping it
/// releases the pipelines, buffers and surface.
pub(crate) struct GpuState {
    context: GpuContext,
    pipelines: Pipelines,
    background: UniformSlot,
    overlay: UniformSlot,
    text_sampler: wgpu::Sampler,
    text: TextTarget,
    multisample_target: Option<MultisampleTarget>,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
        power: GpuPowerPreference,
        transparent: bool,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, antialiasing, power, transparent)?;
        let pipelines = Pipelines::new(
            &context.device,
            context.surface_format,
            context.sample_count,
        )?;
        let background = UniformSlot::new(
            &context.device,
            &pipelines.uniform_layout,
            "background uniforms",
            std::mem::size_of::<ColorBendsUniforms>(),
        );
        let overlay = UniformSlot::new(
            &context.device,
            &pipelines.uniform_layout,
            "overlay uniforms",
            std::mem::size_of::<OverlayUniforms>(),
        );
        let text_sampler = context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("text layer sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let text = TextTarget::new(
            &context.device,
            &pipelines.text_layout,
            &text_sampler,
            context.size,
        );
        let multisample_target = Self::multisample_target_for(&context);

        tracing::info!(
            adapter = %context.adapter_name,
            width = context.size.width,
            height = context.size.height,
            "GPU renderer ready"
        );

        Ok(Self {
            context,
            pipelines,
            background,
            overlay,
            text_sampler,
            text,
            multisample_target,
        })
    }

    fn multisample_target_for(context: &GpuContext) -> Option<MultisampleTarget> {
        (context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    /// Returns whether the swapchain picked up the new size.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) -> bool {
        if !self.context.resize(new_size) {
            return false;
        }
        self.multisample_target = Self::multisample_target_for(&self.context);
        self.text = TextTarget::new(
            &self.context.device,
            &self.pipelines.text_layout,
            &self.text_sampler,
            self.context.size,
        );
        true
    }

    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    pub(crate) fn set_transparent(&mut self, transparent: bool) {
        self.context.set_transparent(transparent);
    }

    pub(crate) fn write_overlay(&self, uniforms: &OverlayUniforms) {
        self.context
            .queue
            .write_buffer(&self.overlay.buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub(crate) fn write_text(&self, layer: &TextLayer) {
        self.text.upload(&self.context.queue, layer);
    }

    /// Clears to `clear`, draws the background field, then the panels and
    /// the text layer when the overlay has any.
    pub(crate) fn render(
        &mut self,
        uniforms: &ColorBendsUniforms,
        draw_overlay: bool,
        draw_text: bool,
        clear: [f64; 4],
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.context
            .queue
            .write_buffer(&self.background.buffer, 0, bytemuck::bytes_of(uniforms));

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("colorbends encoder"),
            });

        {
            let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
                Some(msaa) => (&msaa.view, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("colorbends pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0],
                            g: clear[1],
                            b: clear[2],
                            a: clear[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipelines.background);
            render_pass.set_bind_group(0, &self.background.bind_group, &[]);
            render_pass.draw(0..3, 0..1);

            if draw_overlay {
                render_pass.set_pipeline(&self.pipelines.overlay);
                render_pass.set_bind_group(0, &self.overlay.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            if draw_text {
                render_pass.set_pipeline(&self.pipelines.text);
                render_pass.set_bind_group(0, &self.text.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
