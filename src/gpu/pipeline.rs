//! Device-level half of the fire effect: every GPU object the effect needs,
//! and the two passes that make up a tick.
//!
//! Nothing in here knows about windows or surfaces. A tick renders into any
//! texture view of the target format, which is what lets the tests drive it
//! headless.

use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingResource, BindingType, Buffer, BufferUsages, CommandEncoder,
    Device, LoadOp, Operations, Queue, RenderPassColorAttachment, RenderPassDescriptor,
    RenderPipeline, SamplerBindingType, ShaderStages, StoreOp, Texture, TextureFormat,
    TextureSampleType, TextureView, TextureViewDimension,
    util::{BufferInitDescriptor, DeviceExt},
};

use crate::{
    config::{FireConfig, RenderUniforms, SimUniforms},
    error::FireError,
    gpu::{
        program::{self, QUAD},
        textures::{self, SIM_FORMAT, SimTexturePair},
    },
    palette::Palette,
};

pub struct FirePipeline {
    config: FireConfig,
    textures: SimTexturePair,
    #[allow(dead_code)]
    palette_texture: Texture, // Keep the palette alive for the lifetime of the pipeline
    quad: Buffer,
    sim_program: RenderPipeline,
    render_program: RenderPipeline,
    sim_uniforms: Buffer,
    render_uniforms: Buffer,
    /// Indexed by the front texture they read
    sim_bind_groups: [BindGroup; 2],
    /// Indexed by the simulation texture they display
    render_bind_groups: [BindGroup; 2],
    palette_len: usize,
}

fn texture_entry(binding: u32, filterable: bool) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable },
            view_dimension: TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl FirePipeline {
    /// Build every GPU resource of the effect, in dependency order: palette,
    /// textures, quad, uniforms, programs, bind groups.
    ///
    /// `target_format` is the format of the views later passed to
    /// [`FirePipeline::tick`]. Fails if a shader doesn't compile or a
    /// program doesn't link.
    pub async fn new(
        device: &Device,
        queue: &Queue,
        target_format: TextureFormat,
        config: &FireConfig,
    ) -> Result<Self, FireError> {
        config.validate()?;
        let palette = Palette::generate(config.palette_size())?;
        let (palette_texture, palette_view) =
            textures::create_palette_texture(device, queue, &palette, target_format);

        let textures = SimTexturePair::new(device, queue, config.width, config.height);
        let sampler = textures::nearest_clamp_sampler(device);

        let quad = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("quad vertex buffer"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: BufferUsages::VERTEX,
        });

        let sim_uniforms = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("simulation uniforms"),
            contents: bytemuck::bytes_of(&SimUniforms::new(config, 0)),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let render_uniforms = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("render uniforms"),
            contents: bytemuck::bytes_of(&RenderUniforms::new(
                config.width,
                config.height,
                palette.len(),
            )),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        // Simulation program
        let sim_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("simulation bind group layout"),
            entries: &[texture_entry(0, false), uniform_entry(1)],
        });
        let sim_shader = program::compile_shader(
            device,
            "simulation shader",
            include_str!("./simulate.wgsl"),
        )
        .await?;
        let sim_program = program::link_program(
            device,
            "simulation program",
            &sim_shader,
            &sim_layout,
            SIM_FORMAT,
        )
        .await?;

        // Render program
        let render_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("render bind group layout"),
            entries: &[
                texture_entry(0, false),
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::NonFiltering),
                    count: None,
                },
                texture_entry(2, false),
                uniform_entry(3),
            ],
        });
        let render_shader =
            program::compile_shader(device, "render shader", include_str!("./render.wgsl"))
                .await?;
        let render_program = program::link_program(
            device,
            "render program",
            &render_shader,
            &render_layout,
            target_format,
        )
        .await?;

        let sim_bind_group = |front: usize| {
            device.create_bind_group(&BindGroupDescriptor {
                label: Some(if front == 0 {
                    "simulation bind group (tex0 -> tex1)"
                } else {
                    "simulation bind group (tex1 -> tex0)"
                }),
                layout: &sim_layout,
                entries: &[
                    BindGroupEntry {
                        binding: 0,
                        resource: BindingResource::TextureView(textures.view(front)),
                    },
                    BindGroupEntry {
                        binding: 1,
                        resource: sim_uniforms.as_entire_binding(),
                    },
                ],
            })
        };
        let render_bind_group = |shown: usize| {
            device.create_bind_group(&BindGroupDescriptor {
                label: Some(if shown == 0 {
                    "render bind group (tex0)"
                } else {
                    "render bind group (tex1)"
                }),
                layout: &render_layout,
                entries: &[
                    BindGroupEntry {
                        binding: 0,
                        resource: BindingResource::TextureView(textures.view(shown)),
                    },
                    BindGroupEntry {
                        binding: 1,
                        resource: BindingResource::Sampler(&sampler),
                    },
                    BindGroupEntry {
                        binding: 2,
                        resource: BindingResource::TextureView(&palette_view),
                    },
                    BindGroupEntry {
                        binding: 3,
                        resource: render_uniforms.as_entire_binding(),
                    },
                ],
            })
        };
        let sim_bind_groups = [sim_bind_group(0), sim_bind_group(1)];
        let render_bind_groups = [render_bind_group(0), render_bind_group(1)];

        log::info!(
            "fire pipeline ready: {}x{}, {} palette entries, {} variant",
            config.width,
            config.height,
            palette.len(),
            config.variant
        );

        Ok(Self {
            config: config.clone(),
            textures,
            palette_texture,
            quad,
            sim_program,
            render_program,
            sim_uniforms,
            render_uniforms,
            sim_bind_groups,
            render_bind_groups,
            palette_len: palette.len(),
        })
    }

    /// Record one simulation pass: front texture in, back texture out.
    pub fn encode_step(&self, queue: &Queue, encoder: &mut CommandEncoder, time_ms: u32) {
        queue.write_buffer(
            &self.sim_uniforms,
            0,
            bytemuck::bytes_of(&SimUniforms::new(&self.config, time_ms)),
        );
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("simulation pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: self.textures.view(self.textures.back()),
                resolve_target: None,
                ops: Operations {
                    // every texel is overwritten
                    load: LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.sim_program);
        pass.set_bind_group(0, &self.sim_bind_groups[self.textures.front()], &[]);
        pass.set_vertex_buffer(0, self.quad.slice(..));
        pass.draw(0..QUAD.len() as u32, 0..1);
    }

    /// Record one render pass showing simulation texture `shown` on `target`.
    pub fn encode_render(&self, encoder: &mut CommandEncoder, target: &TextureView, shown: usize) {
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("render pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(wgpu::Color::BLACK),
                    store: StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.render_program);
        pass.set_bind_group(0, &self.render_bind_groups[shown], &[]);
        pass.set_vertex_buffer(0, self.quad.slice(..));
        pass.draw(0..QUAD.len() as u32, 0..1);
    }

    /// A full GPU tick: simulate into the back texture, draw the back texture
    /// to `target`, then make it the front.
    pub fn tick(
        &mut self,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        time_ms: u32,
    ) {
        self.encode_step(queue, encoder, time_ms);
        self.encode_render(encoder, target, self.textures.back());
        self.textures.swap();
    }

    /// Replace the front texture with a CPU-simulated frame and draw it.
    ///
    /// `rgba` is W x H pixels with the normalized palette index in red, see
    /// [`crate::sim::FireBuffer::to_intensity_rgba`].
    pub fn blit(
        &self,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        rgba: &[u8],
    ) {
        let (width, height) = self.textures.size();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: self.textures.texture(self.textures.front()),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.encode_render(encoder, target, self.textures.front());
    }

    /// Tell the render program the drawable's size after a resize.
    pub fn set_surface_size(&self, queue: &Queue, width: u32, height: u32) {
        queue.write_buffer(
            &self.render_uniforms,
            0,
            bytemuck::bytes_of(&RenderUniforms::new(width, height, self.palette_len)),
        );
    }

    pub fn front(&self) -> usize {
        self.textures.front()
    }

    pub fn config(&self) -> &FireConfig {
        &self.config
    }

    /// Copy the front texture's red channel back to the CPU, row-major.
    pub async fn read_front(&self, device: &Device, queue: &Queue) -> Result<Vec<u8>, FireError> {
        let (width, height) = self.textures.size();
        let unpadded = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("simulation readback buffer"),
            size: padded as u64 * height as u64,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: self.textures.texture(self.textures.front()),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| FireError::Readback(e.to_string()))?;
        rx.receive()
            .await
            .ok_or_else(|| FireError::Readback("map callback dropped".into()))?
            .map_err(|e| FireError::Readback(e.to_string()))?;

        let data = slice.get_mapped_range();
        let reds = data
            .chunks(padded as usize)
            .flat_map(|row| row[..unpadded as usize].chunks(4).map(|px| px[0]))
            .collect();
        drop(data);
        staging.unmap();
        Ok(reds)
    }
}
