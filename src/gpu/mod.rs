//! Windowed fire renderer
//!
//! `FireRenderer` owns the wgpu instance, device, queue and surface, plus the
//! [`FirePipeline`] that does the actual work, and turns each presentation
//! tick into one simulation pass and one render pass.

use std::{sync::Arc, time::Duration};

use wgpu::{
    CommandEncoderDescriptor, Device, Instance, Queue, Surface, SurfaceConfiguration,
    TextureUsages, TextureViewDescriptor,
};
use winit::window::Window;

use crate::{
    config::{FireConfig, Variant},
    sim::FireBuffer,
    util::clock,
};

pub mod pipeline;
pub mod program;
pub mod textures;

pub use pipeline::FirePipeline;

/// How often the achieved frame rate is logged, in milliseconds
const FRAME_LOG_INTERVAL_MS: f64 = 2000.0;

pub struct FireRenderer {
    #[allow(dead_code)]
    instance: Instance, // Keep instance alive for the lifetime of the renderer
    device: Arc<Device>,
    queue: Arc<Queue>,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    pipeline: FirePipeline,
    /// Present only for the CPU blit variant
    cpu_buffer: Option<FireBuffer>,
    window: Arc<Window>,
    /// For debug logging: time of last frame rate log
    last_frame_log_time: f64,
    /// For debug logging: frames since last log
    frames_since_last_log: u32,
}

impl FireRenderer {
    /// Create the renderer for `window`.
    ///
    /// Every GPU resource is created here, once; a shader or program error
    /// aborts before the first frame.
    pub async fn new(window: Arc<Window>, config: FireConfig) -> Result<Self, anyhow::Error> {
        if config.variant == Variant::CpuFillRect {
            return Err(anyhow::anyhow!(
                "the {} variant paints through a 2D canvas, not a GPU surface",
                config.variant
            ));
        }

        let instance = Instance::new(&wgpu::InstanceDescriptor::default());

        // Create surface first to find compatible adapter
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await?;

        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("pixelfire device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let pipeline = FirePipeline::new(&device, &queue, surface_format, &config).await?;
        pipeline.set_surface_size(&queue, width, height);

        let cpu_buffer = (config.variant == Variant::CpuBlit).then(|| {
            FireBuffer::new(
                config.width as usize,
                config.height as usize,
                config.cpu_palette_size,
            )
        });

        Ok(Self {
            instance,
            device,
            queue,
            surface,
            surface_config,
            pipeline,
            cpu_buffer,
            window,
            last_frame_log_time: 0.0,
            frames_since_last_log: 0,
        })
    }

    /// Request a redraw of the window
    /// Call this after rendering to keep the animation loop going
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Run one presentation tick at `timestamp_ms`.
    ///
    /// GPU variant: simulate front → back, draw back, swap. CPU blit variant:
    /// step the CPU buffer, upload it, draw it.
    pub fn tick(&mut self, timestamp_ms: f64) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        match self.cpu_buffer {
            Some(ref mut buffer) => {
                buffer.step();
                self.pipeline
                    .blit(&self.queue, &mut encoder, &view, &buffer.to_intensity_rgba());
            }
            None => {
                let time_ms = clock::wrap_ms(timestamp_ms, self.pipeline.config().time_wrap_ms);
                self.pipeline.tick(&self.queue, &mut encoder, &view, time_ms);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.log_frame_rate(timestamp_ms);
        Ok(())
    }

    fn log_frame_rate(&mut self, now: f64) {
        self.frames_since_last_log += 1;
        if self.last_frame_log_time == 0.0 {
            self.last_frame_log_time = now;
        } else if now - self.last_frame_log_time >= FRAME_LOG_INTERVAL_MS {
            let elapsed = Duration::from_secs_f64((now - self.last_frame_log_time) / 1000.0);
            log::info!(
                "Frame rate: {:.1} fps ({} frames in {})",
                self.frames_since_last_log as f64 / elapsed.as_secs_f64(),
                self.frames_since_last_log,
                humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64))
            );
            self.last_frame_log_time = now;
            self.frames_since_last_log = 0;
        }
    }

    /// Reconfigure the surface, e.g. after it was lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
            self.pipeline.set_surface_size(&self.queue, width, height);
        }
    }

    /// Current surface size
    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }
}
