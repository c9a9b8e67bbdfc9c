use std::sync::Arc;

use crate::{
    config::{FireConfig, Variant},
    gpu::FireRenderer,
    util::clock,
};
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use web_sys::HtmlCanvasElement;
use winit::{
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{EventLoop, EventLoopProxy},
    window::WindowAttributes,
};

#[cfg(target_arch = "wasm32")]
use winit::platform::web::WindowAttributesExtWebSys;

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod config;
pub mod error;
pub mod gpu;
pub mod palette;
pub mod rendering;
pub mod sim;
pub mod util;

pub use error::FireError;

/// Message type for GPU renderer events
pub enum GpuMessage {
    Initialized(FireRenderer),
    Error(String),
}

struct Application {
    proxy: Option<EventLoopProxy<GpuMessage>>,
    renderer: Option<FireRenderer>,
    config: FireConfig,
}

impl Application {
    fn new(event_loop: &EventLoop<GpuMessage>, config: FireConfig) -> Self {
        Self {
            proxy: Some(event_loop.create_proxy()),
            renderer: None,
            config,
        }
    }

    fn window_attributes(&self) -> WindowAttributes {
        WindowAttributes::default()
            .with_title("pixelfire")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false)
    }
}

impl winit::application::ApplicationHandler<GpuMessage> for Application {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        #[cfg(target_arch = "wasm32")]
        {
            let canvas: HtmlCanvasElement =
                match canvas::canvas_element("fire-surface", self.config.width, self.config.height)
                {
                    Ok(canvas) => canvas,
                    Err(e) => {
                        log::error!("could not get a canvas: {e:?}");
                        return;
                    }
                };
            let window_attrs = self.window_attributes().with_canvas(Some(canvas));
            match event_loop.create_window(window_attrs) {
                Ok(window) => {
                    if let Some(proxy) = self.proxy.take() {
                        let window = Arc::new(window);
                        let config = self.config.clone();

                        wasm_bindgen_futures::spawn_local(async move {
                            match FireRenderer::new(window, config).await {
                                Ok(renderer) => {
                                    let _ = proxy.send_event(GpuMessage::Initialized(renderer));
                                }
                                Err(e) => {
                                    // Error will be logged in user_event handler
                                    let _ = proxy.send_event(GpuMessage::Error(e.to_string()));
                                }
                            }
                        });
                    }
                }
                Err(e) => log::error!("failed to create window: {e}"),
            };
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            match event_loop.create_window(self.window_attributes()) {
                Ok(window) => {
                    if let Some(proxy) = self.proxy.take() {
                        let window = Arc::new(window);
                        let config = self.config.clone();

                        // On native, use pollster to block on the future
                        match pollster::block_on(FireRenderer::new(window, config)) {
                            Ok(renderer) => {
                                let _ = proxy.send_event(GpuMessage::Initialized(renderer));
                            }
                            Err(e) => {
                                let _ = proxy.send_event(GpuMessage::Error(e.to_string()));
                            }
                        }
                    }
                }
                Err(e) => log::error!("failed to create window: {e}"),
            };
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.renderer = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ref mut renderer) = self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(ref mut renderer) = self.renderer {
                    match renderer.tick(clock::now_ms()) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost) => {
                            // Reconfigure the surface
                            let (w, h) = renderer.surface_size();
                            renderer.resize(w, h);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("Out of memory!");
                            event_loop.exit();
                            return;
                        }
                        Err(e) => log::warn!("Surface error: {e:?}"),
                    }
                    renderer.request_redraw();
                }
            }
            _ => (),
        };
    }

    fn user_event(&mut self, event_loop: &winit::event_loop::ActiveEventLoop, event: GpuMessage) {
        match event {
            GpuMessage::Initialized(renderer) => {
                log::info!("GPU renderer initialized successfully");
                // Request first redraw to kick off the animation loop
                renderer.request_redraw();
                self.renderer = Some(renderer);
            }
            GpuMessage::Error(e) => {
                // nothing sensible to show without the pipeline
                log::error!("GPU initialization error: {e}");
                event_loop.exit();
            }
        }
    }
}

#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();
    let _ = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(fern::Output::call(console_log::log))
        .apply();
}

/// Install the native logger: stdout with RFC 3339 timestamps.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_native_logging(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("wgpu_core", log::LevelFilter::Warn)
        .level_for("wgpu_hal", log::LevelFilter::Warn)
        .level_for("naga", log::LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()
}

/// Run the fire in a window until it is closed.
///
/// Supports the GPU and CPU blit variants; the fill-rect variant only exists
/// on a browser canvas.
pub fn run(config: FireConfig) -> Result<(), anyhow::Error> {
    config.validate()?;
    if config.variant == Variant::CpuFillRect {
        anyhow::bail!("the {} variant needs a browser canvas", config.variant);
    }
    log::info!("Starting fire effect ({} variant)", config.variant);

    let event_loop = EventLoop::<GpuMessage>::with_user_event().build()?;

    #[allow(unused_mut)]
    let mut app = Application::new(&event_loop, config);

    // On web, we need to spawn the event loop
    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        event_loop.spawn_app(app);
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        event_loop.run_app(&mut app)?;
    }
    Ok(())
}

/// Start the shader fire on the page's `fire-surface` canvas.
#[wasm_bindgen]
pub fn start() -> Result<(), JsValue> {
    start_variant("gpu")
}

/// Start the named variant: `gpu`, `cpu-blit` or `cpu-fill-rect`.
#[wasm_bindgen]
pub fn start_variant(name: &str) -> Result<(), JsValue> {
    let variant: Variant = name.parse().map_err(|e: FireError| e.to_string())?;
    let config = FireConfig::default().with_variant(variant);

    #[cfg(target_arch = "wasm32")]
    if variant.is_cpu() {
        return canvas::run(config);
    }

    run(config).map_err(|e| JsValue::from_str(&e.to_string()))
}
