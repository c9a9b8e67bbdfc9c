//! The CPU variants in the browser, painted through a 2D canvas context.

use std::{cell::RefCell, rc::Rc};

use wasm_bindgen::{Clamped, prelude::*};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::{
    config::{FireConfig, Variant},
    palette::Palette,
    rendering::{self, PixelSurface, RectSurface},
    sim::FireBuffer,
};

impl PixelSurface for CanvasRenderingContext2d {
    fn put_pixels(&mut self, rgba: &[u8], width: u32, height: u32) {
        match ImageData::new_with_u8_clamped_array_and_sh(Clamped(rgba), width, height) {
            Ok(image) => {
                if let Err(e) = self.put_image_data(&image, 0.0, 0.0) {
                    log::warn!("put_image_data failed: {e:?}");
                }
            }
            Err(e) => log::warn!("failed to build ImageData: {e:?}"),
        }
    }
}

impl RectSurface for CanvasRenderingContext2d {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &str) {
        self.set_fill_style_str(style);
        CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
    }
}

/// Find the canvas with `id`, or create one and append it to the body.
pub fn canvas_element(id: &str, width: u32, height: u32) -> Result<HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .ok_or("no window")?
        .document()
        .ok_or("no document")?;
    let canvas: HtmlCanvasElement = match document.get_element_by_id(id) {
        Some(element) => element
            .dyn_into()
            .map_err(|_| format!("`{id}` is not a canvas"))?,
        None => {
            let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
            canvas.set_id(id);
            document
                .body()
                .ok_or("document has no body")?
                .append_child(&canvas)?;
            canvas
        }
    };
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}

/// Painter state owned by the animation frame closure.
struct CanvasFire {
    ctx: CanvasRenderingContext2d,
    buffer: FireBuffer,
    palette: Palette,
    styles: Vec<String>,
    scratch: Vec<u8>,
    variant: Variant,
}

impl CanvasFire {
    fn frame(&mut self) {
        self.buffer.step();
        match self.variant {
            Variant::CpuFillRect => {
                rendering::paint_fill_rect(&self.buffer, &self.styles, &mut self.ctx)
            }
            _ => rendering::paint_blit(&self.buffer, &self.palette, &mut self.scratch, &mut self.ctx),
        }
    }
}

fn request_animation_frame(f: &Closure<dyn FnMut(f64)>) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or("no window")?
        .request_animation_frame(f.as_ref().unchecked_ref())
}

/// Start one of the CPU variants on a 2D canvas and keep it running with
/// `requestAnimationFrame`.
pub fn run(config: FireConfig) -> Result<(), JsValue> {
    config.validate().map_err(|e| e.to_string())?;
    if !config.variant.is_cpu() {
        return Err(format!("{} is not a canvas variant", config.variant).into());
    }

    let canvas = canvas_element("fire-surface", config.width, config.height)?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or("2d context unavailable")?
        .dyn_into()?;

    let palette = Palette::generate(config.cpu_palette_size).map_err(|e| e.to_string())?;
    let mut fire = CanvasFire {
        ctx,
        buffer: FireBuffer::new(
            config.width as usize,
            config.height as usize,
            config.cpu_palette_size,
        ),
        styles: palette.css_styles(),
        palette,
        scratch: Vec::new(),
        variant: config.variant,
    };
    if fire.variant == Variant::CpuBlit {
        // opaque black until the first frame lands
        fire.ctx.set_fill_style_str("black");
        CanvasRenderingContext2d::fill_rect(
            &fire.ctx,
            0.0,
            0.0,
            config.width as f64,
            config.height as f64,
        );
    }
    log::info!("Starting {} variant on a 2D canvas", config.variant);

    // The closure re-registers itself each frame, so it has to own a handle
    // to itself.
    let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = callback.clone();
    *callback.borrow_mut() = Some(Closure::new(move |_timestamp: f64| {
        fire.frame();
        if let Some(f) = next.borrow().as_ref() {
            if let Err(e) = request_animation_frame(f) {
                log::error!("failed to schedule next frame: {e:?}");
            }
        }
    }));
    if let Some(f) = callback.borrow().as_ref() {
        request_animation_frame(f)?;
    }
    Ok(())
}
