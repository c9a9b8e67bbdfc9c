//! Painting a CPU fire buffer onto a 2D surface.

use crate::palette::Palette;
use crate::sim::FireBuffer;

/// A drawable that accepts a whole frame of RGBA pixels at once.
pub trait PixelSurface {
    fn put_pixels(&mut self, rgba: &[u8], width: u32, height: u32);
}

/// A drawable that fills axis-aligned rectangles with a CSS style.
pub trait RectSurface {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &str);
}

/// Map every cell through the palette into `rgba`, which must hold four
/// bytes per cell.
pub fn fill_rgba(buffer: &FireBuffer, palette: &Palette, rgba: &mut [u8]) {
    for (&index, px) in buffer.cells().iter().zip(rgba.chunks_exact_mut(4)) {
        px.copy_from_slice(&palette.get(index as usize).to_rgba());
    }
}

/// Pixel-array variant: build the frame in `scratch` and hand it over in one
/// call.
pub fn paint_blit<S: PixelSurface>(
    buffer: &FireBuffer,
    palette: &Palette,
    scratch: &mut Vec<u8>,
    surface: &mut S,
) {
    scratch.resize(buffer.cells().len() * 4, 0);
    fill_rgba(buffer, palette, scratch);
    surface.put_pixels(scratch, buffer.width() as u32, buffer.height() as u32);
}

/// Fill-rect variant: one 1x1 rectangle per cell, styled by palette index.
pub fn paint_fill_rect<S: RectSurface>(buffer: &FireBuffer, styles: &[String], surface: &mut S) {
    for y in 0..buffer.height() {
        for (x, &index) in buffer.row(y).iter().enumerate() {
            let style = &styles[(index as usize).min(styles.len() - 1)];
            surface.fill_rect(x as f64, y as f64, 1.0, 1.0, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(Vec<u8>, u32, u32)>,
        rects: Vec<(f64, f64, String)>,
    }

    impl PixelSurface for Recorder {
        fn put_pixels(&mut self, rgba: &[u8], width: u32, height: u32) {
            self.frames.push((rgba.to_vec(), width, height));
        }
    }

    impl RectSurface for Recorder {
        fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &str) {
            assert_eq!((w, h), (1.0, 1.0));
            self.rects.push((x, y, style.to_string()));
        }
    }

    #[test]
    fn blit_paints_fuel_line_white_and_the_rest_black() {
        let buffer = FireBuffer::new(8, 4, 80);
        let palette = Palette::generate(80).unwrap();
        let mut surface = Recorder::default();
        let mut scratch = Vec::new();
        paint_blit(&buffer, &palette, &mut scratch, &mut surface);

        let (rgba, w, h) = &surface.frames[0];
        assert_eq!((*w, *h), (8, 4));
        assert_eq!(rgba.len(), 8 * 4 * 4);
        let (top, bottom) = rgba.split_at(3 * 8 * 4);
        assert!(top.chunks(4).all(|px| px == [0, 0, 0, 255]));
        assert!(bottom.chunks(4).all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn fill_rect_touches_every_cell_once() {
        let buffer = FireBuffer::new(5, 3, 80);
        let styles = Palette::generate(80).unwrap().css_styles();
        let mut surface = Recorder::default();
        paint_fill_rect(&buffer, &styles, &mut surface);

        assert_eq!(surface.rects.len(), 15);
        assert_eq!(surface.rects[0], (0.0, 0.0, styles[0].clone()));
        assert_eq!(surface.rects[14], (4.0, 2.0, styles[79].clone()));
    }
}
