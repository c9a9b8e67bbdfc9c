//! Heat ramp palette: black → red → yellow → white.

use crate::{error::FireError, util::Color};

/// A point on the heat ramp in cylindrical HSL coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    /// Degrees, [0, 360)
    pub h: f64,
    /// [0, 1]
    pub s: f64,
    /// [0, 1]
    pub l: f64,
}

impl Hsl {
    /// Ramp position `index` of `size`. `size` must be at least 2.
    pub fn heat_ramp(index: usize, size: usize) -> Hsl {
        let t = index as f64 / (size - 1) as f64;
        Hsl {
            h: 60.0 * t,
            s: 1.0,
            l: t,
        }
    }

    pub fn to_rgb(&self) -> Result<Color, FireError> {
        hsl_to_rgb(self.h, self.s, self.l)
    }

    /// CSS color string, as painted by the fill-rect variant.
    pub fn to_css(&self) -> String {
        format!("hsl({}, {}%, {}%)", self.h, self.s * 100.0, self.l * 100.0)
    }
}

/// Standard six-sector HSL → 8-bit RGB conversion.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Result<Color, FireError> {
    if !(0.0..360.0).contains(&h) {
        return Err(FireError::InvalidHue(h));
    }
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp.floor() as u8 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        5 => (c, 0.0, x),
        _ => return Err(FireError::InvalidHue(h)),
    };
    let m = l - c / 2.0;
    let channel = |v: f64| ((v + m) * 256.0).floor().clamp(0.0, 255.0) as u8;
    Ok(Color::rgb(channel(r), channel(g), channel(b)))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Build the `size`-entry heat ramp.
    pub fn generate(size: usize) -> Result<Palette, FireError> {
        if size < 2 {
            return Err(FireError::PaletteTooSmall(size));
        }
        let colors = (0..size)
            .map(|i| Hsl::heat_ramp(i, size).to_rgb())
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("generated {size}-color palette");
        Ok(Palette { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Color at `index`, clamped to the hottest entry.
    pub fn get(&self, index: usize) -> Color {
        self.colors[index.min(self.colors.len() - 1)]
    }

    /// Row-major RGBA bytes, the layout of the palette texture.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(Color::to_rgba).collect()
    }

    /// CSS fill styles for every entry, in order.
    pub fn css_styles(&self) -> Vec<String> {
        (0..self.len())
            .map(|i| Hsl::heat_ramp(i, self.len()).to_css())
            .collect()
    }
}
