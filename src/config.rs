use std::{fmt, str::FromStr};

use bytemuck::{Pod, Zeroable};

use crate::error::FireError;

/// Which renderer paints the fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Variant {
    /// Simulation and palette lookup both run in fragment shaders
    #[default]
    Gpu,
    /// CPU simulation, painted as one pixel array per frame
    CpuBlit,
    /// CPU simulation, painted with one fill-rect per cell
    CpuFillRect,
}

impl Variant {
    pub fn is_cpu(&self) -> bool {
        !matches!(self, Variant::Gpu)
    }
}

impl FromStr for Variant {
    type Err = FireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpu" | "webgl" => Ok(Variant::Gpu),
            "cpu" | "cpu-blit" | "blit" | "canvas" => Ok(Variant::CpuBlit),
            "cpu-fill-rect" | "fill-rect" | "web" => Ok(Variant::CpuFillRect),
            other => Err(FireError::Config(format!("unknown variant `{other}`"))),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::Gpu => "gpu",
            Variant::CpuBlit => "cpu-blit",
            Variant::CpuFillRect => "cpu-fill-rect",
        })
    }
}

/// Knobs for the fire effect. The defaults are the classic 320×200 setup.
#[derive(Clone, Debug, PartialEq)]
pub struct FireConfig {
    pub width: u32,
    pub height: u32,
    /// Palette resolution of the shader pipeline
    pub gpu_palette_size: usize,
    /// Palette resolution of the CPU variants
    pub cpu_palette_size: usize,
    /// Largest cooling applied by one shader step, as a fraction of full heat.
    /// The mean is half of this.
    pub max_decay: f32,
    /// Timestamps are reduced modulo this many milliseconds before seeding
    /// the shader's hash
    pub time_wrap_ms: u32,
    pub variant: Variant,
}

impl Default for FireConfig {
    fn default() -> Self {
        const CPU_PALETTE_SIZE: usize = 80;
        Self {
            width: 320,
            height: 200,
            gpu_palette_size: 256,
            cpu_palette_size: CPU_PALETTE_SIZE,
            // half a CPU palette step per tick on average
            max_decay: 1.0 / (CPU_PALETTE_SIZE - 1) as f32,
            time_wrap_ms: 30_000,
            variant: Variant::Gpu,
        }
    }
}

impl FireConfig {
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Palette resolution used by the selected variant.
    pub fn palette_size(&self) -> usize {
        if self.variant.is_cpu() {
            self.cpu_palette_size
        } else {
            self.gpu_palette_size
        }
    }

    pub fn validate(&self) -> Result<(), FireError> {
        if self.width == 0 || self.height < 2 {
            return Err(FireError::Config(format!(
                "surface must be at least 1x2, got {}x{}",
                self.width, self.height
            )));
        }
        for size in [self.gpu_palette_size, self.cpu_palette_size] {
            if !(2..=256).contains(&size) {
                return Err(FireError::Config(format!(
                    "palette size must be in 2..=256, got {size}"
                )));
            }
        }
        if !(self.max_decay > 0.0 && self.max_decay <= 1.0) {
            return Err(FireError::Config(format!(
                "max_decay must be in (0, 1], got {}",
                self.max_decay
            )));
        }
        if self.time_wrap_ms == 0 {
            return Err(FireError::Config("time_wrap_ms must be non-zero".into()));
        }
        Ok(())
    }
}

/// Uniform block of the simulation program. Layout matches `SimUniforms` in
/// `simulate.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SimUniforms {
    pub view_size: [u32; 2],
    pub time_ms: u32,
    pub max_decay: f32,
}

impl SimUniforms {
    pub fn new(config: &FireConfig, time_ms: u32) -> Self {
        Self {
            view_size: [config.width, config.height],
            time_ms,
            max_decay: config.max_decay,
        }
    }
}

/// Uniform block of the render program. Layout matches `RenderUniforms` in
/// `render.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    pub surface_size: [f32; 2],
    pub palette_len: u32,
    pub _padding: u32,
}

impl RenderUniforms {
    pub fn new(surface_width: u32, surface_height: u32, palette_len: usize) -> Self {
        Self {
            surface_size: [surface_width.max(1) as f32, surface_height.max(1) as f32],
            palette_len: palette_len as u32,
            _padding: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FireConfig::default();
        config.validate().unwrap();
        assert_eq!((config.width, config.height), (320, 200));
        assert_eq!(config.palette_size(), 256);
        assert_eq!(config.with_variant(Variant::CpuBlit).palette_size(), 80);
    }

    #[test]
    fn parses_variant_names() {
        assert_eq!("gpu".parse::<Variant>().unwrap(), Variant::Gpu);
        assert_eq!(" CPU-Blit ".parse::<Variant>().unwrap(), Variant::CpuBlit);
        assert_eq!("fill-rect".parse::<Variant>().unwrap(), Variant::CpuFillRect);
        assert!("vulkan".parse::<Variant>().is_err());
        for v in [Variant::Gpu, Variant::CpuBlit, Variant::CpuFillRect] {
            assert_eq!(v.to_string().parse::<Variant>().unwrap(), v);
        }
    }

    #[test]
    fn rejects_bad_configs() {
        let base = FireConfig::default();
        let cases = [
            FireConfig { width: 0, ..base.clone() },
            FireConfig { height: 1, ..base.clone() },
            FireConfig { gpu_palette_size: 1, ..base.clone() },
            FireConfig { cpu_palette_size: 257, ..base.clone() },
            FireConfig { max_decay: 0.0, ..base.clone() },
            FireConfig { max_decay: f32::NAN, ..base.clone() },
            FireConfig { time_wrap_ms: 0, ..base.clone() },
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(FireError::Config(_))), "{config:?}");
        }
    }

    #[test]
    fn uniform_blocks_are_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<SimUniforms>(), 16);
        assert_eq!(std::mem::size_of::<RenderUniforms>(), 16);
        let u = SimUniforms::new(&FireConfig::default(), 1234);
        assert_eq!(u.view_size, [320, 200]);
        assert_eq!(u.time_ms, 1234);
    }
}
