use thiserror::Error;

/// Everything that can go wrong while building the fire effect.
///
/// All of these are construction-time failures. Once the frame loop is
/// running nothing here is produced any more.
#[derive(Debug, Error)]
pub enum FireError {
    #[error("invalid hue: {0} (must be in [0, 360))")]
    InvalidHue(f64),
    #[error("a palette needs at least 2 colors, got {0}")]
    PaletteTooSmall(usize),
    #[error("failed to compile shader `{label}`: {log}")]
    ShaderCompile { label: &'static str, log: String },
    #[error("failed to link program `{label}`: {log}")]
    ProgramLink { label: &'static str, log: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read back simulation texture: {0}")]
    Readback(String),
}
