use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaterError {
    /// The shader stage needs a value that was never written.
    #[error("missing uniform: {0}")]
    MissingUniform(&'static str),

    #[error("unknown uniform: {0}")]
    UnknownUniform(String),

    #[error("uniform {name} expects a {expected} value")]
    UniformTypeMismatch {
        name: &'static str,
        expected: &'static str,
    },

    #[error("uniform {0} is written by the frame pipeline and cannot be edited")]
    ReadOnlyUniform(&'static str),

    #[error("render target allocation failed ({width}x{height}): {reason}")]
    TargetAllocationFailure {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("invalid wave descriptor: wavelength must be > 0, got {wavelength}")]
    InvalidWaveDescriptor { wavelength: f32 },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unknown render target #{0}")]
    UnknownTarget(u32),

    #[error("render target #{bound} is still bound")]
    TargetAlreadyBound { bound: u32 },

    #[error("texture handle for target #{target} is stale (generation {held}, current {current})")]
    StaleTexture { target: u32, held: u32, current: u32 },

    #[error("capture pass failed: {0}")]
    Capture(String),
}

pub type Result<T> = std::result::Result<T, WaterError>;
