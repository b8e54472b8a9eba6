//! Rendering errors.

use climate_common::ClimateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid color '{0}': expected #rrggbb or #rrggbbaa")]
    InvalidColor(String),

    #[error("Invalid palette: {0}")]
    InvalidPalette(String),

    #[error("Invalid scale: min {min} must be below max {max}")]
    InvalidScale { min: f64, max: f64 },

    #[error("Data has {actual} values, expected {expected} for {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("PNG encoding failed: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RenderError> for ClimateError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Io(e) => ClimateError::Io(e),
            RenderError::Encoding(msg) => ClimateError::Encoding(msg),
            other => ClimateError::Configuration(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
