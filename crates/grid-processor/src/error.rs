//! Error types for grid processing.

use climate_common::ClimateError;
use thiserror::Error;

/// Errors that can occur while building, persisting or resampling grids.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Data length does not match the extent's cell count.
    #[error("shape mismatch: extent has {expected} cells, data has {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Two grids that must share an extent do not.
    #[error("extent mismatch: {0}")]
    ExtentMismatch(String),

    /// Bad resampler or extent parameters.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Tile (de)serialization error.
    #[error("tile format error: {0}")]
    TileFormat(String),
}

impl GridProcessorError {
    /// Create a ConfigError.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an ExtentMismatch error.
    pub fn extent_mismatch(msg: impl Into<String>) -> Self {
        Self::ExtentMismatch(msg.into())
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for GridProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::TileFormat(err.to_string())
    }
}

impl From<ClimateError> for GridProcessorError {
    fn from(err: ClimateError) -> Self {
        match err {
            ClimateError::Configuration(msg) => Self::ConfigError(msg),
            ClimateError::Io(e) => Self::StorageError(e.to_string()),
            other => Self::TileFormat(other.to_string()),
        }
    }
}

impl From<GridProcessorError> for ClimateError {
    fn from(err: GridProcessorError) -> Self {
        match err {
            GridProcessorError::ConfigError(msg) => ClimateError::Configuration(msg),
            GridProcessorError::StorageError(msg) => {
                ClimateError::Io(std::io::Error::new(std::io::ErrorKind::Other, msg))
            }
            GridProcessorError::TileFormat(msg) => ClimateError::Serialization(msg),
            other => ClimateError::InvalidSource(other.to_string()),
        }
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
