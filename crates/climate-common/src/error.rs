//! Error types for the climate overlay pipeline.

use thiserror::Error;

/// Result type alias using ClimateError.
pub type ClimateResult<T> = Result<T, ClimateError>;

/// Primary error type for pipeline operations.
///
/// The first four variants carry the batch recovery policy: a missing source
/// file skips its period, a reprojection failure blanks one pixel, an empty
/// frame renders transparent, and a configuration error aborts the batch.
#[derive(Debug, Error)]
pub enum ClimateError {
    #[error("Source file missing for {variable} {year}: {detail}")]
    MissingSourceFile {
        variable: String,
        year: i32,
        detail: String,
    },

    #[error("Reprojection failed: {0}")]
    Reprojection(String),

    #[error("Frame has no valid values: {0}")]
    EmptyFrame(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // === I/O and encoding ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid source data: {0}")]
    InvalidSource(String),
}

impl ClimateError {
    /// Shorthand for a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether a batch can continue past this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ClimateError::Configuration(_))
    }

    /// Short machine-readable tag, used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ClimateError::MissingSourceFile { .. } => "missing_source_file",
            ClimateError::Reprojection(_) => "reprojection",
            ClimateError::EmptyFrame(_) => "empty_frame",
            ClimateError::Configuration(_) => "configuration",
            ClimateError::Io(_) => "io",
            ClimateError::Serialization(_) => "serialization",
            ClimateError::Encoding(_) => "encoding",
            ClimateError::InvalidSource(_) => "invalid_source",
        }
    }
}

impl From<serde_json::Error> for ClimateError {
    fn from(err: serde_json::Error) -> Self {
        ClimateError::Serialization(format!("JSON error: {}", err))
    }
}
