//! Error types for raster source operations.

use climate_common::{ClimateError, Variable};
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No file for this variable and year
    #[error("No {variable} file for {year}: {detail}")]
    MissingFile {
        variable: Variable,
        year: i32,
        detail: String,
    },

    /// Missing required variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Values do not fit the grid
    #[error("Shape mismatch: {0}")]
    Shape(String),
}

impl From<NetCdfError> for ClimateError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::MissingFile {
                variable,
                year,
                detail,
            } => ClimateError::MissingSourceFile {
                variable: variable.to_string(),
                year,
                detail,
            },
            NetCdfError::IoError(e) => ClimateError::Io(e),
            other => ClimateError::InvalidSource(other.to_string()),
        }
    }
}

impl From<ClimateError> for NetCdfError {
    fn from(err: ClimateError) -> Self {
        NetCdfError::InvalidFormat(err.to_string())
    }
}
