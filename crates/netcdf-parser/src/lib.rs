//! Raster source for HadUK-Grid climate data.
//!
//! The pipeline reads gridded data through the [`RasterSource`] trait, one
//! variable and year at a time, as a [`YearStack`] of monthly frames in
//! north-up row order.
//!
//! - [`MemorySource`] keeps stacks in memory (tests, embedding)
//! - `NetCdfSource` reads HadUK-Grid files with libnetcdf; it needs the
//!   `native` feature and the system libraries `libhdf5-dev libnetcdf-dev`
//!
//! Files are located by a filename pattern per variable, see [`FilePattern`].

pub mod error;
pub mod pattern;
pub mod source;

#[cfg(feature = "native")]
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use pattern::{find_any_year, find_source_file, FilePattern};
pub use source::{MemorySource, RasterSource, YearStack};

#[cfg(feature = "native")]
pub use native::{read_extent, read_grid, silence_hdf5_errors, GridData, NetCdfSource};
