//! Grid processing for climate overlays.
//!
//! - [`RasterFrame`]: one dense month of one variable, north-up
//! - [`SparseGrid`]: the valid cells of a frame, persisted as gzip JSON tiles
//! - [`Resampler`]: builds geographic-linear overlay pixels from either
//! - [`MonthlyAccumulator`]: multi-year per-month means
//!
//! # Architecture
//!
//! ```text
//! RasterFrame ──► SparseGrid::from_frame ──► write_gz ──► tiles/<var>/<YYYY>_<MM>.json.gz
//!      │                                                   │
//!      │                                  SparseGrid::read_gz
//!      ▼                                                   ▼
//!  CellLookup ◄────────────────────────────────────── CellLookup
//!      │
//!      ▼
//! Resampler::resample ──► PixelGrid (row 0 = north) ──► renderer
//! ```

pub mod accumulate;
pub mod error;
pub mod frame;
pub mod resample;
pub mod sparse;

pub use accumulate::MonthlyAccumulator;
pub use error::{GridProcessorError, Result};
pub use frame::{CellLookup, RasterFrame};
pub use resample::{PixelGrid, Resampler};
pub use sparse::{round_value, SparseGrid};
