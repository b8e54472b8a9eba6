//! UK climate map overlays from HadUK-Grid data.
//!
//! Monthly British National Grid rasters are written as sparse gzip JSON
//! tiles, then resampled onto a geographic-linear pixel grid and written as
//! PNG overlays that a web map stretches over [`GeoBounds`] without further
//! projection. See [`OverlayWriter`] for the batch stages.
//!
//! [`GeoBounds`]: climate_common::GeoBounds

pub mod config;
pub mod metadata;
pub mod pipeline;
pub mod report;
pub mod tile_store;

pub use config::{OverlayConfig, ScaleMode};
pub use metadata::{OverlayMetadata, ReferenceStats, ReferenceTracker};
pub use pipeline::{Location, OverlayWriter};
pub use report::{BatchOutcome, BatchReport, Layer, PeriodKey};
pub use tile_store::{ImageStore, TileStore};
