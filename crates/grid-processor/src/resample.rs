//! Geographic-linear resampling of projected grids.
//!
//! Map clients stretch an image overlay linearly over its latitude/longitude
//! bounds. The resampler builds pixels with exactly that mapping, so row 0 is
//! the north edge and row `height - 1` the south edge:
//!
//! ```text
//! lat = north - r / (H - 1) * (north - south)
//! lng = west  + c / (W - 1) * (east - west)
//! ```
//!
//! Each pixel's coordinate is reprojected into the source grid's CRS and
//! takes the value of the nearest source cell. Missing cells and coordinates
//! the transform cannot carry stay NaN, which renders as transparent.

use climate_common::{CrsCode, GeoBounds};
use projection::{ReprojectionError, Reprojector};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{GridProcessorError, Result};
use crate::frame::CellLookup;

/// Resampled values for every output pixel, row 0 north. NaN means no data.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl PixelGrid {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let v = self.values[row * self.width + col];
        if v.is_finite() {
            Some(v)
        } else {
            None
        }
    }

    /// Number of pixels carrying a value.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }
}

/// Maps output pixels to source grid cells for one overlay geometry.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    bounds: GeoBounds,
    width: usize,
    height: usize,
    to_source: Reprojector,
}

impl Resampler {
    /// Create a resampler for an overlay of `width` x `height` pixels over
    /// `bounds`, drawing from grids in `source_crs`.
    ///
    /// Both dimensions must be at least 2 so the corner pixels land exactly
    /// on the bounds.
    pub fn new(bounds: GeoBounds, width: usize, height: usize, source_crs: CrsCode) -> Result<Self> {
        if width < 2 || height < 2 {
            return Err(GridProcessorError::config(format!(
                "overlay must be at least 2x2 pixels, got {}x{}",
                width, height
            )));
        }
        bounds.validate()?;

        Ok(Self {
            bounds,
            width,
            height,
            to_source: Reprojector::new(CrsCode::Epsg4326, source_crs),
        })
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Geographic `(lat, lng)` of a pixel.
    pub fn pixel_to_geo(&self, row: usize, col: usize) -> (f64, f64) {
        let b = &self.bounds;
        let fy = row as f64 / (self.height - 1) as f64;
        let fx = col as f64 / (self.width - 1) as f64;
        (b.north - fy * (b.north - b.south), b.west + fx * (b.east - b.west))
    }

    /// Nearest pixel to a geographic coordinate, `None` outside the bounds.
    pub fn geo_to_pixel(&self, lat: f64, lng: f64) -> Option<(usize, usize)> {
        if !lat.is_finite() || !lng.is_finite() || !self.bounds.contains(lat, lng) {
            return None;
        }
        let b = &self.bounds;
        let row = ((b.north - lat) / (b.north - b.south) * (self.height - 1) as f64).round();
        let col = ((lng - b.west) / (b.east - b.west) * (self.width - 1) as f64).round();
        Some((row as usize, col as usize))
    }

    /// Source-CRS coordinate of a pixel.
    pub fn source_coord(&self, row: usize, col: usize) -> std::result::Result<(f64, f64), ReprojectionError> {
        let (lat, lng) = self.pixel_to_geo(row, col);
        self.to_source.transform_xy(lng, lat)
    }

    /// Value for one pixel, `None` for no data.
    pub fn sample<L: CellLookup + ?Sized>(&self, lookup: &L, row: usize, col: usize) -> Option<f64> {
        let (x, y) = self.source_coord(row, col).ok()?;
        lookup.value_at(x, y)
    }

    /// Resample a whole grid, one output row per rayon task.
    pub fn resample<L: CellLookup + ?Sized>(&self, lookup: &L) -> PixelGrid {
        let width = self.width;
        let mut values = vec![f64::NAN; width * self.height];

        values
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, out)| {
                for (col, px) in out.iter_mut().enumerate() {
                    if let Some(v) = self.sample(lookup, row, col) {
                        *px = v;
                    }
                }
            });

        let grid = PixelGrid {
            width,
            height: self.height,
            values,
        };
        debug!(
            width = grid.width,
            height = grid.height,
            valid = grid.valid_count(),
            "Resampled grid"
        );
        grid
    }
}
