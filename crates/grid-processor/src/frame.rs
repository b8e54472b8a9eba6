//! Dense raster frames and the cell lookup seam.

use climate_common::GridExtent;

use crate::error::{GridProcessorError, Result};

/// Read access to gridded values by projected coordinate.
///
/// Implemented by dense [`RasterFrame`]s and by [`crate::SparseGrid`] tiles
/// read back from disk, so the resampler can draw from either.
pub trait CellLookup: Sync {
    /// Extent of the underlying grid.
    fn extent(&self) -> &GridExtent;

    /// Value of the cell nearest to a projected coordinate, or `None` when
    /// the cell is missing or outside the grid.
    fn value_at(&self, x: f64, y: f64) -> Option<f64>;

    /// Every valid value, in no particular order.
    fn valid_values(&self) -> Vec<f64>;
}

/// One variable for one month on a regular grid, stored north-up in
/// row-major order. NaN marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterFrame {
    extent: GridExtent,
    values: Vec<f64>,
}

impl RasterFrame {
    pub fn new(extent: GridExtent, values: Vec<f64>) -> Result<Self> {
        let expected = extent.len();
        if values.len() != expected {
            return Err(GridProcessorError::ShapeMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { extent, values })
    }

    /// A frame with every cell set to the same value.
    pub fn filled(extent: GridExtent, value: f64) -> Self {
        Self {
            values: vec![value; extent.len()],
            extent,
        }
    }

    pub fn width(&self) -> usize {
        self.extent.width()
    }

    pub fn height(&self) -> usize {
        self.extent.height()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at (row, col), `None` when missing or out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        let v = self.values[self.extent.flat_index(row, col)];
        if v.is_finite() {
            Some(v)
        } else {
            None
        }
    }

    /// Set the value at (row, col). Out-of-range writes are ignored.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        if row < self.height() && col < self.width() {
            let idx = self.extent.flat_index(row, col);
            self.values[idx] = value;
        }
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }

    /// True when no cell holds a value.
    pub fn is_blank(&self) -> bool {
        self.valid_count() == 0
    }

    /// Iterate `(row, col, value)` over valid cells, north to south.
    pub fn iter_valid(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let width = self.width();
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(move |(i, &v)| (i / width, i % width, v))
    }
}

impl CellLookup for RasterFrame {
    fn extent(&self) -> &GridExtent {
        &self.extent
    }

    fn value_at(&self, x: f64, y: f64) -> Option<f64> {
        let (row, col) = self.extent.cell_index(x, y)?;
        self.get(row, col)
    }

    fn valid_values(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| v.is_finite()).collect()
    }
}
