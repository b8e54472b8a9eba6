//! Sparse grid tiles.
//!
//! A tile keeps only the valid cells of a frame, as a two-level map from
//! integer easting to integer northing to value:
//!
//! ```text
//! { "457500": { "166500": 12.3, ... }, ... }
//! ```
//!
//! Keys are cell-center coordinates and values are rounded to one decimal
//! place. Tiles are stored as gzip-compressed JSON.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use climate_common::GridExtent;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::error::{GridProcessorError, Result};
use crate::frame::{CellLookup, RasterFrame};

type Cells = BTreeMap<i64, BTreeMap<i64, f64>>;

/// Round to the one-decimal precision stored in tiles.
pub fn round_value(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn coord_key(v: f64) -> i64 {
    v.round() as i64
}

/// Valid cells of one frame, keyed by cell-center coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseGrid {
    extent: GridExtent,
    cells: Cells,
}

impl SparseGrid {
    /// An empty tile over `extent`.
    pub fn empty(extent: GridExtent) -> Self {
        Self {
            extent,
            cells: Cells::new(),
        }
    }

    /// Keep the valid cells of a frame.
    pub fn from_frame(frame: &RasterFrame) -> Self {
        let extent = *frame.extent();
        let mut grid = Self::empty(extent);
        for (row, col, value) in frame.iter_valid() {
            let (x, y) = extent.index_to_coord(row as i64, col as i64);
            grid.insert(x, y, value);
        }
        grid
    }

    /// Store a value at the cell center containing `(x, y)`.
    pub fn insert(&mut self, x: f64, y: f64, value: f64) {
        if !value.is_finite() {
            return;
        }
        let (cx, cy) = self.extent.snap_to_center(x, y);
        self.cells
            .entry(coord_key(cx))
            .or_default()
            .insert(coord_key(cy), round_value(value));
    }

    /// Look up the value of the cell nearest to `(x, y)`.
    ///
    /// The coordinate is snapped to the nearest cell center of the extent's
    /// lattice before the two-level key lookup.
    pub fn lookup(&self, x: f64, y: f64) -> Option<f64> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (cx, cy) = self.nearest_center(x, y);
        self.cells
            .get(&coord_key(cx))
            .and_then(|column| column.get(&coord_key(cy)))
            .copied()
    }

    fn nearest_center(&self, x: f64, y: f64) -> (f64, f64) {
        let res = self.extent.resolution;
        let x0 = self.extent.x_min + res / 2.0;
        let y0 = self.extent.y_max - res / 2.0;
        let cx = x0 + ((x - x0) / res).round() * res;
        let cy = y0 - ((y0 - y) / res).round() * res;
        (cx, cy)
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Expand back into a dense frame over the tile's extent.
    pub fn to_frame(&self) -> RasterFrame {
        let mut frame = RasterFrame::filled(self.extent, f64::NAN);
        for (&x, column) in &self.cells {
            for (&y, &value) in column {
                if let Some((row, col)) = self.extent.cell_index(x as f64, y as f64) {
                    frame.set(row, col, value);
                }
            }
        }
        frame
    }

    /// Serialize the cell map as compact JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.cells)?)
    }

    /// Parse a cell map previously written by [`SparseGrid::to_json`].
    pub fn from_json(extent: GridExtent, bytes: &[u8]) -> Result<Self> {
        let cells: Cells = serde_json::from_slice(bytes)?;
        if cells
            .values()
            .flat_map(BTreeMap::values)
            .any(|v| !v.is_finite())
        {
            return Err(GridProcessorError::TileFormat(
                "tile contains non-finite values".to_string(),
            ));
        }
        Ok(Self { extent, cells })
    }

    /// Write the tile as gzip-compressed JSON, creating parent directories.
    pub fn write_gz(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = self.to_json()?;
        let file = File::create(path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(&json)?;
        encoder.finish()?.flush()?;

        debug!(path = %path.display(), cells = self.len(), "Wrote sparse tile");
        Ok(())
    }

    /// Read a gzip-compressed tile.
    pub fn read_gz(extent: GridExtent, path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut json = Vec::new();
        decoder.read_to_end(&mut json)?;
        Self::from_json(extent, &json)
    }
}

impl CellLookup for SparseGrid {
    fn extent(&self) -> &GridExtent {
        &self.extent
    }

    fn value_at(&self, x: f64, y: f64) -> Option<f64> {
        self.lookup(x, y)
    }

    fn valid_values(&self) -> Vec<f64> {
        self.cells
            .values()
            .flat_map(|column| column.values().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use climate_common::CrsCode;

    fn haduk_like() -> GridExtent {
        // Centers at ...500, like the HadUK 1 km grid.
        GridExtent::new(-2000.0, 1000.0, 0.0, 2000.0, 1000.0, CrsCode::Epsg27700).unwrap()
    }

    #[test]
    fn test_round_value() {
        assert_eq!(round_value(12.34), 12.3);
        assert_eq!(round_value(-3.25), -3.3);
        assert_eq!(round_value(7.0), 7.0);
    }

    #[test]
    fn test_from_frame_keeps_only_valid_cells() {
        let frame = RasterFrame::new(
            haduk_like(),
            vec![1.04, f64::NAN, 3.0, f64::NAN, 5.56, f64::NAN],
        )
        .unwrap();
        let grid = SparseGrid::from_frame(&frame);
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.lookup(-1500.0, 1500.0), Some(1.0));
        assert_eq!(grid.lookup(500.0, 1500.0), Some(3.0));
        assert_eq!(grid.lookup(-500.0, 500.0), Some(5.6));
        assert_eq!(grid.lookup(-500.0, 1500.0), None);
    }

    #[test]
    fn test_lookup_snaps_to_nearest_center() {
        let mut grid = SparseGrid::empty(haduk_like());
        grid.insert(-500.0, 500.0, 9.0);
        assert_eq!(grid.lookup(-120.0, 910.0), Some(9.0));
        assert_eq!(grid.lookup(-990.0, 10.0), Some(9.0));
        assert_eq!(grid.lookup(50.0, 500.0), None);
        assert_eq!(grid.lookup(f64::NAN, 500.0), None);
    }

    #[test]
    fn test_json_uses_string_integer_keys() {
        let mut grid = SparseGrid::empty(haduk_like());
        grid.insert(-1500.0, 1500.0, 2.25);
        let json = String::from_utf8(grid.to_json().unwrap()).unwrap();
        assert_eq!(json, r#"{"-1500":{"1500":2.3}}"#);
    }

    #[test]
    fn test_to_frame() {
        let mut grid = SparseGrid::empty(haduk_like());
        grid.insert(500.0, 500.0, 4.0);
        let frame = grid.to_frame();
        assert_eq!(frame.get(1, 2), Some(4.0));
        assert_eq!(frame.valid_count(), 1);
    }
}
