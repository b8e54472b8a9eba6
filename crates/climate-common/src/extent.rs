//! Regular projected grid extents and the cell index mapping.
//!
//! Rasters are stored north-up: row 0 is the northernmost row, so northing
//! decreases as the row index increases.

use serde::{Deserialize, Serialize};

use crate::{ClimateError, ClimateResult, CrsCode};

/// Extent and resolution of a regular projected grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridExtent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Cell size in CRS units (metres for BNG)
    #[serde(alias = "resolution_meters")]
    pub resolution: f64,
    pub crs: CrsCode,
}

impl GridExtent {
    /// Create a validated extent.
    pub fn new(
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
        resolution: f64,
        crs: CrsCode,
    ) -> ClimateResult<Self> {
        let extent = Self {
            x_min,
            x_max,
            y_min,
            y_max,
            resolution,
            crs,
        };
        extent.validate()?;
        Ok(extent)
    }

    /// Derive an extent from the cell-center coordinate vectors of a source file.
    ///
    /// Centers may be given in either order; the extent reaches half a cell
    /// beyond the outermost centers.
    pub fn from_cell_centers(xs: &[f64], ys: &[f64], crs: CrsCode) -> ClimateResult<Self> {
        let res_x = uniform_spacing(xs, "x")?;
        let res_y = uniform_spacing(ys, "y")?;
        if (res_x - res_y).abs() > 1e-6 * res_x {
            return Err(ClimateError::config(format!(
                "non-square cells: x spacing {} vs y spacing {}",
                res_x, res_y
            )));
        }

        let (x_lo, x_hi) = min_max(xs);
        let (y_lo, y_hi) = min_max(ys);
        let half = res_x / 2.0;

        Self::new(
            x_lo - half,
            x_hi + half,
            y_lo - half,
            y_hi + half,
            res_x,
            crs,
        )
    }

    /// Check the extent invariants.
    pub fn validate(&self) -> ClimateResult<()> {
        let finite = [self.x_min, self.x_max, self.y_min, self.y_max, self.resolution]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ClimateError::config("extent contains non-finite values"));
        }
        if self.resolution <= 0.0 {
            return Err(ClimateError::config(format!(
                "resolution must be > 0, got {}",
                self.resolution
            )));
        }
        if self.x_max <= self.x_min {
            return Err(ClimateError::config(format!(
                "x_max ({}) must be greater than x_min ({})",
                self.x_max, self.x_min
            )));
        }
        if self.y_max <= self.y_min {
            return Err(ClimateError::config(format!(
                "y_max ({}) must be greater than y_min ({})",
                self.y_max, self.y_min
            )));
        }
        for (axis, span) in [("x", self.x_max - self.x_min), ("y", self.y_max - self.y_min)] {
            let cells = span / self.resolution;
            if (cells - cells.round()).abs() > 1e-6 {
                return Err(ClimateError::config(format!(
                    "{} span {} is not a whole number of {} cells",
                    axis, span, self.resolution
                )));
            }
        }
        Ok(())
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        ((self.x_max - self.x_min) / self.resolution).round() as usize
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        ((self.y_max - self.y_min) / self.resolution).round() as usize
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.width() * self.height()
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Map a projected coordinate to the (row, col) of the cell containing it.
    ///
    /// Coordinates outside the extent produce indices outside
    /// `[0, height) x [0, width)`; use [`GridExtent::cell_index`] for a
    /// bounds-checked lookup.
    pub fn coord_to_index(&self, x: f64, y: f64) -> (i64, i64) {
        let col = ((x - self.x_min) / self.resolution).floor() as i64;
        let row = ((self.y_max - y) / self.resolution).floor() as i64;
        (row, col)
    }

    /// Map a (row, col) index to the projected coordinate of the cell center.
    pub fn index_to_coord(&self, row: i64, col: i64) -> (f64, f64) {
        let x = self.x_min + (col as f64 + 0.5) * self.resolution;
        let y = self.y_max - (row as f64 + 0.5) * self.resolution;
        (x, y)
    }

    /// Whether a signed index lies inside the grid.
    pub fn contains_index(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height() && (col as usize) < self.width()
    }

    /// Bounds-checked cell lookup for a projected coordinate.
    pub fn cell_index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (row, col) = self.coord_to_index(x, y);
        if self.contains_index(row, col) {
            Some((row as usize, col as usize))
        } else {
            None
        }
    }

    /// Snap a coordinate to the center of the cell containing it.
    pub fn snap_to_center(&self, x: f64, y: f64) -> (f64, f64) {
        let (row, col) = self.coord_to_index(x, y);
        self.index_to_coord(row, col)
    }

    /// Row-major flat index for a (row, col) pair.
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.width() + col
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn uniform_spacing(centers: &[f64], axis: &str) -> ClimateResult<f64> {
    if centers.len() < 2 {
        return Err(ClimateError::config(format!(
            "need at least two {} cell centers, got {}",
            axis,
            centers.len()
        )));
    }
    let spacing = (centers[1] - centers[0]).abs();
    let uniform = centers
        .windows(2)
        .all(|pair| ((pair[1] - pair[0]).abs() - spacing).abs() <= 1e-6 * spacing.max(1.0));
    if spacing == 0.0 || !uniform {
        return Err(ClimateError::config(format!(
            "{} cell centers are not uniformly spaced",
            axis
        )));
    }
    Ok(spacing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> GridExtent {
        GridExtent::new(0.0, 2000.0, 0.0, 3000.0, 1000.0, CrsCode::Epsg27700).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let extent = small();
        assert_eq!(extent.width(), 2);
        assert_eq!(extent.height(), 3);
        assert_eq!(extent.len(), 6);
    }

    #[test]
    fn test_north_up_indexing() {
        let extent = small();
        assert_eq!(extent.coord_to_index(500.0, 2500.0), (0, 0));
        assert_eq!(extent.coord_to_index(1500.0, 500.0), (2, 1));
        assert_eq!(extent.index_to_coord(0, 0), (500.0, 2500.0));
        assert_eq!(extent.index_to_coord(2, 1), (1500.0, 500.0));
    }

    #[test]
    fn test_outside_extent_yields_out_of_range_index() {
        let extent = small();
        let (row, col) = extent.coord_to_index(-10.0, 3100.0);
        assert_eq!((row, col), (-1, -1));
        assert!(!extent.contains_index(row, col));
        assert_eq!(extent.cell_index(-10.0, 3100.0), None);
        assert_eq!(extent.cell_index(2500.0, 100.0), None);
    }

    #[test]
    fn test_snap_to_center() {
        let extent = small();
        assert_eq!(extent.snap_to_center(1999.0, 1.0), (1500.0, 500.0));
    }

    #[test]
    fn test_invalid_extents_rejected() {
        assert!(GridExtent::new(0.0, 0.0, 0.0, 10.0, 1.0, CrsCode::Epsg27700).is_err());
        assert!(GridExtent::new(0.0, 10.0, 5.0, 1.0, 1.0, CrsCode::Epsg27700).is_err());
        assert!(GridExtent::new(0.0, 10.0, 0.0, 10.0, 0.0, CrsCode::Epsg27700).is_err());
        assert!(GridExtent::new(0.0, 10.0, 0.0, 10.0, -1.0, CrsCode::Epsg27700).is_err());
    }

    #[test]
    fn test_partial_cell_span_rejected() {
        let err = GridExtent::new(0.0, 2500.0, 0.0, 3000.0, 1000.0, CrsCode::Epsg27700)
            .unwrap_err();
        assert!(err.to_string().contains("x span"));
        let err = GridExtent::new(0.0, 2000.0, 0.0, 3400.0, 1000.0, CrsCode::Epsg27700)
            .unwrap_err();
        assert!(err.to_string().contains("y span"));
    }

    fn assert_round_trip(extent: &GridExtent) {
        for row in 0..extent.height() as i64 {
            for col in 0..extent.width() as i64 {
                let (x, y) = extent.index_to_coord(row, col);
                assert_eq!(extent.coord_to_index(x, y), (row, col), "cell ({}, {})", row, col);
            }
        }
    }

    #[test]
    fn test_every_cell_center_maps_back_to_its_index() {
        assert_round_trip(&small());
        let haduk = GridExtent::new(
            -200000.0,
            700000.0,
            -200000.0,
            1250000.0,
            1000.0,
            CrsCode::Epsg27700,
        )
        .unwrap();
        assert_round_trip(&haduk);
    }

    #[test]
    fn test_from_cell_centers_descending_y() {
        let xs = [-199500.0, -198500.0, -197500.0];
        let ys = [1249500.0, 1248500.0];
        let extent = GridExtent::from_cell_centers(&xs, &ys, CrsCode::Epsg27700).unwrap();
        assert_eq!(extent.x_min, -200000.0);
        assert_eq!(extent.x_max, -197000.0);
        assert_eq!(extent.y_min, 1248000.0);
        assert_eq!(extent.y_max, 1250000.0);
        assert_eq!(extent.resolution, 1000.0);
        assert_eq!(extent.width(), 3);
        assert_eq!(extent.height(), 2);
    }

    #[test]
    fn test_from_cell_centers_rejects_irregular() {
        let xs = [0.0, 1000.0, 2500.0];
        let ys = [0.0, 1000.0];
        assert!(GridExtent::from_cell_centers(&xs, &ys, CrsCode::Epsg27700).is_err());
        assert!(GridExtent::from_cell_centers(&[0.0], &ys, CrsCode::Epsg27700).is_err());
    }

    #[test]
    fn test_metadata_alias() {
        let json = r#"{"x_min":0,"x_max":10,"y_min":0,"y_max":10,"resolution_meters":5,"crs":"EPSG:27700"}"#;
        let extent: GridExtent = serde_json::from_str(json).unwrap();
        assert_eq!(extent.resolution, 5.0);
    }
}
