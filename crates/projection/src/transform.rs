//! CRS-to-CRS coordinate transformation.
//!
//! Every transform pivots through WGS84 geographic coordinates, so each
//! supported CRS only needs a forward and an inverse to/from lon/lat.

use climate_common::{ClimateError, CrsCode, GeoBounds};
use thiserror::Error;

use crate::mercator::WebMercator;
use crate::osgb::BritishNationalGrid;

/// A coordinate that is undefined in, or could not be carried into, the
/// target CRS.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReprojectionError {
    #[error("Non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("Coordinate ({x}, {y}) outside projection domain: {reason}")]
    OutOfDomain { x: f64, y: f64, reason: String },

    #[error("Inverse projection did not converge for ({x}, {y})")]
    NonConvergence { x: f64, y: f64 },
}

impl From<ReprojectionError> for ClimateError {
    fn from(err: ReprojectionError) -> Self {
        ClimateError::Reprojection(err.to_string())
    }
}

/// A 2-D coordinate in x/y order: `(lon, lat)` or `(easting, northing)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Transforms coordinates from one CRS to another.
#[derive(Debug, Clone, Copy)]
pub struct Reprojector {
    source: CrsCode,
    target: CrsCode,
    bng: BritishNationalGrid,
    mercator: WebMercator,
}

impl Reprojector {
    pub fn new(source: CrsCode, target: CrsCode) -> Self {
        Self {
            source,
            target,
            bng: BritishNationalGrid::new(),
            mercator: WebMercator::default(),
        }
    }

    pub fn source(&self) -> CrsCode {
        self.source
    }

    pub fn target(&self) -> CrsCode {
        self.target
    }

    /// The reprojector for the opposite direction.
    pub fn inverse(&self) -> Reprojector {
        Reprojector::new(self.target, self.source)
    }

    /// Transform a single coordinate.
    pub fn transform(&self, coord: Coord) -> Result<Coord, ReprojectionError> {
        let (x, y) = self.transform_xy(coord.x, coord.y)?;
        Ok(Coord { x, y })
    }

    /// Transform a raw `(x, y)` pair.
    pub fn transform_xy(&self, x: f64, y: f64) -> Result<(f64, f64), ReprojectionError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ReprojectionError::NonFinite { x, y });
        }
        if self.source == self.target {
            return Ok((x, y));
        }

        let (lon, lat) = self.to_geographic(x, y)?;
        self.from_geographic(lon, lat)
    }

    /// Transform many coordinates, keeping per-point failures.
    pub fn transform_all(&self, coords: &[Coord]) -> Vec<Result<Coord, ReprojectionError>> {
        coords.iter().map(|&c| self.transform(c)).collect()
    }

    /// Geographic bounds of a projected rectangle, from its south-west and
    /// north-east corners.
    ///
    /// Requires a reprojector whose target is EPSG:4326.
    pub fn geographic_bounds(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Result<GeoBounds, ClimateError> {
        if self.target != CrsCode::Epsg4326 {
            return Err(ClimateError::config(format!(
                "geographic bounds need an EPSG:4326 target, got {}",
                self.target
            )));
        }
        let (west, south) = self.transform_xy(min_x, min_y)?;
        let (east, north) = self.transform_xy(max_x, max_y)?;
        GeoBounds::new(south, west, north, east)
    }

    fn to_geographic(&self, x: f64, y: f64) -> Result<(f64, f64), ReprojectionError> {
        match self.source {
            CrsCode::Epsg4326 => Ok((x, y)),
            CrsCode::Epsg27700 => self.bng.to_wgs84(x, y),
            CrsCode::Epsg3857 => self.mercator.inverse(x, y),
        }
    }

    fn from_geographic(&self, lon: f64, lat: f64) -> Result<(f64, f64), ReprojectionError> {
        match self.target {
            CrsCode::Epsg4326 => Ok((lon, lat)),
            CrsCode::Epsg27700 => self.bng.from_wgs84(lon, lat),
            CrsCode::Epsg3857 => self.mercator.forward(lon, lat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let r = Reprojector::new(CrsCode::Epsg27700, CrsCode::Epsg27700);
        let c = r.transform(Coord::new(457_000.0, 166_000.0)).unwrap();
        assert_eq!(c, Coord::new(457_000.0, 166_000.0));
    }

    #[test]
    fn test_bng_to_wgs84_reference_point() {
        // Woolhampton, Berkshire.
        let r = Reprojector::new(CrsCode::Epsg27700, CrsCode::Epsg4326);
        let c = r.transform(Coord::new(457_000.0, 166_000.0)).unwrap();
        assert!((c.x - -1.18).abs() < 0.05, "lon {}", c.x);
        assert!((c.y - 51.39).abs() < 0.05, "lat {}", c.y);
    }

    #[test]
    fn test_bng_mercator_roundtrip() {
        let forward = Reprojector::new(CrsCode::Epsg27700, CrsCode::Epsg3857);
        let back = forward.inverse();
        let start = Coord::new(350_000.0, 600_000.0);
        let merc = forward.transform(start).unwrap();
        let end = back.transform(merc).unwrap();
        assert!((start.x - end.x).abs() < 0.1);
        assert!((start.y - end.y).abs() < 0.1);
    }

    #[test]
    fn test_pole_to_mercator_is_typed_error() {
        let r = Reprojector::new(CrsCode::Epsg4326, CrsCode::Epsg3857);
        let err = r.transform(Coord::new(0.0, 90.0)).unwrap_err();
        assert!(matches!(err, ReprojectionError::OutOfDomain { .. }));
        let as_climate: ClimateError = err.into();
        assert_eq!(as_climate.kind(), "reprojection");
    }

    #[test]
    fn test_transform_all_keeps_failures() {
        let r = Reprojector::new(CrsCode::Epsg4326, CrsCode::Epsg27700);
        let results = r.transform_all(&[Coord::new(-1.0, 52.0), Coord::new(f64::NAN, 52.0)]);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_geographic_bounds_of_national_grid() {
        let r = Reprojector::new(CrsCode::Epsg27700, CrsCode::Epsg4326);
        let b = r.geographic_bounds(0.0, 0.0, 700_000.0, 1_250_000.0).unwrap();
        assert!((b.south - 49.77).abs() < 0.02, "south {}", b.south);
        assert!((b.west - -7.56).abs() < 0.02, "west {}", b.west);
        assert!(b.north > 60.0 && b.north < 61.5, "north {}", b.north);
        assert!(b.east > 3.0 && b.east < 4.0, "east {}", b.east);

        let wrong = Reprojector::new(CrsCode::Epsg27700, CrsCode::Epsg3857);
        assert!(wrong.geographic_bounds(0.0, 0.0, 1.0, 1.0).is_err());
    }
}
