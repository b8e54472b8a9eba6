//! Geographic bounding boxes for image overlays.

use serde::{Deserialize, Serialize};

use crate::{ClimateError, ClimateResult};

/// A WGS84 latitude/longitude rectangle, in degrees.
///
/// Serialized in overlay metadata in the `[[south, west], [north, east]]`
/// corner form map clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Create validated bounds.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> ClimateResult<Self> {
        let bounds = Self {
            south,
            west,
            north,
            east,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Require `south < north` and `west < east` with latitudes in range.
    pub fn validate(&self) -> ClimateResult<()> {
        let values = [self.south, self.west, self.north, self.east];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ClimateError::config("bounds contain non-finite values"));
        }
        if self.south >= self.north {
            return Err(ClimateError::config(format!(
                "south ({}) must be less than north ({})",
                self.south, self.north
            )));
        }
        if self.west >= self.east {
            return Err(ClimateError::config(format!(
                "west ({}) must be less than east ({})",
                self.west, self.east
            )));
        }
        if self.south < -90.0 || self.north > 90.0 {
            return Err(ClimateError::config("latitudes must lie within [-90, 90]"));
        }
        Ok(())
    }

    /// Latitude span in degrees.
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees.
    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    /// Check if a point falls inside the rectangle (edges inclusive).
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }

    /// Smallest bounds covering every `(lat, lng)` point.
    pub fn enclosing(points: &[(f64, f64)]) -> ClimateResult<Self> {
        if points.is_empty() {
            return Err(ClimateError::config("cannot bound an empty point set"));
        }
        let mut south = f64::INFINITY;
        let mut west = f64::INFINITY;
        let mut north = f64::NEG_INFINITY;
        let mut east = f64::NEG_INFINITY;
        for &(lat, lng) in points {
            south = south.min(lat);
            north = north.max(lat);
            west = west.min(lng);
            east = east.max(lng);
        }
        Self::new(south, west, north, east)
    }

    /// Corner-pair form: `[[south, west], [north, east]]`.
    pub fn to_corners(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }
}

impl TryFrom<[[f64; 2]; 2]> for GeoBounds {
    type Error = ClimateError;

    fn try_from(corners: [[f64; 2]; 2]) -> Result<Self, Self::Error> {
        let [[south, west], [north, east]] = corners;
        GeoBounds::new(south, west, north, east)
    }
}

impl From<GeoBounds> for [[f64; 2]; 2] {
    fn from(bounds: GeoBounds) -> Self {
        bounds.to_corners()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_spans() {
        let b = GeoBounds::new(49.5, -8.5, 61.0, 2.0).unwrap();
        assert_eq!(b.lat_span(), 11.5);
        assert_eq!(b.lng_span(), 10.5);
        assert!(b.contains(51.4, -1.2));
        assert!(!b.contains(48.0, 0.0));
    }

    #[test]
    fn test_rejects_inverted() {
        assert!(GeoBounds::new(61.0, -8.5, 49.5, 2.0).is_err());
        assert!(GeoBounds::new(49.5, 2.0, 61.0, -8.5).is_err());
        assert!(GeoBounds::new(49.5, -8.5, 95.0, 2.0).is_err());
    }

    #[test]
    fn test_corner_serialization() {
        let b = GeoBounds::new(49.5, -8.5, 61.0, 2.0).unwrap();
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "[[49.5,-8.5],[61.0,2.0]]");
        let back: GeoBounds = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
        assert!(serde_json::from_str::<GeoBounds>("[[61.0,-8.5],[49.5,2.0]]").is_err());
    }

    #[test]
    fn test_enclosing() {
        let b = GeoBounds::enclosing(&[(50.0, -7.0), (60.0, 1.5), (55.0, -3.0)]).unwrap();
        assert_eq!(b.to_corners(), [[50.0, -7.0], [60.0, 1.5]]);
        assert!(GeoBounds::enclosing(&[]).is_err());
    }
}
