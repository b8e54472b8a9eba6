//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::PI;

use crate::transform::ReprojectionError;

/// Web Mercator on the WGS84 semi-major axis sphere.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    pub radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self { radius: 6_378_137.0 }
    }
}

impl WebMercator {
    /// Geographic `(lon, lat)` degrees to Mercator `(x, y)` metres.
    ///
    /// The poles map to infinity and are rejected.
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ReprojectionError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(ReprojectionError::NonFinite { x: lon, y: lat });
        }
        if lat.abs() >= 90.0 {
            return Err(ReprojectionError::OutOfDomain {
                x: lon,
                y: lat,
                reason: "latitude at or beyond a pole is undefined in Mercator".to_string(),
            });
        }

        let x = self.radius * lon.to_radians();
        let y = self.radius * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        Ok((x, y))
    }

    /// Mercator `(x, y)` metres to geographic `(lon, lat)` degrees.
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ReprojectionError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ReprojectionError::NonFinite { x, y });
        }
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - PI / 2.0).to_degrees();
        Ok((lon, lat))
    }
}
