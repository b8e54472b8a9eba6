//! The bounds/metadata descriptor the map client reads to place overlays
//! and draw legends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use climate_common::{ClimateResult, GeoBounds, GridExtent};
use grid_processor::{round_value, CellLookup, RasterFrame};

use crate::config::{OverlayConfig, ReferencePoint, ScaleMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayMetadata {
    pub generated_at: DateTime<Utc>,
    /// `[[south, west], [north, east]]`
    pub bounds: GeoBounds,
    pub extent: GridExtent,
    pub image: ImageInfo,
    pub years: Vec<i32>,
    pub months: Vec<u8>,
    pub scales: Scales,
    pub encoding: Encoding,
    pub reference_point: Option<ReferenceStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: usize,
    pub height: usize,
    /// Row 0 is the north edge of `bounds`.
    pub row_order: String,
    /// How pixels map to coordinates; the client must stretch the same way.
    pub interpolation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scales {
    pub temperature: TemperatureScale,
    pub rain_sun: BivariateScale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureScale {
    pub mode: ScaleMode,
    pub min: f64,
    pub max: f64,
    pub unit: String,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BivariateScale {
    pub classification: String,
    pub percentiles: [f64; 2],
    /// Row index: rainfall level. Column index: sunshine level.
    pub colors: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    pub tiles: String,
    pub tile_keys: String,
    pub value_decimals: u32,
    pub missing: String,
}

/// Temperature observed at the reference point across a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStats {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub samples: usize,
    pub observed_min: Option<f64>,
    pub observed_max: Option<f64>,
    pub mean: Option<f64>,
}

/// Collects reference point values frame by frame.
#[derive(Debug, Clone)]
pub struct ReferenceTracker {
    point: ReferencePoint,
    values: Vec<f64>,
}

impl ReferenceTracker {
    pub fn new(point: ReferencePoint) -> Self {
        Self {
            point,
            values: Vec::new(),
        }
    }

    /// Record the frame's value at the point, if it has one.
    pub fn record(&mut self, frame: &RasterFrame) -> Option<f64> {
        let (row, col) = frame.extent().cell_index(self.point.x, self.point.y)?;
        let value = frame.get(row, col)?;
        self.values.push(value);
        Some(value)
    }

    pub fn stats(&self) -> ReferenceStats {
        let n = self.values.len();
        let (min, max, mean) = if n == 0 {
            (None, None, None)
        } else {
            let min = self.values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = self.values.iter().sum::<f64>() / n as f64;
            (
                Some(round_value(min)),
                Some(round_value(max)),
                Some(round_value(mean)),
            )
        };
        ReferenceStats {
            name: self.point.name.clone(),
            x: self.point.x,
            y: self.point.y,
            samples: n,
            observed_min: min,
            observed_max: max,
            mean,
        }
    }
}

impl OverlayMetadata {
    pub fn new(config: &OverlayConfig, bounds: GeoBounds, reference: Option<ReferenceStats>) -> Self {
        Self {
            generated_at: Utc::now(),
            bounds,
            extent: config.extent,
            image: ImageInfo {
                width: config.overlay.width,
                height: config.overlay.height,
                row_order: "north_to_south".to_string(),
                interpolation: "geographic_linear".to_string(),
            },
            years: config.years.clone(),
            months: config.months.clone(),
            scales: Scales {
                temperature: TemperatureScale {
                    mode: config.temperature.mode,
                    min: config.temperature.min,
                    max: config.temperature.max,
                    unit: "degC".to_string(),
                    colors: config.temperature.colors.clone(),
                },
                rain_sun: BivariateScale {
                    classification: "tertile".to_string(),
                    percentiles: [33.0, 66.0],
                    colors: config.rain_sun.colors.clone(),
                },
            },
            encoding: Encoding {
                tiles: "gzip-json".to_string(),
                tile_keys: "cell-centre easting -> northing, metres".to_string(),
                value_decimals: 1,
                missing: "absent key in tiles, alpha 0 in images".to_string(),
            },
            reference_point: reference,
        }
    }

    pub fn write(&self, path: &Path) -> ClimateResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "Wrote metadata descriptor");
        Ok(())
    }

    pub fn read(path: &Path) -> ClimateResult<Self> {
        let bytes = fs::read(path)?;
        let metadata = serde_json::from_slice(&bytes)?;
        debug!(path = %path.display(), "Read metadata descriptor");
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use climate_common::CrsCode;

    fn frame(value: f64) -> RasterFrame {
        let extent =
            GridExtent::new(455_000.0, 460_000.0, 164_000.0, 168_000.0, 1000.0, CrsCode::Epsg27700)
                .unwrap();
        RasterFrame::filled(extent, value)
    }

    #[test]
    fn test_reference_stats() {
        let mut tracker = ReferenceTracker::new(ReferencePoint {
            name: "Woolhampton".to_string(),
            x: 457_000.0,
            y: 166_000.0,
        });
        assert_eq!(tracker.stats().samples, 0);
        assert_eq!(tracker.stats().mean, None);

        tracker.record(&frame(4.04));
        tracker.record(&frame(21.36));
        tracker.record(&frame(f64::NAN));
        let stats = tracker.stats();
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.observed_min, Some(4.0));
        assert_eq!(stats.observed_max, Some(21.4));
        assert_eq!(stats.mean, Some(12.7));
    }

    #[test]
    fn test_point_outside_grid_not_recorded() {
        let mut tracker = ReferenceTracker::new(ReferencePoint {
            name: "Lerwick".to_string(),
            x: 445_000.0,
            y: 1_140_000.0,
        });
        assert_eq!(tracker.record(&frame(3.0)), None);
    }

    #[test]
    fn test_bounds_serialized_as_corners() {
        let config = OverlayConfig::default();
        let bounds = GeoBounds::new(49.5, -8.5, 61.0, 2.0).unwrap();
        let meta = OverlayMetadata::new(&config, bounds, None);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["bounds"], serde_json::json!([[49.5, -8.5], [61.0, 2.0]]));
        assert_eq!(json["image"]["row_order"], "north_to_south");
        assert_eq!(json["scales"]["temperature"]["mode"], "linear");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/bounds.json");
        meta.write(&path).unwrap();
        assert_eq!(OverlayMetadata::read(&path).unwrap(), meta);
    }
}
