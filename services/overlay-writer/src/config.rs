//! Overlay batch configuration.
//!
//! Loaded from a YAML file with `${VAR}` and `${VAR:-default}` environment
//! substitution. Every field has a default reproducing the HadUK-Grid 1 km
//! UK setup, so a config file only needs to name what it changes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use climate_common::{ClimateError, ClimateResult, CrsCode, GeoBounds, GridExtent, Variable};
use projection::Reprojector;
use renderer::{parse_colors, BivariatePalette, Color};

/// Ten-colour diverging palette, cold to hot.
pub const TEMP_COLORS: [&str; 10] = [
    "#053061", "#2166ac", "#4393c3", "#92c5de", "#d1e5f0", "#fddbc7", "#f4a582", "#d6604d",
    "#b2182b", "#67001f",
];

/// Rain/sun key, `[rain_level][sun_level]`.
pub const BIVARIATE_COLORS: [[&str; 3]; 3] = [
    ["#f3f3f3", "#f3e6b3", "#f3b300"],
    ["#b4d3e1", "#b3b3b3", "#b36600"],
    ["#509dc2", "#376387", "#000000"],
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    pub paths: PathsConfig,
    pub sources: SourcePatterns,
    pub extent: GridExtent,
    pub overlay: OverlayGeometry,
    pub years: Vec<i32>,
    pub months: Vec<u8>,
    pub temperature: TemperatureStyle,
    pub rain_sun: RainSunStyle,
    pub legend: LegendConfig,
    pub averages: AveragesConfig,
    pub reference_point: Option<ReferencePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory searched for source NetCDF files.
    pub data_dir: PathBuf,
    /// Root of the sparse tile tree.
    pub tiles_dir: PathBuf,
    /// Root of the overlay image tree.
    pub images_dir: PathBuf,
}

/// Filename patterns per variable; `{year}` is substituted, `*` is a wildcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePatterns {
    pub temperature: String,
    pub rainfall: String,
    pub sunshine: String,
}

impl SourcePatterns {
    pub fn pattern(&self, variable: Variable) -> &str {
        match variable {
            Variable::Temperature => &self.temperature,
            Variable::Rainfall => &self.rainfall,
            Variable::Sunshine => &self.sunshine,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayGeometry {
    pub width: usize,
    pub height: usize,
    /// Explicit geographic bounds. When absent they are derived from
    /// `projected_bounds`.
    pub bounds: Option<GeoBounds>,
    /// BNG rectangle `[min_x, min_y, max_x, max_y]` whose SW and NE corners
    /// give the overlay bounds.
    pub projected_bounds: [f64; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Fixed `[min, max]` scale shared by every period.
    Linear,
    /// Per-frame deciles.
    Decile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureStyle {
    pub mode: ScaleMode,
    pub min: f64,
    pub max: f64,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainSunStyle {
    /// Rows are rain levels (low to high), columns sun levels.
    pub colors: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub enabled: bool,
    pub bar_width: usize,
    pub bar_height: usize,
    pub cell_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AveragesConfig {
    pub enabled: bool,
}

/// A named BNG location whose temperature is tracked through a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            sources: SourcePatterns::default(),
            extent: GridExtent {
                x_min: -200_000.0,
                x_max: 700_000.0,
                y_min: -200_000.0,
                y_max: 1_250_000.0,
                resolution: 1000.0,
                crs: CrsCode::Epsg27700,
            },
            overlay: OverlayGeometry::default(),
            years: vec![2021, 2022, 2023],
            months: (1..=12).collect(),
            temperature: TemperatureStyle::default(),
            rain_sun: RainSunStyle::default(),
            legend: LegendConfig::default(),
            averages: AveragesConfig::default(),
            reference_point: Some(ReferencePoint {
                name: "Woolhampton".to_string(),
                x: 457_000.0,
                y: 166_000.0,
            }),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tiles_dir: PathBuf::from("output/tiles"),
            images_dir: PathBuf::from("output/images"),
        }
    }
}

impl Default for SourcePatterns {
    fn default() -> Self {
        let haduk = |v: Variable| format!("{}_hadukgrid_uk_1km_mon_{{year}}*.nc", v.netcdf_name());
        Self {
            temperature: haduk(Variable::Temperature),
            rainfall: haduk(Variable::Rainfall),
            sunshine: haduk(Variable::Sunshine),
        }
    }
}

impl Default for OverlayGeometry {
    fn default() -> Self {
        Self {
            width: 2000,
            height: 3000,
            bounds: None,
            projected_bounds: [0.0, 0.0, 700_000.0, 1_250_000.0],
        }
    }
}

impl Default for TemperatureStyle {
    fn default() -> Self {
        Self {
            mode: ScaleMode::Linear,
            min: -10.0,
            max: 32.0,
            colors: TEMP_COLORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for RainSunStyle {
    fn default() -> Self {
        Self {
            colors: BIVARIATE_COLORS
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bar_width: 256,
            bar_height: 16,
            cell_size: 20,
        }
    }
}

impl Default for AveragesConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl OverlayConfig {
    /// Read, substitute environment variables, parse and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read overlay config from {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid overlay config {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: OverlayConfig =
            serde_yaml::from_str(&expanded).context("Failed to parse overlay config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything the batch depends on before any I/O happens.
    pub fn validate(&self) -> ClimateResult<()> {
        self.extent.validate()?;
        if self.extent.crs != CrsCode::Epsg27700 {
            return Err(ClimateError::config(format!(
                "source grids must be {}, got {}",
                CrsCode::Epsg27700,
                self.extent.crs
            )));
        }

        if self.overlay.width < 2 || self.overlay.height < 2 {
            return Err(ClimateError::config(format!(
                "overlay must be at least 2x2 pixels, got {}x{}",
                self.overlay.width, self.overlay.height
            )));
        }
        let [min_x, min_y, max_x, max_y] = self.overlay.projected_bounds;
        if self.overlay.bounds.is_none() && !(max_x > min_x && max_y > min_y) {
            return Err(ClimateError::config(
                "projected_bounds must be [min_x, min_y, max_x, max_y] with max > min",
            ));
        }
        self.overlay_bounds()?;

        if self.years.is_empty() {
            return Err(ClimateError::config("no years configured"));
        }
        if self.months.is_empty() {
            return Err(ClimateError::config("no months configured"));
        }
        if let Some(m) = self.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ClimateError::config(format!(
                "month must be in 1..=12, got {}",
                m
            )));
        }

        if !(self.temperature.max > self.temperature.min) {
            return Err(ClimateError::config(format!(
                "temperature scale max ({}) must exceed min ({})",
                self.temperature.max, self.temperature.min
            )));
        }
        let colors = self.temperature_colors()?;
        if colors.is_empty() {
            return Err(ClimateError::config("temperature palette is empty"));
        }
        if self.temperature.mode == ScaleMode::Decile && colors.len() != 10 {
            return Err(ClimateError::config(format!(
                "decile mode needs 10 temperature colours, got {}",
                colors.len()
            )));
        }
        self.bivariate_palette()?;

        if self.legend.enabled
            && (self.legend.bar_width == 0 || self.legend.bar_height == 0 || self.legend.cell_size == 0)
        {
            return Err(ClimateError::config("legend dimensions must be non-zero"));
        }

        Ok(())
    }

    /// Geographic bounds the overlays are built over and placed with.
    pub fn overlay_bounds(&self) -> ClimateResult<GeoBounds> {
        if let Some(bounds) = self.overlay.bounds {
            bounds.validate()?;
            return Ok(bounds);
        }
        let [min_x, min_y, max_x, max_y] = self.overlay.projected_bounds;
        Reprojector::new(self.extent.crs, CrsCode::Epsg4326)
            .geographic_bounds(min_x, min_y, max_x, max_y)
    }

    pub fn temperature_colors(&self) -> ClimateResult<Vec<Color>> {
        Ok(parse_colors(&self.temperature.colors)?)
    }

    pub fn bivariate_palette(&self) -> ClimateResult<BivariatePalette> {
        Ok(BivariatePalette::from_hex_rows(&self.rain_sun.colors)?)
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unclosed variable substitution: ${{{}", after))?;
        result.push_str(&resolve_var_expr(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    match expr.split_once(":-") {
        Some((name, default)) => match std::env::var(name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        },
        None => std::env::var(expr.trim())
            .with_context(|| format!("Environment variable {} not set", expr.trim())),
    }
}
