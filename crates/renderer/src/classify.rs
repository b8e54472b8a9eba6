//! Value classification into palette colours.
//!
//! Two families:
//! - sequential: a fixed linear scale, or deciles of the frame being drawn
//! - bivariate: rainfall and sunshine tertiles looked up in a 3x3 key
//!
//! Every breakpoint comparison uses the same rule: a value's bucket is the
//! number of breakpoints it is not below, so a value equal to a breakpoint
//! falls in the bucket that breakpoint opens.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{RenderError, Result};

/// Percentile of sorted data with linear interpolation between the
/// neighbouring order statistics. `p` is in percent.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Percentiles of the finite values in `values`. An input with no finite
/// values yields all zeros.
pub fn percentiles(values: &[f64], ps: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    ps.iter().map(|&p| percentile(&sorted, p)).collect()
}

/// Number of breakpoints the value is not below.
pub fn bucket(value: f64, breakpoints: &[f64]) -> usize {
    breakpoints.iter().filter(|&&b| !(value < b)).count()
}

/// How a sequential classifier maps values to palette slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SequentialScale {
    /// Fixed absolute scale shared by every period.
    Linear { min: f64, max: f64 },
    /// 10th..90th percentiles of one frame.
    Decile { breakpoints: Vec<f64> },
}

/// Maps single values onto an N-colour palette.
#[derive(Debug, Clone)]
pub struct SequentialClassifier {
    scale: SequentialScale,
    colors: Vec<Color>,
}

impl SequentialClassifier {
    /// Fixed scale over `[min, max]`.
    pub fn linear(min: f64, max: f64, colors: Vec<Color>) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && max > min) {
            return Err(RenderError::InvalidScale { min, max });
        }
        if colors.is_empty() {
            return Err(RenderError::InvalidPalette("palette is empty".to_string()));
        }
        Ok(Self {
            scale: SequentialScale::Linear { min, max },
            colors,
        })
    }

    /// Decile scale from the valid values of a frame. Needs exactly ten colours.
    pub fn decile(values: &[f64], colors: Vec<Color>) -> Result<Self> {
        if colors.len() != 10 {
            return Err(RenderError::InvalidPalette(format!(
                "decile classification needs 10 colours, got {}",
                colors.len()
            )));
        }
        let ps: Vec<f64> = (1..=9).map(|k| k as f64 * 10.0).collect();
        Ok(Self {
            scale: SequentialScale::Decile {
                breakpoints: percentiles(values, &ps),
            },
            colors,
        })
    }

    pub fn scale(&self) -> &SequentialScale {
        &self.scale
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Palette index for a value, `None` for missing values.
    pub fn index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        let last = self.colors.len() - 1;
        let idx = match &self.scale {
            SequentialScale::Linear { min, max } => {
                let normalized = ((value - min) / (max - min)).clamp(0.0, 1.0);
                (normalized * last as f64).floor() as usize
            }
            SequentialScale::Decile { breakpoints } => bucket(value, breakpoints),
        };
        Some(idx.min(last))
    }

    /// Colour for a value, transparent when missing.
    pub fn color(&self, value: f64) -> Color {
        self.index(value)
            .map_or_else(Color::transparent, |i| self.colors[i])
    }
}

/// Three-by-three colour key indexed `[rain_level][sun_level]`, each level
/// running low, mid, high.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BivariatePalette(pub [[Color; 3]; 3]);

impl BivariatePalette {
    pub fn from_hex_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self> {
        if rows.len() != 3 || rows.iter().any(|r| r.len() != 3) {
            return Err(RenderError::InvalidPalette(
                "bivariate palette must be 3x3".to_string(),
            ));
        }
        let mut grid = [[Color::transparent(); 3]; 3];
        for (i, row) in rows.iter().enumerate() {
            for (j, hex) in row.iter().enumerate() {
                grid[i][j] = Color::from_hex(hex.as_ref())?;
            }
        }
        Ok(Self(grid))
    }

    pub fn get(&self, rain_level: usize, sun_level: usize) -> Color {
        self.0[rain_level.min(2)][sun_level.min(2)]
    }
}

/// Tertile classification of rainfall against sunshine.
///
/// Breakpoints are the 33rd and 66th percentiles of each variable's valid
/// values, computed independently.
#[derive(Debug, Clone)]
pub struct BivariateClassifier {
    rain_breaks: [f64; 2],
    sun_breaks: [f64; 2],
    palette: BivariatePalette,
}

impl BivariateClassifier {
    pub fn from_values(rain: &[f64], sun: &[f64], palette: BivariatePalette) -> Self {
        let tertiles = |values: &[f64]| {
            let p = percentiles(values, &[33.0, 66.0]);
            [p[0], p[1]]
        };
        Self {
            rain_breaks: tertiles(rain),
            sun_breaks: tertiles(sun),
            palette,
        }
    }

    pub fn rain_breaks(&self) -> [f64; 2] {
        self.rain_breaks
    }

    pub fn sun_breaks(&self) -> [f64; 2] {
        self.sun_breaks
    }

    /// `(rain_level, sun_level)`, `None` unless both values are present.
    pub fn levels(&self, rain: f64, sun: f64) -> Option<(usize, usize)> {
        if !rain.is_finite() || !sun.is_finite() {
            return None;
        }
        Some((bucket(rain, &self.rain_breaks), bucket(sun, &self.sun_breaks)))
    }

    pub fn color(&self, rain: f64, sun: f64) -> Color {
        self.levels(rain, sun)
            .map_or_else(Color::transparent, |(r, s)| self.palette.get(r, s))
    }
}
