//! Synthetic climate data generators.
//!
//! All generators return row-major `Vec<f64>` data with row 0 as the north
//! edge, matching `RasterFrame`.

use climate_common::GridExtent;

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Monthly maximum temperature in °C, warmer to the south and in summer.
///
/// Ranges from about -2 °C in a northern January to about 24 °C in a
/// southern July.
pub fn create_temperature_grid(extent: &GridExtent, month: u8) -> Vec<f64> {
    let seasonal = seasonal_factor(month);
    gradient(extent, |south_frac, _| -2.0 + 8.0 * south_frac + 18.0 * seasonal)
}

/// Monthly rainfall totals in mm, wetter to the west and in winter.
pub fn create_rainfall_grid(extent: &GridExtent, month: u8) -> Vec<f64> {
    let wet_season = 1.0 - seasonal_factor(month);
    gradient(extent, |_, east_frac| 40.0 + 120.0 * (1.0 - east_frac) + 60.0 * wet_season)
}

/// Monthly sunshine hours, sunnier to the south and in summer.
pub fn create_sunshine_grid(extent: &GridExtent, month: u8) -> Vec<f64> {
    let seasonal = seasonal_factor(month);
    gradient(extent, |south_frac, _| 30.0 + 60.0 * south_frac + 150.0 * seasonal)
}

/// A grid where every value is the same.
pub fn create_constant_grid(extent: &GridExtent, value: f64) -> Vec<f64> {
    vec![value; extent.len()]
}

/// Replace every `nth` cell with NaN, starting at index 0.
pub fn with_missing(mut data: Vec<f64>, nth: usize) -> Vec<f64> {
    if nth > 0 {
        for v in data.iter_mut().step_by(nth) {
            *v = f64::NAN;
        }
    }
    data
}

/// Twelve months of data from a per-month generator, concatenated.
pub fn create_year(extent: &GridExtent, generator: fn(&GridExtent, u8) -> Vec<f64>) -> Vec<f64> {
    (1..=12).flat_map(|m| generator(extent, m)).collect()
}

/// 0 in January rising to 1 in July and back.
fn seasonal_factor(month: u8) -> f64 {
    let m = month.clamp(1, 12) as f64;
    (1.0 - ((m - 1.0) / 6.0 * std::f64::consts::PI).cos()) / 2.0
}

/// Evaluate `f(south_frac, east_frac)` for every cell. Fractions run 0..1
/// from the north and west edges.
fn gradient(extent: &GridExtent, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    let (width, height) = (extent.width(), extent.height());
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let south_frac = row as f64 / height.max(1) as f64;
            let east_frac = col as f64 / width.max(1) as f64;
            data.push(f(south_frac, east_frac));
        }
    }
    data
}
