//! Common test fixtures for climate overlay tests.

use climate_common::{CrsCode, GeoBounds, GridExtent};

/// The 2 x 3 km grid used by the end-to-end alignment scenario:
/// x 0..2000, y 0..3000, 1 km cells, so 3 rows by 2 columns.
pub fn scenario_extent() -> GridExtent {
    GridExtent {
        x_min: 0.0,
        x_max: 2000.0,
        y_min: 0.0,
        y_max: 3000.0,
        resolution: 1000.0,
        crs: CrsCode::Epsg27700,
    }
}

/// Overlay bounds used by the alignment scenario.
pub fn scenario_bounds() -> GeoBounds {
    GeoBounds {
        south: 49.5,
        west: -8.5,
        north: 61.0,
        east: 2.0,
    }
}

/// A small BNG extent with HadUK-style cell centers at `...500`.
///
/// 5 columns x 4 rows around Woolhampton, Berkshire.
pub fn berkshire_extent() -> GridExtent {
    GridExtent {
        x_min: 455_000.0,
        x_max: 460_000.0,
        y_min: 164_000.0,
        y_max: 168_000.0,
        resolution: 1000.0,
        crs: CrsCode::Epsg27700,
    }
}

/// The full HadUK-Grid 1 km extent.
pub fn haduk_extent() -> GridExtent {
    GridExtent {
        x_min: -200_000.0,
        x_max: 700_000.0,
        y_min: -200_000.0,
        y_max: 1_250_000.0,
        resolution: 1000.0,
        crs: CrsCode::Epsg27700,
    }
}

/// Woolhampton reference point in BNG metres.
pub const WOOLHAMPTON: (f64, f64) = (457_000.0, 166_000.0);

/// Ten-colour diverging temperature palette, cold to hot.
pub const TEMP_COLORS: [&str; 10] = [
    "#053061", "#2166ac", "#4393c3", "#92c5de", "#d1e5f0", "#fddbc7", "#f4a582", "#d6604d",
    "#b2182b", "#67001f",
];
