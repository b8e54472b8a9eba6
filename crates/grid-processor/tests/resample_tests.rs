//! Integration tests for geographic-linear resampling against BNG grids.

use climate_common::CrsCode;
use grid_processor::{CellLookup, RasterFrame, Resampler, SparseGrid};
use projection::Reprojector;
use test_utils::{
    berkshire_extent, create_test_grid, scenario_bounds, scenario_extent, with_missing,
};

// ============================================================================
// Alignment scenario
// ============================================================================

#[test]
fn test_pixel_nearest_scenario_cell_reads_that_cell() {
    let extent = scenario_extent();
    let mut values = vec![f64::NAN; extent.len()];
    values[0] = 15.0; // row 0, col 0: BNG (500, 2500)
    let frame = RasterFrame::new(extent, values).unwrap();

    let resampler = Resampler::new(scenario_bounds(), 2000, 3000, CrsCode::Epsg27700).unwrap();
    let to_geo = Reprojector::new(CrsCode::Epsg27700, CrsCode::Epsg4326);
    let (lng, lat) = to_geo.transform_xy(500.0, 2500.0).unwrap();

    let (row, col) = resampler
        .geo_to_pixel(lat, lng)
        .expect("cell center lies inside the overlay bounds");
    assert_eq!(resampler.sample(&frame, row, col), Some(15.0));

    let sparse = SparseGrid::from_frame(&frame);
    assert_eq!(resampler.sample(&sparse, row, col), Some(15.0));
}

// ============================================================================
// Whole-image resampling
// ============================================================================

fn berkshire_resampler(width: usize, height: usize) -> Resampler {
    let extent = berkshire_extent();
    let bounds = Reprojector::new(CrsCode::Epsg27700, CrsCode::Epsg4326)
        .geographic_bounds(extent.x_min, extent.y_min, extent.x_max, extent.y_max)
        .unwrap();
    Resampler::new(bounds, width, height, CrsCode::Epsg27700).unwrap()
}

#[test]
fn test_every_pixel_takes_its_nearest_source_cell() {
    let extent = berkshire_extent();
    let frame = RasterFrame::new(extent, create_test_grid(extent.width(), extent.height())).unwrap();
    let resampler = berkshire_resampler(40, 30);

    let grid = resampler.resample(&frame);
    assert_eq!(grid.values.len(), 40 * 30);
    assert!(grid.valid_count() > 0);

    for row in 0..30 {
        for col in 0..40 {
            let (x, y) = resampler.source_coord(row, col).unwrap();
            let expected = frame.value_at(x, y);
            assert_eq!(grid.get(row, col), expected, "pixel ({}, {})", row, col);
        }
    }
}

#[test]
fn test_north_row_comes_from_north_cells() {
    let extent = berkshire_extent();
    let frame = RasterFrame::new(extent, create_test_grid(extent.width(), extent.height())).unwrap();
    let resampler = berkshire_resampler(50, 50);
    let grid = resampler.resample(&frame);

    // Values encode col * 1000 + row, so the source row is value % 1000.
    let source_row = |v: f64| (v as i64) % 1000;
    let top: Vec<i64> = (0..50).filter_map(|c| grid.get(2, c)).map(source_row).collect();
    let bottom: Vec<i64> = (0..50).filter_map(|c| grid.get(47, c)).map(source_row).collect();
    assert!(!top.is_empty() && !bottom.is_empty());
    assert!(
        top.iter().max() < bottom.iter().min(),
        "top rows must sample northern cells: top {:?} bottom {:?}",
        top,
        bottom
    );
}

#[test]
fn test_missing_cells_stay_transparent() {
    let extent = berkshire_extent();
    let frame = RasterFrame::new(extent, with_missing(vec![5.0; extent.len()], 2)).unwrap();
    let resampler = berkshire_resampler(30, 30);
    let grid = resampler.resample(&frame);

    for row in 0..30 {
        for col in 0..30 {
            let (x, y) = resampler.source_coord(row, col).unwrap();
            if frame.value_at(x, y).is_none() {
                assert!(grid.get(row, col).is_none());
            }
        }
    }
}
