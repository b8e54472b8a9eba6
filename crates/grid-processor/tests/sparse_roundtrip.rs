//! Integration test: persist a frame as a sparse tile and read it back.
//!
//! 1. Build a frame with known values and some missing cells
//! 2. Serialize it to a gzip JSON tile on disk
//! 3. Read the tile back and look up every cell center
//! 4. Verify values come back rounded to one decimal place

use grid_processor::{round_value, CellLookup, RasterFrame, SparseGrid};
use test_utils::{berkshire_extent, create_temperature_grid, with_missing};

#[test]
fn test_tile_roundtrip_through_disk() {
    let extent = berkshire_extent();
    let values = with_missing(create_temperature_grid(&extent, 4), 4);
    let frame = RasterFrame::new(extent, values).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("temp").join("2021_04.json.gz");
    SparseGrid::from_frame(&frame).write_gz(&path).unwrap();
    assert!(path.exists());

    let tile = SparseGrid::read_gz(extent, &path).unwrap();
    assert_eq!(tile.len(), frame.valid_count());

    for row in 0..extent.height() {
        for col in 0..extent.width() {
            let (x, y) = extent.index_to_coord(row as i64, col as i64);
            match frame.get(row, col) {
                Some(v) => assert_eq!(
                    tile.lookup(x, y),
                    Some(round_value(v)),
                    "cell ({}, {})",
                    row,
                    col
                ),
                None => assert_eq!(tile.lookup(x, y), None, "cell ({}, {}) should be missing", row, col),
            }
        }
    }
}

#[test]
fn test_lookup_outside_source_is_not_found() {
    let extent = berkshire_extent();
    let frame = RasterFrame::filled(extent, 8.0);
    let tile = SparseGrid::from_frame(&frame);

    assert_eq!(tile.lookup(extent.x_min - 1500.0, extent.y_max - 500.0), None);
    assert_eq!(tile.lookup(extent.x_min + 500.0, extent.y_max + 700.0), None);
    assert_eq!(tile.lookup(extent.x_min + 500.0, extent.y_max - 500.0), Some(8.0));
}

#[test]
fn test_tile_keys_are_cell_centers() {
    let extent = berkshire_extent();
    let mut values = vec![f64::NAN; extent.len()];
    values[0] = 11.26;
    let tile = SparseGrid::from_frame(&RasterFrame::new(extent, values).unwrap());

    let json = String::from_utf8(tile.to_json().unwrap()).unwrap();
    assert_eq!(json, r#"{"455500":{"167500":11.3}}"#);
    assert_eq!(tile.valid_values(), vec![11.3]);
}

#[test]
fn test_corrupt_tile_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json.gz");
    std::fs::write(&path, b"not gzip").unwrap();
    assert!(SparseGrid::read_gz(berkshire_extent(), &path).is_err());
    assert!(SparseGrid::from_json(berkshire_extent(), b"[1, 2]").is_err());
}
