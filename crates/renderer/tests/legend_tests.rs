//! Legend rendering.

use renderer::legend::{bivariate_square, sequential_bar};
use renderer::{parse_colors, BivariatePalette, Color};
use test_utils::fixtures::TEMP_COLORS;

#[test]
fn test_temperature_bar_runs_cold_to_hot() {
    let colors = parse_colors(&TEMP_COLORS).unwrap();
    let bar = sequential_bar(&colors, 256, 16).unwrap();

    assert_eq!(bar.width, 256);
    assert_eq!(bar.opaque_count(), 256 * 16);
    assert_eq!(bar.pixel(0, 0), Some(colors[0]));
    assert_eq!(bar.pixel(15, 255), Some(colors[9]));
    assert!(bar.to_png().is_ok());
}

#[test]
fn test_empty_palette_is_rejected() {
    assert!(sequential_bar(&[], 10, 10).is_err());
}

#[test]
fn test_bivariate_key_corners() {
    let rows = vec![
        vec!["#f3f3f3", "#f3e6b3", "#f3b300"],
        vec!["#b4d3e1", "#b3b3b3", "#b36600"],
        vec!["#509dc2", "#376387", "#000000"],
    ];
    let palette = BivariatePalette::from_hex_rows(&rows).unwrap();
    let key = bivariate_square(&palette, 20).unwrap();

    assert_eq!((key.width, key.height), (60, 60));
    assert_eq!(key.pixel(0, 0), Some(Color::from_hex("#f3f3f3").unwrap()));
    assert_eq!(key.pixel(0, 59), Some(Color::from_hex("#f3b300").unwrap()));
    assert_eq!(key.pixel(59, 0), Some(Color::from_hex("#509dc2").unwrap()));
    assert_eq!(key.pixel(59, 59), Some(Color::from_hex("#000000").unwrap()));
}
