//! Classification against the overlay palettes.

use renderer::{
    bucket, parse_colors, BivariateClassifier, BivariatePalette, Color, OutputImage,
    SequentialClassifier,
};
use test_utils::fixtures::TEMP_COLORS;

const BIVARIATE: [[&str; 3]; 3] = [
    ["#f3f3f3", "#f3e6b3", "#f3b300"],
    ["#b4d3e1", "#b3b3b3", "#b36600"],
    ["#509dc2", "#376387", "#000000"],
];

fn bivariate_palette() -> BivariatePalette {
    let rows: Vec<Vec<&str>> = BIVARIATE.iter().map(|r| r.to_vec()).collect();
    BivariatePalette::from_hex_rows(&rows).unwrap()
}

fn temperature_classifier() -> SequentialClassifier {
    SequentialClassifier::linear(-10.0, 32.0, parse_colors(&TEMP_COLORS).unwrap()).unwrap()
}

#[test]
fn test_fifteen_degrees_is_sixth_colour() {
    let c = temperature_classifier();
    assert_eq!(c.index(15.0), Some(5));
    assert_eq!(c.color(15.0), Color::from_hex("#fddbc7").unwrap());
}

#[test]
fn test_out_of_scale_values_clamp_to_ends() {
    let c = temperature_classifier();
    assert_eq!(c.color(-25.0), Color::from_hex("#053061").unwrap());
    assert_eq!(c.color(45.0), Color::from_hex("#67001f").unwrap());
}

#[test]
fn test_decile_splits_uniform_data_evenly() {
    let values: Vec<f64> = (0..1000).map(|v| v as f64).collect();
    let c = SequentialClassifier::decile(&values, parse_colors(&TEMP_COLORS).unwrap()).unwrap();

    let mut counts = [0usize; 10];
    for v in &values {
        counts[c.index(*v).unwrap()] += 1;
    }
    for count in counts {
        assert!((99..=101).contains(&count), "uneven bucket {}", count);
    }
}

#[test]
fn test_bivariate_extremes_use_corner_colours() {
    let rain: Vec<f64> = (0..99).map(|v| v as f64).collect();
    let sun = rain.clone();
    let c = BivariateClassifier::from_values(&rain, &sun, bivariate_palette());

    assert_eq!(c.levels(0.0, 0.0), Some((0, 0)));
    assert_eq!(c.color(0.0, 0.0), Color::from_hex("#f3f3f3").unwrap());
    assert_eq!(c.color(98.0, 0.0), Color::from_hex("#509dc2").unwrap());
    assert_eq!(c.color(0.0, 98.0), Color::from_hex("#f3b300").unwrap());
    assert_eq!(c.color(98.0, 98.0), Color::from_hex("#000000").unwrap());
}

#[test]
fn test_bivariate_breaks_are_independent_per_variable() {
    let rain: Vec<f64> = (0..100).map(|v| v as f64).collect();
    let sun: Vec<f64> = (0..100).map(|v| 1000.0 + v as f64 * 2.0).collect();
    let c = BivariateClassifier::from_values(&rain, &sun, bivariate_palette());

    let [r1, r2] = c.rain_breaks();
    let [s1, s2] = c.sun_breaks();
    assert!(r1 < 40.0 && r2 < 70.0);
    assert!(s1 > 1000.0 && s2 > s1);
    // a value sitting on a break belongs to the upper bucket
    assert_eq!(bucket(r1, &[r1, r2]), 1);
}

#[test]
fn test_bivariate_image_needs_both_layers() {
    let c = BivariateClassifier::from_values(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], bivariate_palette());
    let rain = [1.0, f64::NAN, 3.0, 2.0];
    let sun = [1.0, 2.0, f64::NAN, 2.0];
    let img = OutputImage::from_value_pair(&rain, &sun, 2, 2, &c).unwrap();

    assert_eq!(img.opaque_count(), 2);
    assert!(img.pixel(0, 1).unwrap().is_transparent());
    assert!(img.pixel(1, 0).unwrap().is_transparent());
}

fn assert_monotonic(c: &SequentialClassifier, lo: f64, hi: f64) {
    let mut prev = 0;
    let mut v = lo;
    while v <= hi {
        let idx = c.index(v).unwrap();
        assert!(idx >= prev, "index fell from {} to {} at {}", prev, idx, v);
        assert!(idx < c.colors().len());
        prev = idx;
        v += 0.05;
    }
}

#[test]
fn test_linear_index_never_decreases() {
    assert_monotonic(&temperature_classifier(), -20.0, 40.0);
}

#[test]
fn test_decile_index_never_decreases() {
    // skewed, with ties sitting exactly on several breakpoints
    let values: Vec<f64> = (0..500)
        .map(|i| if i % 3 == 0 { 12.5 } else { (i as f64 * 0.37).powf(1.3) % 30.0 })
        .collect();
    let c = SequentialClassifier::decile(&values, parse_colors(&TEMP_COLORS).unwrap()).unwrap();
    assert_monotonic(&c, -5.0, 35.0);
}

#[test]
fn test_every_valid_pair_gets_a_key_colour() {
    let rain: Vec<f64> = (0..200).map(|v| 20.0 + v as f64 * 1.5).collect();
    let sun: Vec<f64> = (0..200).map(|v| 30.0 + (v as f64 * 7.0) % 180.0).collect();
    let palette = bivariate_palette();
    let c = BivariateClassifier::from_values(&rain, &sun, palette);
    let key: Vec<Color> = palette.0.iter().flatten().copied().collect();

    for r in (0..=400).map(|v| v as f64) {
        for s in (0..=250).step_by(5).map(|v| v as f64) {
            let color = c.color(r, s);
            assert!(!color.is_transparent(), "({}, {}) left blank", r, s);
            assert!(key.contains(&color), "({}, {}) off the key", r, s);
            let (rl, sl) = c.levels(r, s).unwrap();
            assert_eq!(color, palette.get(rl, sl));
        }
    }
}
