//! Colour classification and image output for climate overlays.
//!
//! - [`classify`]: linear, decile and bivariate tertile classification
//! - [`image`]: RGBA overlay images built from resampled pixel values
//! - [`legend`]: colour bar and 3x3 bivariate keys
//! - [`png`]: indexed/RGBA PNG encoding

pub mod classify;
pub mod color;
pub mod error;
pub mod image;
pub mod legend;
pub mod png;

pub use classify::{
    bucket, percentile, percentiles, BivariateClassifier, BivariatePalette, SequentialClassifier,
    SequentialScale,
};
pub use color::{interpolate_color, parse_colors, Color};
pub use error::{RenderError, Result};
pub use image::OutputImage;
