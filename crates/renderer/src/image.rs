//! RGBA output images.
//!
//! Pixel row 0 is the top (north) edge of the overlay, the same order the
//! resampler produces values in, so nothing is flipped on the way to PNG.

use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::classify::{BivariateClassifier, SequentialClassifier};
use crate::color::Color;
use crate::error::{RenderError, Result};
use crate::png::create_png_auto;

/// A width x height RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl OutputImage {
    /// Fully transparent image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    pub fn pixel(&self, row: usize, col: usize) -> Option<Color> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let i = (row * self.width + col) * 4;
        let p = &self.pixels[i..i + 4];
        Some(Color::new(p[0], p[1], p[2], p[3]))
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, color: Color) {
        if row < self.height && col < self.width {
            let i = (row * self.width + col) * 4;
            self.pixels[i..i + 4].copy_from_slice(&color.to_rgba());
        }
    }

    /// Colour each value with a sequential classifier. NaN stays transparent.
    pub fn from_values(
        values: &[f64],
        width: usize,
        height: usize,
        classifier: &SequentialClassifier,
    ) -> Result<Self> {
        check_values(values.len(), width, height)?;
        let mut image = Self::new(width, height);
        if width == 0 {
            return Ok(image);
        }

        image
            .pixels
            .par_chunks_mut(width * 4)
            .zip(values.par_chunks(width))
            .for_each(|(out_row, value_row)| {
                for (px, &v) in out_row.chunks_exact_mut(4).zip(value_row) {
                    px.copy_from_slice(&classifier.color(v).to_rgba());
                }
            });

        Ok(image)
    }

    /// Colour paired rainfall and sunshine values with the bivariate key.
    /// A pixel missing either value stays transparent.
    pub fn from_value_pair(
        rain: &[f64],
        sun: &[f64],
        width: usize,
        height: usize,
        classifier: &BivariateClassifier,
    ) -> Result<Self> {
        check_values(rain.len(), width, height)?;
        check_values(sun.len(), width, height)?;
        let mut image = Self::new(width, height);
        if width == 0 {
            return Ok(image);
        }

        image
            .pixels
            .par_chunks_mut(width * 4)
            .zip(rain.par_chunks(width).zip(sun.par_chunks(width)))
            .for_each(|(out_row, (rain_row, sun_row))| {
                for ((px, &r), &s) in out_row.chunks_exact_mut(4).zip(rain_row).zip(sun_row) {
                    px.copy_from_slice(&classifier.color(r, s).to_rgba());
                }
            });

        Ok(image)
    }

    /// Number of pixels with non-zero alpha.
    pub fn opaque_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] != 0).count()
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        create_png_auto(&self.pixels, self.width, self.height)
    }

    /// Encode and write, creating parent directories.
    pub fn write_png(&self, path: &Path) -> Result<()> {
        let bytes = self.to_png()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "Wrote PNG");
        Ok(())
    }
}

fn check_values(len: usize, width: usize, height: usize) -> Result<()> {
    if len != width * height {
        return Err(RenderError::DimensionMismatch {
            width,
            height,
            expected: width * height,
            actual: len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_transparent() {
        let img = OutputImage::new(3, 2);
        assert_eq!(img.pixels.len(), 24);
        assert_eq!(img.opaque_count(), 0);
        assert!(img.pixel(1, 2).unwrap().is_transparent());
        assert!(img.pixel(2, 0).is_none());
    }

    #[test]
    fn test_set_pixel() {
        let mut img = OutputImage::new(2, 2);
        img.set_pixel(1, 0, Color::rgb(1, 2, 3));
        img.set_pixel(5, 5, Color::rgb(9, 9, 9));
        assert_eq!(img.pixel(1, 0), Some(Color::rgb(1, 2, 3)));
        assert_eq!(img.opaque_count(), 1);
    }

    #[test]
    fn test_from_values_keeps_row_order() {
        let colors = vec![Color::rgb(0, 0, 255), Color::rgb(255, 0, 0)];
        let c = SequentialClassifier::linear(0.0, 1.0, colors).unwrap();
        // top row cold, bottom row hot, one missing
        let values = [0.0, 0.0, 1.0, f64::NAN];
        let img = OutputImage::from_values(&values, 2, 2, &c).unwrap();
        assert_eq!(img.pixel(0, 0), Some(Color::rgb(0, 0, 255)));
        assert_eq!(img.pixel(1, 0), Some(Color::rgb(255, 0, 0)));
        assert!(img.pixel(1, 1).unwrap().is_transparent());
    }

    #[test]
    fn test_from_values_checks_length() {
        let c = SequentialClassifier::linear(0.0, 1.0, vec![Color::rgb(0, 0, 0)]).unwrap();
        assert!(OutputImage::from_values(&[0.0; 3], 2, 2, &c).is_err());
    }
}
