//! Legend images.

use crate::classify::BivariatePalette;
use crate::color::{interpolate_color, Color};
use crate::error::{RenderError, Result};
use crate::image::OutputImage;

/// Horizontal colour bar, first palette colour at the left edge and the
/// last at the right, interpolated between stops.
pub fn sequential_bar(colors: &[Color], width: usize, height: usize) -> Result<OutputImage> {
    if colors.is_empty() {
        return Err(RenderError::InvalidPalette("palette is empty".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(RenderError::DimensionMismatch {
            width,
            height,
            expected: 1,
            actual: 0,
        });
    }

    let stops = colors.len() - 1;
    let row: Vec<Color> = (0..width)
        .map(|x| {
            if stops == 0 || width == 1 {
                return colors[0];
            }
            let pos = x as f32 / (width - 1) as f32 * stops as f32;
            let i = (pos.floor() as usize).min(stops - 1);
            interpolate_color(colors[i], colors[i + 1], pos - i as f32)
        })
        .collect();

    let mut image = OutputImage::new(width, height);
    for y in 0..height {
        for (x, &c) in row.iter().enumerate() {
            image.set_pixel(y, x, c);
        }
    }
    Ok(image)
}

/// 3x3 key of `cell`-pixel squares. Rainfall increases downward and
/// sunshine increases to the right.
pub fn bivariate_square(palette: &BivariatePalette, cell: usize) -> Result<OutputImage> {
    if cell == 0 {
        return Err(RenderError::DimensionMismatch {
            width: 0,
            height: 0,
            expected: 1,
            actual: 0,
        });
    }

    let size = cell * 3;
    let mut image = OutputImage::new(size, size);
    for y in 0..size {
        for x in 0..size {
            image.set_pixel(y, x, palette.get(y / cell, x / cell));
        }
    }
    Ok(image)
}
