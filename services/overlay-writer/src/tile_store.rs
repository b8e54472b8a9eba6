//! On-disk layout of tiles, overlay images, legends and descriptors.
//!
//! ```text
//! <tiles>/temp|rain|sun/<YYYY>_<MM>.json.gz
//! <tiles>/metadata.json
//! <images>/temp|rain_sun/<YYYY>_<MM>.png
//! <images>/averages/temp|rain_sun/<MM>.png
//! <images>/legend/temp|rain_sun.png
//! <images>/bounds.json
//! ```

use std::path::{Path, PathBuf};

use climate_common::{ClimateError, ClimateResult, GridExtent, Period, Variable};
use grid_processor::SparseGrid;

use crate::report::Layer;

/// Sparse gzip JSON tiles, one per variable and month.
#[derive(Debug, Clone)]
pub struct TileStore {
    root: PathBuf,
}

impl TileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tile_path(&self, variable: Variable, period: Period) -> PathBuf {
        self.root
            .join(variable.tile_dir())
            .join(format!("{}.json.gz", period.file_stem()))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join("metadata.json")
    }

    pub fn write(&self, variable: Variable, period: Period, grid: &SparseGrid) -> ClimateResult<PathBuf> {
        let path = self.tile_path(variable, period);
        grid.write_gz(&path)?;
        Ok(path)
    }

    /// Read a tile back. A tile that was never written is a missing source.
    pub fn read(&self, variable: Variable, period: Period, extent: GridExtent) -> ClimateResult<SparseGrid> {
        let path = self.tile_path(variable, period);
        if !path.is_file() {
            return Err(ClimateError::MissingSourceFile {
                variable: variable.to_string(),
                year: period.year,
                detail: format!("no tile at {}", path.display()),
            });
        }
        Ok(SparseGrid::read_gz(extent, &path)?)
    }
}

/// Overlay PNGs, legends and the bounds descriptor.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_path(&self, layer: Layer, period: Period) -> PathBuf {
        self.root
            .join(layer.as_str())
            .join(format!("{}.png", period.file_stem()))
    }

    pub fn average_path(&self, layer: Layer, month: u8) -> PathBuf {
        self.root
            .join("averages")
            .join(layer.as_str())
            .join(format!("{:02}.png", month))
    }

    pub fn legend_path(&self, layer: Layer) -> PathBuf {
        self.root.join("legend").join(format!("{}.png", layer))
    }

    pub fn bounds_path(&self) -> PathBuf {
        self.root.join("bounds.json")
    }
}
