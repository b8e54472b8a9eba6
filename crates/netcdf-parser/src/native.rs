//! Native HadUK-Grid NetCDF reading using the netcdf library.
//!
//! Each read opens the file, copies the variable into memory and closes the
//! file again before returning, so a multi-year batch never holds more than
//! one handle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, info};

use climate_common::{CrsCode, GridExtent, Variable};

use crate::error::{NetCdfError, NetCdfResult};
use crate::pattern::{find_any_year, find_source_file, FilePattern};
use crate::source::{RasterSource, YearStack};

const X_COORDINATE: &str = "projection_x_coordinate";
const Y_COORDINATE: &str = "projection_y_coordinate";

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This disables that output by calling
/// H5Eset_auto2 with null handlers. Safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// A gridded variable read from one file, rows north-up.
#[derive(Debug, Clone)]
pub struct GridData {
    pub extent: GridExtent,
    pub months: usize,
    pub values: Vec<f64>,
}

/// Read `variable_name` (or the first 3-D variable if it is absent) from a
/// HadUK-style NetCDF file.
///
/// `_FillValue` / `missing_value` cells become NaN and the extent comes from
/// the projection coordinate variables. Files stored south-first have their
/// rows reordered so row 0 is the northern edge.
pub fn read_grid(path: &Path, variable_name: &str) -> NetCdfResult<GridData> {
    silence_hdf5_errors();

    let file = netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let var = match file.variable(variable_name) {
        Some(v) => v,
        None => file
            .variables()
            .find(|v| v.dimensions().len() == 3)
            .ok_or_else(|| {
                NetCdfError::MissingData(format!(
                    "{} variable (and no 3-D fallback) in {}",
                    variable_name,
                    path.display()
                ))
            })?,
    };

    let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let (months, ny, nx) = match dims.as_slice() {
        [t, y, x] => (*t, *y, *x),
        [y, x] => (1, *y, *x),
        other => {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} has {} dimensions, expected (time, y, x)",
                var.name(),
                other.len()
            )))
        }
    };

    let raw = read_f64_values(&var)?;
    let fill = get_f64_attr(&var, "_FillValue").or_else(|| get_f64_attr(&var, "missing_value"));

    let xs = read_coordinate(&file, X_COORDINATE)?;
    let ys = read_coordinate(&file, Y_COORDINATE)?;
    if xs.len() != nx || ys.len() != ny {
        return Err(NetCdfError::Shape(format!(
            "coordinates are {}x{} but {} is {}x{}",
            xs.len(),
            ys.len(),
            var.name(),
            nx,
            ny
        )));
    }
    if xs.len() > 1 && xs[1] < xs[0] {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} must ascend west to east",
            X_COORDINATE
        )));
    }
    if raw.len() != months * ny * nx {
        return Err(NetCdfError::Shape(format!(
            "read {} values for a {}x{}x{} variable",
            raw.len(),
            months,
            ny,
            nx
        )));
    }

    let extent = GridExtent::from_cell_centers(&xs, &ys, CrsCode::Epsg27700)?;
    let south_first = ys.len() > 1 && ys[1] > ys[0];

    let mut values = Vec::with_capacity(raw.len());
    for t in 0..months {
        for row in 0..ny {
            let src_row = if south_first { ny - 1 - row } else { row };
            let start = (t * ny + src_row) * nx;
            values.extend(raw[start..start + nx].iter().map(|&v| clean_value(v, fill)));
        }
    }

    debug!(
        path = %path.display(),
        variable = %var.name(),
        months,
        width = nx,
        height = ny,
        south_first,
        "Read NetCDF grid"
    );
    drop(file);

    Ok(GridData {
        extent,
        months,
        values,
    })
}

/// Extent of a HadUK-style file from its coordinate variables only.
pub fn read_extent(path: &Path) -> NetCdfResult<GridExtent> {
    silence_hdf5_errors();

    let file = netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let xs = read_coordinate(&file, X_COORDINATE)?;
    let ys = read_coordinate(&file, Y_COORDINATE)?;
    Ok(GridExtent::from_cell_centers(&xs, &ys, CrsCode::Epsg27700)?)
}

/// Raster source over a directory of HadUK-Grid monthly files.
#[derive(Debug, Clone)]
pub struct NetCdfSource {
    data_dir: PathBuf,
    patterns: HashMap<Variable, FilePattern>,
    extent: Option<GridExtent>,
}

impl NetCdfSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            patterns: Variable::ALL
                .iter()
                .map(|&v| (v, FilePattern::haduk(v)))
                .collect(),
            extent: None,
        }
    }

    pub fn with_pattern(mut self, variable: Variable, pattern: FilePattern) -> Self {
        self.patterns.insert(variable, pattern);
        self
    }

    /// Fix the expected extent. Files that disagree are rejected.
    pub fn with_extent(mut self, extent: GridExtent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn pattern(&self, variable: Variable) -> FilePattern {
        self.patterns
            .get(&variable)
            .cloned()
            .unwrap_or_else(|| FilePattern::haduk(variable))
    }
}

impl RasterSource for NetCdfSource {
    fn extent(&self) -> NetCdfResult<GridExtent> {
        if let Some(extent) = self.extent {
            return Ok(extent);
        }
        for variable in Variable::ALL {
            if let Some(path) = find_any_year(&self.data_dir, &self.pattern(variable))? {
                return read_extent(&path);
            }
        }
        Err(NetCdfError::MissingData(format!(
            "no source files in {} to derive an extent from",
            self.data_dir.display()
        )))
    }

    fn load_year(&self, variable: Variable, year: i32) -> NetCdfResult<YearStack> {
        let path = find_source_file(&self.data_dir, &self.pattern(variable), variable, year)?;
        let grid = read_grid(&path, variable.netcdf_name())?;

        if let Some(expected) = self.extent {
            if !same_extent(&expected, &grid.extent) {
                return Err(NetCdfError::Shape(format!(
                    "{} covers {:?}, expected {:?}",
                    path.display(),
                    grid.extent,
                    expected
                )));
            }
        }

        info!(
            variable = %variable,
            year,
            months = grid.months,
            path = %path.display(),
            "Loaded source year"
        );
        YearStack::new(variable, year, grid.extent, grid.values)
    }
}

fn same_extent(a: &GridExtent, b: &GridExtent) -> bool {
    let tol = a.resolution * 1e-6;
    (a.x_min - b.x_min).abs() <= tol
        && (a.x_max - b.x_max).abs() <= tol
        && (a.y_min - b.y_min).abs() <= tol
        && (a.y_max - b.y_max).abs() <= tol
        && (a.resolution - b.resolution).abs() <= tol
}

fn clean_value(v: f64, fill: Option<f64>) -> f64 {
    if !v.is_finite() {
        return f64::NAN;
    }
    match fill {
        Some(f) if (v - f).abs() <= f.abs() * 1e-6 => f64::NAN,
        _ => v,
    }
}

/// Read a variable as f64, falling back to an f32 read for single-precision
/// data.
fn read_f64_values(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    match var.get_values::<f64, _>(..) {
        Ok(values) => Ok(values),
        Err(_) => {
            let values: Vec<f32> = var.get_values(..).map_err(|e| {
                NetCdfError::InvalidFormat(format!("Failed to read {}: {}", var.name(), e))
            })?;
            Ok(values.into_iter().map(f64::from).collect())
        }
    }
}

fn read_coordinate(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;
    read_f64_values(&var)
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_value() {
        assert!(clean_value(1e20, Some(1e20)).is_nan());
        assert!(clean_value(f64::NAN, None).is_nan());
        assert_eq!(clean_value(12.5, Some(1e20)), 12.5);
        assert_eq!(clean_value(-99.0, Some(-99.0)).is_nan(), true);
    }

    #[test]
    fn test_same_extent_tolerance() {
        let a = GridExtent::new(0.0, 2000.0, 0.0, 3000.0, 1000.0, CrsCode::Epsg27700).unwrap();
        let mut b = a;
        b.x_min += 1e-6;
        assert!(same_extent(&a, &b));
        b.x_min += 500.0;
        assert!(!same_extent(&a, &b));
    }
}
