//! The raster source seam and an in-memory implementation.

use std::collections::HashMap;

use climate_common::{GridExtent, Variable};

use crate::error::{NetCdfError, NetCdfResult};

/// One variable for one year: `months x rows x cols`, row 0 north,
/// NaN where a cell has no value.
#[derive(Debug, Clone)]
pub struct YearStack {
    pub variable: Variable,
    pub year: i32,
    pub extent: GridExtent,
    months: usize,
    data: Vec<f64>,
}

impl YearStack {
    pub fn new(
        variable: Variable,
        year: i32,
        extent: GridExtent,
        data: Vec<f64>,
    ) -> NetCdfResult<Self> {
        let cells = extent.len();
        if cells == 0 || data.len() % cells != 0 {
            return Err(NetCdfError::Shape(format!(
                "{} values is not a whole number of {}x{} frames",
                data.len(),
                extent.width(),
                extent.height()
            )));
        }
        let months = data.len() / cells;
        if months == 0 || months > 12 {
            return Err(NetCdfError::Shape(format!(
                "expected 1..=12 monthly frames, got {}",
                months
            )));
        }
        Ok(Self {
            variable,
            year,
            extent,
            months,
            data,
        })
    }

    /// Number of monthly frames held, counted from January.
    pub fn months(&self) -> usize {
        self.months
    }

    /// Values for calendar month `month` (1-based).
    pub fn frame(&self, month: u8) -> Option<&[f64]> {
        let m = month as usize;
        if m == 0 || m > self.months {
            return None;
        }
        let cells = self.extent.len();
        Some(&self.data[(m - 1) * cells..m * cells])
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }
}

/// Supplies gridded climate data by variable and year.
pub trait RasterSource: Send + Sync {
    /// Grid the source delivers.
    fn extent(&self) -> NetCdfResult<GridExtent>;

    /// Load every month of one variable for one year.
    ///
    /// Returns [`NetCdfError::MissingFile`] when the year is not available.
    fn load_year(&self, variable: Variable, year: i32) -> NetCdfResult<YearStack>;
}

/// Year stacks held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    extent: GridExtent,
    stacks: HashMap<(Variable, i32), Vec<f64>>,
}

impl MemorySource {
    pub fn new(extent: GridExtent) -> Self {
        Self {
            extent,
            stacks: HashMap::new(),
        }
    }

    /// Add a year of data, checked against the source extent.
    pub fn insert(&mut self, variable: Variable, year: i32, data: Vec<f64>) -> NetCdfResult<()> {
        YearStack::new(variable, year, self.extent, data.clone())?;
        self.stacks.insert((variable, year), data);
        Ok(())
    }

    pub fn with_year(mut self, variable: Variable, year: i32, data: Vec<f64>) -> NetCdfResult<Self> {
        self.insert(variable, year, data)?;
        Ok(self)
    }
}

impl RasterSource for MemorySource {
    fn extent(&self) -> NetCdfResult<GridExtent> {
        Ok(self.extent)
    }

    fn load_year(&self, variable: Variable, year: i32) -> NetCdfResult<YearStack> {
        let data = self
            .stacks
            .get(&(variable, year))
            .cloned()
            .ok_or_else(|| NetCdfError::MissingFile {
                variable,
                year,
                detail: "not loaded in memory".to_string(),
            })?;
        YearStack::new(variable, year, self.extent, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::berkshire_extent;

    #[test]
    fn test_year_stack_frames() {
        let extent = berkshire_extent();
        let n = extent.len();
        let data: Vec<f64> = (0..n * 12).map(|i| (i / n) as f64).collect();
        let stack = YearStack::new(Variable::Rainfall, 2022, extent, data).unwrap();

        assert_eq!(stack.months(), 12);
        assert_eq!(stack.frame(1).unwrap()[0], 0.0);
        assert_eq!(stack.frame(12).unwrap()[n - 1], 11.0);
        assert!(stack.frame(0).is_none());
        assert!(stack.frame(13).is_none());
    }

    #[test]
    fn test_year_stack_rejects_partial_frames() {
        let extent = berkshire_extent();
        assert!(YearStack::new(Variable::Sunshine, 2022, extent, vec![1.0; 7]).is_err());
        assert!(YearStack::new(Variable::Sunshine, 2022, extent, vec![]).is_err());
        assert!(YearStack::new(Variable::Sunshine, 2022, extent, vec![1.0; extent.len() * 13]).is_err());
    }

    #[test]
    fn test_memory_source_missing_year() {
        let extent = berkshire_extent();
        let source = MemorySource::new(extent)
            .with_year(Variable::Temperature, 2021, vec![10.0; extent.len() * 12])
            .unwrap();

        assert!(source.load_year(Variable::Temperature, 2021).is_ok());
        assert!(matches!(
            source.load_year(Variable::Temperature, 2022),
            Err(NetCdfError::MissingFile { year: 2022, .. })
        ));
    }
}
