//! Climate variables and monthly periods.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ClimateError, ClimateResult};

/// A gridded climate variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    /// Monthly mean of daily maximum temperature
    Temperature,
    /// Monthly total precipitation
    Rainfall,
    /// Monthly total sunshine duration
    Sunshine,
}

impl Variable {
    pub const ALL: [Variable; 3] = [Variable::Temperature, Variable::Rainfall, Variable::Sunshine];

    /// Variable name inside the source NetCDF files.
    pub fn netcdf_name(&self) -> &'static str {
        match self {
            Variable::Temperature => "tasmax",
            Variable::Rainfall => "rainfall",
            Variable::Sunshine => "sun",
        }
    }

    /// Directory name used for serialized tiles.
    pub fn tile_dir(&self) -> &'static str {
        match self {
            Variable::Temperature => "temp",
            Variable::Rainfall => "rain",
            Variable::Sunshine => "sun",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Variable::Temperature => "°C",
            Variable::Rainfall => "mm",
            Variable::Sunshine => "hours",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Variable::Temperature => "Maximum air temperature",
            Variable::Rainfall => "Total precipitation",
            Variable::Sunshine => "Sunshine duration",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variable::Temperature => "temperature",
            Variable::Rainfall => "rainfall",
            Variable::Sunshine => "sunshine",
        };
        f.write_str(name)
    }
}

impl FromStr for Variable {
    type Err = ClimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "temperature" | "temp" | "tasmax" => Ok(Variable::Temperature),
            "rainfall" | "rain" => Ok(Variable::Rainfall),
            "sunshine" | "sun" => Ok(Variable::Sunshine),
            other => Err(ClimateError::config(format!("unknown variable: {}", other))),
        }
    }
}

/// One calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u8,
}

impl Period {
    pub fn new(year: i32, month: u8) -> ClimateResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(ClimateError::config(format!(
                "month must be in 1..=12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// Zero-based index into a twelve-month stack.
    pub fn month_index(&self) -> usize {
        (self.month - 1) as usize
    }

    /// File stem, e.g. `2021_01`.
    pub fn file_stem(&self) -> String {
        format!("{}_{:02}", self.year, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_names() {
        assert_eq!(Variable::Temperature.netcdf_name(), "tasmax");
        assert_eq!(Variable::Rainfall.tile_dir(), "rain");
        assert_eq!(Variable::Sunshine.tile_dir(), "sun");
        assert_eq!("temp".parse::<Variable>().unwrap(), Variable::Temperature);
        assert!("snow".parse::<Variable>().is_err());
    }

    #[test]
    fn test_period() {
        let p = Period::new(2021, 3).unwrap();
        assert_eq!(p.to_string(), "2021-03");
        assert_eq!(p.file_stem(), "2021_03");
        assert_eq!(p.month_index(), 2);
        assert!(Period::new(2021, 0).is_err());
        assert!(Period::new(2021, 13).is_err());
    }
}
