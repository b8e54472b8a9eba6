//! Batch bookkeeping: which periods were produced, skipped or failed.

use serde::Serialize;
use std::fmt;

use climate_common::{Period, Variable};

/// An output layer. Source variables map one-to-one to tile layers; the
/// rain/sun pair is the bivariate image layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Temp,
    Rain,
    Sun,
    RainSun,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Temp => "temp",
            Layer::Rain => "rain",
            Layer::Sun => "sun",
            Layer::RainSun => "rain_sun",
        }
    }
}

impl From<Variable> for Layer {
    fn from(v: Variable) -> Self {
        match v {
            Variable::Temperature => Layer::Temp,
            Variable::Rainfall => Layer::Rain,
            Variable::Sunshine => Layer::Sun,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one output of a batch, e.g. `temp/2021-07`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PeriodKey {
    pub layer: Layer,
    pub year: i32,
    pub month: u8,
}

impl PeriodKey {
    pub fn new(layer: impl Into<Layer>, period: Period) -> Self {
        Self {
            layer: layer.into(),
            year: period.year,
            month: period.month,
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}-{:02}", self.layer, self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every period was produced.
    Complete,
    /// Some periods were skipped or failed, at least one was produced.
    Partial,
    /// Nothing was produced.
    Empty,
}

impl BatchOutcome {
    /// Process exit status for the outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            BatchOutcome::Complete => 0,
            BatchOutcome::Partial => 2,
            BatchOutcome::Empty => 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub produced: Vec<PeriodKey>,
    pub skipped: Vec<(PeriodKey, String)>,
    pub failed: Vec<(PeriodKey, String)>,
}

impl BatchReport {
    pub fn add_produced(&mut self, key: PeriodKey) {
        self.produced.push(key);
    }

    pub fn skip(&mut self, key: PeriodKey, reason: impl Into<String>) {
        self.skipped.push((key, reason.into()));
    }

    pub fn fail(&mut self, key: PeriodKey, reason: impl Into<String>) {
        self.failed.push((key, reason.into()));
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.produced.extend(other.produced);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }

    pub fn outcome(&self) -> BatchOutcome {
        if self.produced.is_empty() {
            BatchOutcome::Empty
        } else if self.skipped.is_empty() && self.failed.is_empty() {
            BatchOutcome::Complete
        } else {
            BatchOutcome::Partial
        }
    }

    /// Produced keys for one layer.
    pub fn produced_for(&self, layer: Layer) -> impl Iterator<Item = &PeriodKey> {
        self.produced.iter().filter(move |k| k.layer == layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(layer: Layer, year: i32, month: u8) -> PeriodKey {
        PeriodKey::new(layer, Period::new(year, month).unwrap())
    }

    #[test]
    fn test_period_key_display() {
        assert_eq!(key(Layer::Temp, 2021, 7).to_string(), "temp/2021-07");
        assert_eq!(key(Layer::RainSun, 2023, 12).to_string(), "rain_sun/2023-12");
        assert_eq!(PeriodKey::new(Variable::Sunshine, Period::new(2022, 1).unwrap()).layer, Layer::Sun);
    }

    #[test]
    fn test_outcomes() {
        let mut report = BatchReport::default();
        assert_eq!(report.outcome(), BatchOutcome::Empty);
        assert_eq!(report.outcome().exit_code(), 1);

        report.add_produced(key(Layer::Temp, 2021, 1));
        assert_eq!(report.outcome(), BatchOutcome::Complete);
        assert_eq!(report.outcome().exit_code(), 0);

        report.skip(key(Layer::Temp, 2022, 1), "missing file");
        assert_eq!(report.outcome(), BatchOutcome::Partial);
        assert_eq!(report.outcome().exit_code(), 2);
    }

    #[test]
    fn test_failed_only_is_empty() {
        let mut report = BatchReport::default();
        report.fail(key(Layer::Rain, 2021, 3), "bad tile");
        assert_eq!(report.outcome(), BatchOutcome::Empty);
    }
}
