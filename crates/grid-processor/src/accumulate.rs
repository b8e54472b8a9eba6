//! Running per-month averages across years.

use std::collections::BTreeMap;

use climate_common::GridExtent;
use tracing::debug;

use crate::error::{GridProcessorError, Result};
use crate::frame::RasterFrame;

#[derive(Debug, Clone)]
struct MonthSum {
    /// NaN once any contributing frame lacked the cell.
    sum: Vec<f64>,
    frames: u32,
}

/// Accumulates frames by calendar month and yields the multi-year mean.
///
/// A cell's mean is only defined where every contributing frame had a value,
/// so one missing year blanks that cell for the month.
#[derive(Debug, Clone)]
pub struct MonthlyAccumulator {
    extent: GridExtent,
    months: BTreeMap<u8, MonthSum>,
}

impl MonthlyAccumulator {
    pub fn new(extent: GridExtent) -> Self {
        Self {
            extent,
            months: BTreeMap::new(),
        }
    }

    /// Add one month's frame.
    pub fn add(&mut self, month: u8, frame: &RasterFrame) -> Result<()> {
        if !(1..=12).contains(&month) {
            return Err(GridProcessorError::config(format!(
                "month must be in 1..=12, got {}",
                month
            )));
        }
        if frame.values().len() != self.extent.len() {
            return Err(GridProcessorError::extent_mismatch(format!(
                "frame has {} cells, accumulator expects {}",
                frame.values().len(),
                self.extent.len()
            )));
        }

        let cells = self.extent.len();
        let entry = self.months.entry(month).or_insert_with(|| MonthSum {
            sum: vec![0.0; cells],
            frames: 0,
        });
        for (s, &v) in entry.sum.iter_mut().zip(frame.values()) {
            *s += if v.is_finite() { v } else { f64::NAN };
        }
        entry.frames += 1;
        Ok(())
    }

    /// Number of frames added for a month.
    pub fn frames(&self, month: u8) -> u32 {
        self.months.get(&month).map_or(0, |m| m.frames)
    }

    /// Mean frame for a month, `None` if nothing was added for it.
    pub fn mean(&self, month: u8) -> Option<RasterFrame> {
        let m = self.months.get(&month)?;
        let frames = m.frames as f64;
        let values = m.sum.iter().map(|&s| s / frames).collect();
        RasterFrame::new(self.extent, values).ok()
    }

    /// Consume the accumulator, yielding `(month, mean)` for each month with data.
    pub fn finish(self) -> Vec<(u8, RasterFrame)> {
        let months: Vec<u8> = self.months.keys().copied().collect();
        let out: Vec<(u8, RasterFrame)> = months
            .into_iter()
            .filter_map(|month| self.mean(month).map(|frame| (month, frame)))
            .collect();
        debug!(months = out.len(), "Flushed monthly averages");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use climate_common::CrsCode;

    fn extent() -> GridExtent {
        GridExtent::new(0.0, 2000.0, 0.0, 1000.0, 1000.0, CrsCode::Epsg27700).unwrap()
    }

    #[test]
    fn test_mean_across_years() {
        let mut acc = MonthlyAccumulator::new(extent());
        acc.add(1, &RasterFrame::new(extent(), vec![2.0, 10.0]).unwrap()).unwrap();
        acc.add(1, &RasterFrame::new(extent(), vec![4.0, f64::NAN]).unwrap()).unwrap();
        assert_eq!(acc.frames(1), 2);

        let mean = acc.mean(1).unwrap();
        assert_eq!(mean.get(0, 0), Some(3.0));
        assert_eq!(mean.get(0, 1), None, "a missing year blanks the cell");
        assert!(acc.mean(2).is_none());
    }

    #[test]
    fn test_missing_first_year_stays_blank() {
        let mut acc = MonthlyAccumulator::new(extent());
        acc.add(4, &RasterFrame::new(extent(), vec![f64::NAN, 1.0]).unwrap()).unwrap();
        acc.add(4, &RasterFrame::new(extent(), vec![6.0, f64::INFINITY]).unwrap()).unwrap();
        acc.add(4, &RasterFrame::new(extent(), vec![8.0, 3.0]).unwrap()).unwrap();

        let mean = acc.mean(4).unwrap();
        assert_eq!(mean.get(0, 0), None);
        assert_eq!(mean.get(0, 1), None);
        assert_eq!(mean.valid_count(), 0);
    }

    #[test]
    fn test_finish_orders_months() {
        let mut acc = MonthlyAccumulator::new(extent());
        acc.add(7, &RasterFrame::filled(extent(), 1.0)).unwrap();
        acc.add(3, &RasterFrame::filled(extent(), 2.0)).unwrap();
        let months: Vec<u8> = acc.finish().into_iter().map(|(m, _)| m).collect();
        assert_eq!(months, vec![3, 7]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut acc = MonthlyAccumulator::new(extent());
        assert!(acc.add(13, &RasterFrame::filled(extent(), 1.0)).is_err());
        let other = GridExtent::new(0.0, 3000.0, 0.0, 1000.0, 1000.0, CrsCode::Epsg27700).unwrap();
        assert!(acc.add(1, &RasterFrame::filled(other, 1.0)).is_err());
    }
}
