//! Regular longitude/latitude bins.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Slack used when counting cells so `47 / 0.125` gives 376, not 377.
const CELL_EPSILON: f64 = 1e-9;

/// Half-open axis `[start, stop)` sampled every `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBins {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl AxisBins {
    pub fn new(start: f64, stop: f64, step: f64) -> Result<Self> {
        let bins = Self { start, stop, step };
        bins.validate()?;
        Ok(bins)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.start.is_finite() && self.stop.is_finite() && self.step.is_finite()) {
            return Err(GridError::invalid_bins(format!("non finite axis {:?}", self)));
        }
        if self.step <= 0.0 {
            return Err(GridError::invalid_bins(format!("step must be > 0, got {}", self.step)));
        }
        if self.stop <= self.start {
            return Err(GridError::invalid_bins(format!(
                "stop ({}) must be greater than start ({})",
                self.stop, self.start
            )));
        }
        Ok(())
    }

    /// Number of cells, `ceil((stop - start) / step)`.
    pub fn cells(&self) -> usize {
        ((self.stop - self.start) / self.step - CELL_EPSILON).ceil().max(0.0) as usize
    }

    /// Cell holding `value`, `None` outside `[start, stop)` or for NaN.
    pub fn cell_of(&self, value: f64) -> Option<usize> {
        if !(value >= self.start && value < self.stop) {
            return None;
        }
        let i = ((value - self.start) / self.step).floor() as usize;
        Some(i.min(self.cells().saturating_sub(1)))
    }

    /// Cell edges, `cells() + 1` values.
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.cells())
            .map(|i| self.start + i as f64 * self.step)
            .collect()
    }

    /// Cell centres, `cells()` values.
    pub fn centers(&self) -> Vec<f64> {
        (0..self.cells())
            .map(|i| self.start + (i as f64 + 0.5) * self.step)
            .collect()
    }
}

/// Two-axis bin definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bins {
    pub lon: AxisBins,
    pub lat: AxisBins,
}

impl Bins {
    pub fn new(lon: AxisBins, lat: AxisBins) -> Result<Self> {
        lon.validate()?;
        lat.validate()?;
        Ok(Self { lon, lat })
    }

    /// Same step on both axes.
    pub fn regular(lon: (f64, f64), lat: (f64, f64), step: f64) -> Result<Self> {
        Self::new(
            AxisBins::new(lon.0, lon.1, step)?,
            AxisBins::new(lat.0, lat.1, step)?,
        )
    }

    /// `(nx, ny)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.lon.cells(), self.lat.cells())
    }

    /// Area of one cell in square degrees.
    pub fn cell_area(&self) -> f64 {
        self.lon.step * self.lat.step
    }

    pub fn cell_of(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        Some((self.lon.cell_of(lon)?, self.lat.cell_of(lat)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_exact_division() {
        assert_eq!(AxisBins::new(-10.0, 37.0, 0.125).unwrap().cells(), 376);
        assert_eq!(AxisBins::new(30.0, 46.0, 0.125).unwrap().cells(), 128);
    }

    #[test]
    fn test_cells_partial_last_cell() {
        assert_eq!(AxisBins::new(0.0, 1.0, 0.3).unwrap().cells(), 4);
    }

    #[test]
    fn test_invalid_axis() {
        assert!(AxisBins::new(0.0, 1.0, 0.0).is_err());
        assert!(AxisBins::new(0.0, 1.0, -0.5).is_err());
        assert!(AxisBins::new(1.0, 1.0, 0.5).is_err());
        assert!(AxisBins::new(f64::NAN, 1.0, 0.5).is_err());
    }

    #[test]
    fn test_cell_of() {
        let axis = AxisBins::new(-10.0, 37.0, 0.125).unwrap();
        assert_eq!(axis.cell_of(-10.0), Some(0));
        assert_eq!(axis.cell_of(-9.9), Some(0));
        assert_eq!(axis.cell_of(-9.875), Some(1));
        assert_eq!(axis.cell_of(36.99), Some(375));
        assert_eq!(axis.cell_of(37.0), None);
        assert_eq!(axis.cell_of(-10.01), None);
        assert_eq!(axis.cell_of(f64::NAN), None);
    }

    #[test]
    fn test_edges_and_centers() {
        let axis = AxisBins::new(0.0, 1.0, 0.25).unwrap();
        assert_eq!(axis.edges(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(axis.centers(), vec![0.125, 0.375, 0.625, 0.875]);
    }

    #[test]
    fn test_bins_shape() {
        let bins = Bins::regular((-10.0, 37.0), (30.0, 46.0), 0.125).unwrap();
        assert_eq!(bins.shape(), (376, 128));
        assert_eq!(bins.cell_area(), 0.015625);
    }
}
