//! Eddy centre histograms.

use eddy_obs::{EddyObservations, Period};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bins::Bins;
use crate::error::{GridError, Result};
use crate::grid::{MaskedGrid, RegularGrid};

/// Default output variable of [`grid_count`].
pub const COUNT_VARIABLE: &str = "count";

/// Options of [`grid_count`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountOptions {
    /// Count eddy centres. Contour counting is not available.
    pub center: bool,
    /// Multiplier applied to every defined cell.
    pub factor: Option<f64>,
    /// Name of the output variable.
    pub name: String,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self {
            center: true,
            factor: None,
            name: COUNT_VARIABLE.to_string(),
        }
    }
}

/// `1 / (dlon * dlat * days)`: turns raw counts into eddies per square
/// degree per day.
pub fn density_factor(bins: &Bins, period: &Period) -> f64 {
    1.0 / (bins.cell_area() * period.span_days() as f64)
}

/// Histogram of eddy centres over `bins`.
///
/// Longitudes are wrapped into `[lon.start, lon.start + 360)` first, so data
/// stored in 0..360 lands in a -180..180 lattice. Cells without any eddy are
/// masked.
pub fn grid_count(
    obs: &EddyObservations,
    bins: &Bins,
    options: &CountOptions,
) -> Result<RegularGrid> {
    if !options.center {
        return Err(GridError::Unsupported(
            "contour counting, only centre counting is available".to_string(),
        ));
    }
    bins.lon.validate()?;
    bins.lat.validate()?;

    let (nx, ny) = bins.shape();
    let x0 = bins.lon.start;
    let mut counts = vec![0u32; nx * ny];
    let mut outside = 0usize;
    for (&lon, &lat) in obs.longitude().iter().zip(obs.latitude()) {
        let lon = (lon - x0).rem_euclid(360.0) + x0;
        match bins.cell_of(lon, lat) {
            Some((ix, iy)) => counts[ix * ny + iy] += 1,
            None => outside += 1,
        }
    }
    debug!(outside, "Observations outside bins");

    let factor = options.factor.unwrap_or(1.0);
    let mask: Vec<bool> = counts.iter().map(|&c| c == 0).collect();
    let values: Vec<f64> = counts.iter().map(|&c| c as f64 * factor).collect();
    let count = MaskedGrid::from_parts(nx, ny, values, mask)?;

    info!(
        polarity = %obs.polarity(),
        observations = obs.len(),
        nx,
        ny,
        filled_cells = count.count_valid(),
        "Counted eddy centres"
    );

    let mut grid = RegularGrid::new(*bins);
    grid.insert(options.name.clone(), count)?;
    Ok(grid)
}

/// Centre count normalized by cell area and by the dataset's period.
pub fn density(obs: &EddyObservations, bins: &Bins, name: &str) -> Result<RegularGrid> {
    let period = obs
        .period()
        .ok_or_else(|| GridError::EmptyDataset(format!("{} observations", obs.polarity())))?;
    let options = CountOptions {
        center: true,
        factor: Some(density_factor(bins, &period)),
        name: name.to_string(),
    };
    grid_count(obs, bins, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_obs::Polarity;

    fn obs(lon: Vec<f64>, lat: Vec<f64>) -> EddyObservations {
        let n = lon.len();
        EddyObservations::new(
            Polarity::Cyclonic,
            lon,
            lat,
            (0..n).map(|i| i as f64).collect(),
            (0..n as u32).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_counts_and_mask() {
        let bins = Bins::regular((0.0, 2.0), (0.0, 2.0), 1.0).unwrap();
        let o = obs(vec![0.5, 0.5, 1.5], vec![0.5, 0.5, 1.5]);
        let grid = grid_count(&o, &bins, &CountOptions::default()).unwrap();
        let count = grid.var(COUNT_VARIABLE).unwrap();
        assert_eq!(count.get(0, 0), Some(2.0));
        assert_eq!(count.get(1, 1), Some(1.0));
        assert_eq!(count.get(0, 1), None);
        assert_eq!(count.get(1, 0), None);
    }

    #[test]
    fn test_longitude_wrapping() {
        let bins = Bins::regular((-10.0, 10.0), (0.0, 10.0), 5.0).unwrap();
        // 355 E is -5 E
        let o = obs(vec![355.0, -365.0], vec![1.0, 1.0]);
        let grid = grid_count(&o, &bins, &CountOptions::default()).unwrap();
        assert_eq!(grid.var("count").unwrap().get(1, 0), Some(2.0));
    }

    #[test]
    fn test_wrap_lands_on_first_edge() {
        let bins = Bins::regular((-10.0, 37.0), (30.0, 46.0), 0.125).unwrap();
        // 350 E is -10 E, the first longitude edge
        let o = obs(vec![350.0, 710.0], vec![30.0, 45.9]);
        let grid = grid_count(&o, &bins, &CountOptions::default()).unwrap();
        let count = grid.var(COUNT_VARIABLE).unwrap();
        assert_eq!(count.get(0, 0), Some(1.0));
        assert_eq!(count.get(0, 127), Some(1.0));
        assert_eq!(count.count_valid(), 2);
    }

    #[test]
    fn test_outside_bins_not_counted() {
        let bins = Bins::regular((0.0, 2.0), (0.0, 2.0), 1.0).unwrap();
        // stop edges are excluded, latitude does not wrap
        let o = obs(
            vec![2.0, 0.5, 0.5, 100.0, 1.5],
            vec![0.5, 2.0, -0.1, 0.5, 0.5],
        );
        let grid = grid_count(&o, &bins, &CountOptions::default()).unwrap();
        let count = grid.var(COUNT_VARIABLE).unwrap();
        assert_eq!(count.count_valid(), 1);
        assert_eq!(count.get(1, 0), Some(1.0));
        assert_eq!(count.sum(), 1.0);
    }

    #[test]
    fn test_nan_positions_skipped() {
        let bins = Bins::regular((0.0, 2.0), (0.0, 2.0), 1.0).unwrap();
        let o = obs(
            vec![f64::NAN, 0.5, 0.5, f64::INFINITY],
            vec![0.5, f64::NAN, 0.5, 0.5],
        );
        let grid = grid_count(&o, &bins, &CountOptions::default()).unwrap();
        let count = grid.var(COUNT_VARIABLE).unwrap();
        assert_eq!(count.count_valid(), 1);
        assert_eq!(count.get(0, 0), Some(1.0));
    }

    #[test]
    fn test_all_outside_is_fully_masked() {
        let bins = Bins::regular((0.0, 2.0), (0.0, 2.0), 1.0).unwrap();
        let o = obs(vec![0.5, 1.5], vec![50.0, -50.0]);
        let grid = grid_count(&o, &bins, &CountOptions::default()).unwrap();
        let count = grid.var(COUNT_VARIABLE).unwrap();
        assert_eq!(count.count_valid(), 0);
        assert_eq!(count.min_max(), None);
    }

    #[test]
    fn test_factor_and_name() {
        let bins = Bins::regular((0.0, 1.0), (0.0, 1.0), 0.5).unwrap();
        let o = obs(vec![0.1], vec![0.1]);
        let options = CountOptions {
            factor: Some(0.25),
            name: "density".to_string(),
            ..Default::default()
        };
        let grid = grid_count(&o, &bins, &options).unwrap();
        assert_eq!(grid.var("density").unwrap().get(0, 0), Some(0.25));
        assert!(grid.var("count").is_err());
    }

    #[test]
    fn test_contour_mode_unsupported() {
        let bins = Bins::regular((0.0, 1.0), (0.0, 1.0), 0.5).unwrap();
        let options = CountOptions {
            center: false,
            ..Default::default()
        };
        let err = grid_count(&obs(vec![], vec![]), &bins, &options).unwrap_err();
        assert!(matches!(err, GridError::Unsupported(_)));
    }

    #[test]
    fn test_density_factor() {
        let bins = Bins::regular((0.0, 1.0), (0.0, 1.0), 0.5).unwrap();
        let period = Period::new(0, 3);
        assert_eq!(density_factor(&bins, &period), 1.0);
    }

    #[test]
    fn test_density_of_empty_set() {
        let bins = Bins::regular((0.0, 1.0), (0.0, 1.0), 0.5).unwrap();
        let empty = EddyObservations::empty(Polarity::Anticyclonic);
        assert!(matches!(
            density(&empty, &bins, "count"),
            Err(GridError::EmptyDataset(_))
        ));
    }
}
