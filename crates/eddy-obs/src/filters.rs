//! Along-track smoothing and gap filling.

use tracing::info;

use crate::error::{ObsError, ObsResult};
use crate::geo::unwrap_longitude;
use crate::observations::{EddyObservations, LATITUDE, LONGITUDE, TIME};

impl EddyObservations {
    /// Replace the values of every floating point column at the observations
    /// flagged in `mask` by linear interpolation between unmasked neighbours
    /// of the same track.
    ///
    /// Masked observations before the first (after the last) unmasked one of
    /// a track take its value; a track with no unmasked observation is left
    /// untouched. Longitudes are first unwrapped around the first unmasked
    /// position of each track so a track crossing the dateline interpolates
    /// the short way.
    pub fn filled_by_interpolation(&mut self, mask: &[bool]) -> ObsResult<()> {
        if mask.len() != self.len() {
            return Err(ObsError::length_mismatch("mask", self.len(), mask.len()));
        }
        let nb_filled = mask.iter().filter(|&&m| m).count();
        info!(filled = nb_filled, "Observations will be filled (unobserved)");
        if nb_filled == 0 {
            return Ok(());
        }

        let spans: Vec<(usize, usize)> = self
            .track_index()
            .iter()
            .map(|(_, first, count)| (first, first + count))
            .collect();

        if let Some(lon) = self.column_mut(LONGITUDE) {
            for &(start, stop) in &spans {
                let Some(reference) = (start..stop).find(|&i| !mask[i]).map(|i| lon[i]) else {
                    continue;
                };
                for l in &mut lon[start..stop] {
                    *l = unwrap_longitude(*l, reference);
                }
            }
        }

        for name in self.column_names() {
            if let Some(values) = self.column_mut(&name) {
                for &(start, stop) in &spans {
                    interpolate_masked(&mut values[start..stop], &mask[start..stop]);
                }
            }
        }
        Ok(())
    }

    /// Running median of `field` over a time window of `half_window` days on
    /// each side, restricted to the observation's own track.
    pub fn median_filter(&mut self, half_window: f64, field: &str) -> ObsResult<()> {
        let smoothed = {
            let y = self.column(field).ok_or_else(|| missing(field))?;
            track_median_filter(half_window, self.time(), y, self.tracks())
        };
        self.replace_column(field, smoothed)
    }

    /// Tricube-weighted (loess) smoothing of `field` over `half_window` days,
    /// restricted to the observation's own track.
    pub fn loess_filter(&mut self, half_window: f64, field: &str) -> ObsResult<()> {
        let smoothed = {
            let y = self.column(field).ok_or_else(|| missing(field))?;
            track_loess_filter(half_window, self.time(), y, self.tracks())
        };
        self.replace_column(field, smoothed)
    }

    /// Median then loess smoothing of both position columns.
    pub fn position_filter(&mut self, median_half_window: f64, loess_half_window: f64) -> ObsResult<()> {
        for field in [LONGITUDE, LATITUDE] {
            self.median_filter(median_half_window, field)?;
            self.loess_filter(loess_half_window, field)?;
        }
        Ok(())
    }

    fn replace_column(&mut self, field: &str, values: Vec<f64>) -> ObsResult<()> {
        if field == TIME {
            return Err(ObsError::InvalidArgument(
                "time is the filter abscissa and cannot be smoothed".to_string(),
            ));
        }
        let column = self.column_mut(field).ok_or_else(|| missing(field))?;
        column.copy_from_slice(&values);
        Ok(())
    }
}

fn missing(field: &str) -> ObsError {
    ObsError::MissingData(format!("column {}", field))
}

/// Linear interpolation over the index axis; ends are held constant.
fn interpolate_masked(values: &mut [f64], mask: &[bool]) {
    let known: Vec<usize> = (0..values.len()).filter(|&i| !mask[i]).collect();
    let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
        return;
    };
    let mut k = 0;
    for i in 0..values.len() {
        if !mask[i] {
            continue;
        }
        if i < first {
            values[i] = values[first];
            continue;
        }
        if i > last {
            values[i] = values[last];
            continue;
        }
        while known[k + 1] < i {
            k += 1;
        }
        let (i0, i1) = (known[k], known[k + 1]);
        let w = (i - i0) as f64 / (i1 - i0) as f64;
        values[i] = values[i0] + (values[i1] - values[i0]) * w;
    }
}

/// Median of `y` within `half_window` of each `x`, per track.
///
/// `x` must be increasing inside each track, possibly irregularly.
pub fn track_median_filter(half_window: f64, x: &[f64], y: &[f64], track: &[u32]) -> Vec<f64> {
    let nb = y.len();
    let mut smoothed = Vec::with_capacity(nb);
    let mut previous = 0;
    let mut next = 0;
    let mut window = Vec::new();
    for i in 0..nb {
        while x[i] - x[previous] > half_window || track[i] != track[previous] {
            previous += 1;
        }
        next = next.max(i);
        while next < nb && x[next] - x[i] <= half_window && track[next] == track[i] {
            next += 1;
        }
        window.clear();
        window.extend_from_slice(&y[previous..next]);
        smoothed.push(median(&mut window));
    }
    smoothed
}

/// Loess smoothing with tricube weights `(1 - (dx / half_window)^3)^3`, per track.
pub fn track_loess_filter(half_window: f64, x: &[f64], y: &[f64], track: &[u32]) -> Vec<f64> {
    let nb = y.len();
    let weight = |dx: f64| (1.0 - (dx / half_window).powi(3)).powi(3);
    (0..nb)
        .map(|i| {
            let mut y_sum = y[i];
            let mut w_sum = 1.0;
            let before = (0..i)
                .rev()
                .take_while(|&j| track[j] == track[i] && x[i] - x[j] < half_window);
            let after = (i + 1..nb)
                .take_while(|&j| track[j] == track[i] && x[j] - x[i] < half_window);
            for j in before.chain(after) {
                let w = weight((x[i] - x[j]).abs());
                y_sum += y[j] * w;
                w_sum += w;
            }
            y_sum / w_sum
        })
        .collect()
}

pub(crate) fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::Polarity;

    #[test]
    fn test_interpolate_masked() {
        let mut values = vec![0.0, 99.0, 99.0, 3.0, 99.0];
        interpolate_masked(&mut values, &[false, true, true, false, true]);
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), 2.5);
        assert!(median(&mut []).is_nan());
    }

    #[test]
    fn test_median_filter_removes_spike() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 1.0, 50.0, 1.0, 1.0];
        let track = [1, 1, 1, 1, 1];
        let smoothed = track_median_filter(1.0, &x, &y, &track);
        assert_eq!(smoothed[2], 1.0);
    }

    #[test]
    fn test_median_filter_respects_tracks() {
        let x = [0.0, 1.0, 0.0, 1.0];
        let y = [1.0, 1.0, 10.0, 10.0];
        let track = [1, 1, 2, 2];
        let smoothed = track_median_filter(5.0, &x, &y, &track);
        assert_eq!(smoothed, vec![1.0, 1.0, 10.0, 10.0]);
    }

    #[test]
    fn test_loess_constant_is_unchanged() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [2.0; 4];
        let track = [7; 4];
        let smoothed = track_loess_filter(3.0, &x, &y, &track);
        for v in smoothed {
            assert!((v - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_loess_smooths_toward_neighbours() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 3.0, 0.0];
        let track = [1, 1, 1];
        let smoothed = track_loess_filter(2.0, &x, &y, &track);
        assert!(smoothed[1] < 3.0);
        assert!(smoothed[1] > 0.0);
    }

    #[test]
    fn test_filled_by_interpolation_unwraps_longitude() {
        let mut obs = EddyObservations::new(
            Polarity::Anticyclonic,
            vec![179.0, 0.0, -179.0],
            vec![10.0, 0.0, 12.0],
            vec![1.0, 2.0, 3.0],
            vec![1, 1, 1],
        )
        .unwrap();
        obs.filled_by_interpolation(&[false, true, false]).unwrap();
        assert!((obs.longitude()[1] - 180.0).abs() < 1e-9);
        assert!((obs.latitude()[1] - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_filled_by_interpolation_stays_within_tracks() {
        let mut obs = EddyObservations::new(
            Polarity::Cyclonic,
            vec![5.0; 8],
            vec![0.0, 1.0, 99.0, 99.0, 11.0, 12.0, 99.0, 99.0],
            vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0],
            vec![1, 1, 1, 2, 2, 2, 3, 3],
        )
        .unwrap();
        // gap at the end of track 1, at the start of track 2, all of track 3
        let mask = [false, false, true, true, false, false, true, true];
        obs.filled_by_interpolation(&mask).unwrap();
        assert_eq!(obs.latitude(), &[0.0, 1.0, 1.0, 11.0, 11.0, 12.0, 99.0, 99.0]);
    }

    #[test]
    fn test_filled_by_interpolation_inner_gap_per_track() {
        let mut obs = EddyObservations::new(
            Polarity::Cyclonic,
            vec![10.0, 0.0, 14.0, -170.0, 0.0, 170.0],
            vec![0.0, 0.0, 4.0, 0.0, 0.0, 0.0],
            vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0],
            vec![4, 4, 4, 9, 9, 9],
        )
        .unwrap();
        obs.filled_by_interpolation(&[false, true, false, false, true, false])
            .unwrap();
        assert!((obs.latitude()[1] - 2.0).abs() < 1e-9);
        assert!((obs.longitude()[1] - 12.0).abs() < 1e-9);
        // -170 -> 170 crosses the dateline: unwrapped to -190
        assert!((obs.longitude()[5] + 190.0).abs() < 1e-9);
        assert!((obs.longitude()[4] + 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_filled_by_interpolation_masked_track_start_is_not_reference() {
        let mut obs = EddyObservations::new(
            Polarity::Anticyclonic,
            vec![-60.0, 179.0, -179.0],
            vec![0.0, 0.0, 0.0],
            vec![1.0, 2.0, 3.0],
            vec![1, 1, 1],
        )
        .unwrap();
        obs.filled_by_interpolation(&[true, false, false]).unwrap();
        assert!((obs.longitude()[0] - 179.0).abs() < 1e-9);
        assert!((obs.longitude()[2] - 181.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_filter_removes_spike() {
        let mut obs = EddyObservations::new(
            Polarity::Anticyclonic,
            vec![10.0, 10.0, 30.0, 10.0, 10.0, 50.0, 50.0, 50.0],
            vec![20.0, 20.0, -5.0, 20.0, 20.0, 40.0, 40.0, 40.0],
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 0.0, 1.0, 2.0],
            vec![1, 1, 1, 1, 1, 2, 2, 2],
        )
        .unwrap();
        obs.position_filter(1.0, 2.0).unwrap();
        for i in 0..5 {
            assert!((obs.longitude()[i] - 10.0).abs() < 1e-9, "lon {}", i);
            assert!((obs.latitude()[i] - 20.0).abs() < 1e-9, "lat {}", i);
        }
        for i in 5..8 {
            assert!((obs.longitude()[i] - 50.0).abs() < 1e-9);
            assert!((obs.latitude()[i] - 40.0).abs() < 1e-9);
        }
        assert_eq!(obs.time(), &[0.0, 1.0, 2.0, 3.0, 4.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_time_cannot_be_smoothed() {
        let mut obs = EddyObservations::new(
            Polarity::Cyclonic,
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![1, 1],
        )
        .unwrap();
        assert!(obs.median_filter(1.0, TIME).is_err());
        assert!(obs.loess_filter(1.0, "missing").is_err());
    }
}
