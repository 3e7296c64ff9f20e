//! Human-readable statistics of an observation set.

use std::fmt;

use serde::Serialize;

use crate::filters::median;
use crate::observations::{EddyObservations, Period, Polarity};

/// Track lifetime class boundaries in days.
pub const LIFETIME_BINS: [usize; 8] = [1, 30, 90, 180, 270, 365, 1000, 10000];

/// Statistics printed by `eddy-density summary`.
#[derive(Debug, Clone, Serialize)]
pub struct ObservationSummary {
    pub polarity: Polarity,
    pub observations: usize,
    pub period: Period,
    pub nb_tracks: usize,
    pub shortest_track: usize,
    pub longest_track: usize,
    pub filled: usize,
    /// Daily displacement in km (mean, median), last observation of each track excluded.
    pub distance_by_day: (f64, f64),
    /// Total track length in km (mean, median).
    pub distance_by_track: (f64, f64),
    /// Percent of tracks per lifetime class.
    pub pct_tracks_by_lifetime: Vec<f64>,
    /// Percent of observations per lifetime class.
    pub pct_obs_by_lifetime: Vec<f64>,
}

impl EddyObservations {
    /// Summary statistics, `None` for an empty set.
    pub fn summary(&self) -> Option<ObservationSummary> {
        let period = self.period()?;
        let index = self.track_index();
        let lengths: Vec<usize> = index.count.iter().copied().filter(|&c| c != 0).collect();
        let nb_tracks = lengths.len();

        let d_km: Vec<f64> = self.distance_to_next().iter().map(|d| d / 1000.0).collect();
        let mut daily = Vec::with_capacity(self.len());
        let mut by_track = Vec::with_capacity(nb_tracks);
        for (_, first, count) in index.iter() {
            let last = first + count - 1;
            daily.extend_from_slice(&d_km[first..last]);
            by_track.push(d_km[first..last].iter().sum::<f64>());
        }

        let mut tracks_by_class = vec![0.0; LIFETIME_BINS.len() - 1];
        let mut obs_by_class = vec![0.0; LIFETIME_BINS.len() - 1];
        for &n in &lengths {
            if let Some(class) = lifetime_class(n) {
                tracks_by_class[class] += 1.0;
                obs_by_class[class] += n as f64;
            }
        }

        Some(ObservationSummary {
            polarity: self.polarity(),
            observations: self.len(),
            period,
            nb_tracks,
            shortest_track: lengths.iter().copied().min().unwrap_or(0),
            longest_track: lengths.iter().copied().max().unwrap_or(0),
            filled: self.virtual_flags().iter().filter(|&&v| v).count(),
            distance_by_day: (mean(&daily), median(&mut daily)),
            distance_by_track: (mean(&by_track), median(&mut by_track)),
            pct_tracks_by_lifetime: percent(&tracks_by_class),
            pct_obs_by_lifetime: percent(&obs_by_class),
        })
    }
}

/// Histogram class of a lifetime; the last class includes its upper edge.
fn lifetime_class(n: usize) -> Option<usize> {
    let last = LIFETIME_BINS.len() - 1;
    if n < LIFETIME_BINS[0] || n > LIFETIME_BINS[last] {
        return None;
    }
    if n == LIFETIME_BINS[last] {
        return Some(last - 1);
    }
    LIFETIME_BINS.windows(2).position(|w| n >= w[0] && n < w[1])
}

fn percent(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    values
        .iter()
        .map(|v| if total > 0.0 { v / total * 100.0 } else { 0.0 })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn boxed<T: fmt::Display>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| format!("{:^10}", v))
        .collect::<Vec<_>>()
        .join("|")
}

impl fmt::Display for ObservationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let per_track = self.observations as f64 / self.nb_tracks.max(1) as f64;
        writeln!(f, "    | {} eddies, {}", self.polarity, self.period)?;
        writeln!(
            f,
            "    | {} observations, {} tracks ({:.2} obs/tracks, shorter {} obs, longer {} obs)",
            self.observations, self.nb_tracks, per_track, self.shortest_track, self.longest_track
        )?;
        writeln!(
            f,
            "    |   {} filled observations ({:.2} obs/tracks, {:.2} % of total)",
            self.filled,
            self.filled as f64 / self.nb_tracks.max(1) as f64,
            self.filled as f64 / self.observations.max(1) as f64 * 100.0
        )?;
        writeln!(
            f,
            "    |   Distance by day             : Mean {:.2} , Median {:.2} km/day",
            self.distance_by_day.0, self.distance_by_day.1
        )?;
        writeln!(
            f,
            "    |   Distance by track           : Mean {:.2} , Median {:.2} km/track",
            self.distance_by_track.0, self.distance_by_track.1
        )?;
        writeln!(f, "    ----Distribution in lifetime:")?;
        writeln!(f, "    |   Lifetime (days  )      {}", boxed(LIFETIME_BINS))?;
        writeln!(
            f,
            "    |   Percent of tracks         : {}",
            boxed(self.pct_tracks_by_lifetime.iter().map(|v| format!("{:.2}", v)))
        )?;
        write!(
            f,
            "    |   Percent of eddies         : {}",
            boxed(self.pct_obs_by_lifetime.iter().map(|v| format!("{:.2}", v)))
        )
    }
}
