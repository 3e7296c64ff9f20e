//! Track indexing and track-aware extraction.
//!
//! All operations assume observations of a track are contiguous, which is
//! how tracking products store them. A track id may be absent from the set;
//! ids are used directly as indices into the [`TrackIndex`] tables.

use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::error::{ObsError, ObsResult};
use crate::geo::{distance, unwrap_longitude};
use crate::observations::EddyObservations;

/// Position and size of every track in an observation set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackIndex {
    /// First observation index per track id, `None` when the id is absent.
    pub first: Vec<Option<usize>>,
    /// Number of observations per track id.
    pub count: Vec<usize>,
}

impl TrackIndex {
    pub fn build(tracks: &[u32]) -> Self {
        let size = tracks.iter().max().map(|&m| m as usize + 1).unwrap_or(0);
        let mut first = vec![None; size];
        let mut count = vec![0usize; size];
        let mut previous = None;
        for (i, &track) in tracks.iter().enumerate() {
            let t = track as usize;
            if previous != Some(track) {
                first[t] = Some(i);
            }
            count[t] += 1;
            previous = Some(track);
        }
        Self { first, count }
    }

    /// Iterate over present tracks as `(track_id, first_index, count)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, usize, usize)> + '_ {
        self.first
            .iter()
            .zip(&self.count)
            .enumerate()
            .filter_map(|(id, (first, &count))| first.map(|f| (id as u32, f, count)))
    }

    /// Index of the last observation of a present track.
    pub fn last(&self, track: u32) -> Option<usize> {
        let t = track as usize;
        let first = (*self.first.get(t)?)?;
        Some(first + self.count[t] - 1)
    }
}

/// Options for [`EddyObservations::extract_with_mask`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Extend the selection to every observation of any touched track.
    pub full_path: bool,
    /// Drop tracks which are only partly selected.
    pub remove_incomplete: bool,
    /// Renumber track ids to 1..=k after extraction.
    pub compress_id: bool,
    /// With `full_path`, ignore selected observations which are virtual.
    pub reject_virtual: bool,
}

/// Cardinal direction of a track's net displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl FromStr for Direction {
    type Err = ObsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "N" | "NORTH" => Ok(Self::North),
            "S" | "SOUTH" => Ok(Self::South),
            "E" | "EAST" => Ok(Self::East),
            "W" | "WEST" => Ok(Self::West),
            other => Err(ObsError::InvalidArgument(format!(
                "unknown direction '{}'",
                other
            ))),
        }
    }
}

impl EddyObservations {
    pub fn track_index(&self) -> TrackIndex {
        TrackIndex::build(self.tracks())
    }

    /// Number of tracks with at least one observation.
    pub fn nb_tracks(&self) -> usize {
        self.track_index().count.iter().filter(|&&c| c != 0).count()
    }

    /// Length of the track each observation belongs to.
    pub fn nb_obs_per_observation(&self) -> Vec<usize> {
        let index = self.track_index();
        self.tracks()
            .iter()
            .map(|&t| index.count[t as usize])
            .collect()
    }

    /// Distance in meters to the next observation, 0 when the next
    /// observation belongs to another track (and for the last one).
    pub fn distance_to_next(&self) -> Vec<f64> {
        let lon = self.longitude();
        let lat = self.latitude();
        let tracks = self.tracks();
        let mut d = vec![0.0; self.len()];
        for i in 1..self.len() {
            if tracks[i] == tracks[i - 1] {
                d[i - 1] = distance(lon[i - 1], lat[i - 1], lon[i], lat[i]);
            }
        }
        d
    }

    /// Mask selecting every observation of the given track ids.
    pub fn mask_from_ids(&self, ids: &[u32]) -> Vec<bool> {
        let index = self.track_index();
        let mut mask = vec![false; self.len()];
        for &id in ids {
            let t = id as usize;
            if let Some(Some(first)) = index.first.get(t) {
                mask[*first..*first + index.count[t]]
                    .iter_mut()
                    .for_each(|m| *m = true);
            }
        }
        mask
    }

    /// Extract a subset of observations.
    pub fn extract_with_mask(&self, mask: &[bool], options: ExtractOptions) -> ObsResult<Self> {
        if mask.len() != self.len() {
            return Err(ObsError::length_mismatch("mask", self.len(), mask.len()));
        }
        if options.full_path && options.remove_incomplete {
            warn!("Incompatible options full_path and remove_incomplete, remove_incomplete ignored");
        }

        let mask: Vec<bool> = if options.full_path {
            let selected = self
                .tracks()
                .iter()
                .zip(mask)
                .zip(self.virtual_flags())
                .filter(|&((_, &m), &v)| m && !(options.reject_virtual && v))
                .map(|((&t, _), _)| t);
            let ids: Vec<u32> = unique(selected);
            self.mask_from_ids(&ids)
        } else if options.remove_incomplete {
            let rejected = self
                .tracks()
                .iter()
                .zip(mask)
                .filter(|&(_, &m)| !m)
                .map(|(&t, _)| t);
            let ids: Vec<u32> = unique(rejected);
            self.mask_from_ids(&ids).into_iter().map(|m| !m).collect()
        } else {
            mask.to_vec()
        };

        let mut extracted = self.select(&mask)?;
        if extracted.is_empty() {
            warn!("Empty dataset will be created");
        } else if options.compress_id {
            extracted.compress_track_ids();
        }
        debug!(
            selected = extracted.len(),
            total = self.len(),
            "Extracted observations"
        );
        Ok(extracted)
    }

    /// Every observation of the listed tracks.
    pub fn extract_ids(&self, ids: &[u32]) -> ObsResult<Self> {
        let mask = self.mask_from_ids(ids);
        self.extract_with_mask(&mask, ExtractOptions::default())
    }

    /// Tracks whose length lies within `(min, max)`; `-1` disables a bound.
    pub fn extract_with_length(&self, bounds: (i64, i64)) -> ObsResult<Self> {
        if self.is_empty() {
            return Ok(Self::empty(self.polarity()));
        }
        let (b0, b1) = bounds;
        let keep = |n: usize| -> ObsResult<bool> {
            let n = n as i64;
            match (b0, b1) {
                (b0, b1) if b0 >= 0 && b1 != -1 => Ok(n >= b0 && n <= b1),
                (-1, b1) if b1 >= 0 => Ok(n <= b1),
                (b0, -1) if b0 >= 0 => Ok(n >= b0),
                _ => Err(ObsError::InvalidArgument(format!(
                    "no valid bound in {:?}, one bound must be positive",
                    bounds
                ))),
            }
        };
        let index = self.track_index();
        let track_mask = index
            .count
            .iter()
            .map(|&c| keep(c))
            .collect::<ObsResult<Vec<bool>>>()?;
        let mask: Vec<bool> = self
            .tracks()
            .iter()
            .map(|&t| track_mask[t as usize])
            .collect();
        self.extract_with_mask(&mask, ExtractOptions::default())
    }

    /// Observations within a period.
    ///
    /// Positive bounds are absolute days since 1950-01-01, negative bounds are
    /// relative to the dataset's own first/last day, zero leaves the side open.
    pub fn extract_with_period(
        &self,
        period: (i64, i64),
        options: ExtractOptions,
    ) -> ObsResult<Self> {
        let Some(dataset_period) = self.period() else {
            return Ok(Self::empty(self.polarity()));
        };
        let (p_min, p_max) = period;
        let lower = match p_min {
            p if p > 0 => Some(p as f64),
            p if p < 0 => Some((dataset_period.first_day - p) as f64),
            _ => None,
        };
        let upper = match p_max {
            p if p > 0 => Some(p as f64),
            p if p < 0 => Some((dataset_period.last_day + p) as f64),
            _ => None,
        };
        let mask: Vec<bool> = self
            .time()
            .iter()
            .map(|&t| lower.map_or(true, |l| t >= l) && upper.map_or(true, |u| t <= u))
            .collect();
        self.extract_with_mask(&mask, options)
    }

    /// Tracks moving west (or east) between their first and last observation.
    ///
    /// `delta_lon` is compared signed: a track is kept only when its net
    /// longitude change exceeds it. Westward tracks have a negative change,
    /// so `Some(-1.0)` keeps westward tracks that moved less than one degree
    /// and a positive value rejects every westward track.
    pub fn extract_toward_direction(&self, west: bool, delta_lon: Option<f64>) -> ObsResult<Self> {
        let lon = self.longitude();
        let index = self.track_index();
        let mut track_mask = vec![false; index.count.len()];
        for (id, first, count) in index.iter() {
            let d_lon = lon[first + count - 1] - lon[first];
            let mut keep = if west { d_lon < 0.0 } else { d_lon > 0.0 };
            if let Some(delta) = delta_lon {
                keep &= delta < d_lon;
            }
            track_mask[id as usize] = keep;
        }
        let mask = self.expand_track_mask(&track_mask);
        self.extract_with_mask(&mask, ExtractOptions::default())
    }

    /// Tracks whose net displacement goes toward `direction` by more than
    /// `min_delta` degrees. Longitudes are unwrapped around the start position.
    pub fn extract_in_direction(&self, direction: Direction, min_delta: f64) -> ObsResult<Self> {
        let lon = self.longitude();
        let lat = self.latitude();
        let index = self.track_index();
        let mut track_mask = vec![false; index.count.len()];
        for (id, start, count) in index.iter() {
            let stop = start + count - 1;
            let keep = match direction {
                Direction::North | Direction::South => {
                    let d_lat = lat[stop] - lat[start];
                    let toward = if direction == Direction::South {
                        d_lat < 0.0
                    } else {
                        d_lat > 0.0
                    };
                    toward && d_lat.abs() > min_delta
                }
                Direction::East | Direction::West => {
                    let lon_end = unwrap_longitude(lon[stop], lon[start]);
                    let d_lon = lon_end - lon[start];
                    let toward = if direction == Direction::West {
                        d_lon < 0.0
                    } else {
                        d_lon > 0.0
                    };
                    toward && d_lon.abs() > min_delta
                }
            };
            track_mask[id as usize] = keep;
        }
        let mask = self.expand_track_mask(&track_mask);
        self.extract_with_mask(&mask, ExtractOptions::default())
    }

    /// First observation of each track in every `res` x `res` degree box.
    pub fn extract_first_obs_in_box(&self, res: f64) -> ObsResult<Self> {
        if res <= 0.0 {
            return Err(ObsError::InvalidArgument(format!(
                "box resolution must be > 0, got {}",
                res
            )));
        }
        let mut seen = HashSet::new();
        let mask: Vec<bool> = self
            .longitude()
            .iter()
            .zip(self.latitude())
            .zip(self.tracks())
            .map(|((&lon, &lat), &track)| {
                let key = (
                    (lon / res).floor() as i64,
                    (lat / res).floor() as i64,
                    track,
                );
                seen.insert(key)
            })
            .collect();
        self.extract_with_mask(&mask, ExtractOptions::default())
    }

    /// Observations belonging to tracks of at least `nb_min` observations.
    pub fn extract_longer_eddies(&self, nb_min: usize, compress_id: bool) -> ObsResult<Self> {
        let mask: Vec<bool> = self
            .nb_obs_per_observation()
            .into_iter()
            .map(|n| n >= nb_min)
            .collect();
        info!(
            selected = mask.iter().filter(|&&m| m).count(),
            "Selection of longer eddies"
        );
        self.extract_with_mask(
            &mask,
            ExtractOptions {
                compress_id,
                ..Default::default()
            },
        )
    }

    /// Renumber track ids to a dense 1..=k range, keeping their order.
    pub fn compress_track_ids(&mut self) {
        let ids: Vec<u32> = unique(self.tracks().iter().copied());
        let Some(&max) = ids.last() else {
            return;
        };
        let mut translate = vec![0u32; max as usize + 1];
        for (rank, &id) in ids.iter().enumerate() {
            translate[id as usize] = rank as u32 + 1;
        }
        for t in self.tracks_mut() {
            *t = translate[*t as usize];
        }
    }

    fn expand_track_mask(&self, track_mask: &[bool]) -> Vec<bool> {
        self.tracks()
            .iter()
            .map(|&t| track_mask.get(t as usize).copied().unwrap_or(false))
            .collect()
    }
}

/// Sorted unique values.
fn unique(values: impl Iterator<Item = u32>) -> Vec<u32> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}
