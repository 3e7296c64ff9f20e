//! Column store for a set of eddy observations.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ObsError, ObsResult};

/// Names of the position/time columns, usable with [`EddyObservations::column`].
pub const LONGITUDE: &str = "longitude";
pub const LATITUDE: &str = "latitude";
pub const TIME: &str = "time";

/// Rotation sense of an eddy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Anticyclonic,
    Cyclonic,
}

impl Polarity {
    /// Sign convention used by tracking products: +1 anticyclonic, -1 cyclonic.
    pub fn sign(&self) -> i8 {
        match self {
            Self::Anticyclonic => 1,
            Self::Cyclonic => -1,
        }
    }

    pub fn from_sign(sign: i8) -> Self {
        if sign < 0 {
            Self::Cyclonic
        } else {
            Self::Anticyclonic
        }
    }

    /// Value stored in the `title` global attribute.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Anticyclonic => "Anticyclonic",
            Self::Cyclonic => "Cyclonic",
        }
    }

    /// Parse a dataset title such as "Anticyclonic" or "Cyclonic eddies".
    pub fn from_title(title: &str) -> Option<Self> {
        let lower = title.to_lowercase();
        // "anticyclonic" contains "cyclonic", check it first
        if lower.contains("anticyclonic") {
            Some(Self::Anticyclonic)
        } else if lower.contains("cyclonic") {
            Some(Self::Cyclonic)
        } else {
            None
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Reference date for observation times (days since 1950-01-01).
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1950, 1, 1).unwrap_or_default()
}

/// Convert a day offset from the 1950 epoch into a calendar date.
pub fn day_to_date(day: i64) -> NaiveDate {
    epoch() + Duration::days(day)
}

/// Inclusive range of days covered by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub first_day: i64,
    pub last_day: i64,
}

impl Period {
    pub fn new(first_day: i64, last_day: i64) -> Self {
        Self {
            first_day,
            last_day,
        }
    }

    /// Number of days covered, both ends included.
    pub fn span_days(&self) -> i64 {
        self.last_day - self.first_day + 1
    }

    pub fn start_date(&self) -> NaiveDate {
        day_to_date(self.first_day)
    }

    pub fn end_date(&self) -> NaiveDate {
        day_to_date(self.last_day)
    }

    /// ISO 8601 duration, e.g. `P9862D`.
    pub fn iso_duration(&self) -> String {
        format!("P{}D", self.span_days())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} days)",
            self.start_date(),
            self.end_date(),
            self.span_days()
        )
    }
}

/// An ordered set of eddy observations.
///
/// Observations are expected to be grouped by track and ordered by time
/// inside each track, which is how tracking products are written. Every
/// column has one value per observation.
#[derive(Debug, Clone, PartialEq)]
pub struct EddyObservations {
    polarity: Polarity,
    longitude: Vec<f64>,
    latitude: Vec<f64>,
    time: Vec<f64>,
    track: Vec<u32>,
    n: Vec<u16>,
    virtual_flag: Vec<bool>,
    fields: BTreeMap<String, Vec<f64>>,
}

impl EddyObservations {
    /// Build an observation set from its mandatory columns.
    ///
    /// Observation numbers are derived from the track column (reset to 0 each
    /// time the track id changes) and no observation is flagged virtual.
    ///
    /// A track whose observations are split by another track is rejected with
    /// [`ObsError::InvalidFormat`].
    pub fn new(
        polarity: Polarity,
        longitude: Vec<f64>,
        latitude: Vec<f64>,
        time: Vec<f64>,
        track: Vec<u32>,
    ) -> ObsResult<Self> {
        let len = longitude.len();
        check_len(LATITUDE, len, latitude.len())?;
        check_len(TIME, len, time.len())?;
        check_len("track", len, track.len())?;
        check_contiguous(&track)?;

        let n = observation_numbers(&track);
        Ok(Self {
            polarity,
            longitude,
            latitude,
            time,
            track,
            n,
            virtual_flag: vec![false; len],
            fields: BTreeMap::new(),
        })
    }

    /// An observation set without any observation.
    pub fn empty(polarity: Polarity) -> Self {
        Self {
            polarity,
            longitude: Vec::new(),
            latitude: Vec::new(),
            time: Vec::new(),
            track: Vec::new(),
            n: Vec::new(),
            virtual_flag: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Replace the derived observation numbers with stored ones.
    pub fn with_observation_numbers(mut self, n: Vec<u16>) -> ObsResult<Self> {
        check_len("observation_number", self.len(), n.len())?;
        self.n = n;
        Ok(self)
    }

    pub fn with_virtual_flags(mut self, flags: Vec<bool>) -> ObsResult<Self> {
        check_len("observation_flag", self.len(), flags.len())?;
        self.virtual_flag = flags;
        Ok(self)
    }

    /// Attach an extra scalar column (amplitude, radius, ...).
    pub fn with_field(mut self, name: impl Into<String>, values: Vec<f64>) -> ObsResult<Self> {
        let name = name.into();
        check_len(&name, self.len(), values.len())?;
        self.fields.insert(name, values);
        Ok(self)
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn len(&self) -> usize {
        self.longitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.longitude.is_empty()
    }

    pub fn longitude(&self) -> &[f64] {
        &self.longitude
    }

    pub fn latitude(&self) -> &[f64] {
        &self.latitude
    }

    /// Observation times in days since 1950-01-01.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn tracks(&self) -> &[u32] {
        &self.track
    }

    pub fn observation_numbers(&self) -> &[u16] {
        &self.n
    }

    pub fn virtual_flags(&self) -> &[bool] {
        &self.virtual_flag
    }

    pub fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Any floating point column, position and time included.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        match name {
            LONGITUDE => Some(&self.longitude),
            LATITUDE => Some(&self.latitude),
            TIME => Some(&self.time),
            other => self.field(other),
        }
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        match name {
            LONGITUDE => Some(&mut self.longitude),
            LATITUDE => Some(&mut self.latitude),
            TIME => Some(&mut self.time),
            other => self.fields.get_mut(other).map(Vec::as_mut_slice),
        }
    }

    /// Names of every floating point column, position and time first.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![LONGITUDE.to_string(), LATITUDE.to_string(), TIME.to_string()];
        names.extend(self.fields.keys().cloned());
        names
    }

    /// First and last observed day, `None` for an empty set.
    pub fn period(&self) -> Option<Period> {
        let (min, max) = self
            .time
            .iter()
            .filter(|t| t.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &t| {
                (min.min(t), max.max(t))
            });
        if min > max {
            return None;
        }
        Some(Period::new(min.floor() as i64, max.floor() as i64))
    }

    /// Keep the observations where `mask` is true, preserving order.
    pub(crate) fn select(&self, mask: &[bool]) -> ObsResult<Self> {
        check_len("mask", self.len(), mask.len())?;
        Ok(Self {
            polarity: self.polarity,
            longitude: pick(&self.longitude, mask),
            latitude: pick(&self.latitude, mask),
            time: pick(&self.time, mask),
            track: pick(&self.track, mask),
            n: pick(&self.n, mask),
            virtual_flag: pick(&self.virtual_flag, mask),
            fields: self
                .fields
                .iter()
                .map(|(name, values)| (name.clone(), pick(values, mask)))
                .collect(),
        })
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut [u32] {
        &mut self.track
    }
}

fn check_len(column: &str, expected: usize, actual: usize) -> ObsResult<()> {
    if expected != actual {
        return Err(ObsError::length_mismatch(column, expected, actual));
    }
    Ok(())
}

/// Each track id must form a single run.
fn check_contiguous(track: &[u32]) -> ObsResult<()> {
    let mut closed = HashSet::new();
    for (i, pair) in track.windows(2).enumerate() {
        let (previous, current) = (pair[0], pair[1]);
        if previous == current {
            continue;
        }
        closed.insert(previous);
        if closed.contains(&current) {
            return Err(ObsError::InvalidFormat(format!(
                "observations of track {} are not contiguous (index {})",
                current,
                i + 1
            )));
        }
    }
    Ok(())
}

fn pick<T: Copy>(values: &[T], mask: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(mask)
        .filter_map(|(&v, &keep)| keep.then_some(v))
        .collect()
}

/// Position of each observation inside its track.
fn observation_numbers(track: &[u32]) -> Vec<u16> {
    let mut n = Vec::with_capacity(track.len());
    let mut previous = None;
    let mut current: u16 = 0;
    for &t in track {
        if previous == Some(t) {
            current = current.saturating_add(1);
        } else {
            current = 0;
        }
        n.push(current);
        previous = Some(t);
    }
    n
}
