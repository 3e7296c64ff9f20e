//! Synthetic eddy observation generators.
//!
//! Tracks are deterministic for a given seed so tests can assert exact
//! counts without shipping sample files.

use eddy_obs::{EddyObservations, Polarity};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// First day of generated tracks (2013-01-01, days since 1950-01-01).
pub const FIRST_DAY: f64 = 23011.0;

/// Creates `nb_tracks` daily tracks of `track_len` observations each.
///
/// Tracks start inside the example domain (-100..90 E, 15..45 N) and drift
/// westward by about 0.1 degree per day. Track ids are 0..nb_tracks and
/// observations of a track are contiguous and time ordered.
///
/// # Example
///
/// ```
/// use eddy_obs::Polarity;
/// use test_utils::synthetic_tracks;
///
/// let obs = synthetic_tracks(Polarity::Cyclonic, 3, 5, 1);
/// assert_eq!(obs.len(), 15);
/// assert_eq!(obs.nb_tracks(), 3);
/// ```
pub fn synthetic_tracks(
    polarity: Polarity,
    nb_tracks: usize,
    track_len: usize,
    seed: u64,
) -> EddyObservations {
    let mut rng = StdRng::seed_from_u64(seed);
    let total = nb_tracks * track_len;
    let mut longitude = Vec::with_capacity(total);
    let mut latitude = Vec::with_capacity(total);
    let mut time = Vec::with_capacity(total);
    let mut track = Vec::with_capacity(total);

    for id in 0..nb_tracks {
        let lon0: f64 = rng.gen_range(-90.0..80.0);
        let lat0: f64 = rng.gen_range(18.0..42.0);
        let day0 = FIRST_DAY + rng.gen_range(0..300) as f64;
        for step in 0..track_len {
            longitude.push(lon0 - 0.1 * step as f64);
            latitude.push(lat0 + rng.gen_range(-0.01..0.01));
            time.push(day0 + step as f64);
            track.push(id as u32);
        }
    }

    EddyObservations::new(polarity, longitude, latitude, time, track)
        .expect("generated columns have equal lengths")
}

/// Creates `count` single-observation tracks all located at (`lon`, `lat`)
/// on consecutive days starting at [`FIRST_DAY`].
///
/// Useful to place an exact number of eddies in a known cell.
pub fn eddies_at(polarity: Polarity, lon: f64, lat: f64, count: usize) -> EddyObservations {
    EddyObservations::new(
        polarity,
        vec![lon; count],
        vec![lat; count],
        (0..count).map(|i| FIRST_DAY + i as f64).collect(),
        (0..count as u32).collect(),
    )
    .expect("generated columns have equal lengths")
}

/// Concatenates observation sets of the same polarity, offsetting track ids
/// so they stay unique.
pub fn concat(parts: &[EddyObservations]) -> EddyObservations {
    let polarity = parts
        .first()
        .map(EddyObservations::polarity)
        .unwrap_or(Polarity::Anticyclonic);
    let mut longitude = Vec::new();
    let mut latitude = Vec::new();
    let mut time = Vec::new();
    let mut track = Vec::new();
    let mut offset = 0u32;
    for part in parts {
        longitude.extend_from_slice(part.longitude());
        latitude.extend_from_slice(part.latitude());
        time.extend_from_slice(part.time());
        track.extend(part.tracks().iter().map(|t| t + offset));
        offset += part.tracks().iter().max().map_or(0, |m| m + 1);
    }
    EddyObservations::new(polarity, longitude, latitude, time, track)
        .expect("concatenated columns have equal lengths")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_tracks_are_reproducible() {
        let a = synthetic_tracks(Polarity::Anticyclonic, 5, 10, 7);
        let b = synthetic_tracks(Polarity::Anticyclonic, 5, 10, 7);
        assert_eq!(a.longitude(), b.longitude());
        assert_eq!(a.time(), b.time());
    }

    #[test]
    fn test_synthetic_tracks_stay_in_domain() {
        let obs = synthetic_tracks(Polarity::Cyclonic, 20, 30, 3);
        assert!(obs.longitude().iter().all(|&l| (-100.0..90.0).contains(&l)));
        assert!(obs.latitude().iter().all(|&l| (15.0..45.0).contains(&l)));
        assert_eq!(obs.observation_numbers()[29], 29);
        assert_eq!(obs.observation_numbers()[30], 0);
    }

    #[test]
    fn test_eddies_at() {
        let obs = eddies_at(Polarity::Cyclonic, 10.0, 30.0, 4);
        assert_eq!(obs.len(), 4);
        assert_eq!(obs.nb_tracks(), 4);
        assert_eq!(obs.period().map(|p| p.span_days()), Some(4));
    }

    #[test]
    fn test_concat_offsets_tracks() {
        let a = eddies_at(Polarity::Cyclonic, 0.0, 20.0, 2);
        let b = eddies_at(Polarity::Cyclonic, 5.0, 20.0, 2);
        let all = concat(&[a, b]);
        assert_eq!(all.tracks(), &[0, 1, 2, 3]);
    }
}
