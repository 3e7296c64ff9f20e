//! Round trips through NetCDF observation files.

use std::path::Path;

use eddy_obs::{load_file, save_file, EddyObservations, ObsError, Polarity};
use netcdf::AttributeValue;
use test_utils::synthetic_tracks;

/// Write a minimal observation file with the given track column.
fn write_raw(path: &Path, track: &[f64], fill: Option<f64>) {
    let n = track.len();
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("obs", n).unwrap();
    for name in ["longitude", "latitude", "time"] {
        let values: Vec<f64> = (0..n).map(|i| 15706.0 + i as f64).collect();
        let mut var = file.add_variable::<f64>(name, &["obs"]).unwrap();
        var.put_values(&values, ..).unwrap();
    }
    let mut var = file.add_variable::<f64>("track", &["obs"]).unwrap();
    if let Some(fill) = fill {
        var.put_attribute("_FillValue", fill).unwrap();
    }
    var.put_values(track, ..).unwrap();
    file.add_attribute("title", "Cyclonic eddies").unwrap();
}

fn global_str(file: &netcdf::File, name: &str) -> String {
    match file.attribute(name).unwrap().value().unwrap() {
        AttributeValue::Str(s) => s,
        other => panic!("{} is not a string: {:?}", name, other),
    }
}

#[test]
fn test_save_then_load_preserves_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cyclonic.nc");

    let obs = synthetic_tracks(Polarity::Cyclonic, 4, 10, 42)
        .with_field("amplitude", (0..40).map(|i| i as f64 * 0.01).collect())
        .unwrap();
    save_file(&obs, &path).unwrap();

    let loaded = load_file(&path).unwrap();
    assert_eq!(loaded.polarity(), Polarity::Cyclonic);
    assert_eq!(loaded.len(), obs.len());
    assert_eq!(loaded.longitude(), obs.longitude());
    assert_eq!(loaded.latitude(), obs.latitude());
    assert_eq!(loaded.time(), obs.time());
    assert_eq!(loaded.tracks(), obs.tracks());
    assert_eq!(loaded.observation_numbers(), obs.observation_numbers());
    assert_eq!(loaded.field("amplitude"), obs.field("amplitude"));
}

#[test]
fn test_virtual_flags_survive_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Anticyclonic.nc");

    let obs = EddyObservations::new(
        Polarity::Anticyclonic,
        vec![1.0, 2.0, 3.0],
        vec![35.0, 35.5, 36.0],
        vec![15706.0, 15707.0, 15708.0],
        vec![7, 7, 7],
    )
    .unwrap()
    .with_virtual_flags(vec![false, true, false])
    .unwrap();
    save_file(&obs, &path).unwrap();

    let loaded = load_file(&path).unwrap();
    assert_eq!(loaded.polarity(), Polarity::Anticyclonic);
    assert_eq!(loaded.virtual_flags(), &[false, true, false]);
    assert_eq!(loaded.period(), obs.period());
}

#[test]
fn test_load_rejects_non_netcdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.nc");
    std::fs::write(&path, b"not a netcdf file").unwrap();
    assert!(load_file(&path).is_err());
}

#[test]
fn test_saved_file_carries_coverage_attributes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cyclonic.nc");

    let obs = EddyObservations::new(
        Polarity::Cyclonic,
        vec![1.0, 2.0],
        vec![35.0, 35.5],
        vec![0.0, 9.0],
        vec![3, 3],
    )
    .unwrap();
    save_file(&obs, &path).unwrap();

    let file = netcdf::open(&path).unwrap();
    assert_eq!(global_str(&file, "title"), Polarity::Cyclonic.title());
    assert_eq!(global_str(&file, "time_coverage_start"), "1950-01-01T00:00:00Z");
    assert_eq!(global_str(&file, "time_coverage_end"), "1950-01-10T00:00:00Z");
    assert_eq!(global_str(&file, "time_coverage_duration"), "P10D");

    let created = global_str(&file, "date_created");
    assert!(
        chrono::NaiveDateTime::parse_from_str(&created, "%Y-%m-%dT%H:%M:%SZ").is_ok(),
        "bad date_created {}",
        created
    );
}

#[test]
fn test_interleaved_tracks_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cyclonic.nc");
    write_raw(&path, &[1.0, 1.0, 2.0, 1.0], None);

    let err = load_file(&path).unwrap_err();
    assert!(matches!(err, ObsError::InvalidFormat(_)), "{:?}", err);
}

#[test]
fn test_negative_track_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cyclonic.nc");
    write_raw(&path, &[4.0, -1.0], None);

    let err = load_file(&path).unwrap_err();
    assert!(matches!(err, ObsError::InvalidFormat(_)), "{:?}", err);
}

#[test]
fn test_filled_track_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cyclonic.nc");
    write_raw(&path, &[4.0, 4.0, -999.0], Some(-999.0));

    let err = load_file(&path).unwrap_err();
    assert!(matches!(err, ObsError::InvalidFormat(_)), "{:?}", err);
}

#[test]
fn test_raw_file_with_valid_tracks_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cyclonic.nc");
    write_raw(&path, &[1.0, 1.0, 2.0], None);

    let obs = load_file(&path).unwrap();
    assert_eq!(obs.polarity(), Polarity::Cyclonic);
    assert_eq!(obs.tracks(), &[1, 1, 2]);
}
