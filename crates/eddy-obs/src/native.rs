//! NetCDF reading and writing of eddy observation files.
//!
//! Observation files hold one `obs` dimension and one variable per column:
//! `longitude`, `latitude`, `time` (days since 1950-01-01), `track`,
//! `observation_number` and optionally `observation_flag` plus any number of
//! scalar fields. Position variables are often packed as integers with
//! `scale_factor`/`add_offset`; unpacking happens here.

use std::path::Path;
use std::sync::Once;

use chrono::Utc;
use netcdf::AttributeValue;
use tracing::{debug, info, warn};

use crate::error::{ObsError, ObsResult};
use crate::observations::{EddyObservations, Polarity, LATITUDE, LONGITUDE, TIME};

/// Dimension shared by every observation variable.
pub const OBS_DIMENSION: &str = "obs";

const TRACK: &str = "track";
const OBSERVATION_NUMBER: &str = "observation_number";
const OBSERVATION_FLAG: &str = "observation_flag";

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints diagnostics even when a missing optional
/// attribute is handled on the Rust side. Call early, before the first
/// NetCDF operation; repeated calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Load an observation file.
///
/// Polarity comes from the `title` global attribute; files without one are
/// treated as anticyclonic with a warning.
pub fn load_file<P: AsRef<Path>>(path: P) -> ObsResult<EddyObservations> {
    silence_hdf5_errors();
    let path = path.as_ref();
    if !path.exists() {
        return Err(ObsError::NotFound(path.display().to_string()));
    }

    let file = netcdf::open(path)
        .map_err(|e| ObsError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

    let len = file
        .dimension(OBS_DIMENSION)
        .ok_or_else(|| ObsError::MissingData(format!("{} dimension", OBS_DIMENSION)))?
        .len();

    let polarity = match global_string_attr(&file, "title").and_then(|t| Polarity::from_title(&t)) {
        Some(p) => p,
        None => {
            warn!(path = %path.display(), "No polarity in title attribute, assuming anticyclonic");
            Polarity::Anticyclonic
        }
    };

    let longitude = read_unpacked(&file, LONGITUDE)?;
    let latitude = read_unpacked(&file, LATITUDE)?;
    let time = read_unpacked(&file, TIME)?;
    let track = track_ids(&read_unpacked(&file, TRACK)?)?;

    let mut obs = EddyObservations::new(polarity, longitude, latitude, time, track)?;

    if file.variable(OBSERVATION_NUMBER).is_some() {
        let n = read_unpacked(&file, OBSERVATION_NUMBER)?
            .into_iter()
            .map(|v| v as u16)
            .collect();
        obs = obs.with_observation_numbers(n)?;
    }
    if file.variable(OBSERVATION_FLAG).is_some() {
        let flags = read_unpacked(&file, OBSERVATION_FLAG)?
            .into_iter()
            .map(|v| v != 0.0)
            .collect();
        obs = obs.with_virtual_flags(flags)?;
    }

    let reserved = [LONGITUDE, LATITUDE, TIME, TRACK, OBSERVATION_NUMBER, OBSERVATION_FLAG];
    let extra: Vec<String> = file
        .variables()
        .filter(|v| {
            let dims = v.dimensions();
            dims.len() == 1 && dims[0].name() == OBS_DIMENSION
        })
        .map(|v| v.name())
        .filter(|name| !reserved.contains(&name.as_str()))
        .collect();
    for name in extra {
        let values = read_unpacked(&file, &name)?;
        obs = obs.with_field(name, values)?;
    }

    info!(
        path = %path.display(),
        observations = len,
        polarity = %obs.polarity(),
        "Loaded eddy observations"
    );
    Ok(obs)
}

/// Write an observation set with the global attributes of tracking products.
pub fn save_file<P: AsRef<Path>>(obs: &EddyObservations, path: P) -> ObsResult<()> {
    silence_hdf5_errors();
    let path = path.as_ref();
    let mut file = netcdf::create(path)?;
    file.add_dimension(OBS_DIMENSION, obs.len())?;

    put_f64(&mut file, LONGITUDE, obs.longitude(), &[("units", "degrees_east"), ("long_name", "Longitude")])?;
    put_f64(&mut file, LATITUDE, obs.latitude(), &[("units", "degrees_north"), ("long_name", "Latitude")])?;
    put_f64(&mut file, TIME, obs.time(), &[("units", "days since 1950-01-01 00:00:00"), ("calendar", "proleptic_gregorian")])?;

    {
        let mut var = file.add_variable::<u32>(TRACK, &[OBS_DIMENSION])?;
        var.put_values(obs.tracks(), ..)?;
        var.put_attribute("long_name", "Trajectory number")?;
    }
    {
        let mut var = file.add_variable::<u16>(OBSERVATION_NUMBER, &[OBS_DIMENSION])?;
        var.put_values(obs.observation_numbers(), ..)?;
        var.put_attribute("long_name", "Eddy temporal index in a trajectory")?;
    }
    {
        let flags: Vec<u8> = obs.virtual_flags().iter().map(|&v| v as u8).collect();
        let mut var = file.add_variable::<u8>(OBSERVATION_FLAG, &[OBS_DIMENSION])?;
        var.put_values(&flags, ..)?;
        var.put_attribute("long_name", "Virtual eddy position")?;
    }

    for name in obs.field_names() {
        if let Some(values) = obs.field(name) {
            put_f64(&mut file, name, values, &[])?;
        }
    }

    file.add_attribute("title", obs.polarity().title())?;
    file.add_attribute("Metadata_Conventions", "Unidata Dataset Discovery v1.0")?;
    file.add_attribute("comment", "Surface product; mesoscale eddies")?;
    file.add_attribute(
        "standard_name_vocabulary",
        "NetCDF Climate and Forecast (CF) Metadata Convention Standard Name Table",
    )?;
    file.add_attribute(
        "date_created",
        Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string().as_str(),
    )?;
    if let Some(period) = obs.period() {
        file.add_attribute("time_coverage_duration", period.iso_duration().as_str())?;
        file.add_attribute(
            "time_coverage_start",
            period.start_date().format("%Y-%m-%dT00:00:00Z").to_string().as_str(),
        )?;
        file.add_attribute(
            "time_coverage_end",
            period.end_date().format("%Y-%m-%dT00:00:00Z").to_string().as_str(),
        )?;
    }

    info!(path = %path.display(), observations = obs.len(), "Saved eddy observations");
    Ok(())
}

// =============================================================================
// Internal helpers
// =============================================================================

fn put_f64(
    file: &mut netcdf::FileMut,
    name: &str,
    values: &[f64],
    attributes: &[(&str, &str)],
) -> ObsResult<()> {
    let mut var = file.add_variable::<f64>(name, &[OBS_DIMENSION])?;
    var.put_values(values, ..)?;
    for (key, value) in attributes {
        var.put_attribute(key, *value)?;
    }
    Ok(())
}

/// Read a variable as f64, applying `scale_factor`/`add_offset` and turning
/// `_FillValue` into NaN.
fn read_unpacked(file: &netcdf::File, name: &str) -> ObsResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| ObsError::MissingData(format!("{} variable", name)))?;

    let raw = read_as_f64(&var)
        .ok_or_else(|| ObsError::InvalidFormat(format!("Failed to read {} as numbers", name)))?;

    let scale = get_f64_attr(&var, "scale_factor").unwrap_or(1.0);
    let offset = get_f64_attr(&var, "add_offset").unwrap_or(0.0);
    let fill = get_f64_attr(&var, "_FillValue");
    debug!(variable = name, scale, offset, "Unpacking variable");

    Ok(raw
        .into_iter()
        .map(|v| match fill {
            Some(f) if v == f => f64::NAN,
            _ => v * scale + offset,
        })
        .collect())
}

/// Track identifiers must be non-negative integers; fill values have
/// already become NaN.
fn track_ids(values: &[f64]) -> ObsResult<Vec<u32>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            if t.is_finite() && t >= 0.0 && t.fract() == 0.0 && t <= u32::MAX as f64 {
                Ok(t as u32)
            } else {
                Err(ObsError::InvalidFormat(format!(
                    "invalid track identifier {} at observation {}",
                    t, i
                )))
            }
        })
        .collect()
}

/// Read numeric values whatever their storage type.
fn read_as_f64(var: &netcdf::Variable) -> Option<Vec<f64>> {
    if let Ok(values) = var.get_values::<f64, _>(..) {
        return Some(values);
    }
    if let Ok(values) = var.get_values::<f32, _>(..) {
        return Some(values.into_iter().map(f64::from).collect());
    }
    if let Ok(values) = var.get_values::<i32, _>(..) {
        return Some(values.into_iter().map(f64::from).collect());
    }
    if let Ok(values) = var.get_values::<u32, _>(..) {
        return Some(values.into_iter().map(f64::from).collect());
    }
    if let Ok(values) = var.get_values::<i16, _>(..) {
        return Some(values.into_iter().map(f64::from).collect());
    }
    if let Ok(values) = var.get_values::<u16, _>(..) {
        return Some(values.into_iter().map(f64::from).collect());
    }
    if let Ok(values) = var.get_values::<i8, _>(..) {
        return Some(values.into_iter().map(f64::from).collect());
    }
    var.get_values::<u8, _>(..)
        .ok()
        .map(|values| values.into_iter().map(f64::from).collect())
}

fn global_string_attr(file: &netcdf::File, name: &str) -> Option<String> {
    match file.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f64 attribute.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}
