//! Configuration for density gridding.

use serde::{Deserialize, Serialize};

use crate::bins::Bins;
use crate::count::COUNT_VARIABLE;
use crate::error::{GridError, Result};

/// Configuration for density gridding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cell size in degrees, both axes.
    pub step: f64,

    /// Longitude range `[start, stop)`.
    pub lon_range: (f64, f64),

    /// Latitude range `[start, stop)`.
    pub lat_range: (f64, f64),

    /// Divide counts by cell area and number of days.
    pub normalize: bool,

    /// Name of the gridded variable.
    pub variable: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            step: 0.125,
            lon_range: (-10.0, 37.0),
            lat_range: (30.0, 46.0),
            normalize: true,
            variable: COUNT_VARIABLE.to_string(),
        }
    }
}

impl GridConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `EDDY_BIN_STEP`, `EDDY_LON_RANGE` and
    /// `EDDY_LAT_RANGE` when they are set and parse.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("EDDY_BIN_STEP") {
            if let Ok(step) = val.trim().parse() {
                self.step = step;
            }
        }

        if let Ok(val) = std::env::var("EDDY_LON_RANGE") {
            if let Ok(range) = parse_range(&val) {
                self.lon_range = range;
            }
        }

        if let Ok(val) = std::env::var("EDDY_LAT_RANGE") {
            if let Ok(range) = parse_range(&val) {
                self.lat_range = range;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.step > 0.0) {
            return Err(GridError::Config("step must be > 0".to_string()));
        }
        if self.lon_range.1 <= self.lon_range.0 {
            return Err(GridError::Config(format!(
                "empty longitude range {:?}",
                self.lon_range
            )));
        }
        if self.lat_range.1 <= self.lat_range.0 {
            return Err(GridError::Config(format!(
                "empty latitude range {:?}",
                self.lat_range
            )));
        }
        if self.lat_range.0 < -90.0 || self.lat_range.1 > 90.0 {
            return Err(GridError::Config(format!(
                "latitude range {:?} outside -90..90",
                self.lat_range
            )));
        }
        if self.variable.is_empty() {
            return Err(GridError::Config("variable name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Bins described by this configuration.
    pub fn bins(&self) -> Result<Bins> {
        self.validate()?;
        Bins::regular(self.lon_range, self.lat_range, self.step)
    }
}

/// Parse `"a,b"` into `(a, b)`.
pub fn parse_range(s: &str) -> Result<(f64, f64)> {
    let mut parts = s.split(',').map(str::trim);
    let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(GridError::Config(format!("expected 'start,stop', got '{}'", s)));
    };
    let parse = |v: &str| {
        v.parse::<f64>()
            .map_err(|e| GridError::Config(format!("invalid number '{}': {}", v, e)))
    };
    Ok((parse(a)?, parse(b)?))
}
