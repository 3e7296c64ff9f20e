//! Eddy observation sets produced by mesoscale eddy tracking.
//!
//! This crate loads anticyclonic and cyclonic eddy track files (NetCDF-4),
//! keeps them as column stores and provides the track-aware operations used
//! before gridding: track indexing, extraction by mask, length, period or
//! direction, gap filling and along-track smoothing.
//!
//! # Example
//!
//! ```ignore
//! use eddy_obs::{load_file, sample_data};
//!
//! let path = sample_data::resolve("Anticyclonic.nc")?;
//! let anticyclonic = load_file(path)?;
//! let long_lived = anticyclonic.extract_with_length((30, -1))?;
//! ```

pub mod error;
pub mod filters;
pub mod geo;
pub mod native;
pub mod observations;
pub mod sample_data;
pub mod summary;
pub mod tracking;

pub use error::{ObsError, ObsResult};
pub use native::{load_file, save_file, silence_hdf5_errors};
pub use observations::{day_to_date, EddyObservations, Period, Polarity};
pub use summary::ObservationSummary;
pub use tracking::{Direction, ExtractOptions, TrackIndex};
