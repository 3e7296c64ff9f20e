//! Eddy density pipeline shared by the `eddy-density` binary and its tests.

pub mod config;
pub mod pipeline;

pub use config::DensityConfig;
pub use pipeline::{run_density, run_subset, run_summary, DensityReport, SubsetOptions};
