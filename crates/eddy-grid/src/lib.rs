//! Spatial binning of eddy centres.
//!
//! This crate turns eddy observation sets into masked 2-D grids on regular
//! longitude/latitude bins and combines them:
//!
//! - [`grid_count`] builds a centre histogram where empty cells are masked
//! - [`density_factor`] normalizes counts by cell area and time span
//! - [`composite`] merges count grids (mask AND, masked read as zero) and
//!   derives their ratio
//!
//! # Example
//!
//! ```ignore
//! use eddy_grid::{density, Bins, DensityComposite};
//!
//! let bins = Bins::regular((-10.0, 37.0), (30.0, 46.0), 0.125)?;
//! let a = density(&anticyclonic, &bins, "count")?;
//! let c = density(&cyclonic, &bins, "count")?;
//! let composite = DensityComposite::build(&a, &c, "count")?;
//! ```

pub mod bins;
pub mod composite;
pub mod config;
pub mod count;
pub mod error;
pub mod grid;

pub use bins::{AxisBins, Bins};
pub use composite::{combined, merge_add, overwrite_with_ratio, ratio, DensityComposite};
pub use config::{parse_range, GridConfig};
pub use count::{density, density_factor, grid_count, CountOptions, COUNT_VARIABLE};
pub use error::{GridError, Result};
pub use grid::{MaskedGrid, RegularGrid};
