//! Error types for gridding.

use eddy_obs::ObsError;
use thiserror::Error;

/// Errors that can occur while binning or combining grids.
#[derive(Error, Debug)]
pub enum GridError {
    /// Bin definition cannot produce any cell.
    #[error("invalid bins: {0}")]
    InvalidBins(String),

    /// Two grids that must line up do not.
    #[error("grid shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Named variable absent from a regular grid.
    #[error("variable not found in grid: {0}")]
    MissingVariable(String),

    /// Operation needs at least one observation.
    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    /// Counting mode not implemented.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error from the observation layer.
    #[error(transparent)]
    Obs(#[from] ObsError),
}

impl GridError {
    /// Create an InvalidBins error.
    pub fn invalid_bins(msg: impl Into<String>) -> Self {
        Self::InvalidBins(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::ShapeMismatch { expected, actual }
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
