//! Error types for eddy observation handling.

use thiserror::Error;

/// Result type for observation operations.
pub type ObsResult<T> = Result<T, ObsError>;

/// Error types for loading and manipulating eddy observations.
#[derive(Error, Debug)]
pub enum ObsError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Dataset could not be located by the sample-data resolver
    #[error("Dataset not found: {0}")]
    NotFound(String),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Error reported by the NetCDF library
    #[error("NetCDF error: {0}")]
    NetCdf(String),

    /// Columns of an observation set disagree in length
    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid argument to an extraction or filter
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ObsError {
    /// Create a LengthMismatch error.
    pub fn length_mismatch(column: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            column: column.into(),
            expected,
            actual,
        }
    }
}

impl From<netcdf::Error> for ObsError {
    fn from(err: netcdf::Error) -> Self {
        Self::NetCdf(err.to_string())
    }
}
