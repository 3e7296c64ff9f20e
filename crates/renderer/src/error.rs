//! Error types for rendering.

use thiserror::Error;

/// Errors that can occur while drawing or encoding a figure.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Unknown colormap name or malformed colour stops.
    #[error("invalid colormap: {0}")]
    InvalidColormap(String),

    /// Normalization that cannot map values (e.g. log with vmin <= 0).
    #[error("invalid norm: {0}")]
    InvalidNorm(String),

    /// Axes or colorbar rectangle outside the figure, or empty.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// Font file that cannot be parsed.
    #[error("invalid font: {0}")]
    InvalidFont(String),

    /// Figure configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// PNG encoding failure.
    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Grid(#[from] eddy_grid::GridError),
}

/// Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
