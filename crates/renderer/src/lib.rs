//! Rendering of eddy density grids.
//!
//! Implements:
//! - Colour ramps (named and JSON defined)
//! - Linear and logarithmic normalization
//! - Masked heatmap panels on a figure with gridlines and colorbars
//! - PNG encoding with text metadata

pub mod canvas;
pub mod colormap;
pub mod density;
pub mod error;
pub mod figure;
pub mod gradient;
pub mod png;

pub use colormap::{Color, Colormap};
pub use density::{render_density_figure, FigureConfig};
pub use error::{RenderError, RenderResult};
pub use figure::{Axes, Colorbar, Figure, FigureRect, Orientation};
pub use gradient::{render_masked_grid, Extent, Norm};
