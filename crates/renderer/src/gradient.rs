//! Heatmap rendering of masked grids.

use eddy_grid::MaskedGrid;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::colormap::Colormap;
use crate::error::{RenderError, RenderResult};

/// Value to colour-position mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Norm {
    Linear { vmin: f64, vmax: f64 },
    Log { vmin: f64, vmax: f64 },
}

impl Norm {
    pub fn validate(&self) -> RenderResult<()> {
        match *self {
            Norm::Linear { vmin, vmax } if vmax > vmin => Ok(()),
            Norm::Log { vmin, vmax } if vmin > 0.0 && vmax > vmin => Ok(()),
            other => Err(RenderError::InvalidNorm(format!("{:?}", other))),
        }
    }

    pub fn range(&self) -> (f64, f64) {
        match *self {
            Norm::Linear { vmin, vmax } | Norm::Log { vmin, vmax } => (vmin, vmax),
        }
    }

    /// Position in `[0, 1]`, values outside the range are clamped.
    ///
    /// `None` for NaN, and for non-positive values on a log scale.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let t = match *self {
            Norm::Linear { vmin, vmax } => (value - vmin) / (vmax - vmin),
            Norm::Log { vmin, vmax } => {
                if value <= 0.0 {
                    return None;
                }
                (value.ln() - vmin.ln()) / (vmax.ln() - vmin.ln())
            }
        };
        Some(t.clamp(0.0, 1.0))
    }

    /// Tick values: powers of ten for log, a 1/2/2.5/5 step for linear.
    pub fn ticks(&self) -> Vec<f64> {
        match *self {
            Norm::Linear { vmin, vmax } => linear_ticks(vmin, vmax, 8),
            Norm::Log { vmin, vmax } => {
                let first = vmin.log10().ceil() as i32;
                let last = vmax.log10().floor() as i32;
                (first..=last).map(|e| 10f64.powi(e)).collect()
            }
        }
    }
}

fn linear_ticks(vmin: f64, vmax: f64, max_ticks: usize) -> Vec<f64> {
    let span = vmax - vmin;
    if !(span > 0.0) {
        return vec![vmin];
    }
    let raw = span / max_ticks as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|&s| s >= raw)
        .unwrap_or(10.0 * magnitude);
    let first = (vmin / step).ceil() as i64;
    let last = (vmax / step + 1e-9).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Data window shown in a pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

/// Paint `grid` (covering `grid_extent`) into an RGBA buffer of
/// `width x height` pixels that shows `view`.
///
/// Row 0 is the north edge. Masked cells take the colormap's `bad` colour
/// (transparent by default); pixels outside the grid stay transparent.
pub fn render_masked_grid(
    grid: &MaskedGrid,
    grid_extent: Extent,
    view: Extent,
    width: usize,
    height: usize,
    cmap: &Colormap,
    norm: &Norm,
) -> Vec<u8> {
    let mut pixels = vec![0u8; width * height * 4];
    let (nx, ny) = grid.shape();
    if width == 0 || height == 0 || nx == 0 || ny == 0 {
        return pixels;
    }
    let dx = (grid_extent.x.1 - grid_extent.x.0) / nx as f64;
    let dy = (grid_extent.y.1 - grid_extent.y.0) / ny as f64;
    let lon_per_px = (view.x.1 - view.x.0) / width as f64;
    let lat_per_px = (view.y.1 - view.y.0) / height as f64;

    let cell_index = |value: f64, origin: f64, step: f64, n: usize| -> Option<usize> {
        let i = ((value - origin) / step).floor();
        (i >= 0.0 && (i as usize) < n).then_some(i as usize)
    };

    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(py, row)| {
            let lat = view.y.1 - (py as f64 + 0.5) * lat_per_px;
            let Some(iy) = cell_index(lat, grid_extent.y.0, dy, ny) else {
                return;
            };
            for (px, pixel) in row.chunks_exact_mut(4).enumerate() {
                let lon = view.x.0 + (px as f64 + 0.5) * lon_per_px;
                let Some(ix) = cell_index(lon, grid_extent.x.0, dx, nx) else {
                    continue;
                };
                let color = match grid.get(ix, iy).map(|v| norm.normalize(v)) {
                    Some(Some(t)) => cmap.at(t),
                    // masked, or not representable by the norm
                    _ => cmap.bad,
                };
                pixel.copy_from_slice(&color.to_array());
            }
        });

    pixels
}
