//! Masked 2-D grids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bins::Bins;
use crate::error::{GridError, Result};

/// `nx * ny` values indexed `[ix][iy]` (longitude-major) with a parallel
/// mask; a masked cell is undefined, which is different from a zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedGrid {
    nx: usize,
    ny: usize,
    values: Vec<f64>,
    mask: Vec<bool>,
}

impl MaskedGrid {
    /// Every cell masked.
    pub fn masked(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            values: vec![0.0; nx * ny],
            mask: vec![true; nx * ny],
        }
    }

    pub fn from_parts(nx: usize, ny: usize, values: Vec<f64>, mask: Vec<bool>) -> Result<Self> {
        let expected = nx * ny;
        if values.len() != expected || mask.len() != expected {
            return Err(GridError::shape_mismatch(
                (nx, ny),
                (values.len(), mask.len()),
            ));
        }
        Ok(Self { nx, ny, values, mask })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    #[inline]
    fn index(&self, ix: usize, iy: usize) -> usize {
        ix * self.ny + iy
    }

    /// Value of a defined cell; `None` if masked or out of range.
    pub fn get(&self, ix: usize, iy: usize) -> Option<f64> {
        if ix >= self.nx || iy >= self.ny {
            return None;
        }
        let i = self.index(ix, iy);
        (!self.mask[i]).then(|| self.values[i])
    }

    /// Set a cell; `None` masks it. Out of range cells are ignored.
    pub fn set(&mut self, ix: usize, iy: usize, value: Option<f64>) {
        if ix >= self.nx || iy >= self.ny {
            return;
        }
        let i = self.index(ix, iy);
        match value {
            Some(v) => {
                self.values[i] = v;
                self.mask[i] = false;
            }
            None => self.mask[i] = true,
        }
    }

    /// Mask every defined cell whose value matches `predicate`.
    pub fn mask_where(&mut self, predicate: impl Fn(f64) -> bool) {
        for (m, &v) in self.mask.iter_mut().zip(&self.values) {
            if !*m && predicate(v) {
                *m = true;
            }
        }
    }

    /// Multiply every defined cell.
    pub fn scale(&mut self, factor: f64) {
        for (v, &m) in self.values.iter_mut().zip(&self.mask) {
            if !m {
                *v *= factor;
            }
        }
    }

    pub fn count_valid(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }

    /// Sum of defined cells.
    pub fn sum(&self) -> f64 {
        self.iter_valid().map(|(_, _, v)| v).sum()
    }

    /// Extremes of defined, finite cells.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.iter_valid()
            .map(|(_, _, v)| v)
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Defined cells as `(ix, iy, value)`.
    pub fn iter_valid(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let ny = self.ny.max(1);
        self.values
            .iter()
            .zip(&self.mask)
            .enumerate()
            .filter(|&(_, (_, &m))| !m)
            .map(move |(i, (&v, _))| (i / ny, i % ny, v))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [f64], &mut [bool]) {
        (&mut self.values, &mut self.mask)
    }

    /// Error unless both grids have the same shape.
    pub fn check_shape(&self, other: &MaskedGrid) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(GridError::shape_mismatch(self.shape(), other.shape()));
        }
        Ok(())
    }
}

/// Grid on regular bins with named variables, as returned by `grid_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegularGrid {
    pub bins: Bins,
    /// Longitude of cell centres.
    pub x_c: Vec<f64>,
    /// Latitude of cell centres.
    pub y_c: Vec<f64>,
    vars: BTreeMap<String, MaskedGrid>,
}

impl RegularGrid {
    pub fn new(bins: Bins) -> Self {
        Self {
            bins,
            x_c: bins.lon.centers(),
            y_c: bins.lat.centers(),
            vars: BTreeMap::new(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.bins.shape()
    }

    /// Add or replace a variable; its shape must match the bins.
    pub fn insert(&mut self, name: impl Into<String>, grid: MaskedGrid) -> Result<()> {
        if grid.shape() != self.shape() {
            return Err(GridError::shape_mismatch(self.shape(), grid.shape()));
        }
        self.vars.insert(name.into(), grid);
        Ok(())
    }

    pub fn var(&self, name: &str) -> Result<&MaskedGrid> {
        self.vars
            .get(name)
            .ok_or_else(|| GridError::MissingVariable(name.to_string()))
    }

    /// Longitude extent `(start, start + nx * step)`.
    pub fn x_bounds(&self) -> (f64, f64) {
        let lon = self.bins.lon;
        (lon.start, lon.start + lon.cells() as f64 * lon.step)
    }

    /// Latitude extent `(start, start + ny * step)`.
    pub fn y_bounds(&self) -> (f64, f64) {
        let lat = self.bins.lat;
        (lat.start, lat.start + lat.cells() as f64 * lat.step)
    }
}
