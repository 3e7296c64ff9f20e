//! Mask algebra between count grids.
//!
//! The combined grid is masked only where both inputs are masked; elsewhere
//! a masked input counts as zero. The ratio is defined only where both
//! operands are defined and the denominator is not zero.

use tracing::debug;

use crate::error::{GridError, Result};
use crate::grid::{MaskedGrid, RegularGrid};

/// `target += other` with masked cells read as zero; the result is masked
/// where both were masked.
pub fn merge_add(target: &mut MaskedGrid, other: &MaskedGrid) -> Result<()> {
    target.check_shape(other)?;
    let (values, mask) = target.parts_mut();
    for (((v, m), &ov), &om) in values
        .iter_mut()
        .zip(mask.iter_mut())
        .zip(other.values())
        .zip(other.mask())
    {
        let a = if *m { 0.0 } else { *v };
        let b = if om { 0.0 } else { ov };
        *m = *m && om;
        *v = if *m { 0.0 } else { a + b };
    }
    Ok(())
}

/// Overwrite `target` with `numerator / denominator`, reusing its storage.
pub fn overwrite_with_ratio(
    target: &mut MaskedGrid,
    numerator: &MaskedGrid,
    denominator: &MaskedGrid,
) -> Result<()> {
    target.check_shape(numerator)?;
    target.check_shape(denominator)?;
    let (values, mask) = target.parts_mut();
    let mut undefined = 0usize;
    for (i, (v, m)) in values.iter_mut().zip(mask.iter_mut()).enumerate() {
        let num = (!numerator.mask()[i]).then(|| numerator.values()[i]);
        let den = (!denominator.mask()[i]).then(|| denominator.values()[i]);
        match (num, den) {
            (Some(n), Some(d)) if d != 0.0 => {
                *v = n / d;
                *m = false;
            }
            _ => {
                *v = 0.0;
                *m = true;
                undefined += 1;
            }
        }
    }
    debug!(undefined, "Ratio cells left undefined");
    Ok(())
}

/// New grid holding `a + c` under the combined mask.
pub fn combined(a: &MaskedGrid, c: &MaskedGrid) -> Result<MaskedGrid> {
    let mut out = a.clone();
    merge_add(&mut out, c)?;
    Ok(out)
}

/// New grid holding `c / a`.
pub fn ratio(c: &MaskedGrid, a: &MaskedGrid) -> Result<MaskedGrid> {
    let mut out = c.clone();
    overwrite_with_ratio(&mut out, c, a)?;
    Ok(out)
}

/// The four grids shown side by side in a density figure.
#[derive(Debug, Clone)]
pub struct DensityComposite {
    pub grid: RegularGrid,
    pub anticyclonic: MaskedGrid,
    pub cyclonic: MaskedGrid,
    pub combined: MaskedGrid,
    /// Cyclonic over anticyclonic.
    pub ratio: MaskedGrid,
}

impl DensityComposite {
    /// Combine the `name` variable of two grids built on the same bins.
    pub fn build(anticyclonic: &RegularGrid, cyclonic: &RegularGrid, name: &str) -> Result<Self> {
        let a = anticyclonic.var(name)?;
        let c = cyclonic.var(name)?;
        if anticyclonic.bins != cyclonic.bins {
            return Err(GridError::shape_mismatch(
                anticyclonic.shape(),
                cyclonic.shape(),
            ));
        }
        let mut grid = RegularGrid::new(anticyclonic.bins);
        let combined = combined(a, c)?;
        let ratio = ratio(c, a)?;
        grid.insert(name, combined.clone())?;
        Ok(Self {
            grid,
            anticyclonic: a.clone(),
            cyclonic: c.clone(),
            combined,
            ratio,
        })
    }
}
