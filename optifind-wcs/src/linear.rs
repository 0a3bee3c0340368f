use nalgebra::{DMatrix, DVector};

use crate::error::{WcsError, WcsResult};

const CONDITION_THRESHOLD: f64 = 1e-12;

/// Linear part of the WCS for N axes, `q = M (p - CRPIX)` with
/// `M = diag(CDELT) * PC` or the CD matrix, applied in the intermediate to
/// pixel direction. Pixel coordinates are 1-based, as in the FITS header.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTransform {
    crpix: DVector<f64>,
    inverse: DMatrix<f64>,
}

impl LinearTransform {
    pub fn from_cd(crpix: &[f64], cd: DMatrix<f64>) -> WcsResult<Self> {
        let n = crpix.len();
        if cd.nrows() != n || cd.ncols() != n {
            return Err(WcsError::invalid_parameter(format!(
                "{}x{} matrix does not match {} axes",
                cd.nrows(),
                cd.ncols(),
                n
            )));
        }

        check_conditioning(&cd)?;
        let inverse = cd
            .clone()
            .try_inverse()
            .ok_or_else(|| WcsError::non_invertible_matrix(cd.determinant()))?;

        Ok(Self {
            crpix: DVector::from_column_slice(crpix),
            inverse,
        })
    }

    pub fn from_pc_cdelt(crpix: &[f64], pc: DMatrix<f64>, cdelt: &[f64]) -> WcsResult<Self> {
        if let Some(axis) = cdelt.iter().position(|&c| c == 0.0) {
            return Err(WcsError::invalid_keyword(
                format!("CDELT{}", axis + 1),
                "pixel spacing cannot be zero",
            ));
        }
        let mut cd = pc;
        for (mut row, &scale) in cd.row_iter_mut().zip(cdelt) {
            row *= scale;
        }
        Self::from_cd(crpix, cd)
    }

    pub fn naxis(&self) -> usize {
        self.crpix.len()
    }

    pub fn intermediate_to_pixel(&self, intermediate: &[f64]) -> Vec<f64> {
        let q = DVector::from_column_slice(intermediate);
        (&self.inverse * q + &self.crpix).iter().copied().collect()
    }

    #[inline]
    pub fn crpix(&self) -> &[f64] {
        self.crpix.as_slice()
    }
}

/// Rejects matrices whose determinant is negligible relative to the size of
/// their rows, so that unit choice (Hz vs. degrees) does not matter.
fn check_conditioning(m: &DMatrix<f64>) -> WcsResult<()> {
    let determinant = m.determinant();
    let row_norms: f64 = m.row_iter().map(|row| row.norm()).product();
    if row_norms == 0.0 || !determinant.is_finite() {
        return Err(WcsError::non_invertible_matrix(determinant));
    }
    if (determinant / row_norms).abs() < CONDITION_THRESHOLD {
        return Err(WcsError::non_invertible_matrix(determinant));
    }
    Ok(())
}
