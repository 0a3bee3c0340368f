//! Zenithal projections. The native latitude fixes the distance from the
//! reference point on the plane and the native longitude fixes the direction.

use crate::common::{radial_to_intermediate, HALF_PI, RAD_TO_DEG};
use crate::coordinate::{IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

/// Places `native` on the plane at the radius returned by `radius` (radians,
/// called with theta in radians). The native pole is always the origin.
fn zenithal(
    native: NativeCoord,
    radius: impl FnOnce(f64) -> WcsResult<f64>,
) -> WcsResult<IntermediateCoord> {
    if native.theta_deg() == 90.0 {
        return Ok(IntermediateCoord::new(0.0, 0.0));
    }
    let r_theta = radius(native.theta_rad())?;
    Ok(radial_to_intermediate(r_theta, native.phi_rad()))
}

pub(crate) fn project_tan(native: NativeCoord) -> WcsResult<IntermediateCoord> {
    zenithal(native, |theta| {
        if theta <= 0.0 {
            return Err(WcsError::singularity("TAN projection undefined at theta <= 0"));
        }
        Ok(1.0 / theta.tan())
    })
}

/// Orthographic projection; `xi`/`eta` (PV2_1, PV2_2) give the slant form.
pub(crate) fn project_sin(native: NativeCoord, xi: f64, eta: f64) -> WcsResult<IntermediateCoord> {
    if xi == 0.0 && eta == 0.0 {
        return zenithal(native, |theta| {
            if theta < 0.0 {
                return Err(WcsError::out_of_bounds(
                    "SIN projection undefined on the far hemisphere",
                ));
            }
            Ok(theta.cos())
        });
    }

    let (sin_theta, cos_theta) = native.theta_rad().sin_cos();
    let (sin_phi, cos_phi) = native.phi_rad().sin_cos();
    let lift = 1.0 - sin_theta;
    Ok(IntermediateCoord::new(
        (cos_theta * sin_phi + xi * lift) * RAD_TO_DEG,
        (eta * lift - cos_theta * cos_phi) * RAD_TO_DEG,
    ))
}

pub(crate) fn project_arc(native: NativeCoord) -> WcsResult<IntermediateCoord> {
    zenithal(native, |theta| Ok(HALF_PI - theta))
}

pub(crate) fn project_stg(native: NativeCoord) -> WcsResult<IntermediateCoord> {
    zenithal(native, |theta| {
        let (sin_theta, cos_theta) = theta.sin_cos();
        if 1.0 + sin_theta == 0.0 {
            return Err(WcsError::singularity("STG projection diverges at theta = -90"));
        }
        Ok(2.0 * cos_theta / (1.0 + sin_theta))
    })
}

pub(crate) fn project_zea(native: NativeCoord) -> WcsResult<IntermediateCoord> {
    zenithal(native, |theta| Ok((2.0 * (1.0 - theta.sin())).sqrt()))
}
