use crate::common::{HALF_PI, RAD_TO_DEG};
use crate::coordinate::{IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

pub(crate) fn project_car(native: NativeCoord) -> WcsResult<IntermediateCoord> {
    Ok(IntermediateCoord::new(native.phi_deg(), native.theta_deg()))
}

pub(crate) fn project_mer(native: NativeCoord) -> WcsResult<IntermediateCoord> {
    let theta = native.theta_rad();
    if theta.abs() >= HALF_PI - 1e-10 {
        return Err(WcsError::singularity(
            "MER projection undefined at theta = +/-90",
        ));
    }

    let y = (std::f64::consts::FRAC_PI_4 + theta / 2.0).tan().ln();
    Ok(IntermediateCoord::new(native.phi_deg(), y * RAD_TO_DEG))
}
