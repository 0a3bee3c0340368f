use std::f64::consts::FRAC_PI_2;

use crate::coordinate::{IntermediateCoord, NativeCoord};

pub(crate) const HALF_PI: f64 = FRAC_PI_2;
pub(crate) const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

#[inline]
pub(crate) fn asin_safe(sin_value: f64) -> f64 {
    sin_value.clamp(-1.0, 1.0).asin()
}

/// Wraps a longitude into (-180, 180].
#[inline]
pub(crate) fn normalize_longitude(lon: f64) -> f64 {
    let mut normalized = lon % 360.0;
    if normalized > 180.0 {
        normalized -= 360.0;
    } else if normalized <= -180.0 {
        normalized += 360.0;
    }
    normalized
}

#[inline]
pub(crate) fn radial_to_intermediate(r_theta: f64, phi_rad: f64) -> IntermediateCoord {
    let (ps, pc) = phi_rad.sin_cos();
    let x = r_theta * ps * RAD_TO_DEG;
    let y = -r_theta * pc * RAD_TO_DEG;
    IntermediateCoord::new(x, y)
}

#[inline]
pub(crate) fn native_coord_from_radians(phi_rad: f64, theta_rad: f64) -> NativeCoord {
    NativeCoord::new(
        normalize_longitude(phi_rad * RAD_TO_DEG),
        theta_rad * RAD_TO_DEG,
    )
}
