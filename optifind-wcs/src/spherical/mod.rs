use std::collections::HashMap;

use crate::common::{asin_safe, native_coord_from_radians, normalize_longitude, HALF_PI, RAD_TO_DEG};
use crate::coordinate::{CelestialCoord, IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

mod cylindrical;
mod zenithal;

use cylindrical::{project_car, project_mer};
use zenithal::{project_arc, project_sin, project_stg, project_tan, project_zea};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalRotation {
    alpha_p: f64,
    delta_p: f64,
    phi_p: f64,
    sin_delta_p: f64,
    cos_delta_p: f64,
}

impl SphericalRotation {
    /// Angles in degrees: celestial pole (`alpha_p`, `delta_p`) and its native longitude `phi_p`.
    pub fn new(alpha_p: f64, delta_p: f64, phi_p: f64) -> Self {
        let delta_p_rad = delta_p.to_radians();
        let (sin_delta_p, cos_delta_p) = delta_p_rad.sin_cos();
        Self {
            alpha_p: alpha_p.to_radians(),
            delta_p: delta_p_rad,
            phi_p: phi_p.to_radians(),
            sin_delta_p,
            cos_delta_p,
        }
    }

    fn default_lonpole(delta_0: f64, theta_0: f64) -> f64 {
        if delta_0 >= theta_0 {
            0.0
        } else {
            180.0
        }
    }

    /// Builds the rotation from the reference point (CRVAL) and the projection's
    /// native reference latitude, all in degrees.
    pub fn from_crval(
        alpha_0: f64,
        delta_0: f64,
        theta_0: f64,
        lonpole: Option<f64>,
        latpole: Option<f64>,
    ) -> WcsResult<Self> {
        let phi_p = lonpole.unwrap_or_else(|| Self::default_lonpole(delta_0, theta_0));
        let latpole_rad = latpole.unwrap_or(90.0).to_radians();

        let (sin_delta_0, cos_delta_0) = delta_0.to_radians().sin_cos();
        let (sin_theta_0, cos_theta_0) = theta_0.to_radians().sin_cos();
        let (sin_phi_p, cos_phi_p) = phi_p.to_radians().sin_cos();

        // Zenithal projections put the reference point at the native pole.
        if theta_0 == 90.0 {
            return Ok(Self::new(alpha_0, delta_0, phi_p));
        }

        let delta_p = Self::compute_delta_p(
            sin_delta_0,
            sin_theta_0,
            cos_theta_0,
            sin_phi_p,
            cos_phi_p,
            latpole_rad,
        )?;

        // Paper II eq. 9, with phi_0 = 0 for every supported non-zenithal projection.
        let pole_offset = (delta_p.abs() - HALF_PI).abs();
        let alpha_p = if pole_offset < 1e-12 {
            // Native and celestial poles coincide: eq. 9 degenerates.
            if delta_p > 0.0 {
                (alpha_0 + phi_p - 180.0).to_radians()
            } else {
                (alpha_0 - phi_p).to_radians()
            }
        } else if cos_delta_0.abs() < 1e-15 {
            alpha_0.to_radians()
        } else {
            let (sin_delta_p, cos_delta_p) = delta_p.sin_cos();
            let y = sin_phi_p * cos_theta_0 / cos_delta_0;
            let x = (sin_theta_0 - sin_delta_p * sin_delta_0) / (cos_delta_p * cos_delta_0);
            alpha_0.to_radians() - y.atan2(x)
        };

        Ok(Self::new(
            normalize_longitude(alpha_p * RAD_TO_DEG),
            delta_p * RAD_TO_DEG,
            phi_p,
        ))
    }

    fn compute_delta_p(
        sin_delta_0: f64,
        sin_theta_0: f64,
        cos_theta_0: f64,
        sin_phi_p: f64,
        cos_phi_p: f64,
        latpole_rad: f64,
    ) -> WcsResult<f64> {
        let cos_theta_0_sin_phi_p = cos_theta_0 * sin_phi_p;
        let denom_sq = 1.0 - cos_theta_0_sin_phi_p * cos_theta_0_sin_phi_p;

        if denom_sq.abs() < 1e-15 {
            if sin_delta_0.abs() < 1e-15 {
                return Ok(latpole_rad);
            }
            return Err(WcsError::invalid_parameter(
                "Invalid combination of theta_0, delta_0 and phi_p - no solution for delta_p",
            ));
        }

        let arg = sin_delta_0 / denom_sq.sqrt();
        if arg.abs() > 1.0 + 1e-15 {
            return Err(WcsError::invalid_parameter(
                "Invalid combination of theta_0, delta_0 and phi_p - acos argument out of range",
            ));
        }

        let acos_term = arg.clamp(-1.0, 1.0).acos();
        let base = sin_theta_0.atan2(cos_theta_0 * cos_phi_p);

        let delta_p_1 = base + acos_term;
        let delta_p_2 = base - acos_term;

        const BOUNDARY_TOL: f64 = 1e-14;
        let in_range = |v: f64| (-HALF_PI - BOUNDARY_TOL..=HALF_PI + BOUNDARY_TOL).contains(&v);
        let clamp_result = |v: f64| v.clamp(-HALF_PI, HALF_PI);

        match (in_range(delta_p_1), in_range(delta_p_2)) {
            (true, false) => Ok(clamp_result(delta_p_1)),
            (false, true) => Ok(clamp_result(delta_p_2)),
            (true, true) => {
                if (delta_p_1 - latpole_rad).abs() <= (delta_p_2 - latpole_rad).abs() {
                    Ok(clamp_result(delta_p_1))
                } else {
                    Ok(clamp_result(delta_p_2))
                }
            }
            (false, false) => Err(WcsError::invalid_parameter(
                "No valid solution for delta_p in range [-90, 90]",
            )),
        }
    }

    pub fn celestial_to_native(&self, celestial: CelestialCoord) -> NativeCoord {
        let (sin_delta, cos_delta) = celestial.lat_deg().to_radians().sin_cos();
        let d_alpha = celestial.lon_deg().to_radians() - self.alpha_p;
        let (sin_d_alpha, cos_d_alpha) = d_alpha.sin_cos();

        let sin_theta = sin_delta * self.sin_delta_p + cos_delta * self.cos_delta_p * cos_d_alpha;
        let theta = asin_safe(sin_theta);

        let x = -cos_delta * sin_d_alpha;
        let y = sin_delta * self.cos_delta_p - cos_delta * self.sin_delta_p * cos_d_alpha;
        let phi = self.phi_p + x.atan2(y);

        native_coord_from_radians(phi, theta)
    }

    #[inline]
    pub fn phi_p_degrees(&self) -> f64 {
        self.phi_p * RAD_TO_DEG
    }

    #[inline]
    pub fn delta_p_degrees(&self) -> f64 {
        self.delta_p * RAD_TO_DEG
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Tan,
    Sin { xi: f64, eta: f64 },
    Arc,
    Stg,
    Zea,
    Car,
    Mer,
}

impl Projection {
    /// Resolves a three-letter CTYPE projection code. `pv` holds the
    /// latitude axis PVi_m parameters keyed by `m`.
    pub fn from_code(code: &str, pv: &HashMap<u8, f64>) -> WcsResult<Self> {
        match code {
            "TAN" => Ok(Self::Tan),
            "SIN" => Ok(Self::Sin {
                xi: pv.get(&1).copied().unwrap_or(0.0),
                eta: pv.get(&2).copied().unwrap_or(0.0),
            }),
            "ARC" => Ok(Self::Arc),
            "STG" => Ok(Self::Stg),
            "ZEA" => Ok(Self::Zea),
            "CAR" => Ok(Self::Car),
            "MER" => Ok(Self::Mer),
            other => Err(WcsError::unsupported_projection(other)),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Tan => "TAN",
            Self::Sin { .. } => "SIN",
            Self::Arc => "ARC",
            Self::Stg => "STG",
            Self::Zea => "ZEA",
            Self::Car => "CAR",
            Self::Mer => "MER",
        }
    }

    /// Native coordinates (phi_0, theta_0) of the reference point, in degrees.
    pub fn native_reference(&self) -> (f64, f64) {
        match self {
            Self::Tan | Self::Sin { .. } | Self::Arc | Self::Stg | Self::Zea => (0.0, 90.0),
            Self::Car | Self::Mer => (0.0, 0.0),
        }
    }

    pub fn project(&self, native: NativeCoord) -> WcsResult<IntermediateCoord> {
        match self {
            Self::Tan => project_tan(native),
            Self::Sin { xi, eta } => project_sin(native, *xi, *eta),
            Self::Arc => project_arc(native),
            Self::Stg => project_stg(native),
            Self::Zea => project_zea(native),
            Self::Car => project_car(native),
            Self::Mer => project_mer(native),
        }
    }
}
