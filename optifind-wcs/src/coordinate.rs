/// Projection-plane coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntermediateCoord {
    x: f64,
    y: f64,
}

impl IntermediateCoord {
    #[inline]
    pub fn new(x_deg: f64, y_deg: f64) -> Self {
        Self { x: x_deg, y: y_deg }
    }

    #[inline]
    pub fn x_deg(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y_deg(&self) -> f64 {
        self.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeCoord {
    phi: f64,
    theta: f64,
}

impl NativeCoord {
    #[inline]
    pub fn new(phi_deg: f64, theta_deg: f64) -> Self {
        Self {
            phi: phi_deg,
            theta: theta_deg,
        }
    }

    #[inline]
    pub fn phi_deg(&self) -> f64 {
        self.phi
    }

    #[inline]
    pub fn theta_deg(&self) -> f64 {
        self.theta
    }

    #[inline]
    pub fn phi_rad(&self) -> f64 {
        self.phi.to_radians()
    }

    #[inline]
    pub fn theta_rad(&self) -> f64 {
        self.theta.to_radians()
    }
}

/// Celestial longitude/latitude in degrees (RA/Dec, GLON/GLAT, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialCoord {
    lon: f64,
    lat: f64,
}

impl CelestialCoord {
    #[inline]
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg,
            lat: lat_deg,
        }
    }

    #[inline]
    pub fn lon_deg(&self) -> f64 {
        self.lon
    }

    #[inline]
    pub fn lat_deg(&self) -> f64 {
        self.lat
    }
}
