use std::fmt;

use tracing::debug;

use crate::axes::AxisRole;
use crate::catalogue::SourceRecord;
use crate::cube::CubeGeometry;
use crate::error::{OptifindError, Result};

/// Sub-region half-widths, pixels on the sky and channels on the spectral axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Radii {
    pub spatial: u32,
    pub spectral: u32,
}

impl Radii {
    pub fn new(spatial: u32, spectral: u32) -> Self {
        Self { spatial, spectral }
    }

    pub fn for_role(&self, role: AxisRole) -> u32 {
        match role {
            AxisRole::Spatial1 | AxisRole::Spatial2 => self.spatial,
            AxisRole::Spectral => self.spectral,
        }
    }
}

/// Inclusive pixel range along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub lower: i64,
    pub upper: i64,
}

impl AxisRange {
    /// `floor(pixel - radius)` raised to 0 and `ceil(pixel + radius)` lowered
    /// to `extent - 1`.
    pub fn around(pixel: f64, radius: u32, extent: usize) -> Self {
        let radius = f64::from(radius);
        let last = extent as i64 - 1;
        Self {
            lower: ((pixel - radius).floor() as i64).max(0),
            upper: ((pixel + radius).ceil() as i64).min(last),
        }
    }

    pub fn width(&self) -> i64 {
        self.upper - self.lower
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub spatial1: AxisRange,
    pub spatial2: AxisRange,
    pub spectral: AxisRange,
}

impl Region {
    pub fn range(&self, role: AxisRole) -> AxisRange {
        match role {
            AxisRole::Spatial1 => self.spatial1,
            AxisRole::Spatial2 => self.spatial2,
            AxisRole::Spectral => self.spectral,
        }
    }

    /// True when every axis spans at least its radius after clipping.
    pub fn fits(&self, radii: Radii) -> bool {
        [AxisRole::Spatial1, AxisRole::Spatial2, AxisRole::Spectral]
            .into_iter()
            .all(|role| self.range(role).width() >= i64::from(radii.for_role(role)))
    }
}

/// `x_min, x_max, y_min, y_max, z_min, z_max`, as `input.region` expects.
impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}",
            self.spatial1.lower,
            self.spatial1.upper,
            self.spatial2.lower,
            self.spatial2.upper,
            self.spectral.lower,
            self.spectral.upper
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionDecision {
    Accepted(Region),
    /// Clipped window narrower than the radius on at least one axis.
    Rejected(Region),
}

impl RegionDecision {
    pub fn region(&self) -> Region {
        match self {
            Self::Accepted(region) | Self::Rejected(region) => *region,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

pub fn compute(source: &SourceRecord, cube: &CubeGeometry, radii: Radii) -> Result<RegionDecision> {
    let pixel = cube
        .world_to_pixel(source.coordinates())
        .map_err(|message| OptifindError::WorldToPixel {
            id: source.id().to_string(),
            message,
        })?;
    let roles = cube.roles();

    let range = |role: AxisRole| -> Result<AxisRange> {
        let axis = roles.index(role);
        let p = pixel[axis];
        if !p.is_finite() {
            return Err(OptifindError::WorldToPixel {
                id: source.id().to_string(),
                message: format!("axis {} maps to {}", axis + 1, p),
            });
        }
        Ok(AxisRange::around(p, radii.for_role(role), cube.extents()[axis]))
    };

    let region = Region {
        spatial1: range(AxisRole::Spatial1)?,
        spatial2: range(AxisRole::Spatial2)?,
        spectral: range(AxisRole::Spectral)?,
    };
    debug!("Source \"{}\" at pixel {:?}", source.id(), pixel);

    if region.fits(radii) {
        Ok(RegionDecision::Accepted(region))
    } else {
        Ok(RegionDecision::Rejected(region))
    }
}
