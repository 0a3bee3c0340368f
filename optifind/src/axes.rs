use tracing::warn;

use crate::error::{OptifindError, Result};

const SPATIAL1_TYPES: [&str; 2] = ["RA", "GLON"];
const SPATIAL2_TYPES: [&str; 2] = ["DEC", "GLAT"];
const SPECTRAL_TYPES: [&str; 5] = ["FREQ", "VELO", "VRAD", "VOPT", "FELO"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRole {
    Spatial1,
    Spatial2,
    Spectral,
}

impl AxisRole {
    /// Case-exact match of an axis type label against the role vocabularies.
    pub fn classify(label: &str) -> Option<Self> {
        if SPATIAL1_TYPES.contains(&label) {
            Some(Self::Spatial1)
        } else if SPATIAL2_TYPES.contains(&label) {
            Some(Self::Spatial2)
        } else if SPECTRAL_TYPES.contains(&label) {
            Some(Self::Spectral)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Spatial1 => "first spatial",
            Self::Spatial2 => "second spatial",
            Self::Spectral => "spectral",
        }
    }
}

/// Indices of the longitude, latitude and spectral axes in native axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRoles {
    pub spatial1: usize,
    pub spatial2: usize,
    pub spectral: usize,
}

impl AxisRoles {
    /// Scans the labels in order. When several axes match one role the last
    /// one wins and a warning names both.
    pub fn resolve<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        let mut found: [Option<usize>; 3] = [None; 3];

        for (i, label) in labels.iter().enumerate() {
            let label = label.as_ref();
            let Some(role) = AxisRole::classify(label) else {
                continue;
            };
            let slot = &mut found[role as usize];
            if let Some(previous) = slot.replace(i) {
                warn!(
                    "Axes {} and {} ({}) both match the {} role; using axis {}.",
                    previous + 1,
                    i + 1,
                    label,
                    role.name(),
                    i + 1
                );
            }
        }

        let pick = |role: AxisRole| {
            found[role as usize].ok_or(OptifindError::AxisResolution { role: role.name() })
        };
        let roles = Self {
            spatial1: pick(AxisRole::Spatial1)?,
            spatial2: pick(AxisRole::Spatial2)?,
            spectral: pick(AxisRole::Spectral)?,
        };

        if roles.spatial1 == roles.spatial2
            || roles.spatial1 == roles.spectral
            || roles.spatial2 == roles.spectral
        {
            return Err(OptifindError::header_read(
                "spatial and spectral roles do not map to distinct axes",
            ));
        }
        Ok(roles)
    }

    pub fn index(&self, role: AxisRole) -> usize {
        match role {
            AxisRole::Spatial1 => self.spatial1,
            AxisRole::Spatial2 => self.spatial2,
            AxisRole::Spectral => self.spectral,
        }
    }
}
