use std::path::Path;

use optifind_wcs::CubeWcs;
use tracing::debug;

use crate::axes::AxisRoles;
use crate::error::{OptifindError, Result};

/// World to 0-based pixel conversion for one position, native axis order.
pub trait WorldToPixel {
    fn world_to_pixel(&self, world: &[f64]) -> std::result::Result<Vec<f64>, String>;
}

impl WorldToPixel for CubeWcs {
    fn world_to_pixel(&self, world: &[f64]) -> std::result::Result<Vec<f64>, String> {
        CubeWcs::world_to_pixel(self, world).map_err(|e| e.to_string())
    }
}

/// Axis layout and coordinate transform of the input cube, resolved once
/// before any source is processed.
pub struct CubeGeometry {
    transform: Box<dyn WorldToPixel>,
    axis_types: Vec<String>,
    extents: Vec<usize>,
    roles: AxisRoles,
}

impl CubeGeometry {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let wcs = CubeWcs::open(path)
            .map_err(|e| OptifindError::header_read(format!("{}: {}", path.display(), e)))?;
        let axis_types = wcs.axis_type_names().into_iter().map(String::from).collect();
        let extents = wcs.extents();
        Self::new(Box::new(wcs), axis_types, extents)
    }

    pub fn new(
        transform: Box<dyn WorldToPixel>,
        axis_types: Vec<String>,
        extents: Vec<usize>,
    ) -> Result<Self> {
        if axis_types.len() != extents.len() {
            return Err(OptifindError::header_read(format!(
                "{} axis types for {} axes",
                axis_types.len(),
                extents.len()
            )));
        }
        let roles = AxisRoles::resolve(&axis_types)?;
        debug!(
            "Cube axes {:?}, extents {:?}, roles {:?}",
            axis_types, extents, roles
        );
        Ok(Self {
            transform,
            axis_types,
            extents,
            roles,
        })
    }

    pub fn naxis(&self) -> usize {
        self.extents.len()
    }

    pub fn axis_types(&self) -> &[String] {
        &self.axis_types
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    pub fn roles(&self) -> AxisRoles {
        self.roles
    }

    pub fn world_to_pixel(&self, world: &[f64]) -> std::result::Result<Vec<f64>, String> {
        self.transform.world_to_pixel(world)
    }
}
