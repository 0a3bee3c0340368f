//! FITS cube headers and world/pixel coordinate transforms for spectral-line
//! data cubes.
//!
//! A cube has one celestial longitude/latitude pair, mapped through a
//! spherical projection, and any number of linear axes (frequency,
//! velocity, Stokes). [`CubeWcs`] combines both into a single N-dimensional
//! transform working on 0-based pixel coordinates.

mod common;
pub mod coordinate;
pub mod cube;
pub mod error;
pub mod header;
pub mod linear;
pub mod spherical;

pub use coordinate::{CelestialCoord, IntermediateCoord, NativeCoord};
pub use cube::{CubeAxis, CubeWcs};
pub use error::{WcsError, WcsResult};
pub use header::{Header, HeaderParser, KeywordMap, KeywordProvider};
pub use linear::LinearTransform;
pub use spherical::{Projection, SphericalRotation};
