//! OptiFind: runs the SoFiA 2 source finder on small sub-regions of a data
//! cube centred on catalogue positions, then merges the per-source
//! catalogues into one.
//!
//! ```text
//! template.par ──► Configuration ─┐
//! cube header ──► CubeGeometry ───┼─► region::compute ─► RunOrchestrator ─► merge
//! sources.csv ──► SourceRecord ───┘
//! ```

pub mod axes;
pub mod catalogue;
pub mod config;
pub mod cube;
pub mod error;
pub mod finder;
pub mod logging;
pub mod merge;
pub mod orchestrator;
pub mod pipeline;
pub mod region;

pub use axes::{AxisRole, AxisRoles};
pub use catalogue::SourceRecord;
pub use config::Configuration;
pub use cube::{CubeGeometry, WorldToPixel};
pub use error::{OptifindError, Result};
pub use finder::{ExternalFinder, Finder, RunStatus};
pub use merge::MergeSummary;
pub use orchestrator::{BatchReport, FailurePolicy, RunOrchestrator, RunResult};
pub use pipeline::{PipelineOptions, PipelineSummary};
pub use region::{AxisRange, Radii, Region, RegionDecision};
