use std::path::PathBuf;

use tracing::debug;

use crate::catalogue;
use crate::config::Configuration;
use crate::cube::CubeGeometry;
use crate::error::{OptifindError, Result};
use crate::finder::Finder;
use crate::merge::{self, MergeSummary};
use crate::orchestrator::{BatchReport, FailurePolicy, RunOrchestrator, DEFAULT_PARAMETER_FILE};
use crate::region::Radii;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// SoFiA 2 template parameter file.
    pub template: PathBuf,
    pub source_list: PathBuf,
    pub radii: Radii,
    pub policy: FailurePolicy,
    /// Where each run's parameter file is written.
    pub parameter_file: PathBuf,
}

impl PipelineOptions {
    pub fn new(template: impl Into<PathBuf>, source_list: impl Into<PathBuf>, radii: Radii) -> Self {
        Self {
            template: template.into(),
            source_list: source_list.into(),
            radii,
            policy: FailurePolicy::default(),
            parameter_file: PathBuf::from(DEFAULT_PARAMETER_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub report: BatchReport,
    pub merge: Option<MergeSummary>,
}

/// Text catalogues are merged unless the template turns them off; SoFiA 2
/// writes them by default.
pub fn text_catalogues_enabled(config: &Configuration) -> bool {
    config
        .get("output.writeCatASCII")
        .map_or(true, |value| value.eq_ignore_ascii_case("true"))
}

/// Directory holding the per-run catalogues. Blank means the working directory.
pub fn output_directory(config: &Configuration) -> PathBuf {
    PathBuf::from(config.get("output.directory").unwrap_or_default())
}

/// Reads the template, cube header and source list, runs the finder on every
/// source that fits inside the cube and merges the resulting catalogues.
pub fn run<F: Finder>(options: &PipelineOptions, finder: F) -> Result<PipelineSummary> {
    let config = Configuration::load(&options.template)?;
    debug!("Read {} parameter settings", config.len());

    let cube_path = config
        .get("input.data")
        .filter(|path| !path.is_empty())
        .ok_or_else(|| OptifindError::header_read("input.data is not set"))?;
    let cube = CubeGeometry::open(cube_path)?;

    let sources = catalogue::load(&options.source_list, cube.naxis() + 1)?;
    debug!("Read {} sources", sources.len());

    let mut orchestrator = RunOrchestrator::new(&config, &cube, options.radii, finder)
        .with_parameter_file(&options.parameter_file)
        .with_policy(options.policy);
    let report = orchestrator.run(&sources)?;

    let merge = merge::merge(
        &report.runs,
        &output_directory(&config),
        text_catalogues_enabled(&config),
    )?;

    Ok(PipelineSummary { report, merge })
}
