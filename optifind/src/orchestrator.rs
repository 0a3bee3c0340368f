use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::catalogue::SourceRecord;
use crate::config::Configuration;
use crate::cube::CubeGeometry;
use crate::error::{OptifindError, Result};
use crate::finder::Finder;
use crate::region::{self, Radii, Region, RegionDecision};

pub const DEFAULT_PARAMETER_FILE: &str = "sofia_optifind_parameter_file.tmp";

/// Makes a source id safe for use in file names.
pub fn sanitize_id(id: &str) -> String {
    id.replace(' ', "_").replace('/', "-")
}

/// `<template>_<id>`, or `optifind_<id>` when the template leaves
/// `output.filename` blank.
pub fn output_filename(template: Option<&str>, id: &str) -> String {
    let base = match template.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => "optifind",
    };
    format!("{}_{}", base, sanitize_id(id))
}

/// Parameter set for one run: the template with the sub-region, the per-source
/// output name and `parameter.offset = true`.
pub fn per_source_configuration(template: &Configuration, id: &str, region: &Region) -> Configuration {
    let filename = output_filename(template.get("output.filename"), id);
    template
        .with_override("input.region", region.to_string())
        .with_override("output.filename", filename)
        .with_override("parameter.offset", "true")
}

/// Parameter file on disk for the duration of one run. Removed on drop.
#[derive(Debug)]
pub struct TransientParameterFile {
    path: PathBuf,
}

impl TransientParameterFile {
    /// A failed write removes whatever part of the file was created.
    pub fn write(path: impl Into<PathBuf>, config: &Configuration) -> Result<Self> {
        let file = Self { path: path.into() };
        fs::write(&file.path, config.to_parameter_file_string()).map_err(|source| {
            OptifindError::TransientWrite {
                path: file.path.clone(),
                source,
            }
        })?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientParameterFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(
                    "Failed to remove temporary parameter file {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// What to do when a finder run fails to launch, exits non-zero or times out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log a warning and carry on with the next source.
    #[default]
    Lenient,
    /// Abort the batch.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub id: String,
    /// Base name of the run's output products.
    pub output_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub id: String,
    pub region: Region,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRun {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub runs: Vec<RunResult>,
    pub skipped: Vec<SkippedSource>,
    pub failed: Vec<FailedRun>,
}

pub struct RunOrchestrator<'a, F: Finder> {
    template: &'a Configuration,
    cube: &'a CubeGeometry,
    radii: Radii,
    finder: F,
    parameter_file: PathBuf,
    policy: FailurePolicy,
}

impl<'a, F: Finder> RunOrchestrator<'a, F> {
    pub fn new(template: &'a Configuration, cube: &'a CubeGeometry, radii: Radii, finder: F) -> Self {
        Self {
            template,
            cube,
            radii,
            finder,
            parameter_file: PathBuf::from(DEFAULT_PARAMETER_FILE),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_parameter_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.parameter_file = path.into();
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn finder(&self) -> &F {
        &self.finder
    }

    /// Processes the sources one after another, in catalogue order.
    pub fn run(&mut self, sources: &[SourceRecord]) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for source in sources {
            match region::compute(source, self.cube, self.radii)? {
                RegionDecision::Accepted(region) => {
                    let run = self.run_source(source, &region, &mut report)?;
                    report.runs.push(run);
                }
                RegionDecision::Rejected(region) => {
                    info!("Skipping source \"{}\": outside bounds.", source.id());
                    report.skipped.push(SkippedSource {
                        id: source.id().to_string(),
                        region,
                    });
                }
            }
        }
        Ok(report)
    }

    fn run_source(
        &mut self,
        source: &SourceRecord,
        region: &Region,
        report: &mut BatchReport,
    ) -> Result<RunResult> {
        info!("Processing source \"{}\"", source.id());
        info!("  Region: {}", region);

        let config = per_source_configuration(self.template, source.id(), region);
        let run = RunResult {
            id: source.id().to_string(),
            output_filename: config.get("output.filename").unwrap_or_default().to_string(),
        };

        let outcome = {
            let file = TransientParameterFile::write(&self.parameter_file, &config)?;
            self.finder.run(file.path())
        };

        let failure = match outcome {
            Ok(status) if status.is_success() => None,
            Ok(status) => match self.policy {
                FailurePolicy::Strict => {
                    return Err(OptifindError::FinderFailed {
                        id: run.id,
                        status,
                    })
                }
                FailurePolicy::Lenient => Some(status.to_string()),
            },
            Err(e) => match self.policy {
                FailurePolicy::Strict => return Err(e),
                FailurePolicy::Lenient => Some(format!("{:#}", anyhow::Error::from(e))),
            },
        };

        if let Some(reason) = failure {
            warn!("SoFiA 2 run for source \"{}\" failed: {}", run.id, reason);
            report.failed.push(FailedRun {
                id: run.id.clone(),
                reason,
            });
        }
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::tests::identity_cube;
    use crate::finder::RunStatus;

    /// Records every parameter file it is handed and answers with a fixed status.
    struct RecordingFinder {
        seen: Vec<String>,
        status: RunStatus,
    }

    impl RecordingFinder {
        fn new(status: RunStatus) -> Self {
            Self {
                seen: Vec::new(),
                status,
            }
        }
    }

    impl Finder for RecordingFinder {
        fn run(&mut self, parameter_file: &Path) -> Result<RunStatus> {
            self.seen.push(fs::read_to_string(parameter_file).unwrap());
            Ok(self.status.clone())
        }
    }

    fn template() -> Configuration {
        Configuration::parse("input.data = cube.fits\noutput.filename = cube_out\ninput.region =\n")
            .unwrap()
    }

    fn sources() -> Vec<SourceRecord> {
        vec![
            SourceRecord::new("Source A/1", vec![50.0, 40.0, 30.0]),
            SourceRecord::new("edge", vec![-1.0, 40.0, 30.0]),
            SourceRecord::new("42", vec![20.0, 20.0, 10.0]),
        ]
    }

    #[test]
    fn sanitizes_spaces_and_slashes() {
        assert_eq!(sanitize_id("Source A/1"), "Source_A-1");
        assert_eq!(sanitize_id("plain"), "plain");
    }

    #[test]
    fn output_filename_derivation() {
        assert_eq!(output_filename(Some("cube_out"), "42"), "cube_out_42");
        assert_eq!(output_filename(Some(""), "42"), "optifind_42");
        assert_eq!(output_filename(None, "42"), "optifind_42");
    }

    #[test]
    fn per_source_configuration_overrides() {
        let region = Region {
            spatial1: region::AxisRange { lower: 1, upper: 2 },
            spatial2: region::AxisRange { lower: 3, upper: 4 },
            spectral: region::AxisRange { lower: 5, upper: 6 },
        };
        let config = per_source_configuration(&template(), "Source A/1", &region);
        assert_eq!(
            config.to_parameter_file_string(),
            "input.data\t=\tcube.fits\n\
             output.filename\t=\tcube_out_Source_A-1\n\
             input.region\t=\t1, 2, 3, 4, 5, 6\n\
             parameter.offset\t=\ttrue\n"
        );
    }

    #[test]
    fn runs_accepted_sources_and_skips_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let param = dir.path().join("params.tmp");
        let cube = identity_cube(&["RA", "DEC", "FREQ"], &[100, 80, 64]);
        let template = template();

        let mut orchestrator =
            RunOrchestrator::new(&template, &cube, Radii::new(5, 3), RecordingFinder::new(RunStatus::Success))
                .with_parameter_file(&param);
        let report = orchestrator.run(&sources()).unwrap();

        let names: Vec<&str> = report.runs.iter().map(|r| r.output_filename.as_str()).collect();
        assert_eq!(names, vec!["cube_out_Source_A-1", "cube_out_42"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].id, "edge");
        assert!(report.failed.is_empty());

        let seen = &orchestrator.finder().seen;
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("input.region\t=\t45, 55, 35, 45, 27, 33\n"));
        assert!(seen[1].contains("output.filename\t=\tcube_out_42\n"));
        assert!(!param.exists());
    }

    #[test]
    fn lenient_policy_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cube = identity_cube(&["RA", "DEC", "FREQ"], &[100, 80, 64]);
        let template = template();

        let mut orchestrator = RunOrchestrator::new(
            &template,
            &cube,
            Radii::new(5, 3),
            RecordingFinder::new(RunStatus::Failed { code: Some(1) }),
        )
        .with_parameter_file(dir.path().join("params.tmp"));
        let report = orchestrator.run(&sources()).unwrap();

        assert_eq!(report.runs.len(), 2);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].reason, "exit code 1");
        assert!(!dir.path().join("params.tmp").exists());
    }

    #[test]
    fn strict_policy_aborts_on_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cube = identity_cube(&["RA", "DEC", "FREQ"], &[100, 80, 64]);
        let template = template();

        let mut orchestrator = RunOrchestrator::new(
            &template,
            &cube,
            Radii::new(5, 3),
            RecordingFinder::new(RunStatus::Failed { code: Some(1) }),
        )
        .with_parameter_file(dir.path().join("params.tmp"))
        .with_policy(FailurePolicy::Strict);
        let err = orchestrator.run(&sources()).unwrap_err();

        assert!(matches!(err, OptifindError::FinderFailed { ref id, .. } if id == "Source A/1"));
        assert_eq!(orchestrator.finder().seen.len(), 1);
        assert!(!dir.path().join("params.tmp").exists());
    }

    #[test]
    fn unwritable_parameter_file_is_fatal() {
        let cube = identity_cube(&["RA", "DEC", "FREQ"], &[100, 80, 64]);
        let template = template();
        let mut orchestrator = RunOrchestrator::new(
            &template,
            &cube,
            Radii::new(5, 3),
            RecordingFinder::new(RunStatus::Success),
        )
        .with_parameter_file("/nonexistent/dir/params.tmp");
        let err = orchestrator.run(&sources()).unwrap_err();
        assert!(matches!(err, OptifindError::TransientWrite { .. }));
    }

    #[test]
    fn transient_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.tmp");
        {
            let file = TransientParameterFile::write(&path, &template()).unwrap();
            assert!(file.path().exists());
        }
        assert!(!path.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_write_leaves_no_file_behind() {
        // /dev/full opens fine and fails every write with ENOSPC.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.tmp");
        std::os::unix::fs::symlink("/dev/full", &path).unwrap();

        let err = TransientParameterFile::write(&path, &template()).unwrap_err();
        assert!(matches!(err, OptifindError::TransientWrite { .. }));
        assert!(fs::symlink_metadata(&path).is_err());
        assert!(Path::new("/dev/full").exists());
    }

    /// Fails every launch the way a missing executable does.
    struct UnlaunchableFinder;

    impl Finder for UnlaunchableFinder {
        fn run(&mut self, _parameter_file: &Path) -> Result<RunStatus> {
            Err(OptifindError::FinderLaunch {
                program: "sofia".to_string(),
                source: std::io::Error::new(ErrorKind::NotFound, "No such file or directory"),
            })
        }
    }

    #[test]
    fn lenient_launch_failure_keeps_cause() {
        let dir = tempfile::tempdir().unwrap();
        let cube = identity_cube(&["RA", "DEC", "FREQ"], &[100, 80, 64]);
        let template = template();

        let mut orchestrator =
            RunOrchestrator::new(&template, &cube, Radii::new(5, 3), UnlaunchableFinder)
                .with_parameter_file(dir.path().join("params.tmp"));
        let report = orchestrator.run(&sources()).unwrap();

        assert_eq!(report.failed.len(), 2);
        assert_eq!(
            report.failed[0].reason,
            "Failed to launch 'sofia': No such file or directory"
        );
    }
}
