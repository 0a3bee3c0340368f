//! End-to-end runs of the pipeline against a synthetic cube.

use std::fs;
use std::path::{Path, PathBuf};

use optifind::merge::MERGED_CATALOGUE_NAME;
use optifind::pipeline::{self, PipelineOptions};
use optifind::{Configuration, FailurePolicy, Finder, OptifindError, Radii, Result, RunStatus};
use tempfile::TempDir;

const CARD: usize = 80;
const BLOCK: usize = 2880;

fn fits_header(cards: &[&str]) -> Vec<u8> {
    let mut data = Vec::new();
    for text in cards.iter().chain(std::iter::once(&"END")) {
        let mut card = [b' '; CARD];
        card[..text.len()].copy_from_slice(text.as_bytes());
        data.extend_from_slice(&card);
    }
    data.resize(data.len().div_ceil(BLOCK) * BLOCK, b' ');
    data
}

/// 100 x 100 x 64 x 1 cube, RA/DEC/FREQ/STOKES, reference pixel (51, 51, 1, 1).
fn write_cube(dir: &Path) -> PathBuf {
    let path = dir.join("cube.fits");
    let header = fits_header(&[
        "SIMPLE  =                    T",
        "BITPIX  =                  -32",
        "NAXIS   =                    4",
        "NAXIS1  =                  100",
        "NAXIS2  =                  100",
        "NAXIS3  =                   64",
        "NAXIS4  =                    1",
        "CTYPE1  = 'RA---SIN'",
        "CTYPE2  = 'DEC--SIN'",
        "CTYPE3  = 'FREQ    '",
        "CTYPE4  = 'STOKES  '",
        "CRPIX1  =                 51.0",
        "CRPIX2  =                 51.0",
        "CRPIX3  =                  1.0",
        "CRPIX4  =                  1.0",
        "CRVAL1  =                150.0",
        "CRVAL2  =                -30.0",
        "CRVAL3  =           1.420E+09",
        "CRVAL4  =                  1.0",
        "CDELT1  =               -0.002",
        "CDELT2  =                0.002",
        "CDELT3  =             1.00E+05",
        "CDELT4  =                  1.0",
    ]);
    fs::write(&path, header).unwrap();
    path
}

struct Workspace {
    dir: TempDir,
    output: PathBuf,
}

impl Workspace {
    fn new(template_extra: &str, sources: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cube = write_cube(dir.path());
        let output = dir.path().join("out");
        fs::create_dir(&output).unwrap();

        let template = format!(
            "# OptiFind test template\ninput.data = {}\ninput.region =\noutput.directory = {}\n{}",
            cube.display(),
            output.display(),
            template_extra
        );
        fs::write(dir.path().join("template.par"), template).unwrap();
        fs::write(dir.path().join("sources.csv"), sources).unwrap();
        Self { dir, output }
    }

    fn options(&self) -> PipelineOptions {
        let mut options = PipelineOptions::new(
            self.dir.path().join("template.par"),
            self.dir.path().join("sources.csv"),
            Radii::new(5, 3),
        );
        options.parameter_file = self.dir.path().join("params.tmp");
        options
    }

    fn merged(&self) -> PathBuf {
        self.output.join(MERGED_CATALOGUE_NAME)
    }
}

/// Stands in for SoFiA 2: reads the parameter file it is given and writes a
/// small catalogue where SoFiA 2 would.
#[derive(Default)]
struct CatalogueWritingFinder {
    parameter_sets: Vec<Configuration>,
}

impl Finder for CatalogueWritingFinder {
    fn run(&mut self, parameter_file: &Path) -> Result<RunStatus> {
        let config = Configuration::load(parameter_file)?;
        let dir = PathBuf::from(config.get("output.directory").unwrap());
        let name = config.get("output.filename").unwrap();
        let catalogue = format!(
            "# SoFiA 2.6.0\n# Source: {}\n#\n#  name  x  y  z\n\"{}_1\"  50.0  50.0  30.0\n\n\"{}_2\"  52.0  49.0  31.0\n",
            name, name, name
        );
        fs::write(dir.join(format!("{}_cat.txt", name)), catalogue).unwrap();
        self.parameter_sets.push(config);
        Ok(RunStatus::Success)
    }
}

// Source "in" lands on pixel (50.30, 50.35, 30.5, 0).
// Source "edge" lands on channel -1.5, so the clipped spectral window is 0..=2.
const TWO_SOURCES: &str = "\
# id, ra, dec, freq, stokes
in, 149.9993, -29.9993, 1.42305E+09, 1
edge, 150.0, -30.0, 1.41985E+09, 1
";

#[test]
fn one_run_one_skip_and_merged_catalogue() {
    let ws = Workspace::new("output.filename = hi\n", TWO_SOURCES);
    let mut finder = CatalogueWritingFinder::default();

    let summary = pipeline::run(&ws.options(), &mut finder).unwrap();

    assert_eq!(finder.parameter_sets.len(), 1);
    let params = &finder.parameter_sets[0];
    assert_eq!(params.get("input.region"), Some("45, 56, 45, 56, 27, 34"));
    assert_eq!(params.get("output.filename"), Some("hi_in"));
    assert_eq!(params.get("parameter.offset"), Some("true"));

    assert_eq!(summary.report.runs.len(), 1);
    assert_eq!(summary.report.skipped.len(), 1);
    assert_eq!(summary.report.skipped[0].id, "edge");
    assert_eq!(summary.report.skipped[0].region.spectral.upper, 2);

    let merge = summary.merge.unwrap();
    assert_eq!(merge.path, ws.merged());
    assert_eq!(merge.rows, 2);
    assert_eq!(
        fs::read_to_string(ws.merged()).unwrap(),
        "# SoFiA 2.6.0\n# Source: hi_in\n#\n#  name  x  y  z\n\n\
         \"hi_in_1\"  50.0  50.0  30.0\n\"hi_in_2\"  52.0  49.0  31.0\n"
    );
    assert!(!ws.dir.path().join("params.tmp").exists());
}

#[test]
fn rerun_does_not_duplicate_header() {
    let ws = Workspace::new("output.filename = hi\n", TWO_SOURCES);
    let mut finder = CatalogueWritingFinder::default();

    pipeline::run(&ws.options(), &mut finder).unwrap();
    let first = fs::read_to_string(ws.merged()).unwrap();
    pipeline::run(&ws.options(), &mut finder).unwrap();
    let second = fs::read_to_string(ws.merged()).unwrap();

    assert_eq!(first, second);
    assert_eq!(second.matches("# SoFiA 2.6.0").count(), 1);
}

#[test]
fn header_kept_once_across_runs() {
    let sources = "\
Source A/1, 149.9993, -29.9993, 1.42305E+09, 1
src B, 150.01, -29.99, 1.42205E+09, 1
";
    let ws = Workspace::new("output.filename =\n", sources);
    let mut finder = CatalogueWritingFinder::default();

    let summary = pipeline::run(&ws.options(), &mut finder).unwrap();
    let names: Vec<&str> = summary
        .report
        .runs
        .iter()
        .map(|r| r.output_filename.as_str())
        .collect();
    assert_eq!(names, vec!["optifind_Source_A-1", "optifind_src_B"]);

    let merged = fs::read_to_string(ws.merged()).unwrap();
    assert_eq!(merged.matches("# SoFiA 2.6.0").count(), 1);
    assert!(merged.contains("# Source: optifind_Source_A-1\n"));
    assert!(!merged.contains("# Source: optifind_src_B"));
    assert_eq!(summary.merge.unwrap().rows, 4);
}

#[test]
fn no_accepted_sources_writes_no_merged_catalogue() {
    let sources = "edge, 150.0, -30.0, 1.41985E+09, 1\n";
    let ws = Workspace::new("output.filename = hi\n", sources);
    let mut finder = CatalogueWritingFinder::default();

    let summary = pipeline::run(&ws.options(), &mut finder).unwrap();
    assert!(finder.parameter_sets.is_empty());
    assert!(summary.merge.is_none());
    assert!(!ws.merged().exists());
}

#[test]
fn text_catalogues_disabled_skips_merge() {
    let ws = Workspace::new(
        "output.filename = hi\noutput.writeCatASCII = false\n",
        TWO_SOURCES,
    );
    let mut finder = CatalogueWritingFinder::default();

    let summary = pipeline::run(&ws.options(), &mut finder).unwrap();
    assert_eq!(summary.report.runs.len(), 1);
    assert!(summary.merge.is_none());
    assert!(!ws.merged().exists());
}

#[test]
fn catalogue_dimension_mismatch_stops_before_any_run() {
    let ws = Workspace::new("", "a, 150.0, -30.0, 1.42E+09\n");
    let mut finder = CatalogueWritingFinder::default();

    let err = pipeline::run(&ws.options(), &mut finder).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Data cube is 4D, but 3 coordinate values given in catalogue."
    );
    assert!(finder.parameter_sets.is_empty());
}

#[test]
fn unreadable_cube_is_header_error() {
    let ws = Workspace::new("", TWO_SOURCES);
    fs::write(
        ws.dir.path().join("template.par"),
        "input.data = /nonexistent/cube.fits\n",
    )
    .unwrap();

    let err = pipeline::run(&ws.options(), CatalogueWritingFinder::default()).unwrap_err();
    assert!(matches!(err, OptifindError::HeaderRead { .. }));
}

/// Reports failure without writing anything.
struct FailingFinder;

impl Finder for FailingFinder {
    fn run(&mut self, _parameter_file: &Path) -> Result<RunStatus> {
        Ok(RunStatus::Failed { code: Some(1) })
    }
}

#[test]
fn lenient_failure_surfaces_at_merge() {
    let ws = Workspace::new("output.filename = hi\n", TWO_SOURCES);

    let err = pipeline::run(&ws.options(), FailingFinder).unwrap_err();
    match err {
        OptifindError::MergeRead { path, .. } => assert_eq!(path, ws.output.join("hi_in_cat.txt")),
        other => panic!("Expected MergeRead error, got {:?}", other),
    }
}

#[test]
fn strict_failure_aborts_batch() {
    let ws = Workspace::new("output.filename = hi\n", TWO_SOURCES);
    let mut options = ws.options();
    options.policy = FailurePolicy::Strict;

    let err = pipeline::run(&options, FailingFinder).unwrap_err();
    assert!(matches!(err, OptifindError::FinderFailed { .. }));
    assert!(!ws.dir.path().join("params.tmp").exists());
}

#[cfg(unix)]
#[test]
fn external_finder_script() {
    use optifind::ExternalFinder;

    let ws = Workspace::new("output.filename = hi\n", TWO_SOURCES);
    let script = ws.dir.path().join("fake_sofia.sh");
    fs::write(
        &script,
        "name=$(awk -F '\\t' '$1 == \"output.filename\" { print $3 }' \"$1\")\n\
         dir=$(awk -F '\\t' '$1 == \"output.directory\" { print $3 }' \"$1\")\n\
         printf '# fake\\n1 2 3\\n' > \"$dir/${name}_cat.txt\"\n",
    )
    .unwrap();

    let finder = ExternalFinder::new(&format!("/bin/sh {}", script.display())).unwrap();
    let summary = pipeline::run(&ws.options(), finder).unwrap();

    assert_eq!(summary.report.runs.len(), 1);
    assert!(summary.report.failed.is_empty());
    assert_eq!(
        fs::read_to_string(ws.merged()).unwrap(),
        "# fake\n\n1 2 3\n"
    );
}
