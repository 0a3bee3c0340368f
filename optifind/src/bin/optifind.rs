//! optifind: catalogue-driven source finding with SoFiA 2.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::error::ErrorKind;
use clap::Parser;
use optifind::finder::DEFAULT_EXECUTABLE;
use optifind::orchestrator::DEFAULT_PARAMETER_FILE;
use optifind::{logging, pipeline, ExternalFinder, FailurePolicy, PipelineOptions, Radii};
use tracing::info;

const INSTRUCTIONS: &str = "
 Usage:
   optifind <par_file> <source_list> <r_spat> <r_spec> [<sofia_exe>]

 Arguments:
   <par_file>     Name of the SoFiA 2 control parameter file to be used.
   <source_list>  Name of the input source catalogue file.
   <r_spat>       Spatial radius of the sub-region in pixels.
   <r_spec>       Spectral radius of the sub-region in channels.
   <sofia_exe>    Optional name of the SoFiA 2 executable. Default: sofia.

 Options:
   --strict                 Stop at the first SoFiA 2 run that fails.
   --timeout <SECONDS>      Kill SoFiA 2 runs that take longer than this.
   --parameter-file <PATH>  Temporary parameter file written for each run.
                            Default: sofia_optifind_parameter_file.tmp
   -v, --verbose            Print debug output.

 OptiFind runs SoFiA 2 on sub-regions of a data cube centred on the positions
 from a user-supplied source catalogue. Every run uses the same template para-
 meter file, which must name the input data cube and can define an output file
 name to be used as the base name for all output.

 The source catalogue lists one source per line as comma-separated values:

   id, coord_1, coord_2, coord_3, ...

 id is a unique source identifier used to name the output products, and coord_n
 is the world coordinate of the source along axis n of the cube, in the units
 given in the FITS header (e.g. degrees for right ascension and Hz for fre-
 quency). A value is required for every cube axis, in header order, so a cube
 with right ascension, declination, frequency and Stokes axes needs four.

 Each run writes its own output products named either \"optifind\" or
 output.filename, followed by an underscore and the source id. Sources whose
 sub-region would be cut short by the cube edge are skipped.

 After all runs, the plain-text catalogues are merged into
 \"optifind_merged_catalogue.txt\" in the output directory. XML and SQL
 catalogues are not merged.
";

#[derive(Parser)]
#[command(name = "optifind")]
#[command(about = "Catalogue-based source finding with SoFiA 2")]
#[command(version)]
struct Cli {
    /// SoFiA 2 template parameter file
    par_file: Option<PathBuf>,

    /// Comma-separated source list
    source_list: Option<PathBuf>,

    /// Spatial radius of the sub-region in pixels
    #[arg(allow_hyphen_values = true)]
    r_spat: Option<String>,

    /// Spectral radius of the sub-region in channels
    #[arg(allow_hyphen_values = true)]
    r_spec: Option<String>,

    /// SoFiA 2 executable, optionally with leading arguments
    sofia_exe: Option<String>,

    /// Abort the batch on the first failed SoFiA 2 run
    #[arg(long)]
    strict: bool,

    /// Kill SoFiA 2 runs exceeding this many seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<f64>,

    /// Temporary parameter file written for each run
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PARAMETER_FILE)]
    parameter_file: PathBuf,

    /// Print debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match parse_failure(&e) {
            Some(message) => {
                eprintln!("ERROR: {}", message);
                return ExitCode::FAILURE;
            }
            None => e.exit(),
        },
    };

    let (Some(par_file), Some(source_list), Some(r_spat), Some(r_spec)) =
        (&cli.par_file, &cli.source_list, &cli.r_spat, &cli.r_spec)
    else {
        print!("{}", INSTRUCTIONS);
        println!();
        return ExitCode::SUCCESS;
    };

    logging::init(cli.verbose);

    match run(&cli, par_file, source_list, r_spat, r_spec) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(
    cli: &Cli,
    par_file: &Path,
    source_list: &Path,
    r_spat: &str,
    r_spec: &str,
) -> anyhow::Result<()> {
    let radii = Radii::new(
        parse_radius(r_spat, "spatial")?,
        parse_radius(r_spec, "spectral")?,
    );
    let timeout = cli.timeout.map(parse_timeout).transpose()?;

    let finder = ExternalFinder::new(cli.sofia_exe.as_deref().unwrap_or(DEFAULT_EXECUTABLE))?
        .with_timeout(timeout);

    let mut options = PipelineOptions::new(par_file, source_list, radii);
    options.policy = if cli.strict {
        FailurePolicy::Strict
    } else {
        FailurePolicy::Lenient
    };
    options.parameter_file = cli.parameter_file.clone();

    let summary = pipeline::run(&options, finder)?;

    info!(
        "Processed {} source(s), skipped {}, {} failed run(s).",
        summary.report.runs.len(),
        summary.report.skipped.len(),
        summary.report.failed.len()
    );
    if let Some(merge) = &summary.merge {
        info!(
            "Merged {} row(s) from {} catalogue(s).",
            merge.rows, merge.catalogues
        );
    }
    Ok(())
}

/// One-line message for a command-line error, or `None` for `--help` and
/// `--version`, which clap prints and exits on itself.
fn parse_failure(e: &clap::Error) -> Option<String> {
    if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        return None;
    }
    let rendered = e.to_string();
    let first = rendered.lines().next().unwrap_or_default().trim();
    Some(first.strip_prefix("error:").unwrap_or(first).trim().to_string())
}

fn parse_radius(value: &str, which: &str) -> anyhow::Result<u32> {
    let radius: i64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} radius: '{}'", which, value))?;
    u32::try_from(radius).map_err(|_| anyhow!("Invalid {} radius: {} (must be 0 or greater)", which, radius))
}

fn parse_timeout(seconds: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| anyhow!("Invalid timeout: {} (must be a positive number of seconds)", seconds))
}
