use std::fmt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{OptifindError, Result};

pub const DEFAULT_EXECUTABLE: &str = "sofia";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of one external finder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Non-zero exit; `None` when the process was ended by a signal.
    Failed { code: Option<i32> },
    TimedOut { after: Duration },
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    fn from_exit(status: ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::Failed {
                code: status.code(),
            }
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed { code: Some(code) } => write!(f, "exit code {}", code),
            Self::Failed { code: None } => write!(f, "terminated by signal"),
            Self::TimedOut { after } => write!(f, "timed out after {:.1} s", after.as_secs_f64()),
        }
    }
}

/// Runs the source finder on one parameter file and blocks until it is done.
pub trait Finder {
    fn run(&mut self, parameter_file: &Path) -> Result<RunStatus>;
}

impl<F: Finder + ?Sized> Finder for &mut F {
    fn run(&mut self, parameter_file: &Path) -> Result<RunStatus> {
        (**self).run(parameter_file)
    }
}

/// SoFiA 2 (or any program taking a parameter file as its last argument)
/// run as a child process. Output streams are inherited.
#[derive(Debug, Clone)]
pub struct ExternalFinder {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ExternalFinder {
    /// `command` is split on whitespace into the program and any leading
    /// arguments, e.g. `"mpirun -np 1 sofia"`.
    pub fn new(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next().ok_or_else(|| {
            OptifindError::InvalidArgument("SoFiA 2 executable name is empty".to_string())
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn launch_error(&self, source: std::io::Error) -> OptifindError {
        OptifindError::FinderLaunch {
            program: self.program.clone(),
            source,
        }
    }

    fn wait_with_timeout(&self, child: &mut Child, timeout: Duration) -> Result<RunStatus> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(|e| self.launch_error(e))? {
                return Ok(RunStatus::from_exit(status));
            }
            if start.elapsed() >= timeout {
                child.kill().map_err(|e| self.launch_error(e))?;
                child.wait().map_err(|e| self.launch_error(e))?;
                return Ok(RunStatus::TimedOut {
                    after: start.elapsed(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Finder for ExternalFinder {
    fn run(&mut self, parameter_file: &Path) -> Result<RunStatus> {
        debug!(
            "Running {} {} {}",
            self.program,
            self.args.join(" "),
            parameter_file.display()
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(parameter_file)
            .spawn()
            .map_err(|e| self.launch_error(e))?;

        match self.timeout {
            Some(timeout) => self.wait_with_timeout(&mut child, timeout),
            None => child
                .wait()
                .map(RunStatus::from_exit)
                .map_err(|e| self.launch_error(e)),
        }
    }
}
