use std::path::PathBuf;

use thiserror::Error;

use crate::finder::RunStatus;

#[derive(Debug, Error)]
pub enum OptifindError {
    #[error("{message}")]
    ConfigParse { message: String },

    #[error("Failed to read WCS from input data cube: {message}")]
    HeaderRead { message: String },

    #[error("Failed to identify {role} axis of data cube.")]
    AxisResolution { role: &'static str },

    #[error("{message}")]
    CatalogueParse { line: Option<usize>, message: String },

    #[error("Failed to convert position of source \"{id}\" to pixel coordinates: {message}")]
    WorldToPixel { id: String, message: String },

    #[error("Failed to write temporary SoFiA 2 parameter file {}", path.display())]
    TransientWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch '{program}'")]
    FinderLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SoFiA 2 run for source \"{id}\" failed: {status}")]
    FinderFailed { id: String, status: RunStatus },

    #[error("Failed to read SoFiA 2 catalogue: {}", path.display())]
    MergeRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write merged output catalogue {}", path.display())]
    MergeWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl OptifindError {
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
        }
    }

    pub fn header_read(message: impl Into<String>) -> Self {
        Self::HeaderRead {
            message: message.into(),
        }
    }

    pub fn catalogue(message: impl Into<String>) -> Self {
        Self::CatalogueParse {
            line: None,
            message: message.into(),
        }
    }

    pub fn catalogue_line(line: usize, message: impl Into<String>) -> Self {
        Self::CatalogueParse {
            line: Some(line),
            message: format!("line {}: {}", line, message.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, OptifindError>;
