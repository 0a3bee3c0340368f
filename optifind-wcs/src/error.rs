use thiserror::Error;

pub type WcsResult<T> = Result<T, WcsError>;

#[derive(Debug, Error)]
pub enum WcsError {
    #[error("Missing required WCS keyword: {keyword}")]
    MissingKeyword { keyword: String },

    #[error("Invalid WCS keyword '{keyword}': {message}")]
    InvalidKeyword { keyword: String, message: String },

    #[error("Unsupported projection: {code}")]
    UnsupportedProjection { code: String },

    #[error("Unsupported spectral algorithm '{code}' on axis {axis}")]
    UnsupportedAlgorithm { axis: usize, code: String },

    #[error("Singularity in transformation: {message}")]
    Singularity { message: String },

    #[error("Coordinate out of bounds: {message}")]
    OutOfBounds { message: String },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Non-invertible matrix (determinant = {determinant})")]
    NonInvertibleMatrix { determinant: f64 },

    #[error("Invalid FITS header: {message}")]
    InvalidHeader { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WcsError {
    pub fn missing_keyword(keyword: impl Into<String>) -> Self {
        Self::MissingKeyword {
            keyword: keyword.into(),
        }
    }

    pub fn invalid_keyword(keyword: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKeyword {
            keyword: keyword.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_projection(code: impl Into<String>) -> Self {
        Self::UnsupportedProjection { code: code.into() }
    }

    pub fn unsupported_algorithm(axis: usize, code: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm {
            axis,
            code: code.into(),
        }
    }

    pub fn singularity(message: impl Into<String>) -> Self {
        Self::Singularity {
            message: message.into(),
        }
    }

    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::OutOfBounds {
            message: message.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn non_invertible_matrix(determinant: f64) -> Self {
        Self::NonInvertibleMatrix { determinant }
    }

    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keyword() {
        let err = WcsError::missing_keyword("CRPIX3");
        assert!(err.to_string().contains("CRPIX3"));
    }

    #[test]
    fn test_invalid_keyword() {
        let err = WcsError::invalid_keyword("CTYPE1/CTYPE2", "mismatched projection codes");
        assert!(err.to_string().contains("CTYPE1/CTYPE2"));
        assert!(err.to_string().contains("mismatched projection codes"));
    }

    #[test]
    fn test_unsupported_algorithm_names_axis() {
        let err = WcsError::unsupported_algorithm(3, "F2W");
        let msg = err.to_string();
        assert!(msg.contains("F2W"));
        assert!(msg.contains("axis 3"));
    }

    #[test]
    fn test_invalid_header() {
        let err = WcsError::invalid_header("Missing END keyword");
        assert_eq!(err.to_string(), "Invalid FITS header: Missing END keyword");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "cube.fits");
        let err: WcsError = io.into();
        assert!(matches!(err, WcsError::Io(_)));
        assert!(err.to_string().contains("cube.fits"));
    }

    #[test]
    fn test_non_invertible_matrix() {
        let err = WcsError::non_invertible_matrix(0.0);
        assert!(err.to_string().contains("0"));
    }
}
