use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while validating, evaluating or persisting model parameters.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// A vector or matrix argument does not match the dimensionality of the parameters.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Grid bounds or sample counts that cannot describe a regular grid.
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// Arrays whose shapes disagree with each other (e.g. centers vs widths).
    #[error("Invalid shape for {what}: expected {expected:?}, got {actual:?}")]
    InvalidShape {
        what: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Values no function approximator can hold: NaN, infinities or non-positive widths.
    #[error("Invalid value for {what}: {reason}")]
    InvalidValue { what: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown model parameters kind: {0}")]
    UnknownKind(String),
}

impl ParamsError {
    pub(crate) fn dimension(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        ParamsError::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    pub(crate) fn shape(what: impl Into<String>, expected: &[usize], actual: &[usize]) -> Self {
        ParamsError::InvalidShape {
            what: what.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub(crate) fn value(what: impl Into<String>, reason: impl Into<String>) -> Self {
        ParamsError::InvalidValue {
            what: what.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ParamsError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ParamsError {
    fn from(err: serde_json::Error) -> Self {
        ParamsError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for ParamsError {
    fn from(err: bincode::Error) -> Self {
        ParamsError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ParamsError>;
