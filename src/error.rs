//! Error types for causal-bench
//!
//! ## Table of Contents
//! - **CausalError**: Main error enum covering all failure modes
//! - **ManifestViolation**: One problem found while scanning a simulation directory
//! - **Result**: Type alias for `Result<T, CausalError>`

use crate::data::DataType;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for causal-bench operations
pub type Result<T> = std::result::Result<T, CausalError>;

/// Main error type for causal-bench operations
#[derive(Error, Debug)]
pub enum CausalError {
    /// Invalid or incomplete configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A parameter key with no stored value and no registered default
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// A stored parameter value has the wrong type for the requested accessor
    #[error("parameter '{key}' holds a {actual}, expected {expected}")]
    ParameterType {
        /// Parameter key
        key: String,
        /// Requested type
        expected: &'static str,
        /// Type actually stored
        actual: &'static str,
    },

    /// A parameter value outside its declared bounds
    #[error("parameter '{key}' = {value} is out of range: {reason}")]
    ParameterRange {
        /// Parameter key
        key: String,
        /// Offending value, rendered
        value: String,
        /// Bound that was violated
        reason: String,
    },

    /// A score wrapper was handed data of the wrong kind
    #[error("data type mismatch: expected {expected} data, got {actual}")]
    DataTypeMismatch {
        /// Type declared by the wrapper
        expected: DataType,
        /// Type of the supplied data set
        actual: DataType,
    },

    /// Indexed access past the end of a sequence
    #[error("index {index} out of range for {len} {what}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Sequence length
        len: usize,
        /// What was being indexed
        what: &'static str,
    },

    /// Variable or node name not present
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// Malformed data or graph file
    #[error("parse error in {path}: {detail}")]
    Parse {
        /// File (or source label) being parsed
        path: String,
        /// What went wrong
        detail: String,
    },

    /// Simulation directory does not follow the expected layout
    #[error("invalid simulation directory {}: {}", .root.display(), join_violations(.violations))]
    Manifest {
        /// Root directory that was scanned
        root: PathBuf,
        /// Every violation found
        violations: Vec<ManifestViolation>,
    },

    /// Numerical failure (singular matrix, empty sample)
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Generic IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CausalError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error for a file or source label
    pub fn parse(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create a numerical error
    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }
}

/// A single problem found while scanning a simulation directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestViolation {
    /// The root path does not exist or is not a directory
    MissingRoot,
    /// A conventional entry exists but is a file, not a directory
    NotADirectory(String),
    /// `graph/` must hold exactly one file
    GraphFileCount(usize),
}

impl fmt::Display for ManifestViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot => write!(f, "root directory does not exist"),
            Self::NotADirectory(name) => write!(f, "'{}' is not a directory", name),
            Self::GraphFileCount(n) => {
                write!(f, "'graph' must contain exactly one file, found {}", n)
            }
        }
    }
}

fn join_violations(violations: &[ManifestViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_error_lists_every_violation() {
        let err = CausalError::Manifest {
            root: PathBuf::from("/tmp/sim"),
            violations: vec![
                ManifestViolation::NotADirectory("data_noise".into()),
                ManifestViolation::GraphFileCount(2),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("'data_noise' is not a directory"));
        assert!(msg.contains("found 2"));
    }

    #[test]
    fn test_data_type_mismatch_message() {
        let err = CausalError::DataTypeMismatch {
            expected: DataType::Continuous,
            actual: DataType::Discrete,
        };
        assert_eq!(
            err.to_string(),
            "data type mismatch: expected continuous data, got discrete"
        );
    }
}
