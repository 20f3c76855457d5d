//! Parameter store shared by every plugin
//!
//! ## Table of Contents
//! - **ParamValue**: Typed value held under a key
//! - **Parameters**: Mutable key/value store with typed accessors
//! - **ParamDescriptor**: Registered description, default and bounds of a known key
//! - **SharedParameters**: Lock-guarded handle that editors bind to
//! - **keys**: Names of the keys the built-in plugins read

use crate::error::{CausalError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Handle to a store that several components read and write
pub type SharedParameters = Arc<RwLock<Parameters>>;

/// Names of the keys read by the built-in plugins
pub mod keys {
    /// Number of time lags for time-series searches
    pub const NUM_TIME_LAGS: &str = "numTimeLags";
    /// Significance level for the Fisher Z score
    pub const ALPHA: &str = "alpha";
    /// Multiplier on the BIC complexity penalty
    pub const PENALTY_DISCOUNT: &str = "penaltyDiscount";
    /// Expected number of parents per node; 0 disables the structure prior
    pub const STRUCTURE_PRIOR: &str = "structurePrior";
    /// Discretize continuous parents of discrete children
    pub const DISCRETIZE: &str = "discretize";
    /// Bin count used when discretizing
    pub const NUM_CATEGORIES_TO_DISCRETIZE: &str = "numCategoriesToDiscretize";
    /// Number of data sets in a simulation
    pub const NUM_RUNS: &str = "numRuns";
    /// Number of measured variables in a generated model
    pub const NUM_MEASURES: &str = "numMeasures";
    /// Average node degree of a generated graph
    pub const AVG_DEGREE: &str = "avgDegree";
    /// Rows per generated data set
    pub const SAMPLE_SIZE: &str = "sampleSize";
    /// RNG seed; negative means seed from entropy
    pub const SEED: &str = "seed";
}

// ============================================================================
// ParamValue
// ============================================================================

/// A value stored under a parameter key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag
    Bool(bool),
    /// Integer (counts, lags, seeds)
    Int(i64),
    /// Floating point (significance levels, penalties)
    Double(f64),
    /// Free text
    Str(String),
}

impl ParamValue {
    /// Name of the variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Double(_) => "double",
            Self::Str(_) => "string",
        }
    }

    /// Infer a typed value from text: bool, then integer, then double, then string
    pub fn infer(s: &str) -> Self {
        let s = s.trim();
        if let Ok(b) = s.parse::<bool>() {
            return Self::Bool(b);
        }
        if let Ok(i) = s.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Self::Double(f);
        }
        Self::Str(s.to_string())
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Double(d) => write!(f, "{}", d),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

// ============================================================================
// ParamDescriptor
// ============================================================================

/// Registered metadata for a known parameter key
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    /// Parameter key
    pub key: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Value used when the store holds nothing for this key
    pub default: ParamValue,
    /// Inclusive lower bound for numeric values
    pub lower: Option<f64>,
    /// Inclusive upper bound for numeric values
    pub upper: Option<f64>,
}

impl ParamDescriptor {
    /// Look up the descriptor for a key
    pub fn find(key: &str) -> Option<&'static ParamDescriptor> {
        DESCRIPTORS.iter().find(|d| d.key == key)
    }

    /// All registered descriptors
    pub fn all() -> &'static [ParamDescriptor] {
        &DESCRIPTORS
    }

    /// Check that a value has the default's type and lies within bounds
    pub fn check(&self, value: &ParamValue) -> Result<()> {
        let type_ok = match (&self.default, value) {
            (ParamValue::Double(_), ParamValue::Int(_)) => true,
            (expected, actual) => {
                std::mem::discriminant(expected) == std::mem::discriminant(actual)
            }
        };
        if !type_ok {
            return Err(CausalError::ParameterType {
                key: self.key.to_string(),
                expected: self.default.type_name(),
                actual: value.type_name(),
            });
        }

        if let Some(v) = value.as_f64() {
            if !v.is_finite() {
                return Err(self.out_of_range(value, "must be finite".to_string()));
            }
            if let Some(lower) = self.lower {
                if v < lower {
                    return Err(self.out_of_range(value, format!("must be >= {}", lower)));
                }
            }
            if let Some(upper) = self.upper {
                if v > upper {
                    return Err(self.out_of_range(value, format!("must be <= {}", upper)));
                }
            }
        }
        Ok(())
    }

    fn out_of_range(&self, value: &ParamValue, reason: String) -> CausalError {
        CausalError::ParameterRange {
            key: self.key.to_string(),
            value: value.to_string(),
            reason,
        }
    }
}

static DESCRIPTORS: [ParamDescriptor; 11] = [
    ParamDescriptor {
        key: keys::NUM_TIME_LAGS,
        description: "Number of time lags",
        default: ParamValue::Int(1),
        lower: Some(0.0),
        upper: None,
    },
    ParamDescriptor {
        key: keys::ALPHA,
        description: "Significance level for independence judgements",
        default: ParamValue::Double(0.001),
        lower: Some(0.0),
        upper: Some(1.0),
    },
    ParamDescriptor {
        key: keys::PENALTY_DISCOUNT,
        description: "Penalty discount on the BIC complexity term",
        default: ParamValue::Double(1.0),
        lower: Some(0.0),
        upper: None,
    },
    ParamDescriptor {
        key: keys::STRUCTURE_PRIOR,
        description: "Expected number of parents per node (0 = uniform prior)",
        default: ParamValue::Double(0.0),
        lower: Some(0.0),
        upper: None,
    },
    ParamDescriptor {
        key: keys::DISCRETIZE,
        description: "Discretize continuous parents of discrete children",
        default: ParamValue::Bool(true),
        lower: None,
        upper: None,
    },
    ParamDescriptor {
        key: keys::NUM_CATEGORIES_TO_DISCRETIZE,
        description: "Number of categories used when discretizing",
        default: ParamValue::Int(3),
        lower: Some(2.0),
        upper: None,
    },
    ParamDescriptor {
        key: keys::NUM_RUNS,
        description: "Number of data sets",
        default: ParamValue::Int(1),
        lower: Some(1.0),
        upper: None,
    },
    ParamDescriptor {
        key: keys::NUM_MEASURES,
        description: "Number of measured variables",
        default: ParamValue::Int(5),
        lower: Some(1.0),
        upper: None,
    },
    ParamDescriptor {
        key: keys::AVG_DEGREE,
        description: "Average degree of the generated graph",
        default: ParamValue::Double(1.0),
        lower: Some(0.0),
        upper: None,
    },
    ParamDescriptor {
        key: keys::SAMPLE_SIZE,
        description: "Rows per generated data set",
        default: ParamValue::Int(500),
        lower: Some(1.0),
        upper: None,
    },
    ParamDescriptor {
        key: keys::SEED,
        description: "Random seed (negative = seed from entropy)",
        default: ParamValue::Int(-1),
        lower: None,
        upper: None,
    },
];

// ============================================================================
// Parameters
// ============================================================================

/// Mutable key/value store read by every plugin
///
/// Writes are visible to the next read. There is no transactional
/// behaviour; wrap in [`SharedParameters`] to share across components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    values: HashMap<String, ParamValue>,
}

impl Parameters {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the store in a shared, lock-guarded handle
    pub fn into_shared(self) -> SharedParameters {
        Arc::new(RwLock::new(self))
    }

    /// Raw stored value, if any
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Store a value, replacing whatever was there
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`Parameters::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Whether a value is stored under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove and return the stored value
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(key)
    }

    /// Stored keys, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Integer value, or `default` when absent
    pub fn get_int(&self, key: &str, default: i64) -> Result<i64> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Int(i)) => Ok(*i),
            Some(other) => Err(type_error(key, "integer", other)),
        }
    }

    /// Integer value, or the registered default when absent
    pub fn get_int_registered(&self, key: &str) -> Result<i64> {
        match self.resolve(key)? {
            ParamValue::Int(i) => Ok(i),
            other => Err(type_error(key, "integer", &other)),
        }
    }

    /// Double value, or the registered default when absent; integers coerce
    pub fn get_double(&self, key: &str) -> Result<f64> {
        let value = self.resolve(key)?;
        value
            .as_f64()
            .ok_or_else(|| type_error(key, "double", &value))
    }

    /// Boolean value, or the registered default when absent
    pub fn get_boolean(&self, key: &str) -> Result<bool> {
        match self.resolve(key)? {
            ParamValue::Bool(b) => Ok(b),
            other => Err(type_error(key, "boolean", &other)),
        }
    }

    /// Any value rendered as text, or the registered default when absent
    pub fn get_string(&self, key: &str) -> Result<String> {
        Ok(self.resolve(key)?.to_string())
    }

    /// Stored value or registered default, checked against the descriptor
    pub fn validated(&self, key: &str) -> Result<ParamValue> {
        let value = self.resolve(key)?;
        if let Some(descriptor) = ParamDescriptor::find(key) {
            descriptor.check(&value)?;
        }
        Ok(value)
    }

    /// [`Parameters::validated`] as a double
    pub fn validated_double(&self, key: &str) -> Result<f64> {
        self.validated(key)?;
        self.get_double(key)
    }

    /// [`Parameters::validated`] as an integer
    pub fn validated_int(&self, key: &str) -> Result<i64> {
        self.validated(key)?;
        self.get_int_registered(key)
    }

    /// [`Parameters::validated`] as a boolean
    pub fn validated_bool(&self, key: &str) -> Result<bool> {
        self.validated(key)?;
        self.get_boolean(key)
    }

    fn resolve(&self, key: &str) -> Result<ParamValue> {
        if let Some(v) = self.values.get(key) {
            return Ok(v.clone());
        }
        ParamDescriptor::find(key)
            .map(|d| d.default.clone())
            .ok_or_else(|| CausalError::UnknownParameter(key.to_string()))
    }

    /// Apply a `key=value` assignment, inferring the value's type
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            CausalError::config(format!("expected key=value, got '{}'", assignment))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CausalError::config(format!(
                "empty key in assignment '{}'",
                assignment
            )));
        }
        self.set(key, ParamValue::infer(value));
        Ok(())
    }

    /// Load a flat parameter file (`.toml` or `.json`)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let params: Parameters = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&contents)?,
            Some("json") => serde_json::from_str(&contents)?,
            Some(ext) => {
                return Err(CausalError::config(format!(
                    "unsupported parameter file extension: .{}",
                    ext
                )))
            }
            None => {
                return Err(CausalError::config(
                    "parameter file has no extension to detect format",
                ))
            }
        };
        debug!(path = %path.display(), count = params.len(), "Parameters loaded");
        Ok(params)
    }

    /// Write the store as pretty-printed JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn type_error(key: &str, expected: &'static str, actual: &ParamValue) -> CausalError {
    CausalError::ParameterType {
        key: key.to_string(),
        expected,
        actual: actual.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_overwrites_and_is_visible() {
        let mut params = Parameters::new();
        params.set(keys::ALPHA, 0.05);
        params.set(keys::ALPHA, 0.01);
        assert_eq!(params.get_double(keys::ALPHA).unwrap(), 0.01);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_get_int_default_when_absent() {
        let params = Parameters::new();
        assert_eq!(params.get_int(keys::NUM_TIME_LAGS, 4).unwrap(), 4);
        assert_eq!(params.get_int_registered(keys::NUM_TIME_LAGS).unwrap(), 1);
    }

    #[test]
    fn test_registered_defaults() {
        let params = Parameters::new();
        assert_eq!(params.get_double(keys::ALPHA).unwrap(), 0.001);
        assert!(params.get_boolean(keys::DISCRETIZE).unwrap());
        assert!(matches!(
            params.get_double("noSuchKey"),
            Err(CausalError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let params = Parameters::new().with(keys::DISCRETIZE, "yes");
        let err = params.get_boolean(keys::DISCRETIZE).unwrap_err();
        assert!(matches!(
            err,
            CausalError::ParameterType { expected: "boolean", actual: "string", .. }
        ));
        assert!(params.get_int(keys::DISCRETIZE, 0).is_err());
    }

    #[test]
    fn test_int_coerces_to_double() {
        let params = Parameters::new().with(keys::PENALTY_DISCOUNT, 2);
        assert_eq!(params.get_double(keys::PENALTY_DISCOUNT).unwrap(), 2.0);
    }

    #[test]
    fn test_validated_bounds() {
        let params = Parameters::new().with(keys::ALPHA, 1.5);
        assert!(matches!(
            params.validated(keys::ALPHA),
            Err(CausalError::ParameterRange { .. })
        ));

        let params = Parameters::new().with(keys::NUM_CATEGORIES_TO_DISCRETIZE, 4);
        assert_eq!(
            params.validated(keys::NUM_CATEGORIES_TO_DISCRETIZE).unwrap(),
            ParamValue::Int(4)
        );
    }

    #[test]
    fn test_non_finite_values_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let params = Parameters::new().with(keys::ALPHA, bad);
            assert!(matches!(
                params.validated_double(keys::ALPHA),
                Err(CausalError::ParameterRange { .. })
            ));
        }
        // No upper bound on avgDegree, infinity still fails
        let params = Parameters::new().with(keys::AVG_DEGREE, f64::INFINITY);
        assert!(params.validated(keys::AVG_DEGREE).is_err());
    }

    #[test]
    fn test_nan_from_toml_fails_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.toml");
        std::fs::write(&path, "alpha = nan\n").unwrap();
        let params = Parameters::load(&path).unwrap();
        assert!(params.validated_double(keys::ALPHA).is_err());
    }

    #[test]
    fn test_infer() {
        assert_eq!(ParamValue::infer("true"), ParamValue::Bool(true));
        assert_eq!(ParamValue::infer("42"), ParamValue::Int(42));
        assert_eq!(ParamValue::infer("0.05"), ParamValue::Double(0.05));
        assert_eq!(ParamValue::infer("fges"), ParamValue::Str("fges".into()));
    }

    #[test]
    fn test_apply_assignment() {
        let mut params = Parameters::new();
        params.apply_assignment("numRuns = 7").unwrap();
        assert_eq!(params.get(keys::NUM_RUNS), Some(&ParamValue::Int(7)));
        assert!(params.apply_assignment("novalue").is_err());
        assert!(params.apply_assignment("=3").is_err());
    }

    #[test]
    fn test_load_toml_and_json() {
        let dir = TempDir::new().unwrap();
        let toml_path = dir.path().join("params.toml");
        std::fs::write(
            &toml_path,
            "alpha = 0.05\nnumRuns = 3\ndiscretize = false\nlabel = \"run-a\"\n",
        )
        .unwrap();

        let params = Parameters::load(&toml_path).unwrap();
        assert_eq!(params.get_double(keys::ALPHA).unwrap(), 0.05);
        assert_eq!(params.get_int(keys::NUM_RUNS, 1).unwrap(), 3);
        assert!(!params.get_boolean(keys::DISCRETIZE).unwrap());
        assert_eq!(params.get_string("label").unwrap(), "run-a");

        let json_path = dir.path().join("params.json");
        params.save_json(&json_path).unwrap();
        assert_eq!(Parameters::load(&json_path).unwrap(), params);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.yaml");
        std::fs::write(&path, "alpha: 0.1").unwrap();
        assert!(matches!(Parameters::load(&path), Err(CausalError::Config(_))));
    }

    #[test]
    fn test_shared_handle_sees_writes() {
        let shared = Parameters::new().into_shared();
        let other = Arc::clone(&shared);
        shared.write().set(keys::NUM_TIME_LAGS, 3);
        assert_eq!(other.read().get_int(keys::NUM_TIME_LAGS, 1).unwrap(), 3);
    }
}
