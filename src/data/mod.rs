//! Tabular data sets and their variables
//!
//! ## Table of Contents
//! - **DataType**: Statistical nature of a data set (continuous, discrete, mixed)
//! - **Variable / VariableKind**: A named column and its kind
//! - **DataSet**: Column-major table of observations
//! - **reader**: Delimited text reader

pub mod reader;

use crate::error::{CausalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub use reader::{read_continuous, TabularFormat};

/// Statistical nature of a data set's variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Every variable is continuous
    Continuous,
    /// Every variable is discrete
    Discrete,
    /// Both kinds present (or, for a consumer, both accepted)
    Mixed,
}

impl DataType {
    /// Whether a consumer declaring `self` can take data of type `actual`
    ///
    /// `Mixed` consumers take anything; the other two take only themselves.
    pub fn accepts(self, actual: DataType) -> bool {
        self == DataType::Mixed || self == actual
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous => write!(f, "continuous"),
            Self::Discrete => write!(f, "discrete"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// Kind of a single variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    /// Real-valued
    Continuous,
    /// Categorical; values are indices into `categories`
    Discrete {
        /// Category labels
        categories: Vec<String>,
    },
}

/// A named column of a data set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name, unique within a data set
    pub name: String,
    /// Continuous or discrete
    pub kind: VariableKind,
}

impl Variable {
    /// A continuous variable
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Continuous,
        }
    }

    /// A discrete variable with the given category labels
    pub fn discrete(name: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Discrete { categories },
        }
    }

    /// A discrete variable with categories labelled `0..n`
    pub fn discrete_n(name: impl Into<String>, n: usize) -> Self {
        Self::discrete(name, (0..n).map(|i| i.to_string()).collect())
    }

    /// Whether the variable is discrete
    pub fn is_discrete(&self) -> bool {
        matches!(self.kind, VariableKind::Discrete { .. })
    }

    /// Number of categories, or `None` for continuous variables
    pub fn num_categories(&self) -> Option<usize> {
        match &self.kind {
            VariableKind::Discrete { categories } => Some(categories.len()),
            VariableKind::Continuous => None,
        }
    }
}

/// Column-major table of observations
///
/// Missing values are stored as NaN. Discrete columns hold category
/// indices as `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    name: String,
    variables: Vec<Variable>,
    columns: Vec<Vec<f64>>,
}

impl DataSet {
    /// Build a data set, validating shape and category indices
    pub fn new(
        name: impl Into<String>,
        variables: Vec<Variable>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let name = name.into();
        if variables.len() != columns.len() {
            return Err(CausalError::config(format!(
                "data set '{}': {} variables but {} columns",
                name,
                variables.len(),
                columns.len()
            )));
        }

        let mut seen = HashSet::new();
        for v in &variables {
            if !seen.insert(v.name.as_str()) {
                return Err(CausalError::config(format!(
                    "data set '{}': duplicate variable '{}'",
                    name, v.name
                )));
            }
        }

        let rows = columns.first().map_or(0, Vec::len);
        for (v, col) in variables.iter().zip(&columns) {
            if col.len() != rows {
                return Err(CausalError::config(format!(
                    "data set '{}': column '{}' has {} rows, expected {}",
                    name,
                    v.name,
                    col.len(),
                    rows
                )));
            }
            if let Some(n) = v.num_categories() {
                let bad = col
                    .iter()
                    .find(|x| !x.is_nan() && (x.fract() != 0.0 || **x < 0.0 || **x >= n as f64));
                if let Some(bad) = bad {
                    return Err(CausalError::config(format!(
                        "data set '{}': value {} is not a category of '{}'",
                        name, bad, v.name
                    )));
                }
            }
        }

        Ok(Self {
            name,
            variables,
            columns,
        })
    }

    /// Build an all-continuous data set from names and columns
    pub fn continuous(
        name: impl Into<String>,
        names: &[&str],
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let variables = names.iter().map(|n| Variable::continuous(*n)).collect();
        Self::new(name, variables, columns)
    }

    /// Data set name (usually the source file stem)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variables, in column order
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Variable by name
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Column index of a variable
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// Column values
    pub fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    /// Single cell
    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.columns[column][row]
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Data type derived from the variable kinds
    pub fn data_type(&self) -> DataType {
        let discrete = self.variables.iter().filter(|v| v.is_discrete()).count();
        if discrete == 0 {
            DataType::Continuous
        } else if discrete == self.variables.len() {
            DataType::Discrete
        } else {
            DataType::Mixed
        }
    }

    /// Whether any cell is missing
    pub fn has_missing(&self) -> bool {
        self.columns.iter().flatten().any(|x| x.is_nan())
    }

    /// Rows with no missing value in any of `columns`
    pub fn complete_rows(&self, columns: &[usize]) -> Vec<usize> {
        (0..self.num_rows())
            .filter(|&r| columns.iter().all(|&c| !self.columns[c][r].is_nan()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> DataSet {
        DataSet::new(
            "mixed",
            vec![Variable::continuous("X"), Variable::discrete_n("D", 2)],
            vec![vec![0.5, f64::NAN, 1.5], vec![0.0, 1.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_data_type_derived_from_variables() {
        assert_eq!(mixed().data_type(), DataType::Mixed);

        let c = DataSet::continuous("c", &["A", "B"], vec![vec![1.0], vec![2.0]]).unwrap();
        assert_eq!(c.data_type(), DataType::Continuous);

        let d = DataSet::new("d", vec![Variable::discrete_n("D", 3)], vec![vec![2.0]]).unwrap();
        assert_eq!(d.data_type(), DataType::Discrete);
    }

    #[test]
    fn test_accepts() {
        assert!(DataType::Mixed.accepts(DataType::Continuous));
        assert!(DataType::Continuous.accepts(DataType::Continuous));
        assert!(!DataType::Continuous.accepts(DataType::Discrete));
        assert!(!DataType::Discrete.accepts(DataType::Mixed));
    }

    #[test]
    fn test_shape_validation() {
        assert!(DataSet::continuous("bad", &["A", "B"], vec![vec![1.0]]).is_err());
        assert!(DataSet::continuous("bad", &["A", "B"], vec![vec![1.0], vec![]]).is_err());
        assert!(DataSet::continuous("dup", &["A", "A"], vec![vec![1.0], vec![2.0]]).is_err());
        assert!(
            DataSet::new("cat", vec![Variable::discrete_n("D", 2)], vec![vec![2.0]]).is_err()
        );
    }

    #[test]
    fn test_lookup_and_missing() {
        let data = mixed();
        assert_eq!(data.index_of("D"), Some(1));
        assert!(data.variable("Y").is_none());
        assert!(data.has_missing());
        assert_eq!(data.complete_rows(&[0, 1]), vec![0, 2]);
        assert_eq!(data.complete_rows(&[1]), vec![0, 1, 2]);
    }
}
