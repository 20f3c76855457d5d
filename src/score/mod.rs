//! Scoring functions and the wrappers that build them
//!
//! ## Table of Contents
//! - **Score**: A scoring function bound to one data set
//! - **ScoreWrapper**: Describes a score variant and binds it to data + parameters
//! - **ScoreKind**: Fixed registry of the built-in variants
//! - **FisherZWrapper**: Correlation-based score (continuous data)
//! - **ConditionalGaussianWrapper**: Conditional Gaussian BIC (mixed data)
//!
//! A wrapper holds no state between calls. Everything a caller needs
//! after binding, including variable lookup, lives on the returned
//! [`Score`], which keeps its own snapshot of the data and parameters.

mod conditional_gaussian;
mod fisher_z;

pub use conditional_gaussian::{
    ConditionalGaussianConfig, ConditionalGaussianScore, ConditionalGaussianWrapper,
};
pub use fisher_z::{FisherZConfig, FisherZScore, FisherZWrapper};

use crate::data::{DataSet, DataType, Variable};
use crate::error::{CausalError, Result};
use crate::graph::Graph;
use crate::parameters::Parameters;
use std::fmt;
use std::str::FromStr;

/// A scoring function bound to one data set
///
/// Higher is better. Node and parent arguments are column indices into
/// [`Score::variables`].
pub trait Score: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Variables of the bound data set
    fn variables(&self) -> &[Variable];

    /// Variable by name
    fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables().iter().find(|v| v.name == name)
    }

    /// Number of rows the score was computed from
    fn sample_size(&self) -> usize;

    /// Score of `node` given `parents`
    fn local_score(&self, node: usize, parents: &[usize]) -> Result<f64>;

    /// Change in the score of `y` from adding `x` to parent set `z`
    fn local_score_diff(&self, x: usize, y: usize, z: &[usize]) -> Result<f64> {
        let mut with_x = z.to_vec();
        with_x.push(x);
        Ok(self.local_score(y, &with_x)? - self.local_score(y, z)?)
    }

    /// Sum of local scores over the parent sets of `graph`, matched by node name
    fn graph_score(&self, graph: &Graph) -> Result<f64> {
        let index_of = |name: &str| {
            self.variables()
                .iter()
                .position(|v| v.name == name)
                .ok_or_else(|| CausalError::UnknownVariable(name.to_string()))
        };

        let mut total = 0.0;
        for (i, node) in graph.nodes().iter().enumerate() {
            let child = index_of(&node.name)?;
            let parents = graph
                .parents(i)
                .into_iter()
                .map(|p| index_of(&graph.nodes()[p].name))
                .collect::<Result<Vec<_>>>()?;
            total += self.local_score(child, &parents)?;
        }
        Ok(total)
    }
}

/// Describes a score variant and binds it to a data set and parameters
pub trait ScoreWrapper: Send + Sync {
    /// Human-readable label
    fn description(&self) -> &'static str;

    /// Kind of data the variant requires
    fn data_type(&self) -> DataType;

    /// Parameter keys read by [`ScoreWrapper::score`], in display order
    fn parameters(&self) -> &'static [&'static str];

    /// Bind a score to `data`, reading `params` now
    ///
    /// Later changes to `params` do not affect the returned score.
    fn score(&self, data: &DataSet, params: &Parameters) -> Result<Box<dyn Score>>;
}

/// Fail unless `data` has a type the wrapper accepts
pub(crate) fn check_data_type(expected: DataType, data: &DataSet) -> Result<()> {
    let actual = data.data_type();
    if expected.accepts(actual) {
        Ok(())
    } else {
        Err(CausalError::DataTypeMismatch { expected, actual })
    }
}

/// Fail unless `node` and `parents` are valid, distinct column indices
pub(crate) fn check_indices(num_vars: usize, node: usize, parents: &[usize]) -> Result<()> {
    for &index in std::iter::once(&node).chain(parents) {
        if index >= num_vars {
            return Err(CausalError::IndexOutOfRange {
                index,
                len: num_vars,
                what: "variables",
            });
        }
    }
    if parents.contains(&node) {
        return Err(CausalError::config(format!(
            "variable {} cannot be its own parent",
            node
        )));
    }
    Ok(())
}

/// Log prior over a parent set of size `k` among `num_vars - 1` candidates
///
/// `expected` is the expected number of parents; 0 gives a flat prior.
pub(crate) fn structure_prior(expected: f64, k: usize, num_vars: usize) -> f64 {
    if expected <= 0.0 || num_vars < 2 {
        return 0.0;
    }
    let candidates = (num_vars - 1) as f64;
    let p = expected / candidates;
    if p >= 1.0 {
        return 0.0;
    }
    k as f64 * p.ln() + (candidates - k as f64) * (1.0 - p).ln()
}

/// Built-in score variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKind {
    /// [`FisherZWrapper`]
    FisherZ,
    /// [`ConditionalGaussianWrapper`]
    ConditionalGaussianBic,
}

impl ScoreKind {
    /// Every built-in variant
    pub fn all() -> &'static [ScoreKind] {
        &[ScoreKind::FisherZ, ScoreKind::ConditionalGaussianBic]
    }

    /// Variant with this command-line name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }

    /// Command-line name
    pub fn name(self) -> &'static str {
        match self {
            Self::FisherZ => "fisher-z",
            Self::ConditionalGaussianBic => "cg-bic",
        }
    }

    /// Construct the wrapper
    pub fn wrapper(self) -> Box<dyn ScoreWrapper> {
        match self {
            Self::FisherZ => Box::new(FisherZWrapper),
            Self::ConditionalGaussianBic => Box::new(ConditionalGaussianWrapper),
        }
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoreKind {
    type Err = CausalError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| CausalError::config(format!("unknown score '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_round_trip() {
        for kind in ScoreKind::all() {
            assert_eq!(kind.name().parse::<ScoreKind>().unwrap(), *kind);
            assert!(!kind.wrapper().description().is_empty());
        }
        assert!("bdeu".parse::<ScoreKind>().is_err());
    }

    #[test]
    fn test_check_indices() {
        assert!(check_indices(3, 0, &[1, 2]).is_ok());
        assert!(matches!(
            check_indices(3, 3, &[]),
            Err(CausalError::IndexOutOfRange { index: 3, .. })
        ));
        assert!(check_indices(3, 1, &[1]).is_err());
    }

    #[test]
    fn test_structure_prior() {
        assert_eq!(structure_prior(0.0, 2, 5), 0.0);
        // one expected parent among four candidates: more parents cost more
        let none = structure_prior(1.0, 0, 5);
        let two = structure_prior(1.0, 2, 5);
        assert!(two < none);
    }
}
