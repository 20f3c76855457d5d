//! Conditional Gaussian BIC for mixed continuous/discrete data
//!
//! The likelihood of a set of variables is Gaussian over its continuous
//! members within each cell of its discrete members. A local score is
//! the difference between the likelihood of child + parents and of the
//! parents alone, penalized per free parameter.

use super::{check_data_type, check_indices, structure_prior, Score, ScoreWrapper};
use crate::data::{DataSet, DataType, Variable};
use crate::error::{CausalError, Result};
use crate::parameters::{keys, Parameters};
use crate::stats;
use std::collections::HashMap;
use tracing::debug;

const PARAMETERS: &[&str] = &[
    keys::PENALTY_DISCOUNT,
    keys::STRUCTURE_PRIOR,
    keys::DISCRETIZE,
    keys::NUM_CATEGORIES_TO_DISCRETIZE,
];

/// Settings read by [`ConditionalGaussianWrapper`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionalGaussianConfig {
    /// Multiplier on the complexity penalty
    pub penalty_discount: f64,
    /// Expected number of parents; 0 for a flat prior
    pub structure_prior: f64,
    /// Bin continuous parents of discrete children
    pub discretize: bool,
    /// Number of bins used when discretizing
    pub num_categories: usize,
}

impl ConditionalGaussianConfig {
    /// Read and validate from a parameter store
    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        Ok(Self {
            penalty_discount: params.validated_double(keys::PENALTY_DISCOUNT)?,
            structure_prior: params.validated_double(keys::STRUCTURE_PRIOR)?,
            discretize: params.validated_bool(keys::DISCRETIZE)?,
            num_categories: params.validated_int(keys::NUM_CATEGORIES_TO_DISCRETIZE)? as usize,
        })
    }
}

/// Wrapper producing a [`ConditionalGaussianScore`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalGaussianWrapper;

impl ConditionalGaussianWrapper {
    /// Bind to `data`, returning the concrete score
    pub fn bind(&self, data: &DataSet, params: &Parameters) -> Result<ConditionalGaussianScore> {
        check_data_type(self.data_type(), data)?;
        let config = ConditionalGaussianConfig::from_parameters(params)?;

        let columns: Vec<usize> = (0..data.num_columns()).collect();
        let rows = data.complete_rows(&columns);
        if rows.is_empty() {
            return Err(CausalError::numerical(format!(
                "data set '{}' has no complete rows",
                data.name()
            )));
        }

        // More bins than rows only adds empty cells
        let bins = config.num_categories.min(rows.len());
        let binned = data
            .variables()
            .iter()
            .enumerate()
            .map(|(c, v)| {
                if v.is_discrete() {
                    return None;
                }
                let observed: Vec<f64> = rows.iter().map(|&r| data.value(r, c)).collect();
                let cuts = stats::equal_frequency_cuts(&observed, bins);
                Some(
                    data.column(c)
                        .iter()
                        .map(|&x| stats::bin_of(x, &cuts))
                        .collect(),
                )
            })
            .collect();

        debug!(
            data = %data.name(),
            penalty_discount = config.penalty_discount,
            discretize = config.discretize,
            num_categories = config.num_categories,
            bins,
            n = rows.len(),
            "Bound conditional Gaussian score"
        );

        Ok(ConditionalGaussianScore {
            data: data.clone(),
            rows,
            binned,
            bins,
            config,
        })
    }
}

impl ScoreWrapper for ConditionalGaussianWrapper {
    fn description(&self) -> &'static str {
        "Conditional Gaussian BIC Score"
    }

    fn data_type(&self) -> DataType {
        DataType::Mixed
    }

    fn parameters(&self) -> &'static [&'static str] {
        PARAMETERS
    }

    fn score(&self, data: &DataSet, params: &Parameters) -> Result<Box<dyn Score>> {
        Ok(Box::new(self.bind(data, params)?))
    }
}

#[derive(Debug, Clone, Copy)]
enum Term {
    Continuous(usize),
    Discrete { column: usize, categories: usize },
    Binned(usize),
}

/// Conditional Gaussian BIC bound to one data set
#[derive(Debug, Clone)]
pub struct ConditionalGaussianScore {
    data: DataSet,
    rows: Vec<usize>,
    binned: Vec<Option<Vec<usize>>>,
    /// Categories actually used when binning, at most the row count
    bins: usize,
    config: ConditionalGaussianConfig,
}

impl ConditionalGaussianScore {
    /// Settings captured at bind time
    pub fn config(&self) -> &ConditionalGaussianConfig {
        &self.config
    }

    /// Whether continuous parents of discrete children are binned
    pub fn discretize(&self) -> bool {
        self.config.discretize
    }

    /// Bin count used when discretizing
    pub fn num_categories(&self) -> usize {
        self.config.num_categories
    }

    fn term(&self, column: usize, bin_continuous: bool) -> Term {
        match self.data.variables()[column].num_categories() {
            Some(categories) => Term::Discrete { column, categories },
            None if bin_continuous => Term::Binned(column),
            None => Term::Continuous(column),
        }
    }

    fn category(&self, term: Term, row: usize) -> Result<usize> {
        match term {
            Term::Discrete { column, .. } => Ok(self.data.value(row, column) as usize),
            Term::Binned(column) => self
                .binned
                .get(column)
                .and_then(Option::as_ref)
                .map(|bins| bins[row])
                .ok_or_else(|| {
                    CausalError::numerical(format!("column {} has no discretization", column))
                }),
            Term::Continuous(column) => Err(CausalError::numerical(format!(
                "column {} is continuous",
                column
            ))),
        }
    }

    /// Log-likelihood and parameter count of a set of terms
    fn log_likelihood(&self, terms: &[Term]) -> Result<(f64, usize)> {
        let continuous: Vec<usize> = terms
            .iter()
            .filter_map(|t| match t {
                Term::Continuous(c) => Some(*c),
                _ => None,
            })
            .collect();
        let discrete: Vec<Term> = terms
            .iter()
            .copied()
            .filter(|t| !matches!(t, Term::Continuous(_)))
            .collect();

        let mut cells: HashMap<Vec<usize>, Vec<usize>> = HashMap::new();
        for &row in &self.rows {
            let key = discrete
                .iter()
                .map(|&t| self.category(t, row))
                .collect::<Result<Vec<_>>>()?;
            cells.entry(key).or_default().push(row);
        }

        let n = self.rows.len() as f64;
        let p = continuous.len();
        let two_pi_e = (2.0 * std::f64::consts::PI).ln() + 1.0;
        let mut ll = 0.0;
        let mut degenerate = 0usize;
        for rows in cells.values() {
            let nc = rows.len() as f64;
            ll += nc * (nc / n).ln();
            if p == 0 {
                continue;
            }
            if rows.len() <= p {
                degenerate += 1;
                continue;
            }
            let cov = stats::covariance(&self.data, &continuous, rows)?;
            match stats::log_det(&cov) {
                Ok(log_det) => ll -= 0.5 * nc * (log_det + p as f64 * two_pi_e),
                Err(_) => degenerate += 1,
            }
        }
        if degenerate > 0 {
            debug!(
                cells = cells.len(),
                degenerate,
                continuous = p,
                "Cells without a Gaussian term"
            );
        }

        let overflow = || CausalError::numerical("too many cells to count parameters");
        let num_cells = discrete.iter().try_fold(1usize, |acc, t| {
            let categories = match t {
                Term::Discrete { categories, .. } => *categories,
                _ => self.bins,
            };
            acc.checked_mul(categories)
        });
        let num_cells = num_cells.ok_or_else(overflow)?;
        let per_cell = p + p * (p + 1) / 2;
        let dof = num_cells
            .checked_mul(per_cell)
            .and_then(|d| d.checked_add(num_cells.saturating_sub(1)))
            .ok_or_else(overflow)?;
        Ok((ll, dof))
    }
}

impl Score for ConditionalGaussianScore {
    fn name(&self) -> &str {
        "cg-bic"
    }

    fn variables(&self) -> &[Variable] {
        self.data.variables()
    }

    fn sample_size(&self) -> usize {
        self.rows.len()
    }

    fn local_score(&self, node: usize, parents: &[usize]) -> Result<f64> {
        let num_vars = self.data.num_columns();
        check_indices(num_vars, node, parents)?;

        let child_discrete = self.data.variables()[node].is_discrete();
        let bin_parents = child_discrete && self.config.discretize;

        let parent_terms: Vec<Term> = parents.iter().map(|&p| self.term(p, bin_parents)).collect();
        let mut joint_terms = parent_terms.clone();
        joint_terms.push(self.term(node, false));

        let (ll_joint, dof_joint) = self.log_likelihood(&joint_terms)?;
        let (ll_parents, dof_parents) = self.log_likelihood(&parent_terms)?;

        let n = self.rows.len() as f64;
        let penalty =
            self.config.penalty_discount * (dof_joint as f64 - dof_parents as f64) * n.ln();
        Ok(2.0 * (ll_joint - ll_parents) - penalty
            + structure_prior(self.config.structure_prior, parents.len(), num_vars))
    }
}
