//! Correlation-based score for continuous data

use super::{check_data_type, check_indices, Score, ScoreWrapper};
use crate::data::{DataSet, DataType, Variable};
use crate::error::{CausalError, Result};
use crate::parameters::{keys, Parameters};
use crate::stats;
use nalgebra::DMatrix;
use tracing::debug;

const PARAMETERS: &[&str] = &[keys::ALPHA];

/// Settings read by [`FisherZWrapper`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FisherZConfig {
    /// Significance level
    pub alpha: f64,
}

impl FisherZConfig {
    /// Read and validate from a parameter store
    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        Ok(Self {
            alpha: params.validated_double(keys::ALPHA)?,
        })
    }
}

/// Wrapper producing a [`FisherZScore`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FisherZWrapper;

impl FisherZWrapper {
    /// Bind to `data`, returning the concrete score
    pub fn bind(&self, data: &DataSet, params: &Parameters) -> Result<FisherZScore> {
        check_data_type(self.data_type(), data)?;
        let config = FisherZConfig::from_parameters(params)?;

        let columns: Vec<usize> = (0..data.num_columns()).collect();
        let rows = data.complete_rows(&columns);
        if rows.len() < 4 {
            return Err(CausalError::numerical(format!(
                "data set '{}' has {} complete rows, need at least 4",
                data.name(),
                rows.len()
            )));
        }
        let correlation = stats::correlation(&stats::covariance(data, &columns, &rows)?)?;

        debug!(
            data = %data.name(),
            alpha = config.alpha,
            n = rows.len(),
            "Bound Fisher Z score"
        );

        Ok(FisherZScore {
            variables: data.variables().to_vec(),
            correlation,
            sample_size: rows.len(),
            alpha: config.alpha,
        })
    }
}

impl ScoreWrapper for FisherZWrapper {
    fn description(&self) -> &'static str {
        "Fisher Z Score"
    }

    fn data_type(&self) -> DataType {
        DataType::Continuous
    }

    fn parameters(&self) -> &'static [&'static str] {
        PARAMETERS
    }

    fn score(&self, data: &DataSet, params: &Parameters) -> Result<Box<dyn Score>> {
        Ok(Box::new(self.bind(data, params)?))
    }
}

/// Linear-Gaussian score over a correlation matrix
///
/// `local_score` is a BIC on the residual variance; `local_score_diff`
/// is `alpha - p` for the Fisher Z test of the added edge, so a positive
/// value means dependence at level `alpha`.
#[derive(Debug, Clone)]
pub struct FisherZScore {
    variables: Vec<Variable>,
    correlation: DMatrix<f64>,
    sample_size: usize,
    alpha: f64,
}

impl FisherZScore {
    /// Significance level captured at bind time
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Correlation matrix over complete rows
    pub fn correlation(&self) -> &DMatrix<f64> {
        &self.correlation
    }

    /// Fisher Z p-value for `x ⫫ y | z`
    pub fn p_value(&self, x: usize, y: usize, z: &[usize]) -> Result<f64> {
        let mut all = z.to_vec();
        all.push(x);
        check_indices(self.variables.len(), y, &all)?;
        let r = stats::partial_correlation(&self.correlation, x, y, z)?;
        stats::fisher_z_p_value(r, self.sample_size, z.len())
    }
}

impl Score for FisherZScore {
    fn name(&self) -> &str {
        "fisher-z"
    }

    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn local_score(&self, node: usize, parents: &[usize]) -> Result<f64> {
        check_indices(self.variables.len(), node, parents)?;
        let residual = stats::residual_variance(&self.correlation, node, parents)?.max(1e-10);
        let n = self.sample_size as f64;
        Ok(-n * residual.ln() - parents.len() as f64 * n.ln())
    }

    fn local_score_diff(&self, x: usize, y: usize, z: &[usize]) -> Result<f64> {
        Ok(self.alpha - self.p_value(x, y, z)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::simulation::standard_normal;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn chain_data(n: usize) -> DataSet {
        let mut rng = StdRng::seed_from_u64(7);
        let x: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.8 * v + standard_normal(&mut rng)).collect();
        let z: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        DataSet::continuous("chain", &["X", "Y", "Z"], vec![x, y, z]).unwrap()
    }

    #[test]
    fn test_declared_contract() {
        let wrapper = FisherZWrapper;
        assert_eq!(wrapper.parameters(), &["alpha"]);
        assert_eq!(wrapper.data_type(), DataType::Continuous);
    }

    #[test]
    fn test_rejects_discrete_data() {
        let data = DataSet::new(
            "d",
            vec![Variable::discrete_n("A", 2), Variable::discrete_n("B", 2)],
            vec![vec![0.0, 1.0, 0.0, 1.0], vec![1.0, 1.0, 0.0, 0.0]],
        )
        .unwrap();
        let err = FisherZWrapper.score(&data, &Parameters::new()).err().unwrap();
        assert!(matches!(
            err,
            CausalError::DataTypeMismatch {
                expected: DataType::Continuous,
                actual: DataType::Discrete
            }
        ));
    }

    #[test]
    fn test_alpha_is_a_snapshot() {
        let data = chain_data(50);
        let mut params = Parameters::new().with(keys::ALPHA, 0.05);
        let score = FisherZWrapper.bind(&data, &params).unwrap();
        params.set(keys::ALPHA, 0.5);
        assert_eq!(score.alpha(), 0.05);
    }

    #[test]
    fn test_default_alpha() {
        let score = FisherZWrapper.bind(&chain_data(50), &Parameters::new()).unwrap();
        assert_eq!(score.alpha(), 0.001);
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let params = Parameters::new().with(keys::ALPHA, -0.1);
        assert!(FisherZWrapper.bind(&chain_data(50), &params).is_err());

        let params = Parameters::new().with(keys::ALPHA, f64::NAN);
        assert!(matches!(
            FisherZWrapper.score(&chain_data(50), &params).err(),
            Some(CausalError::ParameterRange { .. })
        ));
    }

    #[test]
    fn test_score_detects_dependence() {
        let score = FisherZWrapper
            .score(&chain_data(500), &Parameters::new().with(keys::ALPHA, 0.01))
            .unwrap();
        assert!(score.local_score_diff(0, 1, &[]).unwrap() > 0.0);
        assert!(score.local_score(1, &[0]).unwrap() > score.local_score(1, &[]).unwrap());
        assert_eq!(score.variable("Y").unwrap().name, "Y");
        assert!(score.variable("W").is_none());
        assert_eq!(score.sample_size(), 500);
    }

    #[test]
    fn test_graph_score_prefers_true_edge() {
        let score = FisherZWrapper.score(&chain_data(500), &Parameters::new()).unwrap();

        let mut truth = Graph::with_nodes(&["X", "Y", "Z"]).unwrap();
        truth.add_directed_edge("X", "Y").unwrap();
        let empty = Graph::with_nodes(&["X", "Y", "Z"]).unwrap();

        assert!(score.graph_score(&truth).unwrap() > score.graph_score(&empty).unwrap());

        let stranger = Graph::with_nodes(&["Q"]).unwrap();
        assert!(matches!(
            score.graph_score(&stranger),
            Err(CausalError::UnknownVariable(_))
        ));
    }

    #[test]
    fn test_missing_rows_are_dropped() {
        let mut x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..20).map(|i| (i * i) as f64 % 7.0).collect();
        x[3] = f64::NAN;
        let data = DataSet::continuous("m", &["X", "Y"], vec![x, y]).unwrap();
        let score = FisherZWrapper.bind(&data, &Parameters::new()).unwrap();
        assert_eq!(score.sample_size(), 19);
    }
}
