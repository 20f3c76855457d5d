//! Linear Gaussian structural equation model simulation
//!
//! Draws a random DAG over `numMeasures` variables, edge coefficients
//! with magnitude in [0.2, 0.7] and random sign, then `numRuns` data sets
//! of `sampleSize` rows with unit-variance Gaussian noise.

use super::{data_at, Simulation};
use crate::data::{DataSet, DataType};
use crate::error::{CausalError, Result};
use crate::graph::{Edge, Graph};
use crate::parameters::{keys, Parameters};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use tracing::{debug, info};

const PARAMETERS: &[&str] = &[
    keys::NUM_MEASURES,
    keys::AVG_DEGREE,
    keys::SAMPLE_SIZE,
    keys::NUM_RUNS,
    keys::SEED,
];

const MIN_COEFFICIENT: f64 = 0.2;
const MAX_COEFFICIENT: f64 = 0.7;

/// Standard normal draw
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

/// Settings read by [`LinearSemSimulation`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemSimulationConfig {
    /// Number of variables
    pub num_measures: usize,
    /// Expected average degree of the DAG
    pub avg_degree: f64,
    /// Rows per data set
    pub sample_size: usize,
    /// Number of data sets
    pub num_runs: usize,
    /// Fixed seed, or `None` to seed from entropy
    pub seed: Option<u64>,
}

impl SemSimulationConfig {
    /// Read and validate from a parameter store
    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        let seed = params.validated_int(keys::SEED)?;
        Ok(Self {
            num_measures: params.validated_int(keys::NUM_MEASURES)? as usize,
            avg_degree: params.validated_double(keys::AVG_DEGREE)?,
            sample_size: params.validated_int(keys::SAMPLE_SIZE)? as usize,
            num_runs: params.validated_int(keys::NUM_RUNS)? as usize,
            seed: u64::try_from(seed).ok(),
        })
    }

    /// Probability of each forward edge
    fn edge_probability(&self) -> f64 {
        if self.num_measures < 2 {
            return 0.0;
        }
        (self.avg_degree / (self.num_measures - 1) as f64).min(1.0)
    }
}

/// Random linear SEM with a shared ground-truth DAG
#[derive(Debug, Clone, Default)]
pub struct LinearSemSimulation {
    graph: Option<Graph>,
    /// Coefficient per edge of `graph`, same order
    coefficients: Vec<f64>,
    data_sets: Vec<DataSet>,
}

impl LinearSemSimulation {
    /// Create an empty simulation
    pub fn new() -> Self {
        Self::default()
    }

    /// Coefficient on each edge of the current graph
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn random_model(config: &SemSimulationConfig, rng: &mut StdRng) -> Result<(Graph, Vec<f64>)> {
        let names: Vec<String> = (1..=config.num_measures).map(|i| format!("X{}", i)).collect();
        let mut graph = Graph::with_nodes(&names)?;
        let mut coefficients = Vec::new();
        let p = config.edge_probability();

        for from in 0..config.num_measures {
            for to in from + 1..config.num_measures {
                if rng.gen::<f64>() < p {
                    graph.add_edge(Edge::directed(from, to))?;
                    let magnitude = rng.gen_range(MIN_COEFFICIENT..=MAX_COEFFICIENT);
                    let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
                    coefficients.push(sign * magnitude);
                }
            }
        }
        graph.circular_layout(225.0, 200.0, 150.0);

        debug!(
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            "Generated random DAG"
        );
        Ok((graph, coefficients))
    }

    fn sample(
        graph: &Graph,
        coefficients: &[f64],
        rows: usize,
        name: String,
        rng: &mut StdRng,
    ) -> Result<DataSet> {
        let order = graph
            .topological_order()
            .ok_or_else(|| CausalError::numerical("generated graph has a cycle"))?;
        let n = graph.num_nodes();

        let mut parents: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for (edge, coef) in graph.edges().iter().zip(coefficients) {
            if let Some((tail, head)) = edge.direction() {
                parents[head].push((tail, *coef));
            }
        }

        let mut columns = vec![vec![0.0; rows]; n];
        for r in 0..rows {
            for &node in &order {
                let signal: f64 = parents[node]
                    .iter()
                    .map(|&(p, coef)| coef * columns[p][r])
                    .sum();
                columns[node][r] = signal + standard_normal(rng);
            }
        }

        let names: Vec<&str> = graph.nodes().iter().map(|n| n.name.as_str()).collect();
        DataSet::continuous(name, &names, columns)
    }
}

impl Simulation for LinearSemSimulation {
    fn description(&self) -> &'static str {
        "Linear Gaussian SEM over a random DAG"
    }

    fn data_type(&self) -> DataType {
        DataType::Continuous
    }

    fn parameters(&self) -> &'static [&'static str] {
        PARAMETERS
    }

    fn create_data(&mut self, params: &mut Parameters, new_model: bool) -> Result<()> {
        let config = SemSimulationConfig::from_parameters(params)?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let reuse = !new_model
            && self
                .graph
                .as_ref()
                .is_some_and(|g| g.num_nodes() == config.num_measures);
        if !reuse {
            let (graph, coefficients) = Self::random_model(&config, &mut rng)?;
            self.graph = Some(graph);
            self.coefficients = coefficients;
        }

        let graph = self
            .graph
            .as_ref()
            .ok_or_else(|| CausalError::config("no model to sample from"))?;

        self.data_sets = (0..config.num_runs)
            .map(|run| {
                Self::sample(
                    graph,
                    &self.coefficients,
                    config.sample_size,
                    format!("run.{}", run + 1),
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            runs = config.num_runs,
            sample_size = config.sample_size,
            edges = graph.num_edges(),
            reused_model = reuse,
            "SEM data simulated"
        );
        Ok(())
    }

    fn true_graph(&self, _index: usize) -> Option<&Graph> {
        self.graph.as_ref()
    }

    fn data_model(&self, index: usize) -> Result<&DataSet> {
        data_at(&self.data_sets, index)
    }

    fn num_data_models(&self) -> usize {
        self.data_sets.len()
    }
}
