//! Simulations: sources of data sets and their ground-truth graph
//!
//! ## Table of Contents
//! - **Simulation**: Trait for anything producing indexed data sets plus a shared graph
//! - **LoadSimulation**: Reads data sets and a graph from a directory layout
//! - **SimulationManifest**: Up-front validation of that layout
//! - **LinearSemSimulation**: Random DAG + linear Gaussian SEM data
//! - **SimulationKind**: Fixed registry of the built-in variants

mod load;
mod sem;

pub use load::{LoadSimulation, SimulationManifest};
pub use sem::{standard_normal, LinearSemSimulation, SemSimulationConfig};

use crate::data::{DataSet, DataType};
use crate::error::{CausalError, Result};
use crate::graph::Graph;
use crate::parameters::Parameters;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A source of data sets drawn from one ground-truth graph
///
/// `create_data` takes `&mut self`, so one instance cannot be loaded
/// from two places at once.
pub trait Simulation: Send + Sync {
    /// Human-readable label
    fn description(&self) -> &'static str;

    /// Kind of data produced
    fn data_type(&self) -> DataType;

    /// Parameter keys read (or filled in) by [`Simulation::create_data`]
    fn parameters(&self) -> &'static [&'static str];

    /// Produce the data sets, replacing any from a previous call
    ///
    /// `new_model` asks for a fresh ground-truth model where the variant
    /// generates one.
    fn create_data(&mut self, params: &mut Parameters, new_model: bool) -> Result<()>;

    /// Ground-truth graph; every index shares the same graph
    fn true_graph(&self, index: usize) -> Option<&Graph>;

    /// Data set at `index`
    fn data_model(&self, index: usize) -> Result<&DataSet>;

    /// Number of data sets produced by the last `create_data`
    fn num_data_models(&self) -> usize;
}

pub(crate) fn data_at(data_sets: &[DataSet], index: usize) -> Result<&DataSet> {
    data_sets.get(index).ok_or(CausalError::IndexOutOfRange {
        index,
        len: data_sets.len(),
        what: "data sets",
    })
}

/// Built-in simulation variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationKind {
    /// [`LoadSimulation`]
    LoadContinuousData,
    /// [`LinearSemSimulation`]
    LinearSem,
}

impl SimulationKind {
    /// Every built-in variant
    pub fn all() -> &'static [SimulationKind] {
        &[SimulationKind::LoadContinuousData, SimulationKind::LinearSem]
    }

    /// Variant with this command-line name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }

    /// Command-line name
    pub fn name(self) -> &'static str {
        match self {
            Self::LoadContinuousData => "load",
            Self::LinearSem => "linear-sem",
        }
    }

    /// Construct the simulation; the loader needs a root directory
    pub fn build(self, root: Option<&Path>) -> Result<Box<dyn Simulation>> {
        match self {
            Self::LoadContinuousData => {
                let root = root.ok_or_else(|| {
                    CausalError::config("the load simulation needs a root directory")
                })?;
                Ok(Box::new(LoadSimulation::new(root)))
            }
            Self::LinearSem => Ok(Box::new(LinearSemSimulation::new())),
        }
    }
}

impl fmt::Display for SimulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimulationKind {
    type Err = CausalError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| CausalError::config(format!("unknown simulation '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_root_for_loader() {
        assert!(SimulationKind::LoadContinuousData.build(None).is_err());
        let sim = SimulationKind::LoadContinuousData
            .build(Some(Path::new("/nonexistent")))
            .unwrap();
        assert_eq!(sim.num_data_models(), 0);
        assert!(SimulationKind::LinearSem.build(None).is_ok());
    }

    #[test]
    fn test_names_parse() {
        for kind in SimulationKind::all() {
            assert_eq!(kind.name().parse::<SimulationKind>().unwrap(), *kind);
        }
        assert!("bayes-im".parse::<SimulationKind>().is_err());
    }

    #[test]
    fn test_data_at_bounds() {
        let sets = vec![DataSet::continuous("a", &["X"], vec![vec![1.0]]).unwrap()];
        assert!(data_at(&sets, 0).is_ok());
        assert!(matches!(
            data_at(&sets, 1),
            Err(CausalError::IndexOutOfRange { index: 1, len: 1, .. })
        ));
    }
}
