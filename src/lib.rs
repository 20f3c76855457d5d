//! # Causal Bench
//!
//! Parameter-driven score and simulation plugins for causal-structure
//! discovery and algorithm comparison.
//!
//! ## Features
//!
//! - **Parameters**: Shared key/value store with registered defaults and bounds
//! - **Scores**: Fisher Z and Conditional Gaussian BIC scores bound to a data set
//! - **Simulations**: Load data sets + a ground-truth graph from disk, or generate them
//! - **Editors**: Toolkit-neutral controls that write edits straight into the store
//! - **Registry**: Discover plugins and the parameters they read
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use causal_bench::prelude::*;
//!
//! fn main() -> causal_bench::Result<()> {
//!     let mut params = Parameters::new().with(keys::ALPHA, 0.01);
//!
//!     let mut sim = LoadSimulation::new("runs/sim1");
//!     sim.create_data(&mut params, false)?;
//!
//!     let score = ScoreKind::FisherZ.wrapper().score(sim.data_model(0)?, &params)?;
//!     if let Some(graph) = sim.true_graph(0) {
//!         println!("true graph score: {}", score.graph_score(graph)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Simulation directory layout
//!
//! ```text
//! <root>/data_noise/*.txt   tab-delimited continuous data, one data set per file
//! <root>/graph/<one file>   ground-truth graph shared by every data set
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod data;
pub mod editor;
pub mod error;
pub mod graph;
pub mod parameters;
pub mod registry;
pub mod score;
pub mod simulation;
pub mod stats;

// Re-exports for ergonomic API
pub use data::{DataSet, DataType, TabularFormat, Variable, VariableKind};
pub use editor::{Control, ControlInput, DescriptorEditor, ParameterEditor, TimeLagEditor};
pub use error::{CausalError, ManifestViolation, Result};
pub use graph::{Edge, Endpoint, Graph, GraphNode};
pub use parameters::{keys, ParamDescriptor, ParamValue, Parameters, SharedParameters};
pub use registry::{PluginInfo, PluginRegistry};
pub use score::{
    ConditionalGaussianWrapper, FisherZWrapper, Score, ScoreKind, ScoreWrapper,
};
pub use simulation::{
    LinearSemSimulation, LoadSimulation, Simulation, SimulationKind, SimulationManifest,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::data::{DataSet, DataType};
    pub use crate::error::Result;
    pub use crate::graph::Graph;
    pub use crate::parameters::{keys, Parameters};
    pub use crate::score::{Score, ScoreKind, ScoreWrapper};
    pub use crate::simulation::{LoadSimulation, Simulation, SimulationKind};
}
