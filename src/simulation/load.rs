//! Loading a simulation from a directory
//!
//! ```text
//! <root>/data_noise/*.txt   continuous data sets, one per file
//! <root>/graph/<one file>   ground-truth graph
//! ```
//!
//! Both subdirectories are optional. The layout is checked in full
//! before anything is read, and every violation is reported together.

use super::{data_at, Simulation};
use crate::data::{read_continuous, DataSet, DataType, TabularFormat};
use crate::error::{CausalError, ManifestViolation, Result};
use crate::graph::{read_graph, Graph};
use crate::parameters::{keys, Parameters};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PARAMETERS: &[&str] = &[keys::NUM_RUNS];

/// Layout position used for the loaded graph
const LAYOUT_CENTER: (f64, f64) = (225.0, 200.0);
const LAYOUT_RADIUS: f64 = 150.0;

/// Files found under a simulation root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationManifest {
    /// Directory that was scanned
    pub root: PathBuf,
    /// Data files, sorted by file name
    pub data_files: Vec<PathBuf>,
    /// The single graph file, if `graph/` exists
    pub graph_file: Option<PathBuf>,
}

impl SimulationManifest {
    /// Data subdirectory name
    pub const DATA_DIR: &'static str = "data_noise";
    /// Graph subdirectory name
    pub const GRAPH_DIR: &'static str = "graph";
    /// Extension of data files
    pub const DATA_EXTENSION: &'static str = "txt";

    /// Scan `root`, collecting every layout violation
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(CausalError::Manifest {
                root,
                violations: vec![ManifestViolation::MissingRoot],
            });
        }

        let mut violations = Vec::new();

        let mut data_files = Vec::new();
        let data_dir = root.join(Self::DATA_DIR);
        if data_dir.exists() {
            if data_dir.is_dir() {
                for path in list_files(&data_dir)? {
                    if path.extension().and_then(|e| e.to_str()) == Some(Self::DATA_EXTENSION) {
                        data_files.push(path);
                    } else {
                        debug!(path = %path.display(), "Ignoring non-data file");
                    }
                }
            } else {
                violations.push(ManifestViolation::NotADirectory(Self::DATA_DIR.to_string()));
            }
        }

        let mut graph_file = None;
        let graph_dir = root.join(Self::GRAPH_DIR);
        if graph_dir.exists() {
            if graph_dir.is_dir() {
                let mut files = list_files(&graph_dir)?;
                if files.len() == 1 {
                    graph_file = files.pop();
                } else {
                    violations.push(ManifestViolation::GraphFileCount(files.len()));
                }
            } else {
                violations.push(ManifestViolation::NotADirectory(Self::GRAPH_DIR.to_string()));
            }
        }

        if !violations.is_empty() {
            return Err(CausalError::Manifest { root, violations });
        }

        Ok(Self {
            root,
            data_files,
            graph_file,
        })
    }
}

/// Regular files directly under `dir`, sorted by name
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Simulation backed by files on disk
///
/// Unreadable data files are logged and skipped. The graph, when present,
/// is shared by every data set and laid out on a circle.
#[derive(Debug, Clone)]
pub struct LoadSimulation {
    root: PathBuf,
    format: TabularFormat,
    data_sets: Vec<DataSet>,
    graph: Option<Graph>,
}

impl LoadSimulation {
    /// Create a loader for `root`; nothing is read until `create_data`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            format: TabularFormat::default(),
            data_sets: Vec::new(),
            graph: None,
        }
    }

    /// Override the tabular conventions
    pub fn with_format(mut self, format: TabularFormat) -> Self {
        self.format = format;
        self
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Simulation for LoadSimulation {
    fn description(&self) -> &'static str {
        "Load data sets and a ground-truth graph from a directory"
    }

    fn data_type(&self) -> DataType {
        DataType::Continuous
    }

    fn parameters(&self) -> &'static [&'static str] {
        PARAMETERS
    }

    fn create_data(&mut self, params: &mut Parameters, _new_model: bool) -> Result<()> {
        self.data_sets.clear();
        self.graph = None;

        let manifest = SimulationManifest::scan(&self.root)?;

        for path in &manifest.data_files {
            match read_continuous(path, &self.format) {
                Ok(data) => self.data_sets.push(data),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable data file"),
            }
        }

        if let Some(path) = &manifest.graph_file {
            // A bad graph fails the whole load
            let mut graph = match read_graph(path) {
                Ok(graph) => graph,
                Err(e) => {
                    self.data_sets.clear();
                    return Err(e);
                }
            };
            graph.circular_layout(LAYOUT_CENTER.0, LAYOUT_CENTER.1, LAYOUT_RADIUS);
            self.graph = Some(graph);
        }

        if !params.contains(keys::NUM_RUNS) {
            params.set(keys::NUM_RUNS, self.data_sets.len());
        }

        info!(
            root = %self.root.display(),
            data_sets = self.data_sets.len(),
            skipped = manifest.data_files.len() - self.data_sets.len(),
            graph = self.graph.is_some(),
            "Simulation loaded"
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
