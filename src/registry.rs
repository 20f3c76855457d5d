//! Discovery of the built-in plugins
//!
//! Collects the score and simulation variants with the parameter keys
//! each one reads, so a host can build one editor per key across the
//! whole set.

use crate::data::DataType;
use crate::editor::DescriptorEditor;
use crate::error::Result;
use crate::parameters::{ParamDescriptor, Parameters};
use crate::score::ScoreKind;
use crate::simulation::SimulationKind;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// What a plugin is and which keys it reads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginInfo {
    /// Command-line name
    pub name: &'static str,
    /// Human-readable label
    pub description: &'static str,
    /// Data the plugin works with
    pub data_type: DataType,
    /// Parameter keys read
    pub parameters: &'static [&'static str],
}

/// Built-in scores and simulations
#[derive(Debug, Clone, Serialize)]
pub struct PluginRegistry {
    scores: Vec<PluginInfo>,
    simulations: Vec<PluginInfo>,
}

impl PluginRegistry {
    /// Registry of every built-in variant
    pub fn builtin() -> Result<Self> {
        let scores = ScoreKind::all()
            .iter()
            .map(|kind| {
                let wrapper = kind.wrapper();
                PluginInfo {
                    name: kind.name(),
                    description: wrapper.description(),
                    data_type: wrapper.data_type(),
                    parameters: wrapper.parameters(),
                }
            })
            .collect();

        // Construction reads nothing from disk, so any root will do here
        let simulations = SimulationKind::all()
            .iter()
            .map(|kind| {
                let sim = kind.build(Some(Path::new(".")))?;
                Ok(PluginInfo {
                    name: kind.name(),
                    description: sim.description(),
                    data_type: sim.data_type(),
                    parameters: sim.parameters(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            scores,
            simulations,
        })
    }

    /// Score variants
    pub fn scores(&self) -> &[PluginInfo] {
        &self.scores
    }

    /// Simulation variants
    pub fn simulations(&self) -> &[PluginInfo] {
        &self.simulations
    }

    /// Every plugin, scores first
    pub fn plugins(&self) -> impl Iterator<Item = &PluginInfo> {
        self.scores.iter().chain(self.simulations.iter())
    }

    /// Union of the keys read by any plugin, sorted
    pub fn parameter_keys(&self) -> BTreeSet<&'static str> {
        self.plugins()
            .flat_map(|p| p.parameters.iter().copied())
            .collect()
    }

    /// Descriptors for [`PluginRegistry::parameter_keys`]
    pub fn descriptors(&self) -> Vec<&'static ParamDescriptor> {
        self.parameter_keys()
            .into_iter()
            .filter_map(ParamDescriptor::find)
            .collect()
    }

    /// One unbound editor per parameter key
    pub fn editors(&self) -> Result<Vec<DescriptorEditor>> {
        self.parameter_keys()
            .into_iter()
            .map(DescriptorEditor::new)
            .collect()
    }

    /// Store holding the registered default of every key
    pub fn defaults(&self) -> Parameters {
        self.descriptors()
            .into_iter()
            .fold(Parameters::new(), |params, d| {
                params.with(d.key, d.default.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ParameterEditor;
    use crate::parameters::keys;

    #[test]
    fn test_builtin_lists_every_kind() {
        let registry = PluginRegistry::builtin().unwrap();
        let names: Vec<_> = registry.plugins().map(|p| p.name).collect();
        assert_eq!(names, vec!["fisher-z", "cg-bic", "load", "linear-sem"]);
        assert_eq!(registry.scores()[0].data_type, DataType::Continuous);
        assert_eq!(registry.scores()[1].data_type, DataType::Mixed);
    }

    #[test]
    fn test_parameter_union() {
        let registry = PluginRegistry::builtin().unwrap();
        let keys = registry.parameter_keys();
        for key in [
            keys::ALPHA,
            keys::PENALTY_DISCOUNT,
            keys::STRUCTURE_PRIOR,
            keys::DISCRETIZE,
            keys::NUM_CATEGORIES_TO_DISCRETIZE,
            keys::NUM_RUNS,
            keys::SEED,
        ] {
            assert!(keys.contains(key), "missing {}", key);
        }
        assert_eq!(registry.descriptors().len(), keys.len());
    }

    #[test]
    fn test_defaults_validate() {
        let registry = PluginRegistry::builtin().unwrap();
        let defaults = registry.defaults();
        for key in registry.parameter_keys() {
            assert!(defaults.validated(key).is_ok(), "{}", key);
        }
    }

    #[test]
    fn test_editors_bind_to_defaults() {
        let registry = PluginRegistry::builtin().unwrap();
        let shared = registry.defaults().into_shared();
        let mut editors = registry.editors().unwrap();
        for editor in &mut editors {
            editor.set_params(shared.clone());
            editor.setup().unwrap();
            assert_eq!(
                editor.control().unwrap().value(),
                editor.descriptor().default
            );
        }
    }
}
