//! Experiment configuration: shared parameters and the scenarios to run with them.

use std::path::Path;

use crate::core::config::options::parse_parameters;
use crate::core::config::sim_config::{RawSimulationConfig, SimulationConfig};
use crate::error::VmpError;

/// Represents experiment configuration.
///
/// Produces one run per scenario file, all sharing the same simulation config.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub config: SimulationConfig,
    pub scenarios: Vec<String>,
    current: usize,
}

impl ExperimentConfig {
    pub fn new(config: SimulationConfig, scenarios: Vec<String>) -> Self {
        Self {
            config,
            scenarios,
            current: 0,
        }
    }

    /// Reads experiment from `KEY=VALUE` parameter file or, for `.yaml`/`.yml` files,
    /// from YAML with a `scenarios` list.
    pub fn from_file(file_name: &str) -> Result<Self, VmpError> {
        let content = std::fs::read_to_string(file_name)?;
        let is_yaml = matches!(
            Path::new(file_name).extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            #[derive(serde::Deserialize)]
            struct RawExperiment {
                #[serde(flatten)]
                config: RawSimulationConfig,
                #[serde(default)]
                scenarios: Vec<String>,
            }
            let raw: RawExperiment = serde_yaml::from_str(&content)?;
            return Ok(Self::new(SimulationConfig::from_raw(raw.config)?, raw.scenarios));
        }
        Self::from_parameters_str(&content)
    }

    /// Parses `KEY=VALUE` parameter text.
    pub fn from_parameters_str(content: &str) -> Result<Self, VmpError> {
        let (parameters, scenarios) = parse_parameters(content);
        let raw = RawSimulationConfig::from_parameters(&parameters)?;
        Ok(Self::new(SimulationConfig::from_raw(raw)?, scenarios))
    }

    /// Returns the next scenario with its config, or `None` when all scenarios were produced.
    pub fn get(&mut self) -> Option<(String, SimulationConfig)> {
        let scenario = self.scenarios.get(self.current)?.clone();
        self.current += 1;
        Some((scenario, self.config.clone()))
    }

    /// Path of a scenario trace.
    pub fn scenario_path(&self, scenario: &str) -> String {
        Path::new(&self.config.input_dir).join(scenario).to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::placement_algorithm::HeuristicCode;
    use crate::core::resources::Resources;
    use crate::orchestrator::{AlgorithmKind, RecoveringMethod};
    use crate::reconfiguration::OptimizerKind;

    #[test]
    fn test_parameter_file() {
        let content = "\
ALGORITHM=1
HEURISTIC_CODE=BFD
PROTECTION_FACTOR=0.25
PENALTY_FACTOR_RAM=2
VMPR_ALGORITHM=ACO[ants=4,iterations=3]
RECOVERING_METHOD=CANCELLATION
SCENARIOS
a.txt
b.txt
";
        let mut exp = ExperimentConfig::from_parameters_str(content).unwrap();
        assert_eq!(exp.config.algorithm, AlgorithmKind::StateOfArt);
        assert_eq!(exp.config.heuristic, HeuristicCode::BFD);
        assert_eq!(exp.config.protection_factor, Resources::splat(0.25));
        assert_eq!(exp.config.penalty_factor, Resources::new(1., 2., 1.));
        assert_eq!(exp.config.optimizer, OptimizerKind::Aco);
        assert_eq!(exp.config.aco.ants, 4);
        assert_eq!(exp.config.aco.iterations, 3);
        assert_eq!(exp.config.recovering_method, RecoveringMethod::Cancellation);
        assert_eq!(exp.get().unwrap().0, "a.txt");
        assert_eq!(exp.get().unwrap().0, "b.txt");
        assert!(exp.get().is_none());
    }

    #[test]
    fn test_unknown_heuristic_is_rejected() {
        let result = ExperimentConfig::from_parameters_str("HEURISTIC_CODE=XYZ\n");
        assert!(matches!(result, Err(VmpError::UnknownHeuristic(_))));
    }
}
