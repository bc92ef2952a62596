//! Simulation configuration.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::options::{parse_bool, parse_config_value, parse_options, parse_resources, parse_value};
use crate::core::placement_algorithm::HeuristicCode;
use crate::core::resources::Resources;
use crate::core::scalarization::ScalarizationMethod;
use crate::error::VmpError;
use crate::orchestrator::{AlgorithmKind, RecoveringMethod};
use crate::reconfiguration::{AcoSettings, MemeticSettings, OptimizerKind};

/// Holds raw simulation config parsed from YAML or parameter file.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RawSimulationConfig {
    pub algorithm: Option<String>,
    pub heuristic: Option<String>,
    pub pm_config: Option<String>,
    pub derive_cost: Option<f64>,
    pub fault_tolerance: Option<bool>,
    pub protection_factor: Option<Resources>,
    pub penalty_factor: Option<Resources>,
    pub execution_interval: Option<u32>,
    pub execution_duration: Option<u32>,
    pub execution_first_time: Option<u32>,
    pub population_size: Option<usize>,
    pub number_of_generations: Option<usize>,
    pub crossover_prob: Option<f64>,
    pub optimizer: Option<String>,
    pub aco_ants: Option<usize>,
    pub aco_iterations: Option<usize>,
    pub aco_max_pheromone: Option<f64>,
    pub aco_pheromone_constant: Option<f64>,
    pub link_capacity: Option<f64>,
    pub migration_factor_load: Option<f64>,
    pub historical_data_size: Option<usize>,
    pub forecast_size: Option<usize>,
    pub scalarization: Option<String>,
    pub recovering_method: Option<String>,
    pub overload_threshold: Option<f64>,
    pub underload_threshold: Option<f64>,
    pub seed: Option<u64>,
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
}

impl RawSimulationConfig {
    /// Builds raw config from `KEY=VALUE` parameters. Unknown keys are reported and skipped.
    pub fn from_parameters(parameters: &HashMap<String, String>) -> Result<Self, VmpError> {
        let mut raw = RawSimulationConfig::default();
        let mut protection_factor: Option<Resources> = None;
        let mut penalty_factor: Option<Resources> = None;

        let mut keys: Vec<&String> = parameters.keys().collect();
        keys.sort();
        for key in keys {
            let value = &parameters[key];
            let k = key.as_str();
            match k {
                "ALGORITHM" => raw.algorithm = Some(value.clone()),
                "HEURISTIC_CODE" => raw.heuristic = Some(value.clone()),
                "PM_CONFIG" => raw.pm_config = Some(value.clone()),
                "DERIVE_COST" => raw.derive_cost = Some(parse_value(k, value)?),
                "FAULT_TOLERANCE" => raw.fault_tolerance = Some(parse_bool(k, value)?),
                "PROTECTION_FACTOR" => protection_factor = Some(parse_resources(k, value)?),
                "PROTECTION_FACTOR_CPU" | "PROTECTION_FACTOR_RAM" | "PROTECTION_FACTOR_NET" => {
                    let factor = protection_factor.get_or_insert(Resources::splat(1.));
                    set_dimension(factor, k, parse_value(k, value)?);
                }
                "PENALTY_FACTOR" => penalty_factor = Some(parse_resources(k, value)?),
                "PENALTY_FACTOR_CPU" | "PENALTY_FACTOR_RAM" | "PENALTY_FACTOR_NET" => {
                    let factor = penalty_factor.get_or_insert(Resources::splat(1.));
                    set_dimension(factor, k, parse_value(k, value)?);
                }
                "INTERVAL_EXECUTION_MEMETIC" => raw.execution_interval = Some(parse_value(k, value)?),
                "EXECUTION_DURATION" => raw.execution_duration = Some(parse_value(k, value)?),
                "EXECUTION_FIRST_TIME" => raw.execution_first_time = Some(parse_value(k, value)?),
                "POPULATION_SIZE" => raw.population_size = Some(parse_value(k, value)?),
                "NUMBER_GENERATIONS" => raw.number_of_generations = Some(parse_value(k, value)?),
                "CROSSOVER_PROB" => raw.crossover_prob = Some(parse_value(k, value)?),
                "VMPR_ALGORITHM" => raw.optimizer = Some(value.clone()),
                "ACO_ANTS" => raw.aco_ants = Some(parse_value(k, value)?),
                "ACO_ITERATIONS" => raw.aco_iterations = Some(parse_value(k, value)?),
                "ACO_MAX_PHEROMONE" => raw.aco_max_pheromone = Some(parse_value(k, value)?),
                "ACO_PHEROMONE_CONSTANT" => raw.aco_pheromone_constant = Some(parse_value(k, value)?),
                "LINK_CAPACITY" => raw.link_capacity = Some(parse_value(k, value)?),
                "MIGRATION_FACTOR_LOAD" => raw.migration_factor_load = Some(parse_value(k, value)?),
                "HISTORICAL_DATA_SIZE" => raw.historical_data_size = Some(parse_value(k, value)?),
                "FORECAST_SIZE" => raw.forecast_size = Some(parse_value(k, value)?),
                "SCALARIZATION_METHOD" => raw.scalarization = Some(value.clone()),
                "RECOVERING_METHOD" => raw.recovering_method = Some(value.clone()),
                "OVERLOAD_PM_THRESHOLD" => raw.overload_threshold = Some(parse_value(k, value)?),
                "UNDERLOAD_PM_THRESHOLD" => raw.underload_threshold = Some(parse_value(k, value)?),
                "SEED" => raw.seed = Some(parse_value(k, value)?),
                "INPUT_DIR" => raw.input_dir = Some(value.clone()),
                "OUTPUT_DIR" => raw.output_dir = Some(value.clone()),
                _ => log::warn!(target: "config", "unknown parameter {} is ignored", key),
            }
        }
        raw.protection_factor = protection_factor;
        raw.penalty_factor = penalty_factor;
        Ok(raw)
    }
}

fn set_dimension(resources: &mut Resources, key: &str, value: f64) {
    if key.ends_with("_CPU") {
        resources.cpu = value;
    } else if key.ends_with("_RAM") {
        resources.ram = value;
    } else {
        resources.net = value;
    }
}

/// Represents simulation configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Reconfiguration strategy.
    pub algorithm: AlgorithmKind,
    /// Online placement heuristic.
    pub heuristic: HeuristicCode,
    /// Host configuration file name.
    pub pm_config: String,
    /// Multiplier applied to the revenue of derived VMs.
    pub derive_cost: f64,
    /// Forbids placing VMs of the same service on one host.
    pub fault_tolerance: bool,
    /// Overbooking protection factor per resource, in `[0, 1]`.
    pub protection_factor: Resources,
    /// Weight of SLA violations per resource.
    pub penalty_factor: Resources,
    /// Time units between two optimizer executions.
    pub execution_interval: u32,
    /// Projected duration of one optimizer execution in time units.
    pub execution_duration: u32,
    /// Offset of the first periodic execution from the first request.
    pub execution_first_time: u32,
    /// Settings of the memetic optimizer.
    pub memetic: MemeticSettings,
    /// Settings of the ant colony optimizer.
    pub aco: AcoSettings,
    /// Optimizer used for reconfiguration.
    pub optimizer: OptimizerKind,
    /// Link capacity in Gbps, memory is given in GB.
    pub link_capacity: f64,
    /// CPU utilization (percent) added to a VM while it migrates.
    pub migration_factor_load: f64,
    /// Number of past placement scores used for forecasting.
    pub historical_data_size: usize,
    /// Number of forecast values.
    pub forecast_size: usize,
    /// Scalarization of normalized objective values.
    pub scalarization: ScalarizationMethod,
    /// Handling of VMs arriving while the optimizer runs.
    pub recovering_method: RecoveringMethod,
    /// Utilization (percent) above which a host is overloaded.
    pub overload_threshold: f64,
    /// Utilization (percent) below which a host is underloaded.
    pub underload_threshold: f64,
    /// Random seed.
    pub seed: u64,
    /// Directory with host configurations and scenario traces.
    pub input_dir: String,
    /// Directory for result files.
    pub output_dir: String,
}

impl SimulationConfig {
    /// Creates simulation config with default parameter values.
    pub fn new() -> Self {
        Self::from_raw(RawSimulationConfig::default()).unwrap_or_else(|_| unreachable!())
    }

    /// Resolves a raw config, using default values for absent parameters.
    pub fn from_raw(raw: RawSimulationConfig) -> Result<Self, VmpError> {
        let mut aco = AcoSettings {
            ants: raw.aco_ants.unwrap_or(10),
            iterations: raw.aco_iterations.unwrap_or(10),
            max_pheromone: raw.aco_max_pheromone.unwrap_or(1.),
            pheromone_constant: raw.aco_pheromone_constant.unwrap_or(0.5),
        };
        let optimizer = match raw.optimizer {
            Some(value) => {
                let (name, options) = parse_config_value(&value);
                if let Some(options) = options {
                    aco.apply_options(&parse_options(&options))?;
                }
                name.parse()?
            }
            None => OptimizerKind::Memetic,
        };

        let link_capacity = raw.link_capacity.unwrap_or(1.);
        if !(link_capacity > 0.) {
            return Err(VmpError::Config {
                key: "LINK_CAPACITY".to_string(),
                value: link_capacity.to_string(),
            });
        }

        Ok(Self {
            algorithm: parse_or(raw.algorithm, AlgorithmKind::CleverReconfiguration)?,
            heuristic: parse_or(raw.heuristic, HeuristicCode::FF)?,
            pm_config: raw.pm_config.unwrap_or_else(|| "pm_config".to_string()),
            derive_cost: raw.derive_cost.unwrap_or(1.),
            fault_tolerance: raw.fault_tolerance.unwrap_or(false),
            protection_factor: raw.protection_factor.unwrap_or_else(|| Resources::splat(1.)),
            penalty_factor: raw.penalty_factor.unwrap_or_else(|| Resources::splat(1.)),
            execution_interval: raw.execution_interval.unwrap_or(20),
            execution_duration: raw.execution_duration.unwrap_or(10),
            execution_first_time: raw.execution_first_time.unwrap_or(3),
            memetic: MemeticSettings {
                population_size: raw.population_size.unwrap_or(10),
                number_of_generations: raw.number_of_generations.unwrap_or(10),
                crossover_prob: raw.crossover_prob.unwrap_or(1.),
            },
            aco,
            optimizer,
            link_capacity,
            migration_factor_load: raw.migration_factor_load.unwrap_or(10.),
            historical_data_size: raw.historical_data_size.unwrap_or(10),
            forecast_size: raw.forecast_size.unwrap_or(5),
            scalarization: parse_or(raw.scalarization, ScalarizationMethod::ED)?,
            recovering_method: parse_or(raw.recovering_method, RecoveringMethod::UpdateBased)?,
            overload_threshold: raw.overload_threshold.unwrap_or(80.),
            underload_threshold: raw.underload_threshold.unwrap_or(40.),
            seed: raw.seed.unwrap_or(123),
            input_dir: raw.input_dir.unwrap_or_else(|| ".".to_string()),
            output_dir: raw.output_dir.unwrap_or_else(|| "results".to_string()),
        })
    }

    /// Creates simulation config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self, VmpError> {
        let raw: RawSimulationConfig = serde_yaml::from_str(&std::fs::read_to_string(file_name)?)?;
        Self::from_raw(raw)
    }

    /// Path of the host configuration file.
    pub fn pm_config_path(&self) -> String {
        Path::new(&self.input_dir).join(&self.pm_config).to_string_lossy().to_string()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_or<T: std::str::FromStr<Err = VmpError>>(value: Option<String>, default: T) -> Result<T, VmpError> {
    match value {
        Some(value) => value.parse(),
        None => Ok(default),
    }
}
