//! Background reconfiguration of the whole placement.
//!
//! An optimizer receives an owned snapshot of the live placement together with a-priori
//! normalization bounds and returns a new placement of the same VMs. It never touches
//! the live state.

pub mod aco;
pub mod evaluation;
pub mod memetic;
pub mod worker;

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::config::options::parse_value;
use crate::core::config::sim_config::SimulationConfig;
use crate::core::placement::Placement;
use crate::core::scalarization::APrioriBounds;
use crate::error::VmpError;
use crate::reconfiguration::aco::AntColonyOptimizer;
use crate::reconfiguration::evaluation::Evaluator;
use crate::reconfiguration::memetic::MemeticAlgorithm;

/// Trait for implementation of reconfiguration optimizers.
pub trait Reconfigurator: Send {
    /// Proposes a new placement of the VMs of `placement`.
    ///
    /// The returned placement has its score set (lower is better).
    fn reconfigure(&mut self, placement: &Placement, bounds: &APrioriBounds) -> Result<Placement, VmpError>;
}

/// Optimizer selected for reconfiguration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerKind {
    Memetic,
    Aco,
}

impl FromStr for OptimizerKind {
    type Err = VmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MEMETIC" => Ok(OptimizerKind::Memetic),
            "ACO" => Ok(OptimizerKind::Aco),
            _ => Err(VmpError::UnknownOptimizer(s.to_string())),
        }
    }
}

impl Display for OptimizerKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            OptimizerKind::Memetic => write!(f, "MEMETIC"),
            OptimizerKind::Aco => write!(f, "ACO"),
        }
    }
}

/// Settings of the memetic optimizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemeticSettings {
    pub population_size: usize,
    pub number_of_generations: usize,
    pub crossover_prob: f64,
}

/// Settings of the ant colony optimizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcoSettings {
    pub ants: usize,
    pub iterations: usize,
    pub max_pheromone: f64,
    /// Evaporation rate.
    pub pheromone_constant: f64,
}

impl AcoSettings {
    /// Overrides settings from `ACO[ants=..,iterations=..,max_pheromone=..,pheromone_constant=..]` options.
    pub fn apply_options(&mut self, options: &HashMap<String, String>) -> Result<(), VmpError> {
        if let Some(value) = options.get("ants") {
            self.ants = parse_value("ants", value)?;
        }
        if let Some(value) = options.get("iterations") {
            self.iterations = parse_value("iterations", value)?;
        }
        if let Some(value) = options.get("max_pheromone") {
            self.max_pheromone = parse_value("max_pheromone", value)?;
        }
        if let Some(value) = options.get("pheromone_constant") {
            self.pheromone_constant = parse_value("pheromone_constant", value)?;
        }
        Ok(())
    }
}

/// Logging context of an optimizer run: the time unit it was started at.
pub struct ReconfigurationContext {
    name: String,
    time: u32,
}

impl ReconfigurationContext {
    pub fn new(name: &str, time: u32) -> Self {
        Self {
            name: name.to_string(),
            time,
        }
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Creates the configured optimizer for a run started at `time`.
pub fn optimizer_resolver(config: &SimulationConfig, seed: u64, time: u32) -> Box<dyn Reconfigurator> {
    let evaluator = Evaluator::from_config(config);
    match config.optimizer {
        OptimizerKind::Memetic => Box::new(MemeticAlgorithm::new(
            config.memetic.clone(),
            evaluator,
            seed,
            ReconfigurationContext::new("memetic", time),
        )),
        OptimizerKind::Aco => Box::new(AntColonyOptimizer::new(
            config.aco.clone(),
            evaluator,
            seed,
            ReconfigurationContext::new("aco", time),
        )),
    }
}
