//! Normalization and scalarization of objective values.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::objectives::ObjectiveValues;
use crate::error::VmpError;

/// Weight of objectives in the per-time-unit (online) score.
pub const WEIGHT_ONLINE: f64 = 0.33;
/// Weight of objectives in the placement score used to compare reconfigurations.
pub const WEIGHT_OFFLINE: f64 = 0.25;

/// Method combining normalized objective values into one scalar. Lower is better.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarizationMethod {
    /// Euclidean distance to the origin.
    ED,
    /// Chebyshev distance (maximum).
    CD,
    /// Manhattan distance (sum).
    MD,
    /// Weighted sum.
    WS,
}

impl ScalarizationMethod {
    pub fn scalarize(&self, values: &[f64], weight: f64) -> f64 {
        match self {
            ScalarizationMethod::ED => values.iter().map(|v| v * v).sum::<f64>().sqrt(),
            ScalarizationMethod::CD => values.iter().cloned().fold(0., f64::max),
            ScalarizationMethod::MD => values.iter().sum(),
            ScalarizationMethod::WS => values.iter().map(|v| weight * v).sum(),
        }
    }
}

impl FromStr for ScalarizationMethod {
    type Err = VmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ED" => Ok(ScalarizationMethod::ED),
            "CD" => Ok(ScalarizationMethod::CD),
            "MD" => Ok(ScalarizationMethod::MD),
            "WS" => Ok(ScalarizationMethod::WS),
            other => Err(VmpError::UnknownScalarization(other.to_string())),
        }
    }
}

/// Normalizes `value` into `[0, 1]` against `[min, max]`.
///
/// Returns 0 for a zero value or a degenerate range.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if value == 0. || min == max {
        return 0.;
    }
    (value - min) / (max - min)
}

/// Normalization range of one objective.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min: f64,
    pub max: f64,
}

impl Bound {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        normalize(value, self.min, self.max)
    }
}

/// A-priori normalization bounds of all objectives for one time unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct APrioriBounds {
    pub power: Bound,
    pub revenue: Bound,
    pub wasted: Bound,
    pub migrated_memory: Bound,
}

impl APrioriBounds {
    pub fn new(max_power: f64, max_revenue: f64, max_migrated_memory: f64) -> Self {
        Self {
            power: Bound::new(0., max_power),
            revenue: Bound::new(0., max_revenue),
            wasted: Bound::new(0., 1.),
            migrated_memory: Bound::new(0., max_migrated_memory),
        }
    }

    /// Normalized power, revenue and wasted resources.
    pub fn normalize_placement(&self, values: &ObjectiveValues) -> [f64; 3] {
        [
            self.power.normalize(values.power),
            self.revenue.normalize(values.revenue),
            self.wasted.normalize(values.wasted),
        ]
    }

    /// All four objectives normalized.
    pub fn normalize_all(&self, values: &ObjectiveValues) -> [f64; 4] {
        [
            self.power.normalize(values.power),
            self.revenue.normalize(values.revenue),
            self.wasted.normalize(values.wasted),
            self.migrated_memory.normalize(values.migrated_memory),
        ]
    }
}

/// Score of a complete placement, used to compare a reconfiguration with the live placement.
pub fn placement_score(values: &ObjectiveValues, bounds: &APrioriBounds, method: ScalarizationMethod) -> f64 {
    method.scalarize(&bounds.normalize_placement(values), WEIGHT_OFFLINE)
}

/// Fitness of an optimizer candidate, including the migration cost.
pub fn candidate_fitness(values: &ObjectiveValues, bounds: &APrioriBounds, method: ScalarizationMethod) -> f64 {
    method.scalarize(&bounds.normalize_all(values), WEIGHT_OFFLINE)
}
