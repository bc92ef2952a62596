//! Candidate placement encoded as a host assignment vector.

use crate::core::objectives::ObjectiveValues;
use crate::core::placement::Placement;
use crate::core::scalarization::APrioriBounds;
use crate::reconfiguration::evaluation::{Evaluator, HostSums};

#[derive(Clone, Debug)]
pub struct Individual {
    /// Host id per VM index.
    pub solution: Vec<u32>,
    /// Per-host sums of the assignment, kept in sync with `solution` by repair.
    pub sums: Option<HostSums>,
    pub objectives: ObjectiveValues,
    pub fitness: f64,
}

impl Individual {
    pub fn new(solution: Vec<u32>) -> Self {
        Self {
            solution,
            sums: None,
            objectives: ObjectiveValues::default(),
            fitness: f64::MAX,
        }
    }

    /// Recomputes per-host sums from the solution.
    pub fn refresh_sums(&mut self, evaluator: &Evaluator, placement: &Placement) {
        self.sums = Some(evaluator.host_sums(placement, &self.solution));
    }

    /// Computes objective values and fitness.
    pub fn evaluate(&mut self, evaluator: &Evaluator, placement: &Placement, bounds: &APrioriBounds) {
        if self.sums.is_none() {
            self.refresh_sums(evaluator, placement);
        }
        if let Some(sums) = &self.sums {
            self.objectives = evaluator.objectives(placement, &self.solution, sums);
            self.fitness = evaluator.fitness(&self.objectives, bounds);
        }
    }
}
