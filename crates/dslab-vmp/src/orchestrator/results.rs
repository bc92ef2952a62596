//! Per-run metrics and aggregates.

use serde::Serialize;

use crate::core::context::{RequestCounters, SimulationContext};
use crate::core::scalarization::normalize;
use crate::orchestrator::AlgorithmKind;

/// Metrics of the live placement at the end of one time unit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeUnitMetrics {
    pub time: u32,
    pub power: f64,
    pub revenue: f64,
    pub wasted: f64,
    /// Online score of the live placement.
    pub score: f64,
}

/// Results of one scenario run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunResults {
    pub scenario: String,
    pub algorithm: Option<AlgorithmKind>,
    pub initial_time: u32,
    pub series: Vec<TimeUnitMetrics>,
    /// Online scores indexed by time unit, zero before the first request.
    pub scores: Vec<f64>,

    pub avg_power: f64,
    pub avg_revenue: f64,
    pub avg_wasted: f64,
    /// Sum of the online scores over the run.
    pub scenario_score: f64,
    pub economical_penalties: f64,
    pub leasing_costs: f64,
    pub counters: RequestCounters,

    /// Time units at which the optimizer was launched.
    pub reconfiguration_calls: Vec<u32>,
    pub migrations: u64,
    pub merges: u64,
    pub cancellations: u64,
}

impl RunResults {
    pub fn new(scenario: &str, algorithm: AlgorithmKind) -> Self {
        Self {
            scenario: scenario.to_string(),
            algorithm: Some(algorithm),
            ..Default::default()
        }
    }

    /// Computes the aggregates from the collected series.
    pub fn finalize(&mut self, ctx: &SimulationContext) {
        let mut scores = vec![0.; self.initial_time as usize];
        for m in self.series.iter() {
            let t = m.time as usize;
            if scores.len() <= t {
                scores.resize(t + 1, 0.);
            }
            scores[t] = m.score;
        }
        self.scores = scores;

        let n = self.series.len().max(1) as f64;
        self.avg_power = self
            .series
            .iter()
            .map(|m| normalize(m.power, 0., ctx.max_power()))
            .sum::<f64>()
            / n;
        self.avg_revenue = self
            .series
            .iter()
            .map(|m| {
                if m.revenue > 0. {
                    normalize(m.revenue, 0., ctx.revenue_apriori(m.time))
                } else {
                    0.
                }
            })
            .sum::<f64>()
            / n;
        self.avg_wasted = self.series.iter().map(|m| m.wasted).sum::<f64>() / n;
        self.scenario_score = self.series.iter().map(|m| m.score).sum();
        self.economical_penalties = ctx.economical_penalties();
        self.leasing_costs = ctx.leasing_costs();
        self.counters = ctx.counters().clone();
    }

    pub fn time_units(&self) -> usize {
        self.series.len()
    }
}
