//! Per-run simulation context.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::Serialize;

use crate::core::config::sim_config::SimulationConfig;
use crate::core::constraints::Constraints;
use crate::core::objectives::RevenueModel;
use crate::core::request::Request;
use crate::core::resources::{Resources, RAM};
use crate::core::scalarization::APrioriBounds;
use crate::core::violation::Violations;

/// Request processing counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RequestCounters {
    /// Admitted VMs.
    pub served: u64,
    /// VMs which did not fit any host and became derived.
    pub rejected: u64,
    /// Successfully applied updates.
    pub updated: u64,
    /// Updates refused because of insufficient capacity.
    pub violated: u64,
    /// Requests issued after the end of their VM lifetime.
    pub invalid: u64,
}

/// State of one scenario run shared by all its components.
///
/// Owns the run config, SLA violation records, a-priori normalization tables, accumulated
/// penalties and the random number generator. Independent runs never share a context.
pub struct SimulationContext {
    name: String,
    time: u32,
    config: Arc<SimulationConfig>,
    constraints: Constraints,
    revenue_model: RevenueModel,
    violations: Violations,
    revenue_apriori: BTreeMap<u32, f64>,
    migrated_memory_apriori: BTreeMap<u32, f64>,
    max_power: f64,
    economical_penalties: f64,
    leasing_costs: f64,
    counters: RequestCounters,
    rng: Pcg64,
}

impl SimulationContext {
    pub fn new(name: &str, config: Arc<SimulationConfig>, max_power: f64) -> Self {
        Self {
            name: name.to_string(),
            time: 0,
            constraints: Constraints::from_config(&config),
            revenue_model: RevenueModel::new(config.penalty_factor, config.derive_cost),
            rng: Pcg64::seed_from_u64(config.seed),
            config,
            violations: Violations::new(),
            revenue_apriori: BTreeMap::new(),
            migrated_memory_apriori: BTreeMap::new(),
            max_power,
            economical_penalties: 0.,
            leasing_costs: 0.,
            counters: RequestCounters::default(),
        }
    }

    /// Returns the current time unit.
    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn set_time(&mut self, time: u32) {
        self.time = time;
    }

    /// Returns the name of the run.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn config_arc(&self) -> Arc<SimulationConfig> {
        self.config.clone()
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn revenue_model(&self) -> &RevenueModel {
        &self.revenue_model
    }

    pub fn violations(&self) -> &Violations {
        &self.violations
    }

    pub fn counters(&self) -> &RequestCounters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut RequestCounters {
        &mut self.counters
    }

    pub fn rng(&mut self) -> &mut Pcg64 {
        &mut self.rng
    }

    /// Sum of the maximum power of all hosts.
    pub fn max_power(&self) -> f64 {
        self.max_power
    }

    pub fn economical_penalties(&self) -> f64 {
        self.economical_penalties
    }

    pub fn leasing_costs(&self) -> f64 {
        self.leasing_costs
    }

    /// Accounts a request in the a-priori tables of its time unit.
    ///
    /// The worst revenue loss of a time unit is deriving every requested VM, and the worst
    /// migration cost is moving all their memory.
    pub fn register_request(&mut self, request: &Request) {
        *self.revenue_apriori.entry(request.time).or_insert(0.) +=
            request.total_revenue() * self.config.derive_cost;
        *self.migrated_memory_apriori.entry(request.time).or_insert(0.) += request.resources[RAM];
    }

    /// Records unsatisfied demand of a VM and charges the corresponding penalty.
    pub fn record_violation(&mut self, service_id: u32, vm_id: u32, revenue: &Resources, amount: Resources) {
        let time = self.time;
        self.violations.record(service_id, vm_id, time, amount);
        let penalty = amount.dot(revenue);
        *self.revenue_apriori.entry(time).or_insert(0.) += penalty;
        self.economical_penalties += penalty;
    }

    pub fn add_leasing_cost(&mut self, cost: f64) {
        self.leasing_costs += cost;
    }

    /// A-priori revenue bound of the time unit.
    pub fn revenue_apriori(&self, time: u32) -> f64 {
        self.revenue_apriori.get(&time).cloned().unwrap_or(0.)
    }

    /// A-priori migrated memory bound of the time unit.
    pub fn migrated_memory_apriori(&self, time: u32) -> f64 {
        self.migrated_memory_apriori.get(&time).cloned().unwrap_or(0.)
    }

    /// Normalization bounds of all objectives for the time unit.
    pub fn bounds(&self, time: u32) -> APrioriBounds {
        APrioriBounds::new(
            self.max_power,
            self.revenue_apriori(time),
            self.migrated_memory_apriori(time),
        )
    }
}
