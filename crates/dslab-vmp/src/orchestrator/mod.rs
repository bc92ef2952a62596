//! Time-stepped control loop tying placement, scoring and reconfiguration together.
//!
//! Requests are processed one time unit at a time. At each time-unit boundary expired VMs are
//! purged, the live placement is scored and the configured strategy decides whether to launch
//! the background optimizer, to start migrations or to merge an optimizer result.

mod clever;
mod periodic;
pub mod results;
mod state_of_art;
mod threshold;

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::sim_config::SimulationConfig;
use crate::core::context::SimulationContext;
use crate::core::objectives::{power_consumption, vms_to_migrate, wasted_resources, ObjectiveValues};
use crate::core::physical_machine::PhysicalMachine;
use crate::core::placement::{Placement, UpdateOutcome};
use crate::core::placement_algorithm::{place, placement_heuristic_resolver, sort_requests, PlacementHeuristic};
use crate::core::request::{missed_requests, Request, RequestKind};
use crate::core::resources::RAM;
use crate::core::scalarization::{normalize, placement_score, APrioriBounds, WEIGHT_ONLINE};
use crate::core::virtual_machine::{VirtualMachine, VmKey};
use crate::error::VmpError;
use crate::orchestrator::results::{RunResults, TimeUnitMetrics};
use crate::reconfiguration::evaluation::Evaluator;
use crate::reconfiguration::{optimizer_resolver, Reconfigurator};
use crate::reconfiguration::worker::{ReconfigurationWorker, SHUTDOWN_TIMEOUT};
use crate::{log_debug, log_error, log_info, log_warn};

/// Reconfiguration strategy of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmKind {
    /// Optimizer launched at a fixed interval.
    PeriodicMigration,
    /// Periodic optimizer whose result is adopted as soon as it is better.
    StateOfArt,
    /// No optimizer, VMs leave overloaded and underloaded hosts.
    ThresholdBased,
    /// Optimizer launched when the score forecast is trending worse.
    CleverReconfiguration,
    /// Placement heuristics only.
    Online,
}

impl FromStr for AlgorithmKind {
    type Err = VmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" | "PeriodicMigration" => Ok(AlgorithmKind::PeriodicMigration),
            "1" | "StateOfArt" => Ok(AlgorithmKind::StateOfArt),
            "2" | "ThresholdBased" => Ok(AlgorithmKind::ThresholdBased),
            "3" | "CleverReconfiguration" => Ok(AlgorithmKind::CleverReconfiguration),
            "4" | "Online" => Ok(AlgorithmKind::Online),
            other => Err(VmpError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl Display for AlgorithmKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// What happens with VMs arriving while the optimizer runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveringMethod {
    /// The running optimization is abandoned and the next trigger postponed by one interval.
    Cancellation,
    /// The optimization completes and missed requests are replayed onto its result.
    UpdateBased,
}

impl FromStr for RecoveringMethod {
    type Err = VmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CANCELLATION" => Ok(RecoveringMethod::Cancellation),
            "UPDATE-BASED" | "UPDATE_BASED" | "UPDATEBASED" => Ok(RecoveringMethod::UpdateBased),
            _ => Err(VmpError::UnknownRecoveringMethod(s.to_string())),
        }
    }
}

/// Orchestrator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OrchestratorState {
    /// Only placement heuristics are active.
    Serving,
    /// The optimizer runs in background.
    Reconfiguring,
    /// Migrations towards the optimizer result are in flight.
    Migrating,
}

/// Adopts `candidate` if its score is strictly lower than the score of `live`.
///
/// Returns whether the candidate was adopted.
pub fn merge_if_better(live: &mut Placement, candidate: Placement) -> bool {
    if live.is_improved_by(&candidate) {
        *live = candidate;
        true
    } else {
        false
    }
}

/// Time unit at which the migration of a VM completes, `time + round(ram * 8 / link_capacity)`.
///
/// Saturates at `u32::MAX` when the link cannot carry the VM memory.
pub fn migration_end_time(vm: &VirtualMachine, time: u32, link_capacity: f64) -> u32 {
    let seconds = (vm.resources[RAM] * 8. / link_capacity).round();
    time.saturating_add(seconds.max(0.) as u32)
}

/// Builds the optimizer of one reconfiguration from the config, a seed and the launch time.
pub type OptimizerFactory = Box<dyn Fn(&SimulationConfig, u64, u32) -> Box<dyn Reconfigurator> + Send>;

/// Runs one scenario.
pub struct Orchestrator {
    ctx: SimulationContext,
    live: Placement,
    requests: Vec<Request>,
    heuristic: Box<dyn PlacementHeuristic>,
    evaluator: Evaluator,
    optimizer_factory: OptimizerFactory,
    worker: ReconfigurationWorker,
    state: OrchestratorState,

    /// Earliest time unit of the next optimizer launch.
    trigger_time: u32,
    /// Projected end of the running optimization.
    reconfiguration_end: u32,
    /// Time unit at which the optimizer result is collected.
    migration_start: u32,
    migration_end: u32,
    migrating: Vec<(VmKey, u32)>,

    snapshot: Option<Placement>,
    snapshot_time: u32,
    bounds: APrioriBounds,
    result: Option<Placement>,

    results: RunResults,
}

impl Orchestrator {
    /// Creates orchestrator over the hosts. Host ids must be `1..=hosts.len()` in order.
    pub fn new(name: &str, config: SimulationConfig, hosts: Vec<PhysicalMachine>) -> Self {
        let live = Placement::new(hosts);
        let ctx = SimulationContext::new(name, Arc::new(config), live.max_power());
        let heuristic = placement_heuristic_resolver(ctx.config().heuristic);
        let evaluator = Evaluator::from_config(ctx.config());
        let results = RunResults::new(name, ctx.config().algorithm);
        Self {
            ctx,
            live,
            requests: Vec::new(),
            heuristic,
            evaluator,
            optimizer_factory: Box::new(optimizer_resolver),
            worker: ReconfigurationWorker::new(),
            state: OrchestratorState::Serving,
            trigger_time: 0,
            reconfiguration_end: 0,
            migration_start: 0,
            migration_end: 0,
            migrating: Vec::new(),
            snapshot: None,
            snapshot_time: 0,
            bounds: APrioriBounds::default(),
            result: None,
            results,
        }
    }

    /// Replaces the configured optimizer.
    pub fn with_optimizer_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&SimulationConfig, u64, u32) -> Box<dyn Reconfigurator> + Send + 'static,
    {
        self.optimizer_factory = Box::new(factory);
        self
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn placement(&self) -> &Placement {
        &self.live
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Runs the whole trace and returns the collected results.
    pub fn run(mut self, mut requests: Vec<Request>) -> Result<RunResults, VmpError> {
        sort_requests(self.ctx.config().heuristic, &mut requests);
        for request in requests.iter() {
            self.ctx.register_request(request);
        }
        self.requests = requests;
        let Some(first) = self.requests.first() else {
            return Ok(self.results);
        };
        let initial_time = first.time;
        self.results.initial_time = initial_time;
        self.trigger_time = initial_time + self.ctx.config().execution_first_time;
        log_info!(
            self.ctx,
            "starting {} with {} hosts and {} requests",
            self.ctx.config().algorithm,
            self.live.hosts.len(),
            self.requests.len()
        );

        let mut begin = 0;
        while begin < self.requests.len() {
            let actual = self.requests[begin].time;
            let mut end = begin;
            while end < self.requests.len() && self.requests[end].time == actual {
                end += 1;
            }
            let next = self.requests.get(end).map(|r| r.time);
            if let Err(e) = self.step(begin, end, next) {
                log_error!(self.ctx, "run aborted: {}", e);
                self.worker.shutdown(SHUTDOWN_TIMEOUT);
                return Err(e);
            }
            begin = end;
        }
        self.finish()
    }

    /// Processes the requests `begin..end` of one time unit and the boundary that follows.
    fn step(&mut self, begin: usize, end: usize, next: Option<u32>) -> Result<(), VmpError> {
        let actual = self.requests[begin].time;
        self.ctx.set_time(actual);
        let mut admissions = 0;
        for i in begin..end {
            let request = self.requests[i].clone();
            if request.kind() == RequestKind::Admission {
                admissions += 1;
            }
            self.process_request(&request);
        }
        self.record_time_unit(actual);

        match self.ctx.config().algorithm {
            AlgorithmKind::PeriodicMigration => self.periodic_step(actual, next),
            AlgorithmKind::StateOfArt => self.state_of_art_step(actual, next),
            AlgorithmKind::ThresholdBased => {
                self.threshold_step(actual);
                Ok(())
            }
            AlgorithmKind::CleverReconfiguration => self.clever_step(actual, next, admissions > 0),
            AlgorithmKind::Online => Ok(()),
        }
    }

    /// Applies one request to the live placement.
    pub fn process_request(&mut self, request: &Request) {
        match request.kind() {
            RequestKind::Invalid => {
                self.ctx.counters_mut().invalid += 1;
                log_error!(
                    self.ctx,
                    "request for {} at {} is past its end time {}, skipped",
                    request.key(),
                    request.time,
                    request.tend
                );
            }
            RequestKind::Admission => {
                let vm = request.to_vm();
                if place(
                    self.heuristic.as_ref(),
                    vm,
                    &mut self.live,
                    self.ctx.constraints(),
                    false,
                ) {
                    self.ctx.counters_mut().served += 1;
                    log_debug!(self.ctx, "admitted {}", request.key());
                } else {
                    self.ctx.counters_mut().rejected += 1;
                    log_debug!(self.ctx, "no host for {}, derived", request.key());
                }
            }
            RequestKind::Update => {
                let surcharge = if self.is_migrating(&request.key(), request.time) {
                    self.ctx.config().migration_factor_load
                } else {
                    0.
                };
                match self.live.apply_update(request, surcharge, self.ctx.constraints()) {
                    UpdateOutcome::Updated | UpdateOutcome::UpdatedDerived => self.ctx.counters_mut().updated += 1,
                    UpdateOutcome::Violated(amount) => {
                        self.ctx.counters_mut().violated += 1;
                        if amount.any(|v| v > 0.) {
                            self.ctx
                                .record_violation(request.service_id, request.vm_id, &request.revenue, amount);
                            log_debug!(self.ctx, "SLA violation of {}: {}", request.key(), amount);
                        }
                    }
                    UpdateOutcome::NotFound => {
                        self.ctx.counters_mut().violated += 1;
                        log_warn!(self.ctx, "update for unknown {}, counted as violated", request.key());
                    }
                }
            }
        }
    }

    fn is_migrating(&self, key: &VmKey, time: u32) -> bool {
        self.state == OrchestratorState::Migrating
            && self.migrating.iter().any(|(k, end)| k == key && time <= *end)
    }

    /// Purges expired VMs and records the metrics and the online score of the time unit.
    fn record_time_unit(&mut self, time: u32) {
        self.live.remove_expired(time);
        let values = self.objectives(&self.live, time);
        let normalized = [
            normalize(values.power, 0., self.ctx.max_power()),
            if values.revenue > 0. {
                normalize(values.revenue, 0., self.ctx.revenue_apriori(time))
            } else {
                0.
            },
            values.wasted,
        ];
        let score = self.ctx.config().scalarization.scalarize(&normalized, WEIGHT_ONLINE);
        self.live.update_score(score);

        let leasing = self.ctx.revenue_model().derive_cost(&self.live.derived);
        self.ctx.add_leasing_cost(leasing);

        self.results.series.push(TimeUnitMetrics {
            time,
            power: values.power,
            revenue: values.revenue,
            wasted: values.wasted,
            score,
        });
    }

    /// Power, revenue loss (with SLA penalties at `time`) and wasted resources of a placement.
    fn objectives(&self, placement: &Placement, time: u32) -> ObjectiveValues {
        ObjectiveValues {
            power: power_consumption(&placement.hosts),
            revenue: self.ctx.revenue_model().revenue_loss(
                &placement.vms,
                &placement.derived,
                Some((self.ctx.violations(), time)),
            ),
            wasted: wasted_resources(&placement.hosts),
            migrated_memory: 0.,
        }
    }

    /// Placement score used to compare the live placement with an optimizer result.
    fn rescore(&self, placement: &mut Placement, time: u32) -> f64 {
        let values = self.objectives(placement, time);
        let score = placement_score(&values, &self.ctx.bounds(time), self.ctx.config().scalarization);
        placement.update_score(score)
    }

    /// Recent online scores for `next - size ..= actual`, zero for time units without requests.
    fn score_window(&self, actual: u32, next: u32, size: usize) -> Vec<f64> {
        let from = next.saturating_sub(size as u32);
        (from..=actual)
            .map(|t| {
                self.results
                    .series
                    .iter()
                    .rev()
                    .find(|m| m.time == t)
                    .map_or(0., |m| m.score)
            })
            .collect()
    }

    /// Snapshots the live placement and submits the optimizer.
    fn launch_reconfiguration(&mut self, time: u32) {
        let snapshot = self.live.clone();
        self.bounds = self.ctx.bounds(time);
        let seed = self.ctx.rng().gen::<u64>();
        let optimizer = (self.optimizer_factory)(self.ctx.config(), seed, time);
        self.worker.submit(optimizer, snapshot.clone(), self.bounds, time);
        self.snapshot = Some(snapshot);
        self.snapshot_time = time;
        self.state = OrchestratorState::Reconfiguring;
        self.results.reconfiguration_calls.push(time);
        log_info!(
            self.ctx,
            "reconfiguration started with {} VMs on {} hosts",
            self.live.vms.len(),
            self.live.hosts.len()
        );
    }

    /// Abandons the running optimization, its result will be ignored.
    fn cancel_reconfiguration(&mut self) {
        self.worker.discard();
        self.snapshot = None;
        self.state = OrchestratorState::Serving;
        self.results.cancellations += 1;
        log_info!(self.ctx, "reconfiguration cancelled");
    }

    /// Waits for the optimizer and starts migrating towards its result.
    fn begin_migration(&mut self, time: u32) -> Result<(), VmpError> {
        let Some(mut result) = self.worker.await_result()? else {
            self.state = OrchestratorState::Serving;
            return Ok(());
        };
        let snapshot_vms = self.snapshot.as_ref().map(|s| s.vms.clone()).unwrap_or_default();
        let to_migrate: Vec<VirtualMachine> = vms_to_migrate(&snapshot_vms, &result.vms)
            .into_iter()
            .filter(|vm| !vm.is_expired(time))
            .collect();
        result.remove_expired(time);
        let score = self.evaluator.score(&result, &self.bounds);
        result.update_score(score);
        self.result = Some(result);
        self.schedule_migrations(&to_migrate, time);
        if self.migration_end <= time {
            self.finish_migration(time);
        }
        Ok(())
    }

    /// Registers in-flight migrations and enters the migrating state.
    fn schedule_migrations(&mut self, vms: &[VirtualMachine], time: u32) {
        let link_capacity = self.ctx.config().link_capacity;
        self.migrating = vms
            .iter()
            .map(|vm| (vm.key(), migration_end_time(vm, time, link_capacity)))
            .collect();
        self.migration_end = self.migrating.iter().map(|(_, end)| *end).max().unwrap_or(time);
        self.results.migrations += vms.len() as u64;
        self.state = OrchestratorState::Migrating;
        log_info!(
            self.ctx,
            "migrating {} VMs until time {}",
            vms.len(),
            self.migration_end
        );
    }

    /// Brings the optimizer result up to date and adopts it if it beats the live placement.
    fn finish_migration(&mut self, time: u32) {
        self.migrating.clear();
        self.state = OrchestratorState::Serving;
        let Some(result) = self.result.take() else {
            return;
        };
        let mut candidate = self.catch_up(result, time);
        self.rescore(&mut candidate, time);
        let mut live = std::mem::replace(&mut self.live, Placement::new(Vec::new()));
        self.rescore(&mut live, time);
        let (live_score, candidate_score) = (live.score, candidate.score);
        if merge_if_better(&mut live, candidate) {
            self.results.merges += 1;
            log_info!(
                self.ctx,
                "reconfiguration adopted: score {:.5} -> {:.5}",
                live_score.unwrap_or(f64::NAN),
                candidate_score.unwrap_or(f64::NAN)
            );
        } else {
            log_info!(
                self.ctx,
                "reconfiguration discarded: live score {:.5}, result score {:.5}",
                live_score.unwrap_or(f64::NAN),
                candidate_score.unwrap_or(f64::NAN)
            );
        }
        self.live = live;
        self.snapshot = None;
    }

    /// Replays the requests the snapshot did not see onto an optimizer result.
    fn catch_up(&mut self, mut placement: Placement, time: u32) -> Placement {
        placement.remove_expired(time);
        let missed = missed_requests(
            &self.requests,
            self.snapshot_time,
            time,
            self.ctx.config().heuristic.is_decreasing(),
        );
        let constraints = self.ctx.constraints().clone();
        for request in missed.iter() {
            match request.kind() {
                RequestKind::Admission => {
                    if placement.find_vm(&request.key()).is_none() && placement.find_derived(&request.key()).is_none() {
                        place(self.heuristic.as_ref(), request.to_vm(), &mut placement, &constraints, false);
                    }
                }
                RequestKind::Update => {
                    placement.apply_update(request, 0., &constraints);
                }
                RequestKind::Invalid => {}
            }
        }
        log_debug!(self.ctx, "replayed {} missed requests", missed.len());
        placement
    }

    /// Drains the worker and finalizes results.
    fn finish(mut self) -> Result<RunResults, VmpError> {
        if self.worker.is_pending() && !self.worker.shutdown(SHUTDOWN_TIMEOUT) {
            log_warn!(self.ctx, "reconfiguration still running at shutdown, abandoned");
        }
        self.results.finalize(&self.ctx);
        log_info!(
            self.ctx,
            "finished: served {}, rejected {}, updated {}, violated {}, migrations {}",
            self.ctx.counters().served,
            self.ctx.counters().rejected,
            self.ctx.counters().updated,
            self.ctx.counters().violated,
            self.results.migrations
        );
        Ok(self.results)
    }
}
