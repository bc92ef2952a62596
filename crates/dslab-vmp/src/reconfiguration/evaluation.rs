//! Decoding and scoring of candidate assignments.

use crate::core::config::sim_config::SimulationConfig;
use crate::core::constraints::Constraints;
use crate::core::objectives::{max_link_migration, power_consumption, wasted_resources, ObjectiveValues, RevenueModel};
use crate::core::physical_machine::PhysicalMachine;
use crate::core::placement::Placement;
use crate::core::resources::{Resources, RAM};
use crate::core::scalarization::{candidate_fitness, placement_score, APrioriBounds, ScalarizationMethod};
use crate::core::virtual_machine::NO_HOST;

/// Per-host sums of a candidate assignment, indexed by host id (index 0 collects derived VMs).
#[derive(Clone, Debug)]
pub struct HostSums {
    /// Realized demand.
    pub load: Vec<Resources>,
    /// Overbooking reservation.
    pub reserved: Vec<Resources>,
}

impl HostSums {
    pub fn move_vm(&mut self, from: u32, to: u32, load: &Resources, reserved: &Resources) {
        self.load[from as usize] -= *load;
        self.reserved[from as usize] -= *reserved;
        self.load[to as usize] += *load;
        self.reserved[to as usize] += *reserved;
    }
}

/// Scores assignments of the VMs of a placement to its hosts.
///
/// An assignment (solution) maps the index of a placed VM to a host id, `0` meaning derived.
#[derive(Clone, Debug)]
pub struct Evaluator {
    pub constraints: Constraints,
    pub revenue_model: RevenueModel,
    pub scalarization: ScalarizationMethod,
}

impl Evaluator {
    pub fn new(constraints: Constraints, revenue_model: RevenueModel, scalarization: ScalarizationMethod) -> Self {
        Self {
            constraints,
            revenue_model,
            scalarization,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            Constraints::from_config(config),
            RevenueModel::new(config.penalty_factor, config.derive_cost),
            config.scalarization,
        )
    }

    /// Computes per-host load and reservation of the assignment.
    pub fn host_sums(&self, placement: &Placement, solution: &[u32]) -> HostSums {
        let slots = placement.hosts.len() + 1;
        let mut sums = HostSums {
            load: vec![Resources::zero(); slots],
            reserved: vec![Resources::zero(); slots],
        };
        for (vm, &host_id) in placement.vms.iter().zip(solution.iter()) {
            sums.load[host_id as usize] += vm.load();
            sums.reserved[host_id as usize] += vm.reservation(&self.constraints.protection_factor);
        }
        sums
    }

    /// Hosts with the load of the assignment applied.
    pub fn decode_hosts(&self, placement: &Placement, sums: &HostSums) -> Vec<PhysicalMachine> {
        placement
            .hosts
            .iter()
            .map(|host| {
                let mut host = host.clone();
                host.reset();
                host.apply(&sums.load[host.id as usize]);
                host
            })
            .collect()
    }

    /// Raw objective values of the assignment, migrations measured against the placement itself.
    pub fn objectives(&self, placement: &Placement, solution: &[u32], sums: &HostSums) -> ObjectiveValues {
        let hosts = self.decode_hosts(placement, sums);
        let derived_cost: f64 = placement
            .vms
            .iter()
            .zip(solution.iter())
            .filter(|(_, &host_id)| host_id == NO_HOST)
            .map(|(vm, _)| vm.total_revenue() * self.revenue_model.derive_cost)
            .sum();
        let moves = placement
            .vms
            .iter()
            .zip(solution.iter())
            .map(|(vm, &host_id)| (vm.host_id, host_id, vm.resources[RAM] * vm.utilization[RAM] / 100.));
        ObjectiveValues {
            power: power_consumption(&hosts),
            revenue: derived_cost + self.revenue_model.derive_cost(&placement.derived),
            wasted: wasted_resources(&hosts),
            migrated_memory: max_link_migration(moves, placement.hosts.len()),
        }
    }

    /// Scalar fitness of the objective values, lower is better.
    pub fn fitness(&self, values: &ObjectiveValues, bounds: &APrioriBounds) -> f64 {
        candidate_fitness(values, bounds, self.scalarization)
    }

    /// Converts the assignment into a scored placement.
    ///
    /// Host loads are recomputed from scratch and VMs assigned to no host join the derived list.
    pub fn decode(&self, placement: &Placement, solution: &[u32], bounds: &APrioriBounds) -> Placement {
        let mut vms = Vec::with_capacity(placement.vms.len());
        let mut derived = placement.derived.clone();
        for (vm, &host_id) in placement.vms.iter().zip(solution.iter()) {
            let mut vm = vm.clone();
            vm.host_id = host_id;
            if host_id == NO_HOST {
                derived.push(vm);
            } else {
                vms.push(vm);
            }
        }
        let mut result = Placement::from_parts(placement.hosts.clone(), vms, derived);
        let score = self.score(&result, bounds);
        result.update_score(score);
        result
    }

    /// Placement score without SLA penalties, used for optimizer results.
    pub fn score(&self, placement: &Placement, bounds: &APrioriBounds) -> f64 {
        let values = ObjectiveValues {
            power: power_consumption(&placement.hosts),
            revenue: self.revenue_model.revenue_loss(&placement.vms, &placement.derived, None),
            wasted: wasted_resources(&placement.hosts),
            migrated_memory: 0.,
        };
        placement_score(&values, bounds, self.scalarization)
    }
}
