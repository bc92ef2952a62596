//! Objective functions of a placement.
//!
//! All objectives are minimized: power consumption, revenue lost to SLA penalties and derived VMs,
//! wasted resources of running hosts and memory moved by migrations.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::physical_machine::PhysicalMachine;
use crate::core::power_model::{LinearPowerModel, PowerModel};
use crate::core::resources::{Resources, RAM, RESOURCES};
use crate::core::violation::Violations;
use crate::core::virtual_machine::{VirtualMachine, VmKey, NO_HOST};

/// Raw (not normalized) objective values of a placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ObjectiveValues {
    pub power: f64,
    pub revenue: f64,
    pub wasted: f64,
    pub migrated_memory: f64,
}

/// Power consumption of all running hosts with the default linear model.
pub fn power_consumption(hosts: &[PhysicalMachine]) -> f64 {
    power_consumption_with(hosts, &LinearPowerModel::new())
}

/// Power consumption of all running hosts. Idle hosts are assumed to be switched off.
pub fn power_consumption_with(hosts: &[PhysicalMachine], model: &dyn PowerModel) -> f64 {
    hosts
        .iter()
        .filter(|host| host.is_working())
        .map(|host| model.get_power(host.power_max, host.utilization().cpu))
        .sum()
}

/// Prices of the revenue objective.
#[derive(Clone, Debug)]
pub struct RevenueModel {
    /// Weight of violated demand per resource.
    pub penalty_factor: Resources,
    /// Multiplier of the revenue of derived VMs (cost of outsourcing them).
    pub derive_cost: f64,
}

impl RevenueModel {
    pub fn new(penalty_factor: Resources, derive_cost: f64) -> Self {
        Self {
            penalty_factor,
            derive_cost,
        }
    }

    /// Revenue lost by the placement.
    ///
    /// Sums SLA penalties recorded at `time` for placed VMs (skipped when `violations` is `None`)
    /// and the leasing cost of derived VMs.
    pub fn revenue_loss(
        &self,
        vms: &[VirtualMachine],
        derived: &[VirtualMachine],
        violations: Option<(&Violations, u32)>,
    ) -> f64 {
        let mut total = 0.;
        if let Some((violations, time)) = violations {
            for vm in vms {
                if let Some(amount) = violations.get(vm.service_id, vm.id, time) {
                    total += amount.scale(&vm.revenue).dot(&self.penalty_factor);
                }
            }
        }
        total + self.derive_cost(derived)
    }

    /// Cost of the derived VMs.
    pub fn derive_cost(&self, derived: &[VirtualMachine]) -> f64 {
        derived.iter().map(|vm| vm.total_revenue() * self.derive_cost).sum()
    }
}

/// Average unused share of capacity over running hosts and resources. Zero if no host runs.
pub fn wasted_resources(hosts: &[PhysicalMachine]) -> f64 {
    let mut wasted = Resources::zero();
    let mut working = 0;
    for host in hosts.iter().filter(|host| host.is_working()) {
        let utilization = host.utilization();
        for i in 0..RESOURCES {
            wasted[i] += (1. - utilization[i]).max(0.);
        }
        working += 1;
    }
    if working == 0 {
        return 0.;
    }
    wasted.total() / (working as f64 * RESOURCES as f64)
}

fn is_migrated(old_host: u32, new_host: u32) -> bool {
    old_host != new_host && new_host != NO_HOST
}

/// Number of VMs (aligned by index) whose host changed.
pub fn migration_count(old: &[VirtualMachine], new: &[VirtualMachine]) -> usize {
    old.iter()
        .zip(new.iter())
        .filter(|(o, n)| is_migrated(o.host_id, n.host_id))
        .count()
}

/// Memory (requested RAM) moved by the migrations between two VM lists aligned by index.
pub fn memory_migrated(old: &[VirtualMachine], new: &[VirtualMachine]) -> f64 {
    old.iter()
        .zip(new.iter())
        .filter(|(o, n)| is_migrated(o.host_id, n.host_id))
        .map(|(_, n)| n.resources[RAM])
        .sum()
}

/// Largest amount of used memory moved between any pair of hosts.
///
/// Migrations share the link between the source and destination hosts, so the busiest pair
/// bounds the migration time.
pub fn migrated_memory_between_hosts(old: &[VirtualMachine], new: &[VirtualMachine], host_count: usize) -> f64 {
    max_link_migration(
        old.iter()
            .zip(new.iter())
            .map(|(o, n)| (o.host_id, n.host_id, n.resources[RAM] * n.utilization[RAM] / 100.)),
        host_count,
    )
}

/// Largest sum of memory over `(from, to, memory)` moves sharing a host pair.
pub fn max_link_migration<I>(moves: I, host_count: usize) -> f64
where
    I: Iterator<Item = (u32, u32, f64)>,
{
    let mut matrix = vec![vec![0.; host_count + 1]; host_count + 1];
    let mut max = 0.;
    for (from, to, memory) in moves {
        if !is_migrated(from, to) || from as usize > host_count || to as usize > host_count {
            continue;
        }
        let cell = &mut matrix[from as usize][to as usize];
        *cell += memory;
        if *cell > max {
            max = *cell;
        }
    }
    max
}

/// VMs of `new` placed on a different host than in `current`, matched by identity.
///
/// VMs unknown to `current` or derived in `new` are not migrations.
pub fn vms_to_migrate(current: &[VirtualMachine], new: &[VirtualMachine]) -> Vec<VirtualMachine> {
    let hosts: HashMap<VmKey, u32> = current.iter().map(|vm| (vm.key(), vm.host_id)).collect();
    new.iter()
        .filter(|vm| match hosts.get(&vm.key()) {
            Some(&old_host) => is_migrated(old_host, vm.host_id),
            None => false,
        })
        .cloned()
        .collect()
}
