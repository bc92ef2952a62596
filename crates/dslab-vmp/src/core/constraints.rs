//! Admission and overload predicates under overbooking.

use crate::core::config::sim_config::SimulationConfig;
use crate::core::physical_machine::PhysicalMachine;
use crate::core::resources::{Resources, RESOURCES};
use crate::core::virtual_machine::VirtualMachine;

/// Overbooking model shared by heuristics, optimizers and migration policies.
///
/// A VM reserves its realized demand plus the `protection_factor` share of its idle demand.
/// Factor 1 reserves the full requested capacity (no overbooking), factor 0 only the realized one.
#[derive(Clone, Debug)]
pub struct Constraints {
    pub protection_factor: Resources,
    pub fault_tolerance: bool,
}

impl Constraints {
    pub fn new(protection_factor: Resources, fault_tolerance: bool) -> Self {
        Self {
            protection_factor,
            fault_tolerance,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.protection_factor, config.fault_tolerance)
    }

    /// Total reservation of the VMs placed on `host_id`.
    pub fn reserved<'a, I>(&self, host_id: u32, vms: I) -> Resources
    where
        I: IntoIterator<Item = &'a VirtualMachine>,
    {
        let mut reserved = Resources::zero();
        for vm in vms.into_iter().filter(|vm| vm.host_id == host_id) {
            reserved += vm.reservation(&self.protection_factor);
        }
        reserved
    }

    /// Checks whether `host` can take `incoming` in place of `outgoing`.
    ///
    /// `outgoing` is the previous version of the same VM for updates, its reservation is
    /// subtracted before the new one is added. With fault tolerance enabled a fresh admission
    /// is refused if a VM of the same service already runs on the host.
    pub fn fits(
        &self,
        host: &PhysicalMachine,
        outgoing: Option<&VirtualMachine>,
        incoming: &VirtualMachine,
        vms: &[VirtualMachine],
        is_update: bool,
    ) -> bool {
        let reserved = self.reserved(host.id, vms);
        if !self.fits_reserved(&reserved, &host.capacity, outgoing, incoming) {
            return false;
        }
        if !is_update && self.fault_tolerance {
            return !vms
                .iter()
                .any(|vm| vm.host_id == host.id && vm.service_id == incoming.service_id);
        }
        true
    }

    /// Capacity check against an already computed host reservation.
    pub fn fits_reserved(
        &self,
        reserved: &Resources,
        capacity: &Resources,
        outgoing: Option<&VirtualMachine>,
        incoming: &VirtualMachine,
    ) -> bool {
        let mut total = *reserved + incoming.reservation(&self.protection_factor);
        if let Some(outgoing) = outgoing {
            total -= outgoing.reservation(&self.protection_factor);
        }
        (0..RESOURCES).all(|i| total[i] <= capacity[i])
    }

    /// Whether the `reserved` demand exceeds the host capacity on any resource.
    ///
    /// `reserved` is usually [`reserved`](Self::reserved) of the host, reaching the capacity
    /// exactly is not an overload.
    pub fn is_overloaded(&self, host: &PhysicalMachine, reserved: &Resources) -> bool {
        (0..RESOURCES).any(|i| reserved[i] > host.capacity[i])
    }

    /// Demand of `updated` which the reservation of `current` does not cover, per resource.
    ///
    /// All components are zero when the update is absorbed by the overbooking protection.
    pub fn violation(&self, current: &VirtualMachine, updated: &VirtualMachine) -> Resources {
        let mut violation = Resources::zero();
        let reserved = current.reservation(&self.protection_factor);
        let demand = updated.load();
        for i in 0..RESOURCES {
            violation[i] = (demand[i] - reserved[i]).max(0.);
        }
        violation
    }
}

/// Realized utilization of the host exceeds `threshold` (percent) on some resource.
pub fn is_pm_overloaded(host: &PhysicalMachine, threshold: f64) -> bool {
    host.utilization().any(|u| u * 100. > threshold)
}

/// Realized utilization of the host is below `threshold` (percent) on some resource.
pub fn is_pm_underloaded(host: &PhysicalMachine, threshold: f64) -> bool {
    host.utilization().any(|u| u * 100. < threshold)
}
