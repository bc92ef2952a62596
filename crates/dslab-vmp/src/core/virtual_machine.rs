//! Virtual machine (workload) representation.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::core::resources::{Resources, Revenue, RESOURCES};

/// Host id of a VM which is not placed on any host (derived).
pub const NO_HOST: u32 = 0;

/// Identity of a VM: owning service, datacenter and VM id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VmKey {
    pub service_id: u32,
    pub datacenter_id: u32,
    pub vm_id: u32,
}

impl Display for VmKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "vm {} (service {}, dc {})", self.vm_id, self.service_id, self.datacenter_id)
    }
}

/// Represents virtual machine (VM).
///
/// Equality is identity-based (see [`VmKey`]), resource values do not take part in it.
#[derive(Clone, Debug, Serialize)]
pub struct VirtualMachine {
    pub id: u32,
    pub service_id: u32,
    pub datacenter_id: u32,
    pub host_id: u32,
    pub resources: Resources,
    /// Utilization of each resource in percent (0-100).
    pub utilization: Resources,
    pub revenue: Revenue,
    pub tinit: u32,
    pub tend: u32,
}

impl VirtualMachine {
    pub fn key(&self) -> VmKey {
        VmKey {
            service_id: self.service_id,
            datacenter_id: self.datacenter_id,
            vm_id: self.id,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.host_id != NO_HOST
    }

    /// Realized demand: `resources * utilization / 100`.
    pub fn load(&self) -> Resources {
        let mut load = Resources::zero();
        for i in 0..RESOURCES {
            load[i] = self.resources[i] * self.utilization[i] / 100.;
        }
        load
    }

    /// Capacity reserved on a host under overbooking.
    ///
    /// The realized part is always reserved, the idle part only in the `protection_factor` share.
    pub fn reservation(&self, protection_factor: &Resources) -> Resources {
        let mut reserved = Resources::zero();
        for i in 0..RESOURCES {
            let util = self.utilization[i] / 100.;
            reserved[i] = self.resources[i] * util + self.resources[i] * (1. - util) * protection_factor[i];
        }
        reserved
    }

    /// Revenue of the full requested capacity.
    pub fn total_revenue(&self) -> f64 {
        self.resources.dot(&self.revenue)
    }

    pub fn is_expired(&self, time: u32) -> bool {
        self.tend <= time
    }
}

impl PartialEq for VirtualMachine {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for VirtualMachine {}

impl Display for VirtualMachine {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} on host {}", self.key(), self.host_id)
    }
}
