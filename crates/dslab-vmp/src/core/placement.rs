//! Placement of VMs onto hosts.

use serde::Serialize;

use crate::core::constraints::Constraints;
use crate::core::physical_machine::PhysicalMachine;
use crate::core::request::Request;
use crate::core::resources::{Resources, CPU};
use crate::core::virtual_machine::{VirtualMachine, VmKey, NO_HOST};

/// Result of applying an update request to a placement.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOutcome {
    /// Placed VM got the new profile.
    Updated,
    /// Derived VM got the new profile.
    UpdatedDerived,
    /// The new profile does not fit the host, the VM keeps its previous profile.
    /// Holds the demand not covered by the overbooking protection (may be all zeros).
    Violated(Resources),
    /// No VM with such identity is known.
    NotFound,
}

/// Hosts, placed VMs and derived (rejected) VMs at one point in time.
///
/// Hosts are stored in id order, so host `id` lives at index `id - 1`.
#[derive(Clone, Debug, Serialize)]
pub struct Placement {
    pub hosts: Vec<PhysicalMachine>,
    pub vms: Vec<VirtualMachine>,
    pub derived: Vec<VirtualMachine>,
    pub score: Option<f64>,
}

impl Placement {
    /// Creates an empty placement over the given hosts.
    pub fn new(hosts: Vec<PhysicalMachine>) -> Self {
        Self {
            hosts,
            vms: Vec::new(),
            derived: Vec::new(),
            score: None,
        }
    }

    /// Creates a placement from explicit lists, recomputing host state from the VM assignment.
    pub fn from_parts(hosts: Vec<PhysicalMachine>, vms: Vec<VirtualMachine>, derived: Vec<VirtualMachine>) -> Self {
        let mut placement = Self {
            hosts,
            vms,
            derived,
            score: None,
        };
        placement.recompute_hosts();
        placement
    }

    pub fn host(&self, id: u32) -> Option<&PhysicalMachine> {
        if id == NO_HOST {
            return None;
        }
        self.hosts.get(id as usize - 1)
    }

    pub fn host_mut(&mut self, id: u32) -> Option<&mut PhysicalMachine> {
        if id == NO_HOST {
            return None;
        }
        self.hosts.get_mut(id as usize - 1)
    }

    pub fn find_vm(&self, key: &VmKey) -> Option<usize> {
        self.vms.iter().position(|vm| vm.key() == *key)
    }

    pub fn find_derived(&self, key: &VmKey) -> Option<usize> {
        self.derived.iter().position(|vm| vm.key() == *key)
    }

    /// VMs currently placed on the host.
    pub fn vms_on(&self, host_id: u32) -> impl Iterator<Item = &VirtualMachine> {
        self.vms.iter().filter(move |vm| vm.host_id == host_id)
    }

    /// Sum of the maximum power of all hosts.
    pub fn max_power(&self) -> f64 {
        self.hosts.iter().map(|h| h.power_max).sum()
    }

    /// Places the VM on the host and applies its load.
    pub fn commit_admission(&mut self, mut vm: VirtualMachine, host_id: u32) {
        vm.host_id = host_id;
        let load = vm.load();
        if let Some(host) = self.host_mut(host_id) {
            host.apply(&load);
        }
        self.vms.push(vm);
    }

    /// Records the VM as derived.
    pub fn commit_rejection(&mut self, mut vm: VirtualMachine) {
        vm.host_id = NO_HOST;
        self.derived.push(vm);
    }

    /// Moves a placed VM to another host, keeping host loads consistent.
    pub fn move_vm(&mut self, index: usize, host_id: u32) {
        let load = self.vms[index].load();
        let source = self.vms[index].host_id;
        if let Some(host) = self.host_mut(source) {
            host.release(&load);
        }
        if let Some(host) = self.host_mut(host_id) {
            host.apply(&load);
        }
        self.vms[index].host_id = host_id;
    }

    /// Applies an update request.
    ///
    /// `migration_load` is added to the CPU utilization, it models the overhead of an
    /// in-flight migration of this VM. The check is done against the overbooking reservation
    /// of the previous profile, and on failure the VM keeps that profile.
    pub fn apply_update(&mut self, request: &Request, migration_load: f64, constraints: &Constraints) -> UpdateOutcome {
        let mut updated = request.to_vm();
        updated.utilization[CPU] += migration_load;
        let key = request.key();

        if let Some(index) = self.find_vm(&key) {
            let current = self.vms[index].clone();
            updated.host_id = current.host_id;
            let fits = match self.host(current.host_id) {
                Some(host) => constraints.fits(host, Some(&current), &updated, &self.vms, true),
                None => false,
            };
            if fits {
                let (old_load, new_load) = (current.load(), updated.load());
                if let Some(host) = self.host_mut(current.host_id) {
                    host.release(&old_load);
                    host.apply(&new_load);
                }
                self.vms[index] = updated;
                return UpdateOutcome::Updated;
            }
            return UpdateOutcome::Violated(constraints.violation(&current, &updated));
        }

        if let Some(index) = self.find_derived(&key) {
            updated.host_id = NO_HOST;
            self.derived[index] = updated;
            return UpdateOutcome::UpdatedDerived;
        }
        UpdateOutcome::NotFound
    }

    /// Drops placed and derived VMs whose lifetime ended at `time`, releasing their load.
    pub fn remove_expired(&mut self, time: u32) {
        let mut released = Vec::new();
        self.vms.retain(|vm| {
            if vm.is_expired(time) {
                released.push((vm.host_id, vm.load()));
                false
            } else {
                true
            }
        });
        for (host_id, load) in released {
            if let Some(host) = self.host_mut(host_id) {
                host.release(&load);
            }
        }
        self.derived.retain(|vm| !vm.is_expired(time));
    }

    /// Rebuilds host loads from the VM assignment.
    pub fn recompute_hosts(&mut self) {
        for host in self.hosts.iter_mut() {
            host.reset();
        }
        for i in 0..self.vms.len() {
            let (host_id, load) = (self.vms[i].host_id, self.vms[i].load());
            if let Some(host) = self.host_mut(host_id) {
                host.apply(&load);
            }
        }
    }

    /// Stores `score` and returns it.
    pub fn update_score(&mut self, score: f64) -> f64 {
        self.score = Some(score);
        score
    }

    /// Whether `other` has a strictly lower (better) score than this placement.
    ///
    /// A placement without score never wins.
    pub fn is_improved_by(&self, other: &Placement) -> bool {
        match (self.score, other.score) {
            (Some(current), Some(candidate)) => candidate < current,
            (None, Some(_)) => true,
            _ => false,
        }
    }
}
