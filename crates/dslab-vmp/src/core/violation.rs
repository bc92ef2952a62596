//! SLA violation records.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::core::resources::Resources;

/// Violation key: cloud service and VM id.
pub type ViolationKey = (u32, u32);

/// Unsatisfied demand per VM and time unit.
#[derive(Clone, Debug, Default)]
pub struct Violations {
    records: IndexMap<ViolationKey, BTreeMap<u32, Resources>>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the demand not covered for the VM at `time`.
    pub fn record(&mut self, service_id: u32, vm_id: u32, time: u32, amount: Resources) {
        self.records.entry((service_id, vm_id)).or_default().insert(time, amount);
    }

    /// Returns the violation of the VM at `time`, if any.
    pub fn get(&self, service_id: u32, vm_id: u32, time: u32) -> Option<&Resources> {
        self.records.get(&(service_id, vm_id)).and_then(|m| m.get(&time))
    }

    /// Number of recorded (VM, time) violations.
    pub fn count(&self) -> usize {
        self.records.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
