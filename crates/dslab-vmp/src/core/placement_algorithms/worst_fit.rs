//! Worst Fit algorithm.

use crate::core::constraints::Constraints;
use crate::core::placement::Placement;
use crate::core::placement_algorithm::PlacementHeuristic;
use crate::core::virtual_machine::VirtualMachine;

/// Uses the least loaded suitable host, spreading the load.
#[derive(Clone)]
pub struct WorstFit;

impl WorstFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for WorstFit {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementHeuristic for WorstFit {
    fn select_host(&self, vm: &VirtualMachine, placement: &Placement, constraints: &Constraints) -> Option<u32> {
        let mut result: Option<u32> = None;
        let mut max_weight = f64::MIN;

        for host in placement.hosts.iter() {
            if host.weight() > max_weight && constraints.fits(host, None, vm, &placement.vms, false) {
                max_weight = host.weight();
                result = Some(host.id);
            }
        }
        result
    }
}
