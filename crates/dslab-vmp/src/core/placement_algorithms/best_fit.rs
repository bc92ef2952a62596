//! Best Fit algorithm.

use crate::core::constraints::Constraints;
use crate::core::placement::Placement;
use crate::core::placement_algorithm::PlacementHeuristic;
use crate::core::virtual_machine::VirtualMachine;

/// Uses the most loaded suitable host, i.e. the one with the smallest free capacity weight.
#[derive(Clone)]
pub struct BestFit;

impl BestFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for BestFit {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementHeuristic for BestFit {
    fn select_host(&self, vm: &VirtualMachine, placement: &Placement, constraints: &Constraints) -> Option<u32> {
        let mut result: Option<u32> = None;
        let mut min_weight = f64::MAX;

        for host in placement.hosts.iter() {
            if host.weight() < min_weight && constraints.fits(host, None, vm, &placement.vms, false) {
                min_weight = host.weight();
                result = Some(host.id);
            }
        }
        result
    }
}
