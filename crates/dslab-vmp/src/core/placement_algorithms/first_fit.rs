//! First Fit algorithm.

use crate::core::constraints::Constraints;
use crate::core::placement::Placement;
use crate::core::placement_algorithm::PlacementHeuristic;
use crate::core::virtual_machine::VirtualMachine;

/// Uses the first suitable host in host list order.
#[derive(Clone)]
pub struct FirstFit;

impl FirstFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for FirstFit {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementHeuristic for FirstFit {
    fn select_host(&self, vm: &VirtualMachine, placement: &Placement, constraints: &Constraints) -> Option<u32> {
        placement
            .hosts
            .iter()
            .find(|host| constraints.fits(host, None, vm, &placement.vms, false))
            .map(|host| host.id)
    }
}
