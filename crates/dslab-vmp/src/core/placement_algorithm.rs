//! Online VM placement heuristics.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use dyn_clone::{clone_trait_object, DynClone};
use serde::{Deserialize, Serialize};

use crate::core::config::options::parse_config_value;
use crate::core::constraints::Constraints;
use crate::core::placement::Placement;
use crate::core::placement_algorithms::best_fit::BestFit;
use crate::core::placement_algorithms::first_fit::FirstFit;
use crate::core::placement_algorithms::worst_fit::WorstFit;
use crate::core::request::{compare_by_time_and_revenue, Request};
use crate::core::resources::Resources;
use crate::core::virtual_machine::VirtualMachine;
use crate::error::VmpError;

/// Trait for implementation of VM placement heuristics.
///
/// The heuristic is a function of the VM and the current placement, which returns an ID of host
/// selected for the VM or `None` if there is no suitable host. It does not change the placement,
/// committing the decision is up to the caller (see [`place`]).
pub trait PlacementHeuristic: DynClone + Send {
    fn select_host(&self, vm: &VirtualMachine, placement: &Placement, constraints: &Constraints) -> Option<u32>;
}

clone_trait_object!(PlacementHeuristic);

/// Heuristic codes accepted in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeuristicCode {
    FF,
    BF,
    WF,
    FFD,
    BFD,
}

impl HeuristicCode {
    /// Decreasing variants process requests of a time unit by descending revenue.
    pub fn is_decreasing(&self) -> bool {
        matches!(self, HeuristicCode::FFD | HeuristicCode::BFD)
    }
}

impl FromStr for HeuristicCode {
    type Err = VmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "FF" | "FirstFit" => Ok(HeuristicCode::FF),
            "BF" | "BestFit" => Ok(HeuristicCode::BF),
            "WF" | "WorstFit" => Ok(HeuristicCode::WF),
            "FFD" | "FirstFitDecreasing" => Ok(HeuristicCode::FFD),
            "BFD" | "BestFitDecreasing" => Ok(HeuristicCode::BFD),
            other => Err(VmpError::UnknownHeuristic(other.to_string())),
        }
    }
}

impl Display for HeuristicCode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Creates the heuristic behind a code.
pub fn placement_heuristic_resolver(code: HeuristicCode) -> Box<dyn PlacementHeuristic> {
    match code {
        HeuristicCode::FF | HeuristicCode::FFD => Box::new(FirstFit::new()),
        HeuristicCode::BF | HeuristicCode::BFD => Box::new(BestFit::new()),
        HeuristicCode::WF => Box::new(WorstFit::new()),
    }
}

/// Resolves a heuristic from a config string such as `BFD` or `BestFit`.
pub fn placement_heuristic_from_str(config_str: &str) -> Result<Box<dyn PlacementHeuristic>, VmpError> {
    let (name, _options) = parse_config_value(config_str);
    Ok(placement_heuristic_resolver(name.parse()?))
}

/// Places a VM using the heuristic.
///
/// On success the VM is assigned to the selected host and its load applied, otherwise it is
/// appended to the derived list. New VMs are assumed to use all requested resources until
/// their first update, `is_migration` keeps the known utilization of a moved VM.
pub fn place(
    heuristic: &dyn PlacementHeuristic,
    mut vm: VirtualMachine,
    placement: &mut Placement,
    constraints: &Constraints,
    is_migration: bool,
) -> bool {
    if !is_migration {
        vm.utilization = Resources::splat(100.);
    }
    match heuristic.select_host(&vm, placement, constraints) {
        Some(host_id) => {
            placement.commit_admission(vm, host_id);
            true
        }
        None => {
            placement.commit_rejection(vm);
            false
        }
    }
}

/// Orders a batch of requests the way the heuristic expects them.
pub fn sort_requests(code: HeuristicCode, requests: &mut [Request]) {
    if code.is_decreasing() {
        requests.sort_by(compare_by_time_and_revenue);
    } else {
        requests.sort_by_key(|r| r.time);
    }
}
