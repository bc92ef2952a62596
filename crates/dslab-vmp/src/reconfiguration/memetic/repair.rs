//! Repair of overloaded hosts in a candidate assignment.

use rand::Rng;

use crate::core::placement::Placement;
use crate::core::virtual_machine::NO_HOST;
use crate::reconfiguration::evaluation::Evaluator;
use crate::reconfiguration::memetic::individual::Individual;

/// Moves VMs away from overloaded hosts.
///
/// For every VM on an overloaded host, hosts are scanned cyclically from a random one and the VM
/// goes to the first host able to take it. The solution and per-host sums change together, so
/// later checks see the moves already made. VMs without an alternative stay where they are.
pub fn repair<R: Rng>(rng: &mut R, evaluator: &Evaluator, placement: &Placement, individual: &mut Individual) {
    let host_count = placement.hosts.len();
    if host_count == 0 {
        return;
    }
    if individual.sums.is_none() {
        individual.refresh_sums(evaluator, placement);
    }
    let Some(sums) = individual.sums.as_mut() else {
        return;
    };
    let protection_factor = evaluator.constraints.protection_factor;

    for i in 0..individual.solution.len() {
        let host_id = individual.solution[i];
        if host_id == NO_HOST {
            continue;
        }
        let host = &placement.hosts[host_id as usize - 1];
        if !evaluator.constraints.is_overloaded(host, &sums.reserved[host_id as usize]) {
            continue;
        }

        let vm = &placement.vms[i];
        let start = rng.gen_range(0..host_count);
        for step in 0..host_count {
            let candidate = placement.hosts[(start + step) % host_count].id;
            if candidate == host_id {
                continue;
            }
            let target = &placement.hosts[candidate as usize - 1];
            if !evaluator
                .constraints
                .fits_reserved(&sums.reserved[candidate as usize], &target.capacity, None, vm)
            {
                continue;
            }
            if evaluator.constraints.fault_tolerance
                && individual.solution.iter().enumerate().any(|(j, &h)| {
                    j != i && h == candidate && placement.vms[j].service_id == vm.service_id
                })
            {
                continue;
            }
            sums.move_vm(host_id, candidate, &vm.load(), &vm.reservation(&protection_factor));
            individual.solution[i] = candidate;
            break;
        }
    }
}
