//! Ant colony reconfiguration optimizer.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::core::placement::Placement;
use crate::core::resources::RESOURCES;
use crate::core::scalarization::APrioriBounds;
use crate::error::VmpError;
use crate::reconfiguration::evaluation::{Evaluator, HostSums};
use crate::reconfiguration::{AcoSettings, ReconfigurationContext, Reconfigurator};
use crate::{log_debug, log_info};

/// Lower bound of a pheromone trail. The upper bound is `max_pheromone` of the settings.
pub const MIN_PHEROMONE: f64 = 0.2;

/// Free capacity below this share means the VM does not fit.
const FREE_SPACE_EPSILON: f64 = 1e-8;

/// Ants walk over VMs and move each one to a host chosen with probability proportional to
/// `pheromone * heuristic`, where the heuristic is the mean free capacity share of the host
/// after taking the VM. Trails of the best assignment found are reinforced after each iteration.
pub struct AntColonyOptimizer {
    settings: AcoSettings,
    evaluator: Evaluator,
    rng: Pcg64,
    ctx: ReconfigurationContext,
}

impl AntColonyOptimizer {
    pub fn new(settings: AcoSettings, evaluator: Evaluator, seed: u64, ctx: ReconfigurationContext) -> Self {
        Self {
            settings,
            evaluator,
            rng: Pcg64::seed_from_u64(seed),
            ctx,
        }
    }

    /// Mean free capacity share of the host after adding VM `vm_index`, 0 if it does not fit.
    fn heuristic(&self, placement: &Placement, sums: &HostSums, vm_index: usize, host_id: u32) -> f64 {
        let vm = &placement.vms[vm_index];
        let host = &placement.hosts[host_id as usize - 1];
        let reserved = sums.reserved[host_id as usize] + vm.reservation(&self.evaluator.constraints.protection_factor);
        let mut free = 0.;
        for i in 0..RESOURCES {
            if host.capacity[i] <= 0. {
                return 0.;
            }
            let share = (host.capacity[i] - reserved[i]) / host.capacity[i];
            if share < FREE_SPACE_EPSILON {
                return 0.;
            }
            free += share;
        }
        free / RESOURCES as f64
    }

    fn violates_fault_tolerance(&self, placement: &Placement, solution: &[u32], vm_index: usize, host_id: u32) -> bool {
        let service_id = placement.vms[vm_index].service_id;
        self.evaluator.constraints.fault_tolerance
            && solution
                .iter()
                .enumerate()
                .any(|(j, &h)| j != vm_index && h == host_id && placement.vms[j].service_id == service_id)
    }

    /// Roulette choice of a host for the VM, `None` if no host is attractive.
    fn choose_host(
        &mut self,
        placement: &Placement,
        pheromone: &[Vec<f64>],
        solution: &[u32],
        sums: &HostSums,
        vm_index: usize,
    ) -> Option<u32> {
        let mut weights = Vec::with_capacity(placement.hosts.len());
        for host in placement.hosts.iter() {
            let weight = if host.id == solution[vm_index]
                || self.violates_fault_tolerance(placement, solution, vm_index, host.id)
            {
                0.
            } else {
                pheromone[vm_index][host.id as usize - 1] * self.heuristic(placement, sums, vm_index, host.id)
            };
            weights.push(weight);
        }
        let total: f64 = weights.iter().sum();
        if total <= 0. {
            return None;
        }
        let threshold = self.rng.gen::<f64>();
        let mut cumulative = 0.;
        for (i, weight) in weights.iter().enumerate() {
            cumulative += weight / total;
            if *weight > 0. && cumulative >= threshold {
                return Some(placement.hosts[i].id);
            }
        }
        weights.iter().rposition(|&w| w > 0.).map(|i| placement.hosts[i].id)
    }

    fn update_pheromone(&self, pheromone: &mut [Vec<f64>], best_solution: &[u32], best_fitness: f64) {
        let max_pheromone = self.settings.max_pheromone;
        let deposit = if best_fitness > 0. { 1. / best_fitness } else { max_pheromone };
        let rho = self.settings.pheromone_constant;
        for (vm_index, trails) in pheromone.iter_mut().enumerate() {
            for (host_index, trail) in trails.iter_mut().enumerate() {
                *trail *= 1. - rho;
                if best_solution[vm_index] as usize == host_index + 1 {
                    *trail += deposit;
                }
                *trail = trail.max(MIN_PHEROMONE).min(max_pheromone);
            }
        }
    }
}

impl Reconfigurator for AntColonyOptimizer {
    fn reconfigure(&mut self, placement: &Placement, bounds: &APrioriBounds) -> Result<Placement, VmpError> {
        let initial: Vec<u32> = placement.vms.iter().map(|vm| vm.host_id).collect();
        if placement.vms.is_empty() || placement.hosts.is_empty() {
            return Ok(self.evaluator.decode(placement, &initial, bounds));
        }
        let protection_factor = self.evaluator.constraints.protection_factor;
        let mut pheromone = vec![vec![self.settings.max_pheromone; placement.hosts.len()]; placement.vms.len()];

        let initial_sums = self.evaluator.host_sums(placement, &initial);
        let mut best_solution = initial.clone();
        let mut best_fitness = {
            let values = self.evaluator.objectives(placement, &initial, &initial_sums);
            self.evaluator.fitness(&values, bounds)
        };

        for iteration in 0..self.settings.iterations {
            for _ in 0..self.settings.ants {
                let mut solution = initial.clone();
                let mut sums = initial_sums.clone();
                let mut ant_best: Option<(Vec<u32>, f64)> = None;
                for vm_index in 0..placement.vms.len() {
                    let Some(host_id) = self.choose_host(placement, &pheromone, &solution, &sums, vm_index) else {
                        continue;
                    };
                    let vm = &placement.vms[vm_index];
                    sums.move_vm(solution[vm_index], host_id, &vm.load(), &vm.reservation(&protection_factor));
                    solution[vm_index] = host_id;

                    let values = self.evaluator.objectives(placement, &solution, &sums);
                    let fitness = self.evaluator.fitness(&values, bounds);
                    if ant_best.as_ref().map_or(true, |(_, f)| fitness < *f) {
                        ant_best = Some((solution.clone(), fitness));
                    }
                }
                if let Some((solution, fitness)) = ant_best {
                    if fitness < best_fitness {
                        best_fitness = fitness;
                        best_solution = solution;
                    }
                }
            }
            self.update_pheromone(&mut pheromone, &best_solution, best_fitness);
            log_debug!(self.ctx, "iteration {}: best fitness {:.5}", iteration, best_fitness);
        }

        let result = self.evaluator.decode(placement, &best_solution, bounds);
        log_info!(
            self.ctx,
            "finished: fitness {:.5}, placement score {:.5}",
            best_fitness,
            result.score.unwrap_or(f64::NAN)
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constraints::Constraints;
    use crate::core::objectives::RevenueModel;
    use crate::core::resources::Resources;
    use crate::core::scalarization::ScalarizationMethod;

    fn optimizer(max_pheromone: f64) -> AntColonyOptimizer {
        let settings = AcoSettings {
            ants: 2,
            iterations: 2,
            max_pheromone,
            pheromone_constant: 0.5,
        };
        let evaluator = Evaluator::new(
            Constraints::new(Resources::zero(), false),
            RevenueModel::new(Resources::splat(1.), 1.),
            ScalarizationMethod::ED,
        );
        AntColonyOptimizer::new(settings, evaluator, 1, ReconfigurationContext::new("aco", 0))
    }

    #[test]
    fn test_trails_are_bounded_by_configured_maximum() {
        let optimizer = optimizer(5.);
        let mut pheromone = vec![vec![5., 5.], vec![0.3, 0.3]];
        optimizer.update_pheromone(&mut pheromone, &[1, 2], 0.1);

        // evaporated to 2.5 plus a deposit of 10 on the best hosts
        assert_eq!(pheromone[0], vec![5., 2.5]);
        assert_eq!(pheromone[1], vec![MIN_PHEROMONE, 5.]);
    }
}
