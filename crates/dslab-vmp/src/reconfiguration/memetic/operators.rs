//! Genetic operators.

use rand::Rng;

use crate::reconfiguration::memetic::individual::Individual;
use crate::reconfiguration::memetic::population::Population;

/// Random population: every VM goes to a uniformly chosen host in `[1, host_count]`.
pub fn initialize<R: Rng>(rng: &mut R, size: usize, vm_count: usize, host_count: usize) -> Population {
    let individuals = (0..size)
        .map(|_| {
            let solution = (0..vm_count).map(|_| rng.gen_range(1..=host_count as u32)).collect();
            Individual::new(solution)
        })
        .collect();
    Population::new(individuals)
}

/// Binary tournament: draws two individuals and keeps the fitter one, `size + 1` times.
pub fn tournament_selection<R: Rng>(rng: &mut R, population: &Population, size: usize) -> Vec<Individual> {
    let n = population.len();
    let mut parents = Vec::with_capacity(size + 1);
    if n == 0 {
        return parents;
    }
    while parents.len() <= size {
        let a = &population.individuals[rng.gen_range(0..n)];
        let b = &population.individuals[rng.gen_range(0..n)];
        parents.push(if a.fitness <= b.fitness { a.clone() } else { b.clone() });
    }
    parents
}

/// Midpoint of the one-point crossover.
pub fn crossover_point(genes: usize) -> usize {
    if genes % 2 == 0 {
        genes / 2
    } else {
        genes / 2 + 1
    }
}

/// One-point crossover of neighbouring parents.
///
/// Parent `i` is paired with `i + 1` for even `i` and with `i - 1` for odd `i`. With probability
/// `probability` the child takes the genes before the midpoint from the partner, otherwise it
/// is a copy of the parent. The offspring is cut to `size` individuals.
pub fn one_point_crossover<R: Rng>(rng: &mut R, parents: &[Individual], probability: f64, size: usize) -> Population {
    let mut offspring = Vec::with_capacity(parents.len());
    for (i, parent) in parents.iter().enumerate() {
        let partner = if i % 2 == 0 { i + 1 } else { i - 1 };
        let mut child = Individual::new(parent.solution.clone());
        if partner < parents.len() && rng.gen::<f64>() < probability {
            let point = crossover_point(child.solution.len());
            child.solution[..point].copy_from_slice(&parents[partner].solution[..point]);
        }
        offspring.push(child);
    }
    offspring.truncate(size);
    Population::new(offspring)
}

/// Uniform mutation: each gene moves to another random host with probability `1 / genes`.
pub fn uniform_mutation<R: Rng>(rng: &mut R, population: &mut Population, host_count: usize) {
    if host_count < 2 {
        return;
    }
    for individual in population.individuals.iter_mut() {
        let genes = individual.solution.len();
        let mut changed = false;
        for gene in individual.solution.iter_mut() {
            if rng.gen::<f64>() < 1. / genes as f64 {
                let mut host = rng.gen_range(1..=host_count as u32);
                while host == *gene {
                    host = rng.gen_range(1..=host_count as u32);
                }
                *gene = host;
                changed = true;
            }
        }
        if changed {
            individual.sums = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use super::*;

    #[test]
    fn test_crossover_point() {
        assert_eq!(crossover_point(4), 2);
        assert_eq!(crossover_point(5), 3);
    }

    #[test]
    fn test_crossover_swaps_prefix() {
        let mut rng = Pcg64::seed_from_u64(1);
        let parents = vec![Individual::new(vec![1, 1, 1, 1]), Individual::new(vec![2, 2, 2, 2])];
        let offspring = one_point_crossover(&mut rng, &parents, 1., 2);
        assert_eq!(offspring.individuals[0].solution, vec![2, 2, 1, 1]);
        assert_eq!(offspring.individuals[1].solution, vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_selection_size() {
        let mut rng = Pcg64::seed_from_u64(1);
        let population = initialize(&mut rng, 4, 3, 2);
        assert_eq!(tournament_selection(&mut rng, &population, 4).len(), 5);
    }

    #[test]
    fn test_mutation_single_host_is_noop() {
        let mut rng = Pcg64::seed_from_u64(1);
        let mut population = initialize(&mut rng, 3, 5, 1);
        uniform_mutation(&mut rng, &mut population, 1);
        assert!(population.individuals.iter().all(|i| i.solution.iter().all(|&h| h == 1)));
    }
}
