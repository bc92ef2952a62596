//! Population of candidate placements.

use std::cmp::Ordering;

use crate::reconfiguration::memetic::individual::Individual;

/// Individuals ordered by fitness (ascending) after [`sort`](Population::sort).
#[derive(Clone, Debug, Default)]
pub struct Population {
    pub individuals: Vec<Individual>,
}

impl Population {
    pub fn new(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn sort(&mut self) {
        self.individuals
            .sort_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap_or(Ordering::Equal));
    }

    /// Individual with the lowest fitness.
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .min_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap_or(Ordering::Equal))
    }

    /// Elitist merge: keeps the `size` fittest individuals of both populations.
    pub fn merge(mut self, offspring: Population, size: usize) -> Population {
        self.individuals.extend(offspring.individuals);
        self.sort();
        self.individuals.truncate(size);
        self
    }
}
