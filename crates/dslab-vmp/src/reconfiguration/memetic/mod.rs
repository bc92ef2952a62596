//! Memetic (genetic search with repair) reconfiguration optimizer.

pub mod individual;
pub mod operators;
pub mod population;
pub mod repair;

use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::core::placement::Placement;
use crate::core::scalarization::APrioriBounds;
use crate::error::VmpError;
use crate::reconfiguration::evaluation::Evaluator;
use crate::reconfiguration::memetic::individual::Individual;
use crate::reconfiguration::memetic::operators::{
    initialize, one_point_crossover, tournament_selection, uniform_mutation,
};
use crate::reconfiguration::memetic::population::Population;
use crate::reconfiguration::memetic::repair::repair;
use crate::reconfiguration::{MemeticSettings, ReconfigurationContext, Reconfigurator};
use crate::{log_debug, log_info};

/// Elitist (mu + lambda) genetic algorithm over host assignment vectors.
pub struct MemeticAlgorithm {
    settings: MemeticSettings,
    evaluator: Evaluator,
    rng: Pcg64,
    ctx: ReconfigurationContext,
    history: Vec<f64>,
}

impl MemeticAlgorithm {
    pub fn new(settings: MemeticSettings, evaluator: Evaluator, seed: u64, ctx: ReconfigurationContext) -> Self {
        Self {
            settings,
            evaluator,
            rng: Pcg64::seed_from_u64(seed),
            ctx,
            history: Vec::new(),
        }
    }

    /// Best fitness after initialization and after every generation of the last run.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    fn repair_and_evaluate(&mut self, population: &mut Population, placement: &Placement, bounds: &APrioriBounds) {
        for individual in population.individuals.iter_mut() {
            repair(&mut self.rng, &self.evaluator, placement, individual);
            individual.evaluate(&self.evaluator, placement, bounds);
        }
        population.sort();
    }

    /// Runs the generational loop and returns the best individual found.
    pub fn evolve(&mut self, placement: &Placement, bounds: &APrioriBounds) -> Option<Individual> {
        let size = self.settings.population_size.max(1);
        let host_count = placement.hosts.len();
        self.history.clear();

        let mut population = initialize(&mut self.rng, size, placement.vms.len(), host_count);
        self.repair_and_evaluate(&mut population, placement, bounds);
        self.history.push(population.best()?.fitness);

        for generation in 0..self.settings.number_of_generations {
            let parents = tournament_selection(&mut self.rng, &population, size);
            let mut offspring = one_point_crossover(&mut self.rng, &parents, self.settings.crossover_prob, size);
            uniform_mutation(&mut self.rng, &mut offspring, host_count);
            self.repair_and_evaluate(&mut offspring, placement, bounds);
            population = population.merge(offspring, size);
            let best = population.best()?.fitness;
            log_debug!(self.ctx, "generation {}: best fitness {:.5}", generation, best);
            self.history.push(best);
        }
        population.best().cloned()
    }
}

impl Reconfigurator for MemeticAlgorithm {
    fn reconfigure(&mut self, placement: &Placement, bounds: &APrioriBounds) -> Result<Placement, VmpError> {
        if placement.vms.is_empty() || placement.hosts.is_empty() {
            let mut result = placement.clone();
            let score = self.evaluator.score(&result, bounds);
            result.update_score(score);
            return Ok(result);
        }
        let best = self
            .evolve(placement, bounds)
            .ok_or_else(|| VmpError::Reconfiguration("memetic algorithm produced no individuals".to_string()))?;
        let result = self.evaluator.decode(placement, &best.solution, bounds);
        log_info!(
            self.ctx,
            "finished: fitness {:.5}, placement score {:.5}",
            best.fitness,
            result.score.unwrap_or(f64::NAN)
        );
        Ok(result)
    }
}
