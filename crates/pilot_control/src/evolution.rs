//! Generational tuning of pilot genomes.
//!
//! Tournament selection, uniform crossover and Gaussian mutation over a
//! population that grows lazily until the first evolve. Fitness is whatever the
//! caller measures over an evaluation window; the engine does no I/O.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::genome::{Genome, GENE_COUNT};

/// Process-wide handle; every pilot of every team shares one engine.
pub type SharedEvolution = Arc<Mutex<EvolutionEngine>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub tournament_size: usize,
    pub elite_clones: usize,
    /// Per-gene probability of a Gaussian nudge.
    pub mutation_rate: f64,
    /// Standard deviation of the nudge.
    pub mutation_variance: f64,
    /// Candidates tested before an evolve step is due.
    pub evolve_threshold: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            tournament_size: 5,
            elite_clones: 0,
            mutation_rate: 0.3,
            mutation_variance: 0.1,
            evolve_threshold: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub genomes: Vec<Genome>,
    pub next_candidate: usize,
    pub tested: usize,
    pub generation: u32,
    /// Fittest genome seen at any evolve step.
    pub best: Option<Genome>,
}

impl Population {
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    pub fn mean_fitness(&self) -> Option<f64> {
        if self.genomes.is_empty() {
            return None;
        }
        Some(self.genomes.iter().map(|g| g.fitness).sum::<f64>() / self.genomes.len() as f64)
    }

    pub fn fittest(&self) -> Option<&Genome> {
        self.genomes
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }
}

/// Identifies the genome a pilot was handed, so late reports from a previous
/// generation are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateTicket {
    pub generation: u32,
    pub index: usize,
}

pub struct EvolutionEngine {
    config: EvolutionConfig,
    population: Population,
    rng: ChaCha8Rng,
}

impl EvolutionEngine {
    pub fn new(config: EvolutionConfig, population: Population, seed: u64) -> Self {
        Self {
            config,
            population,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn fresh(config: EvolutionConfig, seed: u64) -> Self {
        Self::new(config, Population::default(), seed)
    }

    pub fn into_shared(self) -> SharedEvolution {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Hands out the genome under the cursor, appending a random one when the
    /// cursor has run past the end.
    pub fn next_candidate(&mut self) -> (CandidateTicket, Genome) {
        let index = self.population.next_candidate;
        if index >= self.population.genomes.len() {
            let fresh = Genome::random(&mut self.rng);
            self.population.genomes.push(fresh);
        }
        self.population.next_candidate += 1;
        self.population.tested += 1;
        let ticket = CandidateTicket {
            generation: self.population.generation,
            index,
        };
        (ticket, self.population.genomes[index].clone())
    }

    /// Records the score delta for a ticket. Returns `false` when the ticket is
    /// stale or out of range and the report was dropped.
    pub fn report_fitness(&mut self, ticket: CandidateTicket, delta: f64) -> bool {
        if ticket.generation != self.population.generation {
            tracing::debug!(
                ticket_generation = ticket.generation,
                generation = self.population.generation,
                "dropping stale fitness report"
            );
            return false;
        }
        match self.population.genomes.get_mut(ticket.index) {
            Some(genome) => {
                genome.fitness = delta;
                true
            }
            None => false,
        }
    }

    pub fn ready_to_evolve(&self) -> bool {
        self.population.tested >= self.config.evolve_threshold
    }

    /// Replaces the population with the next generation.
    pub fn evolve(&mut self) {
        if self.population.is_empty() {
            tracing::warn!("evolve called on an empty population, skipping");
            return;
        }
        let size = self.population.len();
        let Some(best_now) = self.population.fittest().cloned() else {
            return;
        };
        let improved = self
            .population
            .best
            .as_ref()
            .map_or(true, |best| best_now.fitness >= best.fitness);
        if improved {
            self.population.best = Some(best_now.clone());
        }

        let mut current = std::mem::take(&mut self.population.genomes);
        let mut pool: Vec<Genome> = (0..size)
            .filter_map(|_| tournament(&current, self.config.tournament_size, &mut self.rng))
            .collect();
        current.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        pool.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        if pool.len() % 2 == 1 {
            pool.push(best_now.clone());
        }

        let mut next: Vec<Genome> = current
            .iter()
            .take(self.config.elite_clones.min(size))
            .map(Genome::untested)
            .collect();
        let noise = Normal::new(0.0, self.config.mutation_variance).ok();
        while next.len() < size {
            let (Some(mut a), Some(mut b)) = (pool.pop(), pool.pop()) else {
                break;
            };
            crossover(&mut a, &mut b, &mut self.rng);
            mutate(&mut a, self.config.mutation_rate, noise.as_ref(), &mut self.rng);
            mutate(&mut b, self.config.mutation_rate, noise.as_ref(), &mut self.rng);
            next.push(a.untested());
            next.push(b.untested());
        }

        let mean = current.iter().map(|g| g.fitness).sum::<f64>() / size as f64;
        tracing::info!(
            generation = self.population.generation,
            size = next.len(),
            best = best_now.fitness,
            mean,
            "evolved population"
        );
        self.population.genomes = next;
        self.population.next_candidate = 0;
        self.population.tested = 0;
        self.population.generation += 1;
    }
}

/// Best of `size` uniform draws with replacement.
fn tournament(genomes: &[Genome], size: usize, rng: &mut impl Rng) -> Option<Genome> {
    (0..size.max(1))
        .filter_map(|_| genomes.get(rng.gen_range(0..genomes.len().max(1))))
        .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
        .cloned()
}

/// Uniform crossover: each gene position is swapped with probability 0.5.
pub fn crossover(a: &mut Genome, b: &mut Genome, rng: &mut impl Rng) {
    for i in 0..GENE_COUNT {
        if rng.gen_bool(0.5) {
            std::mem::swap(&mut a.genes[i], &mut b.genes[i]);
        }
    }
}

/// Gaussian nudge per gene with probability `rate`, clamped to `[0, 1]`.
pub fn mutate(genome: &mut Genome, rate: f64, noise: Option<&Normal<f64>>, rng: &mut impl Rng) {
    let Some(noise) = noise else {
        return;
    };
    let rate = rate.clamp(0.0, 1.0);
    for gene in &mut genome.genes {
        if rng.gen_bool(rate) {
            *gene = (*gene + noise.sample(rng)).clamp(0.0, 1.0);
        }
    }
}
