//! Generic generational GA.
//!
//! A problem supplies individuals, fitness, crossover, and mutation through
//! [`GaProblem`]; [`GaRunner`] owns the evolutionary loop.
//!
//! # Conventions
//! - **Higher fitness = better** (maximization).
//! - The population is kept sorted best-first; equal fitness is broken by
//!   the smaller individual id, so a fixed seed gives a fixed run.
//! - Fitness evaluation never touches the RNG, so evaluating a generation
//!   in parallel does not change the outcome.
//!
//! # Reference
//! Goldberg (1989), "Genetic Algorithms in Search, Optimization, and Machine Learning"

use std::cmp::Ordering;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::operators::CrossoverType;
use super::selection::{select_index, SelectionStrategy};
use crate::error::EngineError;

/// A member of the GA population.
pub trait Individual: Clone + Send + Sync {
    /// Current fitness.
    fn fitness(&self) -> f64;
    /// Stores the evaluated fitness.
    fn set_fitness(&mut self, fitness: f64);
    /// Stable id, assigned by the runner in creation order.
    fn id(&self) -> u64;
    /// Assigns the stable id.
    fn set_id(&mut self, id: u64);
    /// Records the generation the individual was born in.
    fn set_generation(&mut self, _generation: usize) {}
}

/// Problem definition plugged into [`GaRunner`].
pub trait GaProblem: Sync {
    /// Individual type.
    type Individual: Individual;

    /// Heuristic individuals placed into the initial population first.
    fn seed_individuals(&self) -> Vec<Self::Individual> {
        Vec::new()
    }

    /// Creates a random individual.
    fn create_individual<R: Rng>(&self, rng: &mut R) -> Self::Individual;

    /// Fitness of an individual (higher = better, never negative).
    fn evaluate(&self, individual: &Self::Individual) -> f64;

    /// Recombines two parents into children.
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Individual,
        parent2: &Self::Individual,
        rng: &mut R,
    ) -> Vec<Self::Individual>;

    /// Mutates an individual in place.
    fn mutate<R: Rng>(&self, individual: &mut Self::Individual, rng: &mut R);
}

/// GA parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Generation cap.
    pub max_generations: usize,
    /// Probability an offspring is mutated.
    pub mutation_rate: f64,
    /// Probability a parent pair is recombined.
    pub crossover_rate: f64,
    /// Fraction of each generation copied unchanged into the next.
    pub elitism_rate: f64,
    /// Minimum best-fitness gain that counts as improvement.
    pub convergence_threshold: f64,
    /// Consecutive non-improving generations before stopping.
    pub stall_generations: usize,
    /// Parent selection strategy.
    pub selection: SelectionStrategy,
    /// Contestants per tournament.
    pub tournament_size: usize,
    /// Crossover operator.
    pub crossover: CrossoverType,
    /// RNG seed. `None` = draw one and report it.
    pub seed: Option<u64>,
    /// Evaluate fitness across worker threads.
    pub parallel: bool,
    /// Wall-clock budget (ms).
    pub timeout_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            elitism_rate: 0.1,
            convergence_threshold: 1e-4,
            stall_generations: 15,
            selection: SelectionStrategy::Tournament,
            tournament_size: 3,
            crossover: CrossoverType::Uniform,
            seed: None,
            parallel: true,
            timeout_ms: None,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the generation cap.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    /// Sets the elitism rate.
    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate;
        self
    }

    /// Sets the convergence threshold and stall window.
    pub fn with_convergence(mut self, threshold: f64, stall_generations: usize) -> Self {
        self.convergence_threshold = threshold;
        self.stall_generations = stall_generations;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, selection: SelectionStrategy) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the crossover operator.
    pub fn with_crossover(mut self, crossover: CrossoverType) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Number of elites carried per generation (at least one).
    pub fn elite_count(&self) -> usize {
        let n = self.population_size.max(1);
        ((n as f64 * self.elitism_rate).ceil() as usize).clamp(1, n)
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), EngineError> {
        let bad = |msg: String| Err(EngineError::InvalidRequest(msg));
        if self.population_size < 2 {
            return bad(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            ));
        }
        if self.max_generations == 0 {
            return bad("max_generations must be at least 1".into());
        }
        for (name, rate) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
            ("elitism_rate", self.elitism_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return bad(format!("{name} must be within 0.0..=1.0, got {rate}"));
            }
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 0.0 {
            return bad(format!(
                "convergence_threshold must be non-negative, got {}",
                self.convergence_threshold
            ));
        }
        if self.stall_generations == 0 {
            return bad("stall_generations must be at least 1".into());
        }
        if self.selection == SelectionStrategy::Tournament && self.tournament_size == 0 {
            return bad("tournament_size must be at least 1".into());
        }
        Ok(())
    }
}

/// Outcome of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult<I> {
    /// Best individual found.
    pub best: I,
    /// Its fitness.
    pub best_fitness: f64,
    /// Final population, best first.
    pub population: Vec<I>,
    /// Generations completed (initial population not counted).
    pub generations: usize,
    /// Generation at which the stall criterion fired.
    pub convergence_generation: Option<usize>,
    /// Whether the wall-clock budget stopped the run.
    pub timed_out: bool,
    /// Best fitness per generation; index 0 is the initial population.
    pub history: Vec<f64>,
    /// Seed used.
    pub seed: u64,
}

/// Runs the generational loop.
pub struct GaRunner;

impl GaRunner {
    /// Evolves a population for `problem` under `config`.
    ///
    /// # Algorithm
    /// 1. Seed individuals, then random ones, up to the population size.
    /// 2. Per generation: copy elites, breed offspring by selection,
    ///    crossover, and mutation, evaluate them, merge, and sort.
    /// 3. Stop at the generation cap, on timeout, or after
    ///    `stall_generations` without a gain above `convergence_threshold`.
    pub fn run<P: GaProblem>(problem: &P, config: &GaConfig) -> GaResult<P::Individual> {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        let started = Instant::now();

        let n = config.population_size.max(1);
        let elite_count = config.elite_count();
        let mutation_rate = config.mutation_rate.clamp(0.0, 1.0);
        let crossover_rate = config.crossover_rate.clamp(0.0, 1.0);
        let mut next_id: u64 = 0;

        let mut population: Vec<P::Individual> =
            problem.seed_individuals().into_iter().take(n).collect();
        while population.len() < n {
            population.push(problem.create_individual(&mut rng));
        }
        for individual in &mut population {
            individual.set_id(next_id);
            individual.set_generation(0);
            next_id += 1;
        }
        evaluate_all(problem, &mut population, config.parallel);
        population.sort_by(compare_individuals);

        let mut history = vec![population[0].fitness()];
        let mut reference = population[0].fitness();
        let mut stall = 0usize;
        let mut generations = 0usize;
        let mut convergence_generation = None;
        let mut timed_out = false;

        for generation in 1..=config.max_generations {
            if let Some(limit) = config.timeout_ms {
                if started.elapsed().as_millis() >= u128::from(limit) {
                    timed_out = true;
                    break;
                }
            }

            let target = n - elite_count;
            let mut offspring: Vec<P::Individual> = Vec::with_capacity(target);
            while offspring.len() < target {
                let i = select_index(&population, config.selection, config.tournament_size, &mut rng);
                let j = select_index(&population, config.selection, config.tournament_size, &mut rng);
                let mut children = if rng.random_bool(crossover_rate) {
                    problem.crossover(&population[i], &population[j], &mut rng)
                } else {
                    Vec::new()
                };
                if children.is_empty() {
                    children = vec![population[i].clone(), population[j].clone()];
                }
                for mut child in children {
                    if offspring.len() >= target {
                        break;
                    }
                    if rng.random_bool(mutation_rate) {
                        problem.mutate(&mut child, &mut rng);
                    }
                    child.set_id(next_id);
                    child.set_generation(generation);
                    next_id += 1;
                    offspring.push(child);
                }
            }
            evaluate_all(problem, &mut offspring, config.parallel);

            let mut next: Vec<P::Individual> = population[..elite_count].to_vec();
            next.extend(offspring);
            next.sort_by(compare_individuals);
            population = next;
            generations = generation;

            let best = population[0].fitness();
            history.push(best);
            if best - reference > config.convergence_threshold {
                reference = best;
                stall = 0;
            } else {
                stall += 1;
            }
            debug!(generation, best_fitness = best, stall, "generation complete");

            if stall >= config.stall_generations {
                convergence_generation = Some(generation);
                break;
            }
        }

        let best = population[0].clone();
        GaResult {
            best_fitness: best.fitness(),
            best,
            population,
            generations,
            convergence_generation,
            timed_out,
            history,
            seed,
        }
    }
}

/// Best-first ordering: fitness descending, then id ascending.
pub fn compare_individuals<I: Individual>(a: &I, b: &I) -> Ordering {
    b.fitness()
        .total_cmp(&a.fitness())
        .then_with(|| a.id().cmp(&b.id()))
}

fn evaluate_all<P: GaProblem>(problem: &P, individuals: &mut [P::Individual], parallel: bool) {
    let score = |individual: &mut P::Individual| {
        let fitness = problem.evaluate(individual);
        individual.set_fitness(if fitness.is_finite() { fitness.max(0.0) } else { 0.0 });
    };
    if parallel {
        individuals.par_iter_mut().for_each(score);
    } else {
        individuals.iter_mut().for_each(score);
    }
}
