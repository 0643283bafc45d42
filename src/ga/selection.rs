//! Parent selection strategies.
//!
//! All strategies work on a population sorted best-first (see
//! [`compare_individuals`](super::runner::compare_individuals)), so a
//! lower index always means "at least as good, and older on ties".
//!
//! # Reference
//! Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//! Used in Genetic Algorithms"

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::runner::Individual;

/// How parents are drawn from the population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Best of `tournament_size` uniformly drawn contestants.
    #[default]
    Tournament,
    /// Fitness-proportionate.
    RouletteWheel,
    /// Linear rank weights (best gets `n`, worst gets 1).
    Rank,
}

/// Picks one parent index from a best-first sorted population.
pub fn select_index<I: Individual, R: Rng>(
    population: &[I],
    strategy: SelectionStrategy,
    tournament_size: usize,
    rng: &mut R,
) -> usize {
    let n = population.len();
    if n <= 1 {
        return 0;
    }
    match strategy {
        SelectionStrategy::Tournament => tournament(n, tournament_size, rng),
        SelectionStrategy::RouletteWheel => roulette(population, rng),
        SelectionStrategy::Rank => rank(n, rng),
    }
}

fn tournament<R: Rng>(n: usize, size: usize, rng: &mut R) -> usize {
    // Sorted population: the smallest index is the tournament winner,
    // which also resolves fitness ties toward the smaller id.
    (0..size.max(1))
        .map(|_| rng.random_range(0..n))
        .min()
        .unwrap_or(0)
}

fn roulette<I: Individual, R: Rng>(population: &[I], rng: &mut R) -> usize {
    let total: f64 = population.iter().map(|i| i.fitness().max(0.0)).sum();
    if total <= 0.0 || !total.is_finite() {
        return rng.random_range(0..population.len());
    }
    let mut remaining = rng.random::<f64>() * total;
    for (idx, individual) in population.iter().enumerate() {
        remaining -= individual.fitness().max(0.0);
        if remaining <= 0.0 {
            return idx;
        }
    }
    population.len() - 1
}

fn rank<R: Rng>(n: usize, rng: &mut R) -> usize {
    let total = n * (n + 1) / 2;
    let mut remaining = rng.random_range(0..total);
    for idx in 0..n {
        let weight = n - idx;
        if remaining < weight {
            return idx;
        }
        remaining -= weight;
    }
    n - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[derive(Debug, Clone)]
    struct Scored(f64, u64);

    impl Individual for Scored {
        fn fitness(&self) -> f64 {
            self.0
        }
        fn set_fitness(&mut self, fitness: f64) {
            self.0 = fitness;
        }
        fn id(&self) -> u64 {
            self.1
        }
        fn set_id(&mut self, id: u64) {
            self.1 = id;
        }
    }

    fn population() -> Vec<Scored> {
        vec![
            Scored(0.9, 0),
            Scored(0.5, 1),
            Scored(0.2, 2),
            Scored(0.0, 3),
        ]
    }

    fn histogram(strategy: SelectionStrategy) -> [usize; 4] {
        let pop = population();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut counts = [0usize; 4];
        for _ in 0..4_000 {
            counts[select_index(&pop, strategy, 3, &mut rng)] += 1;
        }
        counts
    }

    #[test]
    fn test_tournament_favors_best() {
        let counts = histogram(SelectionStrategy::Tournament);
        assert!(counts[0] > counts[1]);
        assert!(counts[1] > counts[3]);
    }

    #[test]
    fn test_roulette_never_picks_zero_fitness() {
        let counts = histogram(SelectionStrategy::RouletteWheel);
        assert_eq!(counts[3], 0);
        assert!(counts[0] > counts[2]);
    }

    #[test]
    fn test_rank_weights() {
        let counts = histogram(SelectionStrategy::Rank);
        assert!(counts[0] > counts[1]);
        assert!(counts[2] > counts[3]);
        assert!(counts[3] > 0);
    }

    #[test]
    fn test_roulette_all_zero_falls_back_to_uniform() {
        let pop = vec![Scored(0.0, 0), Scored(0.0, 1)];
        let mut rng = SmallRng::seed_from_u64(7);
        let picks: Vec<usize> = (0..50)
            .map(|_| select_index(&pop, SelectionStrategy::RouletteWheel, 3, &mut rng))
            .collect();
        assert!(picks.contains(&0));
        assert!(picks.contains(&1));
    }

    #[test]
    fn test_single_individual() {
        let pop = vec![Scored(1.0, 0)];
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(select_index(&pop, SelectionStrategy::Rank, 3, &mut rng), 0);
    }
}
