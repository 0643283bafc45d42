//! Configurable genetic operators for allocation search.
//!
//! Provides runtime-selectable crossover and mutation strategies
//! via [`GeneticOperators`].
//!
//! # Usage
//!
//! ```
//! use u_resource_optim::ga::operators::{CrossoverType, GeneticOperators, MutationType};
//!
//! let ops = GeneticOperators::default();
//! assert_eq!(ops.crossover_type, CrossoverType::Uniform);
//! assert_eq!(ops.mutation_type, MutationType::Mixed);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::genome::{
    reassign_mutation, shift_mutation, single_point_crossover, uniform_crossover,
    AllocationGenome,
};
use crate::scheduler::PlanningContext;

/// Probability that [`MutationType::Mixed`] reassigns rather than shifts.
const MIXED_REASSIGN_PROBABILITY: f64 = 0.7;

/// Crossover strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverType {
    /// One random cut point.
    SinglePoint,
    /// Per-gene coin flip (Syswerda, 1989).
    #[default]
    Uniform,
}

/// Mutation strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationType {
    /// Move one task to another eligible resource.
    Reassign,
    /// Change one task's start delay.
    Shift,
    /// Reassign or shift, chosen at random.
    #[default]
    Mixed,
}

/// Runtime-selectable genetic operators.
///
/// # Example
///
/// ```
/// use u_resource_optim::ga::operators::{CrossoverType, GeneticOperators, MutationType};
///
/// let ops = GeneticOperators {
///     crossover_type: CrossoverType::SinglePoint,
///     mutation_type: MutationType::Reassign,
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct GeneticOperators {
    /// Crossover strategy.
    pub crossover_type: CrossoverType,
    /// Mutation strategy.
    pub mutation_type: MutationType,
}

impl GeneticOperators {
    /// Operators with the given crossover and mixed mutation.
    pub fn with_crossover(crossover_type: CrossoverType) -> Self {
        Self {
            crossover_type,
            ..Default::default()
        }
    }

    /// Performs crossover using the configured strategy. Children are not
    /// repaired.
    pub fn crossover<R: Rng>(
        &self,
        p1: &AllocationGenome,
        p2: &AllocationGenome,
        rng: &mut R,
    ) -> (AllocationGenome, AllocationGenome) {
        match self.crossover_type {
            CrossoverType::SinglePoint => single_point_crossover(p1, p2, rng),
            CrossoverType::Uniform => uniform_crossover(p1, p2, rng),
        }
    }

    /// Performs mutation using the configured strategy.
    pub fn mutate<R: Rng>(&self, genome: &mut AllocationGenome, ctx: &PlanningContext, rng: &mut R) {
        match self.mutation_type {
            MutationType::Reassign => reassign_mutation(genome, ctx, rng),
            MutationType::Shift => shift_mutation(genome, ctx, rng),
            MutationType::Mixed => {
                if rng.random_bool(MIXED_REASSIGN_PROBABILITY) {
                    reassign_mutation(genome, ctx, rng);
                } else {
                    shift_mutation(genome, ctx, rng);
                }
            }
        }
    }
}
