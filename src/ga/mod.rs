//! GA-based allocation optimization.
//!
//! A generational genetic algorithm searches over resource assignments;
//! every candidate is decoded into a time-resolved plan and scored against
//! the request's objective.
//!
//! # Encoding
//!
//! - **Assignment vector**: one gene per task holding the chosen resource
//!   and a start delay. Timing is resolved by the decoder, so offspring
//!   never break dependencies.
//!
//! # Submodules
//!
//! - [`operators`]: Runtime-selectable crossover and mutation strategies
//!
//! # Reference
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization, and
//!   Machine Learning"
//! - Hartmann (1998), "A competitive genetic algorithm for
//!   resource-constrained project scheduling"

mod genome;
pub mod operators;
mod problem;
mod runner;
mod selection;

pub use genome::{
    reassign_mutation, shift_mutation, single_point_crossover, uniform_crossover,
    AllocationGenome,
};
pub use operators::{CrossoverType, GeneticOperators, MutationType};
pub use problem::{AllocationProblem, Assessment};
pub use runner::{compare_individuals, GaConfig, GaProblem, GaResult, GaRunner, Individual};
pub use selection::{select_index, SelectionStrategy};
