//! Resource optimization engine for the U-Engine ecosystem.
//!
//! Allocates workers, equipment, and materials to interdependent project
//! tasks. A genetic algorithm searches over assignments; every candidate is
//! resolved into a time-accurate plan by a resource-constrained critical-path
//! scheduler and scored against the request's objective.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Resource`, `Allocation`,
//!   `Dependency`, `OptimizationRequest`, `OptimizationResult`
//! - **`validation`**: Input integrity checks (duplicate IDs, DAG cycles, predecessor refs)
//! - **`snapshot`**: Read-only access to tasks, resources, and committed allocations
//! - **`conflict`**: Over-allocation and availability clashes in committed work
//! - **`forecast`**: Demand projection per resource type, bottleneck windows
//! - **`scheduler`**: Critical-path scheduling, baseline plans, plan KPIs
//! - **`ga`**: Genetic algorithm framework and the allocation problem
//! - **`ranking`**: Distinct scenario selection and trade-off descriptions
//! - **`engine`**: End-to-end orchestration
//!
//! # Quick Start
//!
//! ```
//! use u_resource_optim::{InMemorySnapshot, OptimizationEngine, OptimizationRequest};
//! use u_resource_optim::models::{Objective, Resource, Task, DAY_MS};
//!
//! let snapshot = InMemorySnapshot::new()
//!     .with_task(Task::new("FOUNDATION", 3 * DAY_MS).with_skill("concrete"))
//!     .with_task(Task::new("FRAME", 5 * DAY_MS).depends_on("FOUNDATION"))
//!     .with_resource(Resource::worker("CREW-1").with_capability("concrete").with_cost_rate(60.0))
//!     .with_resource(Resource::worker("CREW-2").with_cost_rate(45.0));
//!
//! let request = OptimizationRequest::new("REQ-1", 0, 30 * DAY_MS)
//!     .with_objective(Objective::MinimizeCost)
//!     .with_seed(7);
//!
//! let result = OptimizationEngine::new().optimize(&request, &snapshot).unwrap();
//! let plan = result.plan.unwrap();
//! assert_eq!(plan.total_duration_ms, 8 * DAY_MS);
//! ```
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Hartmann (1998), "A competitive genetic algorithm for resource-constrained
//!   project scheduling"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod conflict;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod ga;
pub mod models;
pub mod ranking;
pub mod scheduler;
pub mod snapshot;
pub mod validation;

pub use engine::OptimizationEngine;
pub use error::{EngineError, ForecastError};
pub use models::{OptimizationRequest, OptimizationResult, OptimizationStatus};
pub use snapshot::{InMemorySnapshot, SnapshotProvider};
