//! Plan construction and evaluation.
//!
//! Turns resource assignments into time-resolved plans and measures them.
//!
//! # Components
//!
//! - [`PlanningContext`]: the indexed snapshot and rules for one request.
//! - [`CriticalPathScheduler`]: resource-constrained forward/backward pass
//!   producing start/finish, slack, and the critical path.
//! - [`BaselineScheduler`]: greedy assignments; the naive plan that savings
//!   are measured against.
//! - [`PlanMetrics`]: cost, duration, quality, risk, utilization, and
//!   constraint violations of a plan.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4

mod baseline;
mod context;
mod cpm;
mod kpi;

pub use baseline::{BaselineScheduler, BaselineStrategy};
pub use context::PlanningContext;
pub use cpm::{
    dependency_slack, dependency_times, topological_order, Assignment, CriticalPathScheduler,
    DependencyTimes,
};
pub use kpi::PlanMetrics;
