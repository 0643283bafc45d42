//! Resource optimization domain models.
//!
//! Snapshot types consumed by the engine (tasks, resources, committed
//! allocations), the request it is invoked with, and the result it emits.
//!
//! # Domain Mappings
//!
//! | Model | Construction site |
//! |-------|-------------------|
//! | Task | Work package (pour slab, rough-in electrical) |
//! | Resource | Crew member, crane, concrete lot |
//! | Allocation | Booking of a resource onto a work package |
//! | SchedulingPlan | Look-ahead schedule |

mod allocation;
mod calendar;
mod dependency;
mod request;
mod resource;
mod result;
mod task;

pub use allocation::{peak_load, Allocation};
pub use calendar::{
    available_time_in_range, earliest_fit, windows_well_formed, within_availability, TimeWindow,
    DAY_MS, HOUR_MS,
};
pub use dependency::{Dependency, DependencyType};
pub use request::{
    Constraints, Objective, ObjectiveWeights, OptimizationRequest, Preferences, Scope,
};
pub use resource::{Resource, ResourceKind, ResourceType};
pub use result::{
    AlternativeScenario, OptimizationMetrics, OptimizationResult, OptimizationStatus,
    OptimizationWarning, ScheduledTask, SchedulingPlan, WarningCategory, WarningSeverity,
};
pub use task::Task;
