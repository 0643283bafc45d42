//! Greedy baseline assignments.
//!
//! # Strategies
//!
//! - **FirstFit**: every task goes to its first eligible resource with no
//!   delay. This is the naive plan optimization savings are measured
//!   against.
//! - **EarliestAvailable**: tasks are visited in placement order and each
//!   goes to the eligible resource that can start it soonest, tracking
//!   when every resource frees up. Used to seed the search.
//!
//! Both only choose resources; timing always comes from
//! [`CriticalPathScheduler`].
//!
//! # Complexity
//! O(n · c) where n = tasks, c = eligible resources per task.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use super::{Assignment, CriticalPathScheduler, PlanningContext};
use crate::models::SchedulingPlan;

/// Baseline strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BaselineStrategy {
    /// First eligible resource in snapshot order.
    #[default]
    FirstFit,
    /// Eligible resource with the earliest feasible start.
    EarliestAvailable,
}

/// Greedy assignment builder.
///
/// # Example
///
/// ```
/// use u_resource_optim::models::{OptimizationRequest, Resource, Task, DAY_MS};
/// use u_resource_optim::scheduler::{BaselineScheduler, BaselineStrategy, PlanningContext};
///
/// let tasks = vec![Task::new("A", DAY_MS), Task::new("B", DAY_MS)];
/// let resources = vec![Resource::worker("W1"), Resource::worker("W2")];
/// let request = OptimizationRequest::new("R1", 0, 10 * DAY_MS);
/// let ctx = PlanningContext::new(tasks, resources, &[], &request).unwrap();
///
/// let naive = BaselineScheduler::new().schedule(&ctx);
/// assert_eq!(naive.total_duration_ms, 2 * DAY_MS);
///
/// let greedy = BaselineScheduler::new()
///     .with_strategy(BaselineStrategy::EarliestAvailable)
///     .schedule(&ctx);
/// assert_eq!(greedy.total_duration_ms, DAY_MS);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BaselineScheduler {
    strategy: BaselineStrategy,
}

impl BaselineScheduler {
    /// Creates a first-fit baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: BaselineStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// One assignment per task, in snapshot order.
    pub fn assignments(&self, ctx: &PlanningContext) -> Vec<Assignment> {
        match self.strategy {
            BaselineStrategy::FirstFit => ctx
                .eligible
                .iter()
                .map(|e| Assignment {
                    resource: e.first().copied(),
                    delay_ms: 0,
                })
                .collect(),
            BaselineStrategy::EarliestAvailable => earliest_available(ctx),
        }
    }

    /// Decodes the baseline assignments into a plan.
    pub fn schedule(&self, ctx: &PlanningContext) -> SchedulingPlan {
        CriticalPathScheduler::new().schedule(ctx, &self.assignments(ctx))
    }
}

fn earliest_available(ctx: &PlanningContext) -> Vec<Assignment> {
    let n = ctx.task_count();
    let mut genes = vec![Assignment::default(); n];
    let mut resource_free: Vec<i64> = vec![ctx.horizon.start_ms; ctx.resources.len()];
    let mut start = vec![0i64; n];
    let mut end = vec![0i64; n];

    for &t in &ctx.order {
        let d = ctx.tasks[t].duration_ms;
        let ready = ctx.predecessors[t]
            .iter()
            .map(|(p, dep)| dep.earliest_successor_start(start[*p], end[*p], d))
            .fold(ctx.horizon.start_ms, i64::max);

        // Select resource with earliest feasible start
        let mut best: Option<(usize, i64)> = None;
        for &r in &ctx.eligible[t] {
            let from = ready.max(resource_free[r]);
            if let Some(s) = ctx.resources[r].earliest_fit(from, d) {
                let better = match best {
                    Some((_, b)) => s < b,
                    None => true,
                };
                if better {
                    best = Some((r, s));
                }
            }
        }

        let s = match best {
            Some((r, s)) => {
                genes[t] = Assignment::to(r);
                resource_free[r] = s + d;
                s
            }
            None => {
                genes[t].resource = ctx.eligible[t].first().copied();
                ready
            }
        };
        start[t] = s;
        end[t] = s + d;
    }
    genes
}
