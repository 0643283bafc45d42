//! Plan quality metrics (KPIs).
//!
//! Computes the indicators fitness, ranking, and reporting are built on
//! from a decoded plan and its planning context.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Duration | Project end − horizon start |
//! | Total Tardiness | Sum of max(0, finish − task deadline) |
//! | Average Quality | Mean quality rating of assigned resources (0 if unresourced) |
//! | Risk | Complexity-weighted shortfall in resource quality, plus zero-slack share |
//! | Avg Utilization | Mean busy load / plan duration over resources in use |
//! | Idle Ratio | Mean share of each used resource's active span spent idle |
//! | Violations | Hard-constraint breaches (see [`PlanMetrics::violation_count`]) |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PlanningContext;
use crate::models::{peak_load, Allocation, SchedulingPlan};

/// Weight of the critical-path share in [`PlanMetrics::risk`].
const CRITICAL_RISK_WEIGHT: f64 = 0.2;

/// Plan performance indicators.
///
/// All time values are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanMetrics {
    /// Sum of allocation costs.
    pub total_cost: f64,
    /// Plan duration (ms).
    pub duration_ms: i64,
    /// Sum of task tardiness (ms).
    pub total_tardiness_ms: i64,
    /// Largest single task tardiness (ms).
    pub max_tardiness_ms: i64,
    /// Tasks finishing after their own deadline.
    pub deadline_misses: usize,
    /// Mean assigned-resource quality (0.0..1.0).
    pub average_quality: f64,
    /// Schedule risk (0.0 = none, 1.0 = worst).
    pub risk: f64,
    /// Mean utilization of resources in use.
    pub avg_utilization: f64,
    /// Per-resource utilization.
    pub utilization_by_resource: BTreeMap<String, f64>,
    /// Mean idle share of used resources' active spans (0.0..1.0).
    pub idle_ratio: f64,
    /// Tasks with a resource.
    pub resourced_tasks: usize,
    /// Tasks without a resource.
    pub unresourced_tasks: usize,
    /// Allocations whose resource exceeds its capacity cap at some instant.
    pub overloaded_allocations: usize,
    /// How far the plan runs past the request deadline (ms).
    pub deadline_overrun_ms: i64,
    /// How far the plan runs past the horizon end (ms).
    pub horizon_overrun_ms: i64,
    /// Cost above the budget.
    pub budget_overrun: f64,
    /// Share of tasks on a preferred resource.
    pub preferred_share: f64,
    /// Hard-constraint violations: unresourced tasks, overloads (unless
    /// overtime is allowed), missed task deadlines, and one each for a
    /// request-deadline, horizon, or budget overrun.
    pub violation_count: usize,
}

impl PlanMetrics {
    /// Computes metrics for `plan` under `ctx`.
    pub fn calculate(plan: &SchedulingPlan, ctx: &PlanningContext) -> Self {
        let task_count = plan.tasks.len();
        let mut metrics = Self {
            total_cost: plan.total_cost,
            duration_ms: plan.total_duration_ms,
            unresourced_tasks: plan.unresourced_tasks.len(),
            resourced_tasks: task_count - plan.unresourced_tasks.len(),
            ..Default::default()
        };

        let mut quality_sum = 0.0;
        let mut task_risk_sum = 0.0;
        let mut preferred = 0usize;
        for scheduled in &plan.tasks {
            let task = ctx.task_position(&scheduled.task_id).map(|i| &ctx.tasks[i]);
            let resource = scheduled
                .resource_id
                .as_deref()
                .and_then(|id| ctx.resource_position(id))
                .map(|i| &ctx.resources[i]);

            let rating = resource.map_or(0.0, |r| r.quality_rating);
            let complexity = task.map_or(1.0, |t| t.complexity);
            quality_sum += rating;
            task_risk_sum += complexity / 10.0 * (1.0 - rating);
            if resource.is_some_and(|r| ctx.preferences.prefers(&r.id)) {
                preferred += 1;
            }

            if let Some(deadline) = task.and_then(|t| t.deadline_ms) {
                let tardiness = (scheduled.end_ms - deadline).max(0);
                if tardiness > 0 {
                    metrics.deadline_misses += 1;
                    metrics.total_tardiness_ms += tardiness;
                    metrics.max_tardiness_ms = metrics.max_tardiness_ms.max(tardiness);
                }
            }
        }

        if task_count == 0 {
            metrics.average_quality = 1.0;
        } else {
            let n = task_count as f64;
            metrics.average_quality = quality_sum / n;
            metrics.preferred_share = preferred as f64 / n;
            let critical_share = plan.tasks.iter().filter(|t| t.is_critical).count() as f64 / n;
            metrics.risk = ((1.0 - CRITICAL_RISK_WEIGHT) * task_risk_sum / n
                + CRITICAL_RISK_WEIGHT * critical_share)
                .clamp(0.0, 1.0);
        }

        // Utilization and idle time per resource in use
        let mut by_resource: BTreeMap<&str, Vec<&Allocation>> = BTreeMap::new();
        for alloc in &plan.allocations {
            by_resource.entry(alloc.resource_id.as_str()).or_default().push(alloc);
        }
        let span = plan.total_duration_ms;
        let mut idle_sum = 0.0;
        for (resource_id, allocs) in &by_resource {
            let busy: f64 = allocs.iter().map(|a| a.load_ms()).sum();
            let utilization = if span > 0 { busy / span as f64 } else { 0.0 };
            metrics
                .utilization_by_resource
                .insert(resource_id.to_string(), utilization);
            idle_sum += idle_share(allocs);
        }
        if !by_resource.is_empty() {
            let used = by_resource.len() as f64;
            metrics.avg_utilization = metrics.utilization_by_resource.values().sum::<f64>() / used;
            metrics.idle_ratio = idle_sum / used;
        }

        // Overloads, counting committed out-of-scope load
        let cap = ctx.capacity_percent();
        for alloc in &plan.allocations {
            let mut peers: Vec<&Allocation> = by_resource
                .get(alloc.resource_id.as_str())
                .cloned()
                .unwrap_or_default();
            if let Some(r) = ctx.resource_position(&alloc.resource_id) {
                peers.extend(ctx.background[r].iter());
            }
            if peak_load(&peers, &alloc.window()) > cap {
                metrics.overloaded_allocations += 1;
            }
        }

        if let Some(deadline) = ctx.constraints.deadline_ms {
            metrics.deadline_overrun_ms = (plan.project_end_ms - deadline).max(0);
        }
        metrics.horizon_overrun_ms = (plan.project_end_ms - ctx.horizon.end_ms).max(0);
        if let Some(budget) = ctx.constraints.max_budget {
            metrics.budget_overrun = (plan.total_cost - budget).max(0.0);
        }

        let overloads = if ctx.constraints.allow_overtime {
            0
        } else {
            metrics.overloaded_allocations
        };
        metrics.violation_count = metrics.unresourced_tasks
            + overloads
            + metrics.deadline_misses
            + usize::from(metrics.deadline_overrun_ms > 0)
            + usize::from(metrics.horizon_overrun_ms > 0)
            + usize::from(metrics.budget_overrun > 0.0);
        metrics
    }

    /// Whether the plan meets every hard constraint.
    pub fn is_feasible(&self) -> bool {
        self.violation_count == 0
    }
}

/// Share of a resource's active span (first start to last end) with no
/// allocation running.
fn idle_share(allocs: &[&Allocation]) -> f64 {
    let mut windows: Vec<(i64, i64)> = allocs.iter().map(|a| (a.start_ms, a.end_ms)).collect();
    windows.sort_unstable();
    let (Some(first), Some(last_end)) = (windows.first(), windows.iter().map(|w| w.1).max())
    else {
        return 0.0;
    };
    let span = last_end - first.0;
    if span <= 0 {
        return 0.0;
    }
    let mut covered = 0i64;
    let mut cursor = first.0;
    for (start, end) in windows {
        let s = start.max(cursor);
        if end > s {
            covered += end - s;
            cursor = end;
        }
    }
    1.0 - covered as f64 / span as f64
}
