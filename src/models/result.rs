//! Optimization result model.
//!
//! What the engine hands back for one request: the chosen plan, ranked
//! alternatives, aggregate metrics, and every warning raised on the way.
//! Errors other than structurally invalid input travel in-band here.

use serde::{Deserialize, Serialize};

use super::Allocation;
use crate::conflict::Conflict;
use crate::forecast::DemandForecast;
use crate::scheduler::PlanMetrics;

/// Overall outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStatus {
    /// Every task resourced and every hard constraint met.
    Success,
    /// A usable plan that leaves something unresolved.
    Partial,
    /// No usable plan.
    Failed,
}

/// A task's resolved position in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Task id.
    pub task_id: String,
    /// Assigned resource, `None` when the task could not be resourced.
    pub resource_id: Option<String>,
    /// Resolved (earliest) start (ms).
    pub start_ms: i64,
    /// Resolved (earliest) finish (ms).
    pub end_ms: i64,
    /// Latest start that does not delay the project (ms).
    pub latest_start_ms: i64,
    /// Latest finish that does not delay the project (ms).
    pub latest_finish_ms: i64,
    /// `latest_start_ms - start_ms`.
    pub slack_ms: i64,
    /// Whether the task is on the critical path.
    pub is_critical: bool,
}

/// A fully time-resolved project plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulingPlan {
    /// Per-task schedule, in placement order.
    pub tasks: Vec<ScheduledTask>,
    /// Resource commitments backing the schedule.
    pub allocations: Vec<Allocation>,
    /// One chain of zero-slack tasks ending at the plan finish, in
    /// execution order. Other zero-slack tasks keep `is_critical` set.
    pub critical_path: Vec<String>,
    /// Plan origin (horizon start, ms).
    pub project_start_ms: i64,
    /// Latest finish across all tasks (ms).
    pub project_end_ms: i64,
    /// `project_end_ms - project_start_ms`.
    pub total_duration_ms: i64,
    /// Sum of allocation costs.
    pub total_cost: f64,
    /// Tasks left without a resource.
    pub unresourced_tasks: Vec<String>,
}

impl SchedulingPlan {
    /// Finds a task's schedule entry.
    pub fn task(&self, task_id: &str) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    /// Finds a task's allocation.
    pub fn allocation_for_task(&self, task_id: &str) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.task_id == task_id)
    }

    /// All allocations on one resource.
    pub fn allocations_for_resource(&self, resource_id: &str) -> Vec<&Allocation> {
        self.allocations
            .iter()
            .filter(|a| a.resource_id == resource_id)
            .collect()
    }

    /// Whether every task received a resource.
    pub fn is_fully_resourced(&self) -> bool {
        self.unresourced_tasks.is_empty()
    }

    /// Resource id per task, in task order. Used to tell plans apart.
    pub fn assignment_signature(&self) -> Vec<Option<&str>> {
        self.tasks.iter().map(|t| t.resource_id.as_deref()).collect()
    }
}

/// Warning severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// Warning category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCategory {
    /// Clash found in pre-existing allocations.
    Conflict,
    /// A hard constraint cannot be met by any plan.
    Infeasible,
    /// Not enough capacity to resource everything.
    Capacity,
    /// Demand forecast findings.
    Forecast,
    /// Search stopped by the time limit.
    Timeout,
    /// Plan exceeds the budget.
    Budget,
    /// Plan misses a deadline or runs past the horizon.
    Schedule,
}

/// A finding reported alongside the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationWarning {
    /// How serious.
    pub severity: WarningSeverity,
    /// What kind.
    pub category: WarningCategory,
    /// Human-readable description.
    pub message: String,
    /// Tasks involved.
    pub affected_tasks: Vec<String>,
    /// Resources involved.
    pub affected_resources: Vec<String>,
    /// Suggested next step.
    pub recommended_action: Option<String>,
}

impl OptimizationWarning {
    /// Creates a warning.
    pub fn new(
        severity: WarningSeverity,
        category: WarningCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            affected_tasks: Vec::new(),
            affected_resources: Vec::new(),
            recommended_action: None,
        }
    }

    /// Sets the affected tasks.
    pub fn with_tasks<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_tasks = tasks.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the affected resources.
    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_resources = resources.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the recommended action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_action = Some(action.into());
        self
    }
}

/// A ranked runner-up plan and how it trades off against the chosen one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeScenario {
    /// Scenario id.
    pub id: String,
    /// Short label.
    pub name: String,
    /// The plan.
    pub plan: SchedulingPlan,
    /// Plan metrics.
    pub metrics: PlanMetrics,
    /// Composite score (same scale as fitness).
    pub score: f64,
    /// Cost difference versus the chosen plan (%).
    pub cost_delta_percent: f64,
    /// Duration difference versus the chosen plan (%).
    pub duration_delta_percent: f64,
    /// Quality difference versus the chosen plan (%).
    pub quality_delta_percent: f64,
    /// Where this scenario is better.
    pub pros: Vec<String>,
    /// Where this scenario is worse.
    pub cons: Vec<String>,
    /// Hard-constraint violations found in this plan.
    pub violation_count: usize,
}

/// Aggregate quality of the chosen plan versus a naive baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    /// Baseline cost minus chosen cost.
    pub cost_savings: f64,
    /// `cost_savings` relative to baseline (%).
    pub cost_savings_percent: f64,
    /// Baseline duration minus chosen duration (ms).
    pub time_savings_ms: i64,
    /// `time_savings_ms` relative to baseline (%).
    pub time_savings_percent: f64,
    /// Mean resource utilization of the chosen plan (0.0..1.0).
    pub average_utilization: f64,
    /// Utilization gain over baseline (percentage points).
    pub utilization_improvement: f64,
    /// Share of tasks resourced, discounted for violations (0.0..1.0).
    pub feasibility_score: f64,
    /// Share of the final population within 5% of the best fitness.
    pub robustness_score: f64,
    /// Baseline plan cost.
    pub baseline_cost: f64,
    /// Baseline plan duration (ms).
    pub baseline_duration_ms: i64,
}

/// The engine's output for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Request this answers.
    pub request_id: String,
    /// Overall outcome.
    pub status: OptimizationStatus,
    /// Chosen plan (`None` when failed).
    pub plan: Option<SchedulingPlan>,
    /// Metrics of the chosen plan.
    pub plan_metrics: Option<PlanMetrics>,
    /// Ranked alternatives.
    pub alternatives: Vec<AlternativeScenario>,
    /// Aggregate metrics.
    pub metrics: OptimizationMetrics,
    /// Everything worth telling the caller.
    pub warnings: Vec<OptimizationWarning>,
    /// Confidence in the chosen plan (0.0..1.0).
    pub confidence: f64,
    /// Generations actually run.
    pub generations_run: usize,
    /// Generation at which convergence was detected.
    pub convergence_generation: Option<usize>,
    /// Best fitness after each generation (index 0 = initial population).
    pub fitness_history: Vec<f64>,
    /// Seed that reproduces this run.
    pub seed: u64,
    /// Conflicts found in pre-existing allocations.
    pub conflicts: Vec<Conflict>,
    /// Demand forecasts per resource type.
    pub forecasts: Vec<DemandForecast>,
    /// Wall-clock time spent (ms).
    pub elapsed_ms: u64,
}

impl OptimizationResult {
    /// A failed result with no plan.
    pub fn failed(
        request_id: impl Into<String>,
        seed: u64,
        warnings: Vec<OptimizationWarning>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            status: OptimizationStatus::Failed,
            plan: None,
            plan_metrics: None,
            alternatives: Vec::new(),
            metrics: OptimizationMetrics::default(),
            warnings,
            confidence: 0.0,
            generations_run: 0,
            convergence_generation: None,
            fitness_history: Vec::new(),
            seed,
            conflicts: Vec::new(),
            forecasts: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Warnings of a given category.
    pub fn warnings_in(&self, category: WarningCategory) -> Vec<&OptimizationWarning> {
        self.warnings
            .iter()
            .filter(|w| w.category == category)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_builder() {
        let w = OptimizationWarning::new(
            WarningSeverity::High,
            WarningCategory::Capacity,
            "not enough cranes",
        )
        .with_tasks(["T1", "T2"])
        .with_resources(vec!["C1".to_string()])
        .with_action("rent another crane");

        assert_eq!(w.affected_tasks, vec!["T1", "T2"]);
        assert_eq!(w.affected_resources, vec!["C1"]);
        assert_eq!(w.recommended_action.as_deref(), Some("rent another crane"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(WarningSeverity::Critical > WarningSeverity::High);
        assert!(WarningSeverity::Low > WarningSeverity::Info);
    }

    #[test]
    fn test_failed_result() {
        let r = OptimizationResult::failed("R1", 7, Vec::new());
        assert_eq!(r.status, OptimizationStatus::Failed);
        assert!(r.plan.is_none());
        assert!((r.confidence - 0.0).abs() < 1e-12);
        assert_eq!(r.seed, 7);
    }

    #[test]
    fn test_plan_queries() {
        let plan = SchedulingPlan {
            tasks: vec![ScheduledTask {
                task_id: "T1".into(),
                resource_id: Some("R1".into()),
                start_ms: 0,
                end_ms: 10,
                latest_start_ms: 0,
                latest_finish_ms: 10,
                slack_ms: 0,
                is_critical: true,
            }],
            allocations: vec![Allocation::new("R1", "T1", 0, 10)],
            critical_path: vec!["T1".into()],
            project_start_ms: 0,
            project_end_ms: 10,
            total_duration_ms: 10,
            total_cost: 0.0,
            unresourced_tasks: Vec::new(),
        };
        assert!(plan.task("T1").is_some());
        assert!(plan.task("T9").is_none());
        assert_eq!(plan.allocations_for_resource("R1").len(), 1);
        assert!(plan.allocation_for_task("T1").is_some());
        assert!(plan.is_fully_resourced());
        assert_eq!(plan.assignment_signature(), vec![Some("R1")]);
    }
}
