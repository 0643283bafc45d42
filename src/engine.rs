//! Optimization engine.
//!
//! Runs one request end to end: snapshot fetch, validation, conflict
//! detection and demand forecasting (concurrently), GA search, scenario
//! ranking, and result assembly.
//!
//! Only structurally invalid input is returned as `Err`; infeasibility,
//! capacity shortfalls, timeouts, and forecast gaps are reported in-band
//! on the [`OptimizationResult`].

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use rand::Rng;
use tracing::{info, warn};

use crate::conflict::{Conflict, ConflictDetector, ConflictSeverity};
use crate::error::{EngineError, ForecastError};
use crate::forecast::{DemandForecast, Forecaster, ModelRegistry, UtilizationSample};
use crate::ga::{AllocationProblem, GaConfig, GaResult, GaRunner, GeneticOperators, Individual};
use crate::models::{
    OptimizationMetrics, OptimizationRequest, OptimizationResult, OptimizationStatus,
    OptimizationWarning, ResourceType, SchedulingPlan, WarningCategory, WarningSeverity,
};
use crate::ranking::ScenarioRanker;
use crate::scheduler::{BaselineScheduler, PlanMetrics, PlanningContext};
use crate::snapshot::SnapshotProvider;
use crate::validation::{validate_snapshot, ValidationErrorKind};

/// Population members within this share of the best fitness count as
/// equally good for robustness.
const ROBUSTNESS_BAND: f64 = 0.95;
/// Confidence multiplier for a plan that breaks a hard constraint.
const INFEASIBLE_CONFIDENCE: f64 = 0.75;

/// Resource optimization engine.
///
/// Holds only read-only configuration; every call to
/// [`optimize`](Self::optimize) is independent.
///
/// # Example
///
/// ```
/// use u_resource_optim::engine::OptimizationEngine;
/// use u_resource_optim::models::{OptimizationRequest, OptimizationStatus, Resource, Task, DAY_MS};
/// use u_resource_optim::snapshot::InMemorySnapshot;
///
/// let snapshot = InMemorySnapshot::new()
///     .with_task(Task::new("A", 2 * DAY_MS))
///     .with_task(Task::new("B", 3 * DAY_MS).depends_on("A"))
///     .with_task(Task::new("C", DAY_MS).depends_on("B"))
///     .with_resource(Resource::worker("W1"));
/// let request = OptimizationRequest::new("R1", 0, 30 * DAY_MS).with_seed(42);
///
/// let result = OptimizationEngine::new().optimize(&request, &snapshot).unwrap();
/// assert_eq!(result.status, OptimizationStatus::Success);
/// let plan = result.plan.unwrap();
/// assert_eq!(plan.critical_path, vec!["A", "B", "C"]);
/// assert_eq!(plan.total_duration_ms, 6 * DAY_MS);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptimizationEngine {
    registry: ModelRegistry,
}

impl OptimizationEngine {
    /// Creates an engine with an empty model registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `registry` to pick forecast models.
    pub fn with_registry(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    /// The model registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Optimizes `request` against `snapshot`.
    ///
    /// # Errors
    /// - [`EngineError::InvalidRequest`] for a malformed horizon, constraint,
    ///   weight, or GA parameter.
    /// - [`EngineError::CyclicDependency`] if the tasks form a cycle.
    /// - [`EngineError::Validation`] for other structural snapshot problems.
    /// - [`EngineError::Snapshot`] if the provider fails.
    pub fn optimize<P>(
        &self,
        request: &OptimizationRequest,
        snapshot: &P,
    ) -> Result<OptimizationResult, EngineError>
    where
        P: SnapshotProvider + ?Sized,
    {
        let started = Instant::now();
        request.validate()?;

        let tasks = snapshot.tasks(&request.scope)?;
        let resources = snapshot.resources(&request.scope)?;
        if let Err(errors) = validate_snapshot(&tasks, &resources) {
            if let Some(cycle) = errors
                .iter()
                .find(|e| e.kind == ValidationErrorKind::CyclicDependency)
            {
                return Err(EngineError::CyclicDependency {
                    task_id: cycle.entity_id.clone(),
                });
            }
            return Err(EngineError::Validation(errors));
        }

        let seed = request.ga.seed.unwrap_or_else(|| rand::rng().random());
        info!(
            request_id = %request.id,
            objective = %request.objective,
            tasks = tasks.len(),
            resources = resources.len(),
            seed,
            "optimization started"
        );

        let resource_ids: Vec<String> = resources.iter().map(|r| r.id.clone()).collect();
        let committed = snapshot.committed_allocations(&resource_ids, &request.horizon)?;
        let mut warnings = Vec::new();

        // Forecast inputs, per resource type in use
        let mut capacity: BTreeMap<ResourceType, f64> = BTreeMap::new();
        for r in &resources {
            if !request.constraints.excluded_resources.contains(&r.id) {
                *capacity.entry(r.resource_type()).or_default() += 1.0;
            }
        }
        let types: BTreeSet<ResourceType> = resources.iter().map(|r| r.resource_type()).collect();
        let mut history: Vec<(ResourceType, Vec<UtilizationSample>)> = Vec::new();
        for resource_type in types {
            match snapshot.utilization_history(resource_type) {
                Ok(samples) => history.push((resource_type, samples)),
                Err(e) => warnings.push(OptimizationWarning::new(
                    WarningSeverity::Info,
                    WarningCategory::Forecast,
                    format!("No utilization history for {resource_type:?}: {e}"),
                )),
            }
        }

        // Slack of background commitments comes from their own projects
        let in_scope: BTreeSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let mut foreign: Vec<String> = committed
            .iter()
            .filter(|a| !in_scope.contains(a.task_id.as_str()))
            .map(|a| a.task_id.clone())
            .collect();
        foreign.sort();
        foreign.dedup();
        let mut slack_tasks = tasks.clone();
        slack_tasks.extend(
            snapshot
                .projects_of(&foreign)?
                .into_iter()
                .filter(|t| !in_scope.contains(t.id.as_str())),
        );

        let detector =
            ConflictDetector::new().with_capacity(u32::from(request.constraints.max_allocation_percent));
        let (conflicts, forecasts) = rayon::join(
            || detector.detect(&resources, &committed, &slack_tasks, &request.horizon),
            || self.forecast_all(&history, &capacity, request),
        );

        warnings.extend(conflicts.iter().map(conflict_warning));
        let mut kept_forecasts = Vec::new();
        for (resource_type, outcome) in forecasts {
            match outcome {
                Ok(forecast) => {
                    if let Some(w) = bottleneck_warning(&forecast) {
                        warnings.push(w);
                    }
                    kept_forecasts.push(forecast);
                }
                Err(ForecastError::InsufficientData {
                    required,
                    available,
                }) => {
                    warn!(?resource_type, required, available, "forecast skipped");
                    warnings.push(OptimizationWarning::new(
                        WarningSeverity::Info,
                        WarningCategory::Forecast,
                        format!(
                            "Demand forecast for {resource_type:?} omitted: {available} of {required} samples"
                        ),
                    ));
                }
                Err(e) => warnings.push(OptimizationWarning::new(
                    WarningSeverity::Info,
                    WarningCategory::Forecast,
                    format!("Demand forecast for {resource_type:?} omitted: {e}"),
                )),
            }
        }

        let ctx = PlanningContext::new(tasks, resources, &committed, request)?;

        // Skills nobody can supply make every plan infeasible
        let missing = ctx.missing_skills();
        let uncoverable = ctx.uncoverable_tasks();
        if !missing.is_empty() || !uncoverable.is_empty() {
            for (skill, task_ids) in &missing {
                warn!(request_id = %request.id, skill = %skill, "required skill unavailable");
                warnings.push(
                    OptimizationWarning::new(
                        WarningSeverity::Critical,
                        WarningCategory::Infeasible,
                        format!("No available resource has required skill '{skill}'"),
                    )
                    .with_tasks(task_ids.iter().cloned())
                    .with_action(format!("Add or free a resource with skill '{skill}'")),
                );
            }
            for task_id in &uncoverable {
                warn!(request_id = %request.id, task_id = %task_id, "no resource covers task");
                warnings.push(
                    OptimizationWarning::new(
                        WarningSeverity::Critical,
                        WarningCategory::Infeasible,
                        format!("No single resource holds every skill task '{task_id}' requires"),
                    )
                    .with_tasks([task_id.clone()])
                    .with_action("Split the task or add a resource with the full skill set"),
                );
            }
            let mut result = OptimizationResult::failed(&request.id, seed, warnings);
            result.conflicts = conflicts;
            result.forecasts = kept_forecasts;
            result.elapsed_ms = elapsed_ms(started);
            info!(request_id = %request.id, status = ?result.status, "optimization finished");
            return Ok(result);
        }

        let mut config = request.ga.clone().with_seed(seed);
        // One task on one resource: nothing to search
        let degenerate = ctx.task_count() == 1 && ctx.eligible[0].len() == 1;
        if degenerate {
            config.max_generations = config.max_generations.min(1);
        }

        let problem = build_problem(&ctx, &config, &conflicts, &kept_forecasts);
        let ga = GaRunner::run(&problem, &config);
        if ga.timed_out {
            warn!(
                request_id = %request.id,
                generations = ga.generations,
                max_generations = config.max_generations,
                "search timed out"
            );
        }

        let ranker = ScenarioRanker::new(request.max_alternatives);
        let ranked = ranker.rank(&problem, &ga.population);
        let alternatives = ranker.alternatives(&ranked);
        let assessment = match ranked.into_iter().next() {
            Some(best) => best.assessment,
            None => problem.assess(&ga.best.genes),
        };
        let (plan, plan_metrics) = (assessment.plan, assessment.metrics);

        let baseline = BaselineScheduler::new().schedule(&ctx);
        let baseline_metrics = PlanMetrics::calculate(&baseline, &ctx);
        let metrics = aggregate_metrics(&plan_metrics, &baseline_metrics, ctx.task_count(), &ga);

        // Skill gaps already returned `Failed`; what remains is capacity
        let status = if plan_metrics.unresourced_tasks > 0 || !plan_metrics.is_feasible() {
            OptimizationStatus::Partial
        } else {
            OptimizationStatus::Success
        };

        let completion = if ga.timed_out && config.max_generations > 0 {
            ga.generations as f64 / config.max_generations as f64
        } else {
            1.0
        };
        let covered = coverage(&plan_metrics, ctx.task_count());
        let feasible = if plan_metrics.is_feasible() {
            1.0
        } else {
            INFEASIBLE_CONFIDENCE
        };
        let confidence = (completion * covered * feasible).clamp(0.0, 1.0);

        warnings.extend(plan_warnings(&plan, &plan_metrics, &ctx));
        if ga.timed_out {
            warnings.push(
                OptimizationWarning::new(
                    WarningSeverity::Medium,
                    WarningCategory::Timeout,
                    format!(
                        "Search stopped after {} of {} generations",
                        ga.generations, config.max_generations
                    ),
                )
                .with_action("Raise the timeout or lower the generation cap"),
            );
        }

        let result = OptimizationResult {
            request_id: request.id.clone(),
            status,
            plan: Some(plan),
            plan_metrics: Some(plan_metrics),
            alternatives,
            metrics,
            warnings,
            confidence,
            generations_run: ga.generations,
            convergence_generation: ga.convergence_generation,
            fitness_history: ga.history,
            seed,
            conflicts,
            forecasts: kept_forecasts,
            elapsed_ms: elapsed_ms(started),
        };
        info!(
            request_id = %result.request_id,
            status = ?result.status,
            generations = result.generations_run,
            confidence = result.confidence,
            elapsed_ms = result.elapsed_ms,
            "optimization finished"
        );
        Ok(result)
    }

    fn forecast_all(
        &self,
        history: &[(ResourceType, Vec<UtilizationSample>)],
        capacity: &BTreeMap<ResourceType, f64>,
        request: &OptimizationRequest,
    ) -> Vec<(ResourceType, Result<DemandForecast, ForecastError>)> {
        let forecaster = Forecaster::new(&self.registry);
        history
            .iter()
            .map(|(resource_type, samples)| {
                let cap = capacity.get(resource_type).copied().unwrap_or(0.0);
                (
                    *resource_type,
                    forecaster.forecast(*resource_type, samples, &request.horizon, cap),
                )
            })
            .collect()
    }
}

fn build_problem<'a>(
    ctx: &'a PlanningContext,
    config: &GaConfig,
    conflicts: &[Conflict],
    forecasts: &[DemandForecast],
) -> AllocationProblem<'a> {
    AllocationProblem::new(ctx)
        .with_operators(GeneticOperators::with_crossover(config.crossover))
        .with_conflicts(conflicts)
        .with_scarcity(forecasts)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn coverage(metrics: &PlanMetrics, task_count: usize) -> f64 {
    if task_count == 0 {
        1.0
    } else {
        metrics.resourced_tasks as f64 / task_count as f64
    }
}

fn aggregate_metrics<I: Individual>(
    chosen: &PlanMetrics,
    baseline: &PlanMetrics,
    task_count: usize,
    ga: &GaResult<I>,
) -> OptimizationMetrics {
    let cost_savings = baseline.total_cost - chosen.total_cost;
    let time_savings_ms = baseline.duration_ms - chosen.duration_ms;
    let percent_of = |saved: f64, base: f64| if base > 0.0 { saved / base * 100.0 } else { 0.0 };

    let other_violations = chosen.violation_count.saturating_sub(chosen.unresourced_tasks);
    let mut feasibility_score = coverage(chosen, task_count);
    if other_violations > 0 {
        feasibility_score *= 0.5;
    }

    let robustness_score = if ga.population.is_empty() {
        0.0
    } else {
        let threshold = ROBUSTNESS_BAND * ga.best_fitness;
        let close = ga
            .population
            .iter()
            .filter(|i| i.fitness() >= threshold)
            .count();
        close as f64 / ga.population.len() as f64
    };

    OptimizationMetrics {
        cost_savings,
        cost_savings_percent: percent_of(cost_savings, baseline.total_cost),
        time_savings_ms,
        time_savings_percent: percent_of(time_savings_ms as f64, baseline.duration_ms as f64),
        average_utilization: chosen.avg_utilization,
        utilization_improvement: (chosen.avg_utilization - baseline.avg_utilization) * 100.0,
        feasibility_score,
        robustness_score,
        baseline_cost: baseline.total_cost,
        baseline_duration_ms: baseline.duration_ms,
    }
}

fn conflict_warning(conflict: &Conflict) -> OptimizationWarning {
    let severity = match conflict.severity {
        ConflictSeverity::Low => WarningSeverity::Low,
        ConflictSeverity::Medium => WarningSeverity::Medium,
        ConflictSeverity::High => WarningSeverity::High,
        ConflictSeverity::Critical => WarningSeverity::Critical,
    };
    let action = if conflict.can_reschedule {
        "Move a task with slack out of the window"
    } else {
        "Reassign one of the allocations or add capacity"
    };
    OptimizationWarning::new(
        severity,
        WarningCategory::Conflict,
        format!(
            "{:?} on '{}' from {} to {} ({:.0}% over capacity)",
            conflict.kind,
            conflict.resource_id,
            conflict.window.start_ms,
            conflict.window.end_ms,
            conflict.excess_percent
        ),
    )
    .with_tasks(conflict.task_ids())
    .with_resources([conflict.resource_id.clone()])
    .with_action(action)
}

fn bottleneck_warning(forecast: &DemandForecast) -> Option<OptimizationWarning> {
    let first = forecast.bottlenecks.first()?;
    Some(
        OptimizationWarning::new(
            WarningSeverity::Medium,
            WarningCategory::Forecast,
            format!(
                "{:?} demand forecast to exceed capacity {} from {} (peak {:.1})",
                forecast.resource_type, forecast.capacity, first.window.start_ms, forecast.peak.demand
            ),
        )
        .with_action("Secure additional capacity before the bottleneck"),
    )
}

fn plan_warnings(
    plan: &SchedulingPlan,
    metrics: &PlanMetrics,
    ctx: &PlanningContext,
) -> Vec<OptimizationWarning> {
    let mut warnings = Vec::new();

    if !plan.unresourced_tasks.is_empty() {
        warnings.push(
            OptimizationWarning::new(
                WarningSeverity::High,
                WarningCategory::Capacity,
                format!(
                    "{} of {} tasks could not be resourced",
                    plan.unresourced_tasks.len(),
                    plan.tasks.len()
                ),
            )
            .with_tasks(plan.unresourced_tasks.iter().cloned())
            .with_action("Add capacity, widen availability, or extend the horizon"),
        );
    }

    if metrics.overloaded_allocations > 0 && ctx.constraints.allow_overtime {
        let resources: BTreeSet<&str> = plan
            .allocations
            .iter()
            .map(|a| a.resource_id.as_str())
            .collect();
        warnings.push(
            OptimizationWarning::new(
                WarningSeverity::Low,
                WarningCategory::Capacity,
                format!(
                    "{} allocations run on overtime",
                    metrics.overloaded_allocations
                ),
            )
            .with_resources(resources),
        );
    }

    if metrics.budget_overrun > 0.0 {
        warnings.push(
            OptimizationWarning::new(
                WarningSeverity::High,
                WarningCategory::Budget,
                format!(
                    "Plan cost {:.2} exceeds budget by {:.2}",
                    metrics.total_cost, metrics.budget_overrun
                ),
            )
            .with_action("Raise the budget or favor cheaper resources"),
        );
    }

    if metrics.deadline_misses > 0 {
        let late: Vec<String> = plan
            .tasks
            .iter()
            .filter(|s| {
                ctx.task_position(&s.task_id)
                    .and_then(|i| ctx.tasks[i].deadline_ms)
                    .is_some_and(|d| s.end_ms > d)
            })
            .map(|s| s.task_id.clone())
            .collect();
        warnings.push(
            OptimizationWarning::new(
                WarningSeverity::Medium,
                WarningCategory::Schedule,
                format!("{} tasks finish after their deadline", metrics.deadline_misses),
            )
            .with_tasks(late),
        );
    }

    if metrics.deadline_overrun_ms > 0 {
        warnings.push(OptimizationWarning::new(
            WarningSeverity::High,
            WarningCategory::Schedule,
            format!(
                "Plan finishes {} ms after the requested deadline",
                metrics.deadline_overrun_ms
            ),
        ));
    }

    if metrics.horizon_overrun_ms > 0 {
        warnings.push(
            OptimizationWarning::new(
                WarningSeverity::High,
                WarningCategory::Schedule,
                format!(
                    "Plan runs {} ms past the planning horizon",
                    metrics.horizon_overrun_ms
                ),
            )
            .with_action("Extend the horizon"),
        );
    }

    warnings
}
