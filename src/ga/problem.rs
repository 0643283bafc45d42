//! Allocation GA problem definition.
//!
//! Implements [`GaProblem`] for resource allocation. Bridges the planning
//! context (tasks, resources, rules) to the generic GA runner: genomes are
//! decoded through the critical-path scheduler and scored against the
//! request's objective.
//!
//! # Fitness
//!
//! ```text
//! base    = 0.9 · (wc·cost + wt·time + wq·quality) + 0.1 · (1 − risk)
//! score   = 0.75 · base + 0.25 · emphasis(objective)     (Balanced: base)
//! fitness = score / (1 + penalty)
//! ```
//!
//! Component scores are normalized to [0, 1], higher = better. The penalty
//! grows with every hard-constraint breach, so a feasible plan always beats
//! an infeasible one of similar quality.
//!
//! # Reference
//! Hartmann (1998), "A competitive genetic algorithm for resource-constrained
//! project scheduling"

use rand::Rng;

use super::genome::AllocationGenome;
use super::operators::GeneticOperators;
use super::runner::GaProblem;
use crate::conflict::{Conflict, ConflictKind};
use crate::forecast::DemandForecast;
use crate::models::{Objective, ResourceType, SchedulingPlan, TimeWindow};
use crate::scheduler::{
    Assignment, BaselineScheduler, BaselineStrategy, CriticalPathScheduler, PlanMetrics,
    PlanningContext,
};

/// Share of the score taken by the objective-specific metric.
const EMPHASIS: f64 = 0.25;
/// Share of the base score taken by (1 − risk).
const RISK_SHARE: f64 = 0.1;
/// Share of the score taken by preferred-resource usage.
const PREFERENCE_SHARE: f64 = 0.05;

/// A decoded and scored genome.
#[derive(Debug, Clone)]
pub struct Assessment {
    /// Decoded plan.
    pub plan: SchedulingPlan,
    /// Plan metrics.
    pub metrics: PlanMetrics,
    /// Objective score before penalties (0.0..1.0).
    pub score: f64,
    /// Constraint penalty (0 = none).
    pub penalty: f64,
    /// `score / (1 + penalty)`.
    pub fitness: f64,
    /// Hard-constraint violations, including placements into known
    /// over-allocation windows.
    pub violations: usize,
}

/// GA problem for resource allocation.
///
/// # Example
/// ```
/// use u_resource_optim::ga::{AllocationProblem, GaConfig, GaRunner};
/// use u_resource_optim::models::{OptimizationRequest, Resource, Task, DAY_MS};
/// use u_resource_optim::scheduler::PlanningContext;
///
/// let tasks = vec![Task::new("A", DAY_MS), Task::new("B", DAY_MS).depends_on("A")];
/// let resources = vec![Resource::worker("W1").with_cost_rate(40.0)];
/// let request = OptimizationRequest::new("R1", 0, 10 * DAY_MS);
/// let ctx = PlanningContext::new(tasks, resources, &[], &request).unwrap();
///
/// let problem = AllocationProblem::new(&ctx);
/// let config = GaConfig::default()
///     .with_population_size(10)
///     .with_max_generations(5)
///     .with_seed(42);
/// let result = GaRunner::run(&problem, &config);
/// let plan = problem.decode(&result.best);
/// assert_eq!(plan.total_duration_ms, 2 * DAY_MS);
/// ```
pub struct AllocationProblem<'a> {
    ctx: &'a PlanningContext,
    operators: GeneticOperators,
    scheduler: CriticalPathScheduler,
    cost_ceiling: f64,
    conflict_windows: Vec<(usize, TimeWindow)>,
    scarcity: Vec<(ResourceType, TimeWindow)>,
}

impl<'a> AllocationProblem<'a> {
    /// Creates a problem over `ctx` with default operators.
    pub fn new(ctx: &'a PlanningContext) -> Self {
        // Most expensive eligible resource per task
        let cost_ceiling = ctx
            .tasks
            .iter()
            .zip(&ctx.eligible)
            .map(|(task, eligible)| {
                eligible
                    .iter()
                    .map(|&r| ctx.resources[r].cost_for(task.duration_ms, task.allocation_percent))
                    .fold(0.0, f64::max)
            })
            .sum();
        Self {
            ctx,
            operators: GeneticOperators::default(),
            scheduler: CriticalPathScheduler::new(),
            cost_ceiling,
            conflict_windows: Vec::new(),
            scarcity: Vec::new(),
        }
    }

    /// Sets the genetic operators.
    pub fn with_operators(mut self, operators: GeneticOperators) -> Self {
        self.operators = operators;
        self
    }

    /// Penalizes placements into over-allocated windows found in
    /// pre-existing allocations.
    pub fn with_conflicts(mut self, conflicts: &[Conflict]) -> Self {
        self.conflict_windows = conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::OverAllocation)
            .filter_map(|c| {
                self.ctx
                    .resource_position(&c.resource_id)
                    .map(|r| (r, c.window))
            })
            .collect();
        self
    }

    /// Penalizes placements into forecast bottleneck windows.
    pub fn with_scarcity(mut self, forecasts: &[DemandForecast]) -> Self {
        self.scarcity = forecasts
            .iter()
            .flat_map(|f| f.bottlenecks.iter().map(move |b| (f.resource_type, b.window)))
            .collect();
        self
    }

    /// The genetic operators in use.
    pub fn operators(&self) -> &GeneticOperators {
        &self.operators
    }

    /// The planning context.
    pub fn context(&self) -> &PlanningContext {
        self.ctx
    }

    /// Decodes a genome into a plan.
    pub fn decode(&self, genome: &AllocationGenome) -> SchedulingPlan {
        self.scheduler.schedule(self.ctx, &genome.genes)
    }

    /// Decodes and scores a set of assignments.
    pub fn assess(&self, genes: &[Assignment]) -> Assessment {
        let plan = self.scheduler.schedule(self.ctx, genes);
        let metrics = PlanMetrics::calculate(&plan, self.ctx);
        let score = self.score(&metrics);

        let conflict_hits = self.count_hits(&plan, |r, window| {
            self.conflict_windows
                .iter()
                .any(|(cr, cw)| *cr == r && cw.overlaps(window))
        });
        let scarcity_hits = self.count_hits(&plan, |r, window| {
            let kind = self.ctx.resources[r].resource_type();
            self.scarcity
                .iter()
                .any(|(t, w)| *t == kind && w.overlaps(window))
        });

        let penalty = self.penalty(&metrics, conflict_hits, scarcity_hits);
        Assessment {
            violations: metrics.violation_count + conflict_hits,
            fitness: score / (1.0 + penalty),
            plan,
            metrics,
            score,
            penalty,
        }
    }

    /// Objective score of a plan's metrics, before penalties.
    pub fn score(&self, metrics: &PlanMetrics) -> f64 {
        let w = self.ctx.weights;
        let cost = if self.cost_ceiling > 0.0 {
            (1.0 - metrics.total_cost / self.cost_ceiling).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let time = if metrics.duration_ms > 0 {
            (self.ctx.dependency_length_ms as f64 / metrics.duration_ms as f64).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let quality = metrics.average_quality.clamp(0.0, 1.0);

        let base = (1.0 - RISK_SHARE) * (w.cost * cost + w.time * time + w.quality * quality)
            + RISK_SHARE * (1.0 - metrics.risk);

        let emphasis = match self.ctx.objective {
            Objective::Balanced => None,
            Objective::MinimizeCost => Some(cost),
            Objective::MinimizeDuration => Some(time),
            Objective::MaximizeQuality => Some(quality),
            Objective::MaximizeUtilization => Some(metrics.avg_utilization.min(1.0)),
            Objective::MinimizeIdleTime => Some(1.0 - metrics.idle_ratio),
        };
        let mut score = match emphasis {
            Some(e) => (1.0 - EMPHASIS) * base + EMPHASIS * e,
            None => base,
        };

        if !self.ctx.preferences.preferred_resources.is_empty() {
            score = (1.0 - PREFERENCE_SHARE) * score + PREFERENCE_SHARE * metrics.preferred_share;
        }
        score.clamp(0.0, 1.0)
    }

    fn penalty(&self, metrics: &PlanMetrics, conflict_hits: usize, scarcity_hits: usize) -> f64 {
        let n = self.ctx.task_count().max(1) as f64;
        let horizon = self.ctx.horizon.duration_ms().max(1) as f64;
        let overload_weight = if self.ctx.constraints.allow_overtime {
            0.1
        } else {
            1.0
        };

        let mut penalty = 2.0 * metrics.unresourced_tasks as f64 / n
            + overload_weight * metrics.overloaded_allocations as f64 / n
            + 0.5 * metrics.deadline_misses as f64 / n
            + metrics.deadline_overrun_ms as f64 / horizon
            + metrics.horizon_overrun_ms as f64 / horizon
            + 0.25 * conflict_hits as f64 / n
            + 0.1 * scarcity_hits as f64 / n;

        if metrics.budget_overrun > 0.0 {
            penalty += match self.ctx.constraints.max_budget {
                Some(budget) if budget > 0.0 => metrics.budget_overrun / budget,
                _ => 1.0,
            };
        }
        penalty
    }

    fn count_hits<F>(&self, plan: &SchedulingPlan, hit: F) -> usize
    where
        F: Fn(usize, &TimeWindow) -> bool,
    {
        if self.conflict_windows.is_empty() && self.scarcity.is_empty() {
            return 0;
        }
        plan.allocations
            .iter()
            .filter(|a| {
                self.ctx
                    .resource_position(&a.resource_id)
                    .is_some_and(|r| hit(r, &a.window()))
            })
            .count()
    }
}

impl GaProblem for AllocationProblem<'_> {
    type Individual = AllocationGenome;

    fn seed_individuals(&self) -> Vec<AllocationGenome> {
        [BaselineStrategy::FirstFit, BaselineStrategy::EarliestAvailable]
            .into_iter()
            .map(|s| {
                AllocationGenome::new(BaselineScheduler::new().with_strategy(s).assignments(self.ctx))
            })
            .collect()
    }

    fn create_individual<R: Rng>(&self, rng: &mut R) -> AllocationGenome {
        if rng.random_bool(0.5) {
            AllocationGenome::random(self.ctx, rng)
        } else {
            AllocationGenome::with_load_balancing(self.ctx, rng)
        }
    }

    fn evaluate(&self, individual: &AllocationGenome) -> f64 {
        if !individual.is_valid(self.ctx) {
            return 0.0;
        }
        self.assess(&individual.genes).fitness
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &AllocationGenome,
        parent2: &AllocationGenome,
        rng: &mut R,
    ) -> Vec<AllocationGenome> {
        let (mut c1, mut c2) = self.operators.crossover(parent1, parent2, rng);
        c1.repair(self.ctx);
        c2.repair(self.ctx);
        vec![c1, c2]
    }

    fn mutate<R: Rng>(&self, individual: &mut AllocationGenome, rng: &mut R) {
        self.operators.mutate(individual, self.ctx, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::{GaConfig, GaRunner};
    use crate::models::{OptimizationRequest, Resource, Task, DAY_MS, HOUR_MS};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn two_worker_ctx(objective: Objective) -> PlanningContext {
        let tasks = vec![Task::new("A", HOUR_MS)];
        let resources = vec![
            Resource::worker("CHEAP").with_cost_rate(10.0).with_quality(0.5),
            Resource::worker("GOOD").with_cost_rate(100.0).with_quality(1.0),
        ];
        let request = OptimizationRequest::new("R1", 0, DAY_MS).with_objective(objective);
        PlanningContext::new(tasks, resources, &[], &request).unwrap()
    }

    #[test]
    fn test_cost_objective_prefers_cheap() {
        let ctx = two_worker_ctx(Objective::MinimizeCost);
        let p = AllocationProblem::new(&ctx);
        let cheap = p.assess(&[Assignment::to(0)]);
        let good = p.assess(&[Assignment::to(1)]);
        assert!(cheap.fitness > good.fitness);
    }

    #[test]
    fn test_quality_objective_prefers_rated() {
        let ctx = two_worker_ctx(Objective::MaximizeQuality);
        let p = AllocationProblem::new(&ctx);
        let cheap = p.assess(&[Assignment::to(0)]);
        let good = p.assess(&[Assignment::to(1)]);
        assert!(good.fitness > cheap.fitness);
    }

    #[test]
    fn test_balanced_score_values() {
        let ctx = two_worker_ctx(Objective::Balanced);
        let p = AllocationProblem::new(&ctx);
        let a = p.assess(&[Assignment::to(0)]);
        // cost 0.9, time 1, quality 0.5; risk 0.8·0.05 + 0.2 = 0.24
        let expected = 0.9 * (0.9 + 1.0 + 0.5) / 3.0 + 0.1 * 0.76;
        assert!((a.score - expected).abs() < 1e-10);
        assert!((a.penalty).abs() < 1e-10);
        assert!((a.fitness - expected).abs() < 1e-10);
        assert_eq!(a.violations, 0);
    }

    #[test]
    fn test_overload_penalized() {
        let tasks = vec![Task::new("A", HOUR_MS), Task::new("B", HOUR_MS)];
        let resources = vec![Resource::worker("W1").with_availability(0, HOUR_MS)];
        let request = OptimizationRequest::new("R1", 0, DAY_MS);
        let ctx = PlanningContext::new(tasks, resources, &[], &request).unwrap();
        let p = AllocationProblem::new(&ctx);
        let a = p.assess(&[Assignment::to(0), Assignment::to(0)]);
        assert_eq!(a.metrics.unresourced_tasks, 1);
        assert!(a.penalty >= 1.0);
        assert!(a.fitness < a.score);
    }

    #[test]
    fn test_invalid_genome_scores_zero() {
        let tasks = vec![Task::new("A", HOUR_MS).with_skill("weld")];
        let resources = vec![
            Resource::worker("W1"),
            Resource::worker("W2").with_capability("weld"),
        ];
        let request = OptimizationRequest::new("R1", 0, DAY_MS);
        let ctx = PlanningContext::new(tasks, resources, &[], &request).unwrap();
        let p = AllocationProblem::new(&ctx);
        let bad = AllocationGenome::new(vec![Assignment::to(0)]);
        let good = AllocationGenome::new(vec![Assignment::to(1)]);
        assert!((p.evaluate(&bad)).abs() < 1e-12);
        assert!(p.evaluate(&good) > 0.0);
    }

    #[test]
    fn test_conflict_window_penalty() {
        let ctx = two_worker_ctx(Objective::Balanced);
        let conflict = Conflict {
            resource_id: "CHEAP".into(),
            kind: ConflictKind::OverAllocation,
            window: TimeWindow::new(0, HOUR_MS),
            allocations: Vec::new(),
            peak_percent: 150,
            excess_percent: 50.0,
            severity: crate::conflict::ConflictSeverity::High,
            can_reschedule: false,
        };
        let plain = AllocationProblem::new(&ctx);
        let aware = AllocationProblem::new(&ctx).with_conflicts(&[conflict]);
        let before = plain.assess(&[Assignment::to(0)]);
        let after = aware.assess(&[Assignment::to(0)]);
        assert!(after.fitness < before.fitness);
        assert_eq!(after.violations, 1);
        let other = aware.assess(&[Assignment::to(1)]);
        assert!((other.penalty).abs() < 1e-12);
    }

    #[test]
    fn test_seed_individuals() {
        let ctx = two_worker_ctx(Objective::Balanced);
        let p = AllocationProblem::new(&ctx);
        let seeds = p.seed_individuals();
        assert_eq!(seeds.len(), 2);
        assert!(seeds.iter().all(|g| g.is_valid(&ctx)));
    }

    #[test]
    fn test_offspring_stay_valid() {
        let tasks = vec![
            Task::new("A", HOUR_MS).with_skill("weld"),
            Task::new("B", HOUR_MS),
            Task::new("C", HOUR_MS).depends_on("A"),
        ];
        let resources = vec![
            Resource::worker("W1"),
            Resource::worker("W2").with_capability("weld"),
        ];
        let request = OptimizationRequest::new("R1", 0, DAY_MS);
        let ctx = PlanningContext::new(tasks, resources, &[], &request).unwrap();
        let p = AllocationProblem::new(&ctx);
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..20 {
            let a = p.create_individual(&mut rng);
            let b = p.create_individual(&mut rng);
            for mut child in p.crossover(&a, &b, &mut rng) {
                p.mutate(&mut child, &mut rng);
                assert!(child.is_valid(&ctx));
            }
        }
    }

    #[test]
    fn test_ga_finds_parallel_plan() {
        let tasks = vec![Task::new("A", DAY_MS), Task::new("B", DAY_MS)];
        let resources = vec![Resource::worker("W1"), Resource::worker("W2")];
        let request = OptimizationRequest::new("R1", 0, 10 * DAY_MS)
            .with_objective(Objective::MinimizeDuration);
        let ctx = PlanningContext::new(tasks, resources, &[], &request).unwrap();
        let p = AllocationProblem::new(&ctx);
        let config = GaConfig::default()
            .with_population_size(20)
            .with_max_generations(10)
            .with_seed(42);
        let result = GaRunner::run(&p, &config);
        assert_eq!(p.decode(&result.best).total_duration_ms, DAY_MS);
    }
}
