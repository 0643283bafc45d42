//! Scenario ranking.
//!
//! Picks the top distinct plans out of a final GA population, decodes and
//! scores each with the same composite used as fitness, and describes how
//! every runner-up trades off against the winner.
//!
//! # Ordering
//!
//! 1. Fitness, descending
//! 2. Constraint violations, ascending
//! 3. Genome id, ascending
//!
//! Two genomes are the same scenario when they assign every task to the
//! same resource; start delays alone do not make a plan distinct.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::ga::{AllocationGenome, AllocationProblem, Assessment};
use crate::models::AlternativeScenario;
use crate::scheduler::Assignment;

/// Deltas below this (percent) are not worth mentioning.
const NOTABLE_DELTA_PERCENT: f64 = 0.5;

/// A scored, distinct scenario.
#[derive(Debug, Clone)]
pub struct RankedScenario {
    /// Genome id the scenario came from.
    pub genome_id: u64,
    /// Assignments that produced it.
    pub genes: Vec<Assignment>,
    /// Decoded plan and its scores.
    pub assessment: Assessment,
}

/// Selects and describes the best distinct scenarios.
///
/// # Example
///
/// ```
/// use u_resource_optim::ga::{AllocationGenome, AllocationProblem};
/// use u_resource_optim::models::{OptimizationRequest, Resource, Task, HOUR_MS, DAY_MS};
/// use u_resource_optim::ranking::ScenarioRanker;
/// use u_resource_optim::scheduler::{Assignment, PlanningContext};
///
/// let tasks = vec![Task::new("A", HOUR_MS)];
/// let resources = vec![
///     Resource::worker("W1").with_cost_rate(10.0),
///     Resource::worker("W2").with_cost_rate(20.0),
/// ];
/// let request = OptimizationRequest::new("R1", 0, DAY_MS);
/// let ctx = PlanningContext::new(tasks, resources, &[], &request).unwrap();
/// let problem = AllocationProblem::new(&ctx);
///
/// let population = vec![
///     AllocationGenome::new(vec![Assignment::to(0)]),
///     AllocationGenome::new(vec![Assignment::to(0).with_delay(HOUR_MS)]),
///     AllocationGenome::new(vec![Assignment::to(1)]),
/// ];
/// let ranked = ScenarioRanker::new(3).rank(&problem, &population);
/// assert_eq!(ranked.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRanker {
    max_alternatives: usize,
}

impl ScenarioRanker {
    /// Keeps the winner plus up to `max_alternatives` runners-up.
    pub fn new(max_alternatives: usize) -> Self {
        Self { max_alternatives }
    }

    /// Ranks the distinct valid genomes of `population`.
    ///
    /// `population` is scanned in order, so a best-first population keeps
    /// the fittest representative of each scenario.
    pub fn rank(
        &self,
        problem: &AllocationProblem<'_>,
        population: &[AllocationGenome],
    ) -> Vec<RankedScenario> {
        let ctx = problem.context();
        let limit = self.max_alternatives + 1;
        let mut seen: HashSet<Vec<Option<usize>>> = HashSet::new();
        let mut ranked: Vec<RankedScenario> = Vec::with_capacity(limit);

        for genome in population {
            if ranked.len() >= limit {
                break;
            }
            if !genome.is_valid(ctx) || !seen.insert(genome.resource_vector()) {
                continue;
            }
            ranked.push(RankedScenario {
                genome_id: genome.id,
                genes: genome.genes.clone(),
                assessment: problem.assess(&genome.genes),
            });
        }

        ranked.sort_by(compare_scenarios);
        ranked
    }

    /// Describes every scenario after the first against the first.
    pub fn alternatives(&self, ranked: &[RankedScenario]) -> Vec<AlternativeScenario> {
        let Some((primary, rest)) = ranked.split_first() else {
            return Vec::new();
        };
        rest.iter()
            .enumerate()
            .map(|(i, scenario)| describe(i + 1, primary, scenario))
            .collect()
    }
}

fn compare_scenarios(a: &RankedScenario, b: &RankedScenario) -> Ordering {
    b.assessment
        .fitness
        .total_cmp(&a.assessment.fitness)
        .then_with(|| a.assessment.violations.cmp(&b.assessment.violations))
        .then_with(|| a.genome_id.cmp(&b.genome_id))
}

fn describe(rank: usize, primary: &RankedScenario, alt: &RankedScenario) -> AlternativeScenario {
    let (p, a) = (&primary.assessment.metrics, &alt.assessment.metrics);
    let cost = delta_percent(a.total_cost, p.total_cost);
    let duration = delta_percent(a.duration_ms as f64, p.duration_ms as f64);
    let quality = delta_percent(a.average_quality, p.average_quality);

    let mut pros = Vec::new();
    let mut cons = Vec::new();
    if cost < -NOTABLE_DELTA_PERCENT {
        pros.push(format!("{:.0}% cheaper", -cost));
    } else if cost > NOTABLE_DELTA_PERCENT {
        cons.push(format!("{cost:.0}% more expensive"));
    }
    if duration < -NOTABLE_DELTA_PERCENT {
        pros.push(format!("{:.0}% shorter", -duration));
    } else if duration > NOTABLE_DELTA_PERCENT {
        cons.push(format!("{duration:.0}% longer"));
    }
    if quality > NOTABLE_DELTA_PERCENT {
        pros.push(format!("{quality:.0}% higher quality"));
    } else if quality < -NOTABLE_DELTA_PERCENT {
        cons.push(format!("{:.0}% lower quality", -quality));
    }
    let (pv, av) = (primary.assessment.violations, alt.assessment.violations);
    if av < pv {
        pros.push(format!("{} fewer constraint violations", pv - av));
    } else if av > pv {
        cons.push(format!("{} more constraint violations", av - pv));
    }

    let name = if cost < -NOTABLE_DELTA_PERCENT {
        "Lower cost".to_string()
    } else if duration < -NOTABLE_DELTA_PERCENT {
        "Faster completion".to_string()
    } else if quality > NOTABLE_DELTA_PERCENT {
        "Higher quality".to_string()
    } else {
        format!("Alternative {rank}")
    };

    AlternativeScenario {
        id: format!("ALT-{rank}"),
        name,
        plan: alt.assessment.plan.clone(),
        metrics: a.clone(),
        score: alt.assessment.fitness,
        cost_delta_percent: cost,
        duration_delta_percent: duration,
        quality_delta_percent: quality,
        pros,
        cons,
        violation_count: av,
    }
}

/// Change from `base` to `value` in percent of `base`.
fn delta_percent(value: f64, base: f64) -> f64 {
    if base.abs() < f64::EPSILON {
        if value.abs() < f64::EPSILON {
            0.0
        } else {
            100.0 * value.signum()
        }
    } else {
        (value - base) / base.abs() * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OptimizationRequest, Resource, Task, DAY_MS, HOUR_MS};
    use crate::scheduler::PlanningContext;

    fn ctx() -> PlanningContext {
        let tasks = vec![Task::new("A", 10 * HOUR_MS)];
        let resources = vec![
            Resource::worker("W1").with_cost_rate(100.0).with_quality(1.0),
            Resource::worker("W2").with_cost_rate(88.0).with_quality(0.5),
            Resource::worker("W3").with_cost_rate(100.0).with_quality(1.0),
        ];
        let request = OptimizationRequest::new("R1", 0, 10 * DAY_MS);
        PlanningContext::new(tasks, resources, &[], &request).unwrap()
    }

    fn genome(id: u64, gene: Assignment) -> AllocationGenome {
        let mut g = AllocationGenome::new(vec![gene]);
        g.id = id;
        g
    }

    #[test]
    fn test_dedupes_by_resource_vector() {
        let c = ctx();
        let p = AllocationProblem::new(&c);
        let population = vec![
            genome(0, Assignment::to(0)),
            genome(1, Assignment::to(0).with_delay(HOUR_MS)),
            genome(2, Assignment::to(1)),
            genome(3, Assignment::to(2)),
        ];
        let ranked = ScenarioRanker::new(3).rank(&p, &population);
        let ids: Vec<u64> = ranked.iter().map(|r| r.genome_id).collect();
        assert_eq!(ranked.len(), 3);
        assert!(!ids.contains(&1));
    }

    #[test]
    fn test_respects_limit() {
        let c = ctx();
        let p = AllocationProblem::new(&c);
        let population = vec![
            genome(0, Assignment::to(0)),
            genome(1, Assignment::to(1)),
            genome(2, Assignment::to(2)),
        ];
        assert_eq!(ScenarioRanker::new(1).rank(&p, &population).len(), 2);
        assert_eq!(ScenarioRanker::new(0).rank(&p, &population).len(), 1);
    }

    #[test]
    fn test_equal_fitness_breaks_on_id() {
        let c = ctx();
        let p = AllocationProblem::new(&c);
        // W1 and W3 are identical
        let population = vec![genome(7, Assignment::to(2)), genome(3, Assignment::to(0))];
        let ranked = ScenarioRanker::new(3).rank(&p, &population);
        assert_eq!(ranked[0].genome_id, 3);
        assert!(ranked[0].assessment.fitness >= ranked[1].assessment.fitness);
    }

    #[test]
    fn test_pros_and_cons() {
        let c = ctx();
        let p = AllocationProblem::new(&c);
        let ranker = ScenarioRanker::new(3);
        let primary = RankedScenario {
            genome_id: 0,
            genes: vec![Assignment::to(0)],
            assessment: p.assess(&[Assignment::to(0)]),
        };
        let cheaper = RankedScenario {
            genome_id: 1,
            genes: vec![Assignment::to(1)],
            assessment: p.assess(&[Assignment::to(1)]),
        };
        let alts = ranker.alternatives(&[primary, cheaper]);
        assert_eq!(alts.len(), 1);
        let alt = &alts[0];
        assert_eq!(alt.id, "ALT-1");
        assert_eq!(alt.name, "Lower cost");
        assert!((alt.cost_delta_percent + 12.0).abs() < 1e-9);
        assert!((alt.quality_delta_percent + 50.0).abs() < 1e-9);
        assert!(alt.duration_delta_percent.abs() < 1e-12);
        assert_eq!(alt.pros, vec!["12% cheaper"]);
        assert_eq!(alt.cons, vec!["50% lower quality"]);
    }

    #[test]
    fn test_delta_percent() {
        assert!((delta_percent(110.0, 100.0) - 10.0).abs() < 1e-10);
        assert!((delta_percent(0.0, 0.0)).abs() < 1e-12);
        assert!((delta_percent(5.0, 0.0) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_alternatives_for_single_scenario() {
        let c = ctx();
        let p = AllocationProblem::new(&c);
        let ranked = ScenarioRanker::new(3).rank(&p, &[genome(0, Assignment::to(0))]);
        assert!(ScenarioRanker::new(3).alternatives(&ranked).is_empty());
    }
}
