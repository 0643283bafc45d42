//! Assignment genome for allocation search.
//!
//! # Encoding
//!
//! One gene per task, in snapshot order. Each gene holds the assigned
//! resource (an index into the context's resources) and a start delay.
//! Start times are not encoded: decoding through
//! [`CriticalPathScheduler`](crate::scheduler::CriticalPathScheduler)
//! resolves them, so every decoded plan respects dependencies.
//!
//! # Reference
//! Hartmann (1998), "A competitive genetic algorithm for resource-constrained
//! project scheduling"

use rand::prelude::IndexedRandom;
use rand::seq::SliceRandom;
use rand::Rng;

use super::runner::Individual;
use crate::scheduler::{Assignment, PlanningContext};

/// Candidate allocation of every task in scope.
///
/// Higher fitness = better plan (maximization convention).
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationGenome {
    /// Stable id; breaks fitness ties (smaller wins).
    pub id: u64,
    /// One gene per task, in snapshot order.
    pub genes: Vec<Assignment>,
    /// Fitness value (higher = better).
    pub fitness: f64,
    /// Generation this genome was created in.
    pub generation: usize,
}

impl Individual for AllocationGenome {
    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn set_generation(&mut self, generation: usize) {
        self.generation = generation;
    }
}

impl AllocationGenome {
    /// Wraps genes into an unevaluated genome.
    pub fn new(genes: Vec<Assignment>) -> Self {
        Self {
            id: 0,
            genes,
            fitness: 0.0,
            generation: 0,
        }
    }

    /// Random eligible resource per task, no delays.
    pub fn random<R: Rng>(ctx: &PlanningContext, rng: &mut R) -> Self {
        let genes = ctx
            .eligible
            .iter()
            .map(|e| Assignment {
                resource: e.choose(rng).copied(),
                delay_ms: 0,
            })
            .collect();
        Self::new(genes)
    }

    /// Tasks visited in random order, each given the eligible resource with
    /// the lowest load relative to its horizon capacity.
    pub fn with_load_balancing<R: Rng>(ctx: &PlanningContext, rng: &mut R) -> Self {
        let mut visit: Vec<usize> = (0..ctx.task_count()).collect();
        visit.shuffle(rng);

        let capacity: Vec<f64> = (0..ctx.resources.len())
            .map(|r| ctx.capacity_in_horizon(r).max(1.0))
            .collect();
        let mut load = vec![0.0f64; ctx.resources.len()];
        let mut genes = vec![Assignment::default(); ctx.task_count()];

        for t in visit {
            // Select least-loaded candidate
            let best = ctx.eligible[t]
                .iter()
                .copied()
                .min_by(|&a, &b| (load[a] / capacity[a]).total_cmp(&(load[b] / capacity[b])));
            if let Some(r) = best {
                load[r] += demand_ms(ctx, t);
                genes[t] = Assignment::to(r);
            }
        }
        Self::new(genes)
    }

    /// Resource per task; used to tell genomes apart.
    pub fn resource_vector(&self) -> Vec<Option<usize>> {
        self.genes.iter().map(|g| g.resource).collect()
    }

    /// Whether the genome is well-formed for `ctx`: one gene per task, every
    /// assigned resource eligible, every task with candidates assigned, and
    /// no negative delays.
    pub fn is_valid(&self, ctx: &PlanningContext) -> bool {
        if self.genes.len() != ctx.task_count() {
            return false;
        }
        self.genes.iter().enumerate().all(|(t, g)| {
            g.delay_ms >= 0
                && match g.resource {
                    Some(r) => ctx.is_eligible(t, r),
                    None => ctx.eligible[t].is_empty(),
                }
        })
    }

    /// Restores validity after recombination.
    ///
    /// 1. Genes pointing at ineligible (or no) resources move to the most
    ///    available eligible resource.
    /// 2. Unless overtime is allowed, tasks on a resource whose total demand
    ///    exceeds its horizon capacity move to the eligible resource with
    ///    the most remaining capacity, when one can absorb them.
    pub fn repair(&mut self, ctx: &PlanningContext) {
        let n = ctx.task_count();
        self.genes.resize(n, Assignment::default());

        let capacity: Vec<f64> = (0..ctx.resources.len())
            .map(|r| ctx.capacity_in_horizon(r))
            .collect();
        let mut load = vec![0.0f64; ctx.resources.len()];

        for t in 0..n {
            let gene = &mut self.genes[t];
            gene.delay_ms = gene.delay_ms.max(0);
            if !gene.resource.is_some_and(|r| ctx.is_eligible(t, r)) {
                gene.resource = most_available(&ctx.eligible[t], &load, &capacity, None);
            }
            if let Some(r) = gene.resource {
                load[r] += demand_ms(ctx, t);
            }
        }

        if ctx.constraints.allow_overtime {
            return;
        }
        for t in 0..n {
            let Some(r) = self.genes[t].resource else {
                continue;
            };
            if load[r] <= capacity[r] {
                continue;
            }
            let need = demand_ms(ctx, t);
            let alternative = most_available(&ctx.eligible[t], &load, &capacity, Some(r))
                .filter(|&a| load[a] + need <= capacity[a]);
            if let Some(a) = alternative {
                load[r] -= need;
                load[a] += need;
                self.genes[t].resource = Some(a);
            }
        }
    }
}

/// Capacity-time a task consumes (ms at 100%).
fn demand_ms(ctx: &PlanningContext, task: usize) -> f64 {
    let t = &ctx.tasks[task];
    t.duration_ms as f64 * f64::from(t.allocation_percent) / 100.0
}

/// Candidate with the most remaining capacity (ties: snapshot order).
fn most_available(
    candidates: &[usize],
    load: &[f64],
    capacity: &[f64],
    except: Option<usize>,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for &r in candidates {
        if Some(r) == except {
            continue;
        }
        let remaining = capacity[r] - load[r];
        match best {
            Some((_, b)) if remaining <= b => {}
            _ => best = Some((r, remaining)),
        }
    }
    best.map(|(r, _)| r)
}

// ======================== Crossover operators ========================

/// Single-point crossover: genes before a random cut come from one parent,
/// the rest from the other.
pub fn single_point_crossover<R: Rng>(
    p1: &AllocationGenome,
    p2: &AllocationGenome,
    rng: &mut R,
) -> (AllocationGenome, AllocationGenome) {
    let len = p1.genes.len().min(p2.genes.len());
    if len < 2 {
        return (
            AllocationGenome::new(p1.genes.clone()),
            AllocationGenome::new(p2.genes.clone()),
        );
    }
    let point = rng.random_range(1..len);
    let mut c1 = p1.genes[..point].to_vec();
    c1.extend_from_slice(&p2.genes[point..]);
    let mut c2 = p2.genes[..point].to_vec();
    c2.extend_from_slice(&p1.genes[point..]);
    (AllocationGenome::new(c1), AllocationGenome::new(c2))
}

/// Uniform crossover: each gene comes from either parent with equal
/// probability; the second child takes the other parent's gene.
pub fn uniform_crossover<R: Rng>(
    p1: &AllocationGenome,
    p2: &AllocationGenome,
    rng: &mut R,
) -> (AllocationGenome, AllocationGenome) {
    let (c1, c2) = p1
        .genes
        .iter()
        .zip(&p2.genes)
        .map(|(a, b)| if rng.random_bool(0.5) { (*a, *b) } else { (*b, *a) })
        .unzip();
    (AllocationGenome::new(c1), AllocationGenome::new(c2))
}

// ======================== Mutation operators ========================

/// Reassign mutation: moves one task with alternatives to a different
/// eligible resource. Falls back to [`shift_mutation`] when no task has a
/// choice.
pub fn reassign_mutation<R: Rng>(genome: &mut AllocationGenome, ctx: &PlanningContext, rng: &mut R) {
    let movable: Vec<usize> = (0..genome.genes.len().min(ctx.task_count()))
        .filter(|&t| ctx.eligible[t].len() > 1)
        .collect();
    let Some(&t) = movable.choose(rng) else {
        shift_mutation(genome, ctx, rng);
        return;
    };
    let current = genome.genes[t].resource;
    let others: Vec<usize> = ctx.eligible[t]
        .iter()
        .copied()
        .filter(|&r| Some(r) != current)
        .collect();
    if let Some(&r) = others.choose(rng) {
        genome.genes[t].resource = Some(r);
    }
}

/// Shift mutation: changes one task's start delay, either clearing it or
/// drawing a new one of up to the task's duration.
pub fn shift_mutation<R: Rng>(genome: &mut AllocationGenome, ctx: &PlanningContext, rng: &mut R) {
    let len = genome.genes.len().min(ctx.task_count());
    if len == 0 {
        return;
    }
    let t = rng.random_range(0..len);
    let gene = &mut genome.genes[t];
    if gene.delay_ms > 0 && rng.random_bool(0.5) {
        gene.delay_ms = 0;
    } else {
        let max_shift = ctx.tasks[t].duration_ms.max(1);
        gene.delay_ms = rng.random_range(0..=max_shift);
    }
}
