//! Resource-constrained critical path scheduling.
//!
//! Turns a resource assignment into a time-resolved plan.
//!
//! # Algorithm
//!
//! 1. **Order**: tasks are placed in topological order (Kahn's algorithm,
//!    ties broken by snapshot order).
//! 2. **Forward pass**: each task starts at the earliest instant that
//!    satisfies every incoming link, its gene delay, its resource's
//!    availability windows, and the resource's remaining capacity
//!    (committed out-of-scope allocations count against capacity).
//! 3. **Backward pass**: latest finish/start are propagated back over the
//!    dependency links, and over resource links to later bookings on the
//!    same resource that could not overlap.
//! 4. **Critical path**: zero-slack tasks ordered by (finish, start,
//!    placement order).
//!
//! # Complexity
//! O(n·b) placements where b = bookings per resource.
//!
//! # Reference
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Kolisch (1996), "Serial and parallel resource-constrained project
//!   scheduling methods revisited: Theory and computation"

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use super::PlanningContext;
use crate::error::EngineError;
use crate::models::{Allocation, Dependency, Resource, ScheduledTask, SchedulingPlan, Task};
use crate::validation::detect_cycles;

/// One task's decision: which resource, and how long to hold the start back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Assignment {
    /// Index into the context's resources. `None` = leave unresourced.
    pub resource: Option<usize>,
    /// Extra delay after the task becomes ready (ms, non-negative).
    pub delay_ms: i64,
}

impl Assignment {
    /// Assigns a resource with no delay.
    pub fn to(resource: usize) -> Self {
        Self {
            resource: Some(resource),
            delay_ms: 0,
        }
    }

    /// Sets the start delay.
    pub fn with_delay(mut self, delay_ms: i64) -> Self {
        self.delay_ms = delay_ms.max(0);
        self
    }
}

/// Topological order of `tasks` (Kahn's algorithm).
///
/// Among ready tasks the one earliest in `tasks` goes first, so the
/// order is stable. Links to unknown tasks are ignored.
///
/// # Errors
/// [`EngineError::CyclicDependency`] naming a task on the cycle.
pub fn topological_order(tasks: &[Task]) -> Result<Vec<usize>, EngineError> {
    let index = id_index(tasks);
    let mut in_degree = vec![0usize; tasks.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.dependencies {
            if let Some(&p) = index.get(dep.predecessor_id.as_str()) {
                successors[p].push(i);
                in_degree[i] += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();
    let mut order = Vec::with_capacity(tasks.len());
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &s in &successors[i] {
            in_degree[s] -= 1;
            if in_degree[s] == 0 {
                ready.push(Reverse(s));
            }
        }
    }

    if order.len() < tasks.len() {
        let task_id = detect_cycles(tasks)
            .map(|e| e.entity_id)
            .or_else(|| {
                in_degree
                    .iter()
                    .position(|d| *d > 0)
                    .map(|i| tasks[i].id.clone())
            })
            .unwrap_or_default();
        return Err(EngineError::CyclicDependency { task_id });
    }
    Ok(order)
}

/// Dependency-only CPM times, ignoring resources. Origin is t=0.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyTimes {
    /// Earliest start per task.
    pub earliest_start: Vec<i64>,
    /// Latest start per task.
    pub latest_start: Vec<i64>,
    /// Longest path length (ms).
    pub length_ms: i64,
}

impl DependencyTimes {
    /// Slack of task `i` (ms, never negative).
    pub fn slack(&self, i: usize) -> i64 {
        (self.latest_start[i] - self.earliest_start[i]).max(0)
    }
}

/// Classic forward/backward CPM over dependency links.
///
/// With `per_project`, each task's backward pass starts from the end of
/// its own project instead of the end of everything.
pub fn dependency_times(tasks: &[Task], per_project: bool) -> Result<DependencyTimes, EngineError> {
    let order = topological_order(tasks)?;
    let index = id_index(tasks);
    let n = tasks.len();

    let mut successors: Vec<Vec<(usize, &Dependency)>> = vec![Vec::new(); n];
    let mut earliest_start = vec![0i64; n];
    for &t in &order {
        let d = tasks[t].duration_ms;
        let mut es = 0i64;
        for dep in &tasks[t].dependencies {
            if let Some(&p) = index.get(dep.predecessor_id.as_str()) {
                let ps = earliest_start[p];
                es = es.max(dep.earliest_successor_start(ps, ps + tasks[p].duration_ms, d));
                successors[p].push((t, dep));
            }
        }
        earliest_start[t] = es;
    }

    let mut project_end: HashMap<&str, i64> = HashMap::new();
    let mut length_ms = 0i64;
    for (t, task) in tasks.iter().enumerate() {
        let ef = earliest_start[t] + task.duration_ms;
        length_ms = length_ms.max(ef);
        let end = project_end.entry(task.project_id.as_str()).or_insert(ef);
        *end = (*end).max(ef);
    }

    let mut latest_start = vec![0i64; n];
    let mut latest_finish = vec![0i64; n];
    for &t in order.iter().rev() {
        let d = tasks[t].duration_ms;
        let mut lf = if per_project {
            project_end
                .get(tasks[t].project_id.as_str())
                .copied()
                .unwrap_or(length_ms)
        } else {
            length_ms
        };
        for (s, dep) in &successors[t] {
            lf = lf.min(dep.latest_predecessor_finish(latest_start[*s], latest_finish[*s], d));
        }
        latest_finish[t] = lf;
        latest_start[t] = lf - d;
    }

    Ok(DependencyTimes {
        earliest_start,
        latest_start,
        length_ms,
    })
}

/// Slack per task id, measured against each task's own project end.
pub fn dependency_slack(tasks: &[Task]) -> Result<HashMap<String, i64>, EngineError> {
    let times = dependency_times(tasks, true)?;
    Ok(tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), times.slack(i)))
        .collect())
}

fn id_index(tasks: &[Task]) -> HashMap<&str, usize> {
    tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Booking {
    start_ms: i64,
    end_ms: i64,
    percent: u32,
    task: Option<usize>,
}

/// Serial schedule generator with CPM slack analysis.
///
/// # Example
///
/// ```
/// use u_resource_optim::models::{OptimizationRequest, Resource, Task, DAY_MS};
/// use u_resource_optim::scheduler::{Assignment, CriticalPathScheduler, PlanningContext};
///
/// let tasks = vec![
///     Task::new("A", 2 * DAY_MS),
///     Task::new("B", DAY_MS).depends_on("A"),
/// ];
/// let resources = vec![Resource::worker("W1")];
/// let request = OptimizationRequest::new("R1", 0, 10 * DAY_MS);
/// let ctx = PlanningContext::new(tasks, resources, &[], &request).unwrap();
///
/// let plan = CriticalPathScheduler::new().schedule(&ctx, &[Assignment::to(0), Assignment::to(0)]);
/// assert_eq!(plan.total_duration_ms, 3 * DAY_MS);
/// assert_eq!(plan.critical_path, vec!["A", "B"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CriticalPathScheduler;

impl CriticalPathScheduler {
    /// Creates a scheduler.
    pub fn new() -> Self {
        Self
    }

    /// Decodes `assignments` (one per task, in snapshot order) into a plan.
    ///
    /// A task whose resource cannot host it anywhere (capacity or
    /// availability) is kept in the plan at its ready time and listed as
    /// unresourced. Missing assignments count as unresourced.
    pub fn schedule(&self, ctx: &PlanningContext, assignments: &[Assignment]) -> SchedulingPlan {
        let n = ctx.task_count();
        let cap = ctx.capacity_percent();
        let overtime = ctx.constraints.allow_overtime;

        let mut start = vec![0i64; n];
        let mut end = vec![0i64; n];
        let mut resource_of: Vec<Option<usize>> = vec![None; n];
        // Later bookings each task must finish before.
        let mut resource_successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut bookings: Vec<Vec<Booking>> = ctx
            .background
            .iter()
            .map(|allocs| {
                allocs
                    .iter()
                    .map(|a| Booking {
                        start_ms: a.start_ms,
                        end_ms: a.end_ms,
                        percent: u32::from(a.percent),
                        task: None,
                    })
                    .collect()
            })
            .collect();

        // Forward pass
        for &t in &ctx.order {
            let task = &ctx.tasks[t];
            let d = task.duration_ms;
            let percent = u32::from(task.allocation_percent);
            let gene = assignments.get(t).copied().unwrap_or_default();
            let ready = ctx.predecessors[t]
                .iter()
                .map(|(p, dep)| dep.earliest_successor_start(start[*p], end[*p], d))
                .fold(ctx.horizon.start_ms, i64::max)
                + gene.delay_ms.max(0);

            let placed = gene
                .resource
                .filter(|r| *r < ctx.resources.len())
                .and_then(|r| {
                    place(&ctx.resources[r], &bookings[r], ready, d, percent, cap, overtime)
                        .map(|s| (r, s))
                });

            match placed {
                Some((r, s)) => {
                    start[t] = s;
                    end[t] = s + d;
                    resource_of[t] = Some(r);
                    if !overtime {
                        for b in &bookings[r] {
                            if let Some(prev) = b.task {
                                if b.end_ms <= s && b.percent + percent > cap {
                                    resource_successors[prev].push(t);
                                }
                            }
                        }
                    }
                    bookings[r].push(Booking {
                        start_ms: s,
                        end_ms: s + d,
                        percent,
                        task: Some(t),
                    });
                }
                None => {
                    start[t] = ready;
                    end[t] = ready + d;
                }
            }
        }

        let project_start = ctx.horizon.start_ms;
        let project_end = end.iter().copied().fold(project_start, i64::max);

        // Backward pass
        let mut latest_start = vec![0i64; n];
        let mut latest_finish = vec![0i64; n];
        for &t in ctx.order.iter().rev() {
            let d = ctx.tasks[t].duration_ms;
            let mut lf = project_end;
            for (s, dep) in &ctx.successors[t] {
                lf = lf.min(dep.latest_predecessor_finish(latest_start[*s], latest_finish[*s], d));
            }
            for &u in &resource_successors[t] {
                lf = lf.min(latest_start[u]);
            }
            latest_finish[t] = lf;
            latest_start[t] = lf - d;
        }

        let mut rank = vec![0usize; n];
        for (pos, &t) in ctx.order.iter().enumerate() {
            rank[t] = pos;
        }
        let slack: Vec<i64> = (0..n).map(|t| (latest_start[t] - start[t]).max(0)).collect();

        // Walk back from the last zero-slack finish through predecessors
        // that pin each start.
        let mut resource_predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (p, succs) in resource_successors.iter().enumerate() {
            for &u in succs {
                resource_predecessors[u].push(p);
            }
        }
        let chain_key = |t: usize| (end[t], start[t], Reverse(rank[t]));
        let mut critical: Vec<usize> = Vec::new();
        let mut current = (0..n).filter(|&t| slack[t] == 0).max_by_key(|&t| chain_key(t));
        while let Some(t) = current {
            critical.push(t);
            let d = ctx.tasks[t].duration_ms;
            let by_dependency = ctx.predecessors[t]
                .iter()
                .filter(|(p, dep)| dep.earliest_successor_start(start[*p], end[*p], d) == start[t])
                .map(|(p, _)| *p);
            let by_resource = resource_predecessors[t]
                .iter()
                .copied()
                .filter(|&p| end[p] == start[t]);
            current = by_dependency
                .chain(by_resource)
                .filter(|&p| slack[p] == 0 && !critical.contains(&p))
                .max_by_key(|&p| chain_key(p));
        }
        critical.reverse();

        let mut plan = SchedulingPlan {
            project_start_ms: project_start,
            project_end_ms: project_end,
            total_duration_ms: project_end - project_start,
            critical_path: critical.iter().map(|&t| ctx.tasks[t].id.clone()).collect(),
            ..Default::default()
        };
        for &t in &ctx.order {
            let task = &ctx.tasks[t];
            let resource = resource_of[t].map(|r| &ctx.resources[r]);
            plan.tasks.push(ScheduledTask {
                task_id: task.id.clone(),
                resource_id: resource.map(|r| r.id.clone()),
                start_ms: start[t],
                end_ms: end[t],
                latest_start_ms: latest_start[t],
                latest_finish_ms: latest_finish[t],
                slack_ms: slack[t],
                is_critical: slack[t] == 0,
            });
            match resource {
                Some(r) => {
                    let cost = r.cost_for(task.duration_ms, task.allocation_percent);
                    plan.total_cost += cost;
                    plan.allocations.push(
                        Allocation::new(&r.id, &task.id, start[t], end[t])
                            .with_percent(task.allocation_percent)
                            .with_cost(cost),
                    );
                }
                None => plan.unresourced_tasks.push(task.id.clone()),
            }
        }
        plan
    }
}

/// Earliest start `>= ready` where `resource` is available for `duration`
/// and its load stays within `cap`.
fn place(
    resource: &Resource,
    bookings: &[Booking],
    ready: i64,
    duration: i64,
    percent: u32,
    cap: u32,
    overtime: bool,
) -> Option<i64> {
    let mut from = ready;
    // Each retry jumps past at least one booking's end.
    for _ in 0..=bookings.len() {
        let start = resource.earliest_fit(from, duration)?;
        if overtime {
            return Some(start);
        }
        let end = start + duration;
        let overlapping: Vec<&Booking> = bookings
            .iter()
            .filter(|b| b.start_ms < end && b.end_ms > start)
            .collect();
        if peak_percent(&overlapping, start, end) + percent <= cap {
            return Some(start);
        }
        from = overlapping.iter().map(|b| b.end_ms).min()?;
    }
    None
}

fn peak_percent(bookings: &[&Booking], start: i64, end: i64) -> u32 {
    let mut events: Vec<(i64, i64)> = Vec::with_capacity(bookings.len() * 2);
    for b in bookings {
        let s = b.start_ms.max(start);
        let e = b.end_ms.min(end);
        if e > s {
            events.push((s, i64::from(b.percent)));
            events.push((e, -i64::from(b.percent)));
        }
    }
    events.sort_unstable();
    let mut current = 0i64;
    let mut peak = 0i64;
    for (_, delta) in events {
        current += delta;
        peak = peak.max(current);
    }
    u32::try_from(peak).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DependencyType, OptimizationRequest, DAY_MS, HOUR_MS};

    fn ctx(tasks: Vec<Task>, resources: Vec<Resource>) -> PlanningContext {
        let request = OptimizationRequest::new("R1", 0, 30 * DAY_MS);
        PlanningContext::new(tasks, resources, &[], &request).unwrap()
    }

    fn all_to(resource: usize, n: usize) -> Vec<Assignment> {
        vec![Assignment::to(resource); n]
    }

    #[test]
    fn test_topological_order_stable() {
        let tasks = vec![
            Task::new("C", 1).depends_on("A"),
            Task::new("A", 1),
            Task::new("B", 1),
        ];
        assert_eq!(topological_order(&tasks).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn test_topological_order_cycle() {
        let tasks = vec![
            Task::new("A", 1).depends_on("C"),
            Task::new("B", 1).depends_on("A"),
            Task::new("C", 1).depends_on("B"),
        ];
        let err = topological_order(&tasks).unwrap_err();
        assert_eq!(
            err,
            EngineError::CyclicDependency {
                task_id: "A".into()
            }
        );
    }

    #[test]
    fn test_chain_on_single_resource() {
        // A(2d) → B(3d) → C(1d)
        let tasks = vec![
            Task::new("A", 2 * DAY_MS),
            Task::new("B", 3 * DAY_MS).depends_on("A"),
            Task::new("C", DAY_MS).depends_on("B"),
        ];
        let c = ctx(tasks, vec![Resource::worker("W1")]);
        let plan = CriticalPathScheduler::new().schedule(&c, &all_to(0, 3));

        assert_eq!(plan.critical_path, vec!["A", "B", "C"]);
        assert_eq!(plan.total_duration_ms, 6 * DAY_MS);
        assert!(plan.tasks.iter().all(|t| t.slack_ms == 0 && t.is_critical));
        assert_eq!(plan.allocations.len(), 3);
        assert!(plan.is_fully_resourced());
    }

    #[test]
    fn test_parallel_branch_has_slack() {
        // A(2d) → C(1d); B(1d) → C
        let tasks = vec![
            Task::new("A", 2 * DAY_MS),
            Task::new("B", DAY_MS),
            Task::new("C", DAY_MS).depends_on("A").depends_on("B"),
        ];
        let resources = vec![Resource::worker("W1"), Resource::worker("W2")];
        let c = ctx(tasks, resources);
        let genes = vec![Assignment::to(0), Assignment::to(1), Assignment::to(0)];
        let plan = CriticalPathScheduler::new().schedule(&c, &genes);

        assert_eq!(plan.total_duration_ms, 3 * DAY_MS);
        assert_eq!(plan.critical_path, vec!["A", "C"]);
        let b = plan.task("B").unwrap();
        assert_eq!(b.slack_ms, DAY_MS);
        assert!(!b.is_critical);
    }

    #[test]
    fn test_critical_path_is_one_chain() {
        // A(1d) → C(1d); B(1d) → C, both branches tight
        let tasks = vec![
            Task::new("A", DAY_MS),
            Task::new("B", DAY_MS),
            Task::new("C", DAY_MS).depends_on("A").depends_on("B"),
        ];
        let resources = vec![Resource::worker("W1"), Resource::worker("W2")];
        let c = ctx(tasks, resources);
        let genes = vec![Assignment::to(0), Assignment::to(1), Assignment::to(0)];
        let plan = CriticalPathScheduler::new().schedule(&c, &genes);

        assert_eq!(plan.critical_path, vec!["A", "C"]);
        assert!(plan.tasks.iter().all(|t| t.is_critical));
        for pair in plan.critical_path.windows(2) {
            let (prev, next) = (plan.task(&pair[0]).unwrap(), plan.task(&pair[1]).unwrap());
            assert_eq!(prev.end_ms, next.start_ms);
        }
    }

    #[test]
    fn test_critical_chain_skips_early_finishers() {
        // X(3d) alone on W2 ends first; the chain is the W1 pair
        let tasks = vec![
            Task::new("A", 2 * DAY_MS),
            Task::new("B", 2 * DAY_MS),
            Task::new("X", 3 * DAY_MS),
        ];
        let resources = vec![Resource::worker("W1"), Resource::worker("W2")];
        let c = ctx(tasks, resources);
        let genes = vec![Assignment::to(0), Assignment::to(0), Assignment::to(1)];
        let plan = CriticalPathScheduler::new().schedule(&c, &genes);

        assert_eq!(plan.total_duration_ms, 4 * DAY_MS);
        assert_eq!(plan.critical_path, vec!["A", "B"]);
        assert_eq!(plan.task("X").unwrap().slack_ms, DAY_MS);
    }

    #[test]
    fn test_shared_resource_serializes() {
        let tasks = vec![Task::new("A", DAY_MS), Task::new("B", DAY_MS)];
        let c = ctx(tasks, vec![Resource::worker("W1")]);
        let plan = CriticalPathScheduler::new().schedule(&c, &all_to(0, 2));

        assert_eq!(plan.task("A").unwrap().start_ms, 0);
        assert_eq!(plan.task("B").unwrap().start_ms, DAY_MS);
        assert_eq!(plan.total_duration_ms, 2 * DAY_MS);
        // The resource link makes A critical too.
        assert_eq!(plan.critical_path, vec!["A", "B"]);
    }

    #[test]
    fn test_partial_allocations_share_resource() {
        let tasks = vec![
            Task::new("A", DAY_MS).with_allocation_percent(50),
            Task::new("B", DAY_MS).with_allocation_percent(50),
        ];
        let c = ctx(tasks, vec![Resource::worker("W1")]);
        let plan = CriticalPathScheduler::new().schedule(&c, &all_to(0, 2));
        assert_eq!(plan.task("B").unwrap().start_ms, 0);
        assert_eq!(plan.total_duration_ms, DAY_MS);
    }

    #[test]
    fn test_overtime_allows_overlap() {
        let tasks = vec![Task::new("A", DAY_MS), Task::new("B", DAY_MS)];
        let mut request = OptimizationRequest::new("R1", 0, 30 * DAY_MS);
        request.constraints.allow_overtime = true;
        let c = PlanningContext::new(tasks, vec![Resource::worker("W1")], &[], &request).unwrap();
        let plan = CriticalPathScheduler::new().schedule(&c, &all_to(0, 2));
        assert_eq!(plan.task("B").unwrap().start_ms, 0);
    }

    #[test]
    fn test_availability_window_respected() {
        let tasks = vec![Task::new("A", 4 * HOUR_MS)];
        let resources = vec![Resource::worker("W1")
            .with_availability(0, 2 * HOUR_MS)
            .with_availability(DAY_MS, DAY_MS + 8 * HOUR_MS)];
        let c = ctx(tasks, resources);
        let plan = CriticalPathScheduler::new().schedule(&c, &all_to(0, 1));
        assert_eq!(plan.task("A").unwrap().start_ms, DAY_MS);
    }

    #[test]
    fn test_unplaceable_task_is_unresourced() {
        let tasks = vec![Task::new("A", 4 * HOUR_MS)];
        let resources = vec![Resource::worker("W1").with_availability(0, HOUR_MS)];
        let c = ctx(tasks, resources);
        let plan = CriticalPathScheduler::new().schedule(&c, &all_to(0, 1));
        assert_eq!(plan.unresourced_tasks, vec!["A"]);
        assert!(plan.allocations.is_empty());
        assert_eq!(plan.task("A").unwrap().resource_id, None);
    }

    #[test]
    fn test_background_load_blocks_capacity() {
        let tasks = vec![Task::new("A", DAY_MS)];
        let request = OptimizationRequest::new("R1", 0, 30 * DAY_MS);
        let committed = vec![Allocation::new("W1", "OTHER", 0, 2 * DAY_MS)];
        let c = PlanningContext::new(tasks, vec![Resource::worker("W1")], &committed, &request)
            .unwrap();
        let plan = CriticalPathScheduler::new().schedule(&c, &all_to(0, 1));
        assert_eq!(plan.task("A").unwrap().start_ms, 2 * DAY_MS);
    }

    #[test]
    fn test_dependency_types_and_delay() {
        let tasks = vec![
            Task::new("A", 4 * HOUR_MS),
            Task::new("B", 2 * HOUR_MS).depends_on_with("A", DependencyType::StartToStart, HOUR_MS),
            Task::new("C", 2 * HOUR_MS).depends_on_with("A", DependencyType::FinishToFinish, 0),
        ];
        let resources = vec![
            Resource::worker("W1"),
            Resource::worker("W2"),
            Resource::worker("W3"),
        ];
        let c = ctx(tasks, resources);
        let genes = vec![
            Assignment::to(0),
            Assignment::to(1).with_delay(HOUR_MS),
            Assignment::to(2),
        ];
        let plan = CriticalPathScheduler::new().schedule(&c, &genes);
        assert_eq!(plan.task("B").unwrap().start_ms, 2 * HOUR_MS);
        assert_eq!(plan.task("C").unwrap().end_ms, 4 * HOUR_MS);
    }

    #[test]
    fn test_cost_accumulates() {
        let tasks = vec![Task::new("A", 2 * HOUR_MS)];
        let c = ctx(tasks, vec![Resource::worker("W1").with_cost_rate(40.0)]);
        let plan = CriticalPathScheduler::new().schedule(&c, &all_to(0, 1));
        assert!((plan.total_cost - 80.0).abs() < 1e-9);
        assert!((plan.allocations[0].estimated_cost - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_dependency_slack_per_project() {
        let tasks = vec![
            Task::new("A", 2 * DAY_MS).with_project("P1"),
            Task::new("B", DAY_MS).with_project("P1"),
            Task::new("X", 5 * DAY_MS).with_project("P2"),
        ];
        let slack = dependency_slack(&tasks).unwrap();
        assert_eq!(slack["A"], 0);
        assert_eq!(slack["B"], DAY_MS);
        assert_eq!(slack["X"], 0);

        let global = dependency_times(&tasks, false).unwrap();
        assert_eq!(global.length_ms, 5 * DAY_MS);
        assert_eq!(global.slack(0), 3 * DAY_MS);
    }
}
