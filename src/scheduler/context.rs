//! Planning context for one optimization request.
//!
//! Indexes the snapshot once so the decoder, the GA problem, and the
//! ranker can work on positions instead of string ids.

use std::collections::{BTreeMap, HashMap};

use super::cpm::{dependency_times, topological_order};
use crate::error::EngineError;
use crate::models::{
    Allocation, Constraints, Dependency, Objective, ObjectiveWeights, OptimizationRequest,
    Preferences, Resource, Task, TimeWindow,
};

/// Read-only view of the tasks, resources, and rules being planned.
///
/// All times are in milliseconds relative to the scheduling epoch (t=0).
#[derive(Debug, Clone)]
pub struct PlanningContext {
    /// Tasks in scope, in snapshot order.
    pub tasks: Vec<Task>,
    /// Resources in scope, in snapshot order.
    pub resources: Vec<Resource>,
    /// Planning horizon.
    pub horizon: TimeWindow,
    /// Optimization goal.
    pub objective: Objective,
    /// Hard rules.
    pub constraints: Constraints,
    /// Soft preferences.
    pub preferences: Preferences,
    /// Normalized cost/time/quality weights.
    pub weights: ObjectiveWeights,
    /// Placement order: topological, ties broken by snapshot order.
    pub order: Vec<usize>,
    /// Incoming links per task: (predecessor index, link).
    pub predecessors: Vec<Vec<(usize, Dependency)>>,
    /// Outgoing links per task: (successor index, link).
    pub successors: Vec<Vec<(usize, Dependency)>>,
    /// Resources able to work each task, in snapshot order.
    pub eligible: Vec<Vec<usize>>,
    /// Committed allocations of out-of-scope tasks, per resource.
    pub background: Vec<Vec<Allocation>>,
    /// Length of the dependency-only critical path (ms).
    pub dependency_length_ms: i64,
    task_index: HashMap<String, usize>,
    resource_index: HashMap<String, usize>,
}

impl PlanningContext {
    /// Builds the context.
    ///
    /// `committed` may include allocations of in-scope tasks; those are
    /// being re-planned and are ignored.
    ///
    /// # Errors
    /// [`EngineError::CyclicDependency`] if the dependency graph has a cycle,
    /// [`EngineError::InvalidRequest`] for links to unknown tasks.
    pub fn new(
        tasks: Vec<Task>,
        resources: Vec<Resource>,
        committed: &[Allocation],
        request: &OptimizationRequest,
    ) -> Result<Self, EngineError> {
        let order = topological_order(&tasks)?;
        let dependency_length_ms = dependency_times(&tasks, false)?.length_ms;

        let task_index: HashMap<String, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        let resource_index: HashMap<String, usize> = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        let mut predecessors = vec![Vec::new(); tasks.len()];
        let mut successors = vec![Vec::new(); tasks.len()];
        for (i, task) in tasks.iter().enumerate() {
            for dep in &task.dependencies {
                let p = *task_index.get(&dep.predecessor_id).ok_or_else(|| {
                    EngineError::InvalidRequest(format!(
                        "task '{}' references unknown predecessor '{}'",
                        task.id, dep.predecessor_id
                    ))
                })?;
                predecessors[i].push((p, dep.clone()));
                successors[p].push((i, dep.clone()));
            }
        }

        let constraints = request.constraints.clone();
        let eligible = tasks
            .iter()
            .map(|task| {
                resources
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| {
                        !constraints.excluded_resources.contains(&r.id)
                            && r.covers(&task.required_skills)
                    })
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        let mut background = vec![Vec::new(); resources.len()];
        for alloc in committed {
            if task_index.contains_key(&alloc.task_id) {
                continue;
            }
            if let Some(&r) = resource_index.get(&alloc.resource_id) {
                background[r].push(alloc.clone());
            }
        }

        Ok(Self {
            tasks,
            resources,
            horizon: request.horizon,
            objective: request.objective,
            weights: request.preferences.weights(),
            preferences: request.preferences.clone(),
            constraints,
            order,
            predecessors,
            successors,
            eligible,
            background,
            dependency_length_ms,
            task_index,
            resource_index,
        })
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Position of a task by id.
    pub fn task_position(&self, task_id: &str) -> Option<usize> {
        self.task_index.get(task_id).copied()
    }

    /// Position of a resource by id.
    pub fn resource_position(&self, resource_id: &str) -> Option<usize> {
        self.resource_index.get(resource_id).copied()
    }

    /// Per-resource capacity cap (percent).
    pub fn capacity_percent(&self) -> u32 {
        u32::from(self.constraints.max_allocation_percent)
    }

    /// Whether a resource may work a task.
    pub fn is_eligible(&self, task: usize, resource: usize) -> bool {
        self.eligible
            .get(task)
            .is_some_and(|e| e.contains(&resource))
    }

    /// Required skills no usable resource holds, with the tasks needing them.
    pub fn missing_skills(&self) -> BTreeMap<String, Vec<String>> {
        let mut missing: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for task in &self.tasks {
            for skill in &task.required_skills {
                let held = self.resources.iter().any(|r| {
                    !self.constraints.excluded_resources.contains(&r.id) && r.has_capability(skill)
                });
                if !held {
                    missing.entry(skill.clone()).or_default().push(task.id.clone());
                }
            }
        }
        missing
    }

    /// Tasks whose skills all have holders, but no single resource holds
    /// the full set.
    pub fn uncoverable_tasks(&self) -> Vec<String> {
        let missing = self.missing_skills();
        self.tasks
            .iter()
            .zip(&self.eligible)
            .filter(|(task, eligible)| {
                eligible.is_empty()
                    && !task.required_skills.iter().any(|s| missing.contains_key(s))
            })
            .map(|(task, _)| task.id.clone())
            .collect()
    }

    /// Capacity-time a resource offers inside the horizon (ms at 100%).
    pub fn capacity_in_horizon(&self, resource: usize) -> f64 {
        let r = &self.resources[resource];
        let available = if r.availability.is_empty() {
            self.horizon.duration_ms()
        } else {
            r.available_time_in(&self.horizon)
        };
        available as f64 * f64::from(self.constraints.max_allocation_percent) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DAY_MS, HOUR_MS};

    fn request() -> OptimizationRequest {
        OptimizationRequest::new("R1", 0, 10 * DAY_MS)
    }

    #[test]
    fn test_context_indexes() {
        let tasks = vec![
            Task::new("B", DAY_MS).depends_on("A").with_skill("paint"),
            Task::new("A", DAY_MS).with_skill("frame"),
        ];
        let resources = vec![
            Resource::worker("W1").with_capability("frame"),
            Resource::worker("W2").with_capability("paint"),
        ];
        let ctx = PlanningContext::new(tasks, resources, &[], &request()).unwrap();

        assert_eq!(ctx.order, vec![1, 0]);
        assert_eq!(ctx.task_position("A"), Some(1));
        assert_eq!(ctx.resource_position("W2"), Some(1));
        assert_eq!(ctx.eligible, vec![vec![1], vec![0]]);
        assert_eq!(ctx.predecessors[0].len(), 1);
        assert_eq!(ctx.successors[1][0].0, 0);
        assert_eq!(ctx.dependency_length_ms, 2 * DAY_MS);
        assert!(ctx.is_eligible(0, 1));
        assert!(!ctx.is_eligible(0, 0));
    }

    #[test]
    fn test_excluded_resources_not_eligible() {
        let tasks = vec![Task::new("A", HOUR_MS)];
        let resources = vec![Resource::worker("W1"), Resource::worker("W2")];
        let mut req = request();
        req.constraints.excluded_resources = vec!["W1".into()];
        let ctx = PlanningContext::new(tasks, resources, &[], &req).unwrap();
        assert_eq!(ctx.eligible[0], vec![1]);
    }

    #[test]
    fn test_background_excludes_in_scope_tasks() {
        let tasks = vec![Task::new("A", HOUR_MS)];
        let resources = vec![Resource::worker("W1")];
        let committed = vec![
            Allocation::new("W1", "A", 0, HOUR_MS),
            Allocation::new("W1", "OTHER", 0, HOUR_MS),
            Allocation::new("GHOST", "OTHER", 0, HOUR_MS),
        ];
        let ctx = PlanningContext::new(tasks, resources, &committed, &request()).unwrap();
        assert_eq!(ctx.background[0].len(), 1);
        assert_eq!(ctx.background[0][0].task_id, "OTHER");
    }

    #[test]
    fn test_missing_and_uncoverable_skills() {
        let tasks = vec![
            Task::new("A", HOUR_MS).with_skill("weld"),
            Task::new("B", HOUR_MS).with_skill("frame").with_skill("paint"),
        ];
        let resources = vec![
            Resource::worker("W1").with_capability("frame"),
            Resource::worker("W2").with_capability("paint"),
        ];
        let ctx = PlanningContext::new(tasks, resources, &[], &request()).unwrap();
        let missing = ctx.missing_skills();
        assert_eq!(missing.get("weld"), Some(&vec!["A".to_string()]));
        assert_eq!(ctx.uncoverable_tasks(), vec!["B".to_string()]);
    }

    #[test]
    fn test_cycle_rejected() {
        let tasks = vec![
            Task::new("A", HOUR_MS).depends_on("B"),
            Task::new("B", HOUR_MS).depends_on("A"),
        ];
        let err = PlanningContext::new(tasks, vec![], &[], &request()).unwrap_err();
        assert!(matches!(err, EngineError::CyclicDependency { .. }));
    }

    #[test]
    fn test_capacity_in_horizon() {
        let tasks = vec![Task::new("A", HOUR_MS)];
        let resources = vec![
            Resource::worker("W1"),
            Resource::worker("W2").with_availability(0, DAY_MS),
        ];
        let mut req = request();
        req.constraints.max_allocation_percent = 50;
        let ctx = PlanningContext::new(tasks, resources, &[], &req).unwrap();
        assert!((ctx.capacity_in_horizon(0) - 5.0 * DAY_MS as f64).abs() < 1e-6);
        assert!((ctx.capacity_in_horizon(1) - 0.5 * DAY_MS as f64).abs() < 1e-6);
    }
}
