//! Snapshot access.
//!
//! The engine reads tasks, resources, committed allocations, and
//! utilization history through [`SnapshotProvider`]; it never writes back.
//! [`InMemorySnapshot`] serves all four from owned vectors.

use crate::error::EngineError;
use crate::forecast::UtilizationSample;
use crate::models::{Allocation, Resource, ResourceType, Scope, Task, TimeWindow};

/// Read-only source of planning data.
pub trait SnapshotProvider: Sync {
    /// Tasks in `scope`.
    fn tasks(&self, scope: &Scope) -> Result<Vec<Task>, EngineError>;

    /// Resources in `scope`.
    fn resources(&self, scope: &Scope) -> Result<Vec<Resource>, EngineError>;

    /// Committed allocations on `resource_ids` overlapping `horizon`.
    fn committed_allocations(
        &self,
        resource_ids: &[String],
        horizon: &TimeWindow,
    ) -> Result<Vec<Allocation>, EngineError>;

    /// Historical demand samples for one resource type.
    fn utilization_history(
        &self,
        resource_type: ResourceType,
    ) -> Result<Vec<UtilizationSample>, EngineError>;

    /// Every task of the projects that own `task_ids`, plus those tasks.
    ///
    /// Ids the snapshot does not know are skipped. Empty input yields an
    /// empty list, not the whole snapshot.
    fn projects_of(&self, task_ids: &[String]) -> Result<Vec<Task>, EngineError> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let scope = Scope {
            task_ids: task_ids.to_vec(),
            ..Default::default()
        };
        let mut project_ids: Vec<String> =
            self.tasks(&scope)?.into_iter().map(|t| t.project_id).collect();
        project_ids.sort();
        project_ids.dedup();
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.tasks(&Scope {
            project_ids,
            ..scope
        })
    }
}

/// Snapshot held in memory.
///
/// Scope filtering: a task is in scope when `task_ids` lists it or
/// `project_ids` lists its project; with both lists empty every task is.
/// A resource is in scope when `resource_ids` lists it or is empty.
///
/// # Example
///
/// ```
/// use u_resource_optim::models::{Resource, Scope, Task, DAY_MS};
/// use u_resource_optim::snapshot::{InMemorySnapshot, SnapshotProvider};
///
/// let snapshot = InMemorySnapshot::new()
///     .with_task(Task::new("A", DAY_MS).with_project("P1"))
///     .with_task(Task::new("B", DAY_MS).with_project("P2"))
///     .with_resource(Resource::worker("W1"));
///
/// let scope = Scope { project_ids: vec!["P1".into()], ..Default::default() };
/// let tasks = snapshot.tasks(&scope).unwrap();
/// assert_eq!(tasks.len(), 1);
/// assert_eq!(tasks[0].id, "A");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshot {
    tasks: Vec<Task>,
    resources: Vec<Resource>,
    allocations: Vec<Allocation>,
    history: Vec<UtilizationSample>,
}

impl InMemorySnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task.
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Adds tasks.
    pub fn with_tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Adds a resource.
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Adds resources.
    pub fn with_resources(mut self, resources: impl IntoIterator<Item = Resource>) -> Self {
        self.resources.extend(resources);
        self
    }

    /// Adds a committed allocation.
    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocations.push(allocation);
        self
    }

    /// Adds utilization samples.
    pub fn with_history(mut self, samples: impl IntoIterator<Item = UtilizationSample>) -> Self {
        self.history.extend(samples);
        self
    }
}

impl SnapshotProvider for InMemorySnapshot {
    fn tasks(&self, scope: &Scope) -> Result<Vec<Task>, EngineError> {
        let everything = scope.task_ids.is_empty() && scope.project_ids.is_empty();
        Ok(self
            .tasks
            .iter()
            .filter(|t| {
                everything
                    || scope.task_ids.contains(&t.id)
                    || scope.project_ids.contains(&t.project_id)
            })
            .cloned()
            .collect())
    }

    fn resources(&self, scope: &Scope) -> Result<Vec<Resource>, EngineError> {
        Ok(self
            .resources
            .iter()
            .filter(|r| scope.resource_ids.is_empty() || scope.resource_ids.contains(&r.id))
            .cloned()
            .collect())
    }

    fn committed_allocations(
        &self,
        resource_ids: &[String],
        horizon: &TimeWindow,
    ) -> Result<Vec<Allocation>, EngineError> {
        Ok(self
            .allocations
            .iter()
            .filter(|a| resource_ids.contains(&a.resource_id) && a.window().overlaps(horizon))
            .cloned()
            .collect())
    }

    fn utilization_history(
        &self,
        resource_type: ResourceType,
    ) -> Result<Vec<UtilizationSample>, EngineError> {
        Ok(self
            .history
            .iter()
            .filter(|s| s.resource_type == resource_type)
            .cloned()
            .collect())
    }
}
