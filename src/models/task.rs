//! Task model.
//!
//! A task is one unit of project work: a fixed duration estimate, the
//! skills it requires, a complexity score, and the dependencies that tie
//! it to other tasks.

use serde::{Deserialize, Serialize};

use super::{Dependency, DependencyType};

/// A unit of project work.
///
/// # Time Representation
/// All times are in milliseconds relative to a scheduling epoch (t=0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Owning project.
    pub project_id: String,
    /// Duration estimate (ms). Must be positive.
    pub duration_ms: i64,
    /// Skills a resource must hold to work this task.
    pub required_skills: Vec<String>,
    /// Complexity score (1.0 = trivial, 10.0 = hardest).
    pub complexity: f64,
    /// Minimum allocation percentage the task needs from its resource.
    pub allocation_percent: u8,
    /// Scheduling priority (higher = more important).
    pub priority: i32,
    /// Latest completion time (ms). `None` = no deadline.
    pub deadline_ms: Option<i64>,
    /// Links where this task is the successor.
    pub dependencies: Vec<Dependency>,
}

impl Task {
    /// Creates a new task with the given ID and duration.
    pub fn new(id: impl Into<String>, duration_ms: i64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            project_id: String::new(),
            duration_ms,
            required_skills: Vec::new(),
            complexity: 1.0,
            allocation_percent: 100,
            priority: 0,
            deadline_ms: None,
            dependencies: Vec::new(),
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the owning project.
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    /// Adds a required skill.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.push(skill.into());
        self
    }

    /// Sets the complexity score (clamped to 1.0..=10.0).
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = complexity.clamp(1.0, 10.0);
        self
    }

    /// Sets the required allocation percentage (clamped to 1..=100).
    pub fn with_allocation_percent(mut self, percent: u8) -> Self {
        self.allocation_percent = percent.clamp(1, 100);
        self
    }

    /// Sets the scheduling priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the deadline (latest completion time in ms).
    pub fn with_deadline(mut self, deadline_ms: i64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    /// Adds a zero-lag finish-to-start dependency on `predecessor_id`.
    pub fn depends_on(self, predecessor_id: impl Into<String>) -> Self {
        self.depends_on_with(predecessor_id, DependencyType::FinishToStart, 0)
    }

    /// Adds a dependency of the given type and lag on `predecessor_id`.
    pub fn depends_on_with(
        mut self,
        predecessor_id: impl Into<String>,
        dependency_type: DependencyType,
        lag_ms: i64,
    ) -> Self {
        let dep = Dependency::new(predecessor_id, self.id.clone(), dependency_type, lag_ms);
        self.dependencies.push(dep);
        self
    }

    /// Whether this task has any predecessors.
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DAY_MS;

    #[test]
    fn test_task_builder() {
        let task = Task::new("T1", 2 * DAY_MS)
            .with_name("Pour foundation")
            .with_project("P1")
            .with_skill("concrete")
            .with_complexity(6.0)
            .with_allocation_percent(50)
            .with_priority(10)
            .with_deadline(10 * DAY_MS);

        assert_eq!(task.id, "T1");
        assert_eq!(task.name, "Pour foundation");
        assert_eq!(task.project_id, "P1");
        assert_eq!(task.duration_ms, 2 * DAY_MS);
        assert_eq!(task.required_skills, vec!["concrete".to_string()]);
        assert!((task.complexity - 6.0).abs() < 1e-10);
        assert_eq!(task.allocation_percent, 50);
        assert_eq!(task.priority, 10);
        assert_eq!(task.deadline_ms, Some(10 * DAY_MS));
        assert!(!task.has_dependencies());
    }

    #[test]
    fn test_depends_on_sets_successor() {
        let task = Task::new("B", 1_000)
            .depends_on("A")
            .depends_on_with("C", DependencyType::StartToStart, -500);

        assert_eq!(task.dependencies.len(), 2);
        assert_eq!(task.dependencies[0].predecessor_id, "A");
        assert_eq!(task.dependencies[0].successor_id, "B");
        assert_eq!(task.dependencies[1].dependency_type, DependencyType::StartToStart);
        assert_eq!(task.dependencies[1].lag_ms, -500);
    }

    #[test]
    fn test_clamping() {
        let task = Task::new("T", 1)
            .with_complexity(42.0)
            .with_allocation_percent(0);
        assert!((task.complexity - 10.0).abs() < 1e-10);
        assert_eq!(task.allocation_percent, 1);
    }
}
