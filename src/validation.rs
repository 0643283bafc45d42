//! Input validation for optimization snapshots.
//!
//! Checks structural integrity of tasks and resources before any search
//! runs. Detects:
//! - Duplicate IDs
//! - Non-positive task durations
//! - Self-dependencies and dependencies attached to the wrong task
//! - References to unknown predecessors
//! - Malformed availability windows
//! - Circular dependencies (DAG validation)
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use crate::models::{windows_well_formed, Resource, Task};
use std::collections::{HashMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Offending task or resource id.
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// Task duration is zero or negative.
    InvalidDuration,
    /// A dependency links a task to itself or sits on the wrong task.
    InvalidDependency,
    /// A dependency references a predecessor that doesn't exist.
    InvalidPredecessor,
    /// Availability windows overlap, are unordered, or are empty.
    InvalidAvailability,
    /// Dependency graph contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    /// Creates a validation error with no entity id.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: String::new(),
            message: message.into(),
        }
    }

    fn about(kind: ValidationErrorKind, entity_id: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: entity_id.to_string(),
            message: message.into(),
        }
    }
}

/// Validates the snapshot for one optimization request.
///
/// Checks:
/// 1. No duplicate task IDs
/// 2. No duplicate resource IDs
/// 3. Every task has a positive duration
/// 4. Dependencies are attached to their successor and are not self-links
/// 5. All predecessor references point to tasks in the snapshot
/// 6. Availability windows are ordered and non-overlapping
/// 7. No circular dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_snapshot(tasks: &[Task], resources: &[Resource]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut resource_ids = HashSet::new();
    for r in resources {
        if !resource_ids.insert(r.id.as_str()) {
            errors.push(ValidationError::about(
                ValidationErrorKind::DuplicateId,
                &r.id,
                format!("Duplicate resource ID: {}", r.id),
            ));
        }
        if !windows_well_formed(&r.availability) {
            errors.push(ValidationError::about(
                ValidationErrorKind::InvalidAvailability,
                &r.id,
                format!(
                    "Resource '{}' has overlapping, unordered, or empty availability windows",
                    r.id
                ),
            ));
        }
    }

    let mut task_ids = HashSet::new();
    for task in tasks {
        if !task_ids.insert(task.id.as_str()) {
            errors.push(ValidationError::about(
                ValidationErrorKind::DuplicateId,
                &task.id,
                format!("Duplicate task ID: {}", task.id),
            ));
        }
        if task.duration_ms <= 0 {
            errors.push(ValidationError::about(
                ValidationErrorKind::InvalidDuration,
                &task.id,
                format!("Task '{}' has duration {}", task.id, task.duration_ms),
            ));
        }
    }

    for task in tasks {
        for dep in &task.dependencies {
            if dep.predecessor_id == dep.successor_id {
                errors.push(ValidationError::about(
                    ValidationErrorKind::InvalidDependency,
                    &task.id,
                    format!("Task '{}' depends on itself", task.id),
                ));
            } else if dep.successor_id != task.id {
                errors.push(ValidationError::about(
                    ValidationErrorKind::InvalidDependency,
                    &task.id,
                    format!(
                        "Task '{}' carries a dependency whose successor is '{}'",
                        task.id, dep.successor_id
                    ),
                ));
            }
            if !task_ids.contains(dep.predecessor_id.as_str()) {
                errors.push(ValidationError::about(
                    ValidationErrorKind::InvalidPredecessor,
                    &task.id,
                    format!(
                        "Task '{}' references unknown predecessor '{}'",
                        task.id, dep.predecessor_id
                    ),
                ));
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(tasks) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the dependency graph using DFS.
///
/// Nodes are visited in input order so the reported task is deterministic.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
pub fn detect_cycles(tasks: &[Task]) -> Option<ValidationError> {
    // predecessor → successors
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in tasks {
        for dep in &task.dependencies {
            if dep.predecessor_id != task.id {
                adj.entry(dep.predecessor_id.as_str())
                    .or_default()
                    .push(task.id.as_str());
            }
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for task in tasks {
        let node = task.id.as_str();
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::about(
                ValidationErrorKind::CyclicDependency,
                node,
                format!("Circular dependency detected involving task '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}
