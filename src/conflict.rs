//! Conflict detection over committed allocations.
//!
//! Scans the allocations already booked against each resource and reports
//! where they break the allocation invariant, before any optimization runs.
//!
//! # Conflict kinds
//!
//! - **OverAllocation**: summed percentages on one resource exceed its
//!   capacity over some window. Contiguous over-capacity stretches are
//!   reported as one conflict.
//! - **OutsideAvailability**: an allocation runs (partly) outside the
//!   resource's availability windows.
//!
//! # Severity
//!
//! Both kinds are graded by how far capacity is exceeded, in percent:
//!
//! | Excess | Severity |
//! |--------|----------|
//! | ≤ 10 | Low |
//! | ≤ 25 | Medium |
//! | ≤ 50 | High |
//! | > 50 | Critical |
//!
//! # Reference
//! de Berg et al. (2008), "Computational Geometry", Ch. 2 (sweep line)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Allocation, Resource, Task, TimeWindow};
use crate::scheduler::dependency_slack;

/// What kind of clash a conflict is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Capacity exceeded.
    OverAllocation,
    /// Booked while the resource is unavailable.
    OutsideAvailability,
}

/// Conflict severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ConflictSeverity {
    /// Grades an excess over capacity (percent).
    pub fn from_excess(excess_percent: f64) -> Self {
        if excess_percent <= 10.0 {
            Self::Low
        } else if excess_percent <= 25.0 {
            Self::Medium
        } else if excess_percent <= 50.0 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

/// A detected violation of the allocation invariant.
///
/// Always derived from allocations, never stored as a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Affected resource.
    pub resource_id: String,
    /// Kind of clash.
    pub kind: ConflictKind,
    /// When the clash happens.
    pub window: TimeWindow,
    /// Allocations involved.
    pub allocations: Vec<Allocation>,
    /// Highest summed percentage inside the window.
    pub peak_percent: u32,
    /// How far capacity is exceeded (percent of capacity).
    pub excess_percent: f64,
    /// Grade of `excess_percent`.
    pub severity: ConflictSeverity,
    /// Whether an involved task has slack in its own project.
    pub can_reschedule: bool,
}

impl Conflict {
    /// Task ids of the involved allocations.
    pub fn task_ids(&self) -> Vec<&str> {
        self.allocations.iter().map(|a| a.task_id.as_str()).collect()
    }
}

/// Sweep-line conflict detector.
///
/// # Example
///
/// ```
/// use u_resource_optim::conflict::{ConflictDetector, ConflictKind};
/// use u_resource_optim::models::{Allocation, Resource, TimeWindow, HOUR_MS};
///
/// let resources = vec![Resource::worker("W1")];
/// let allocations = vec![
///     Allocation::new("W1", "T1", 0, 4 * HOUR_MS).with_percent(80),
///     Allocation::new("W1", "T2", 2 * HOUR_MS, 6 * HOUR_MS).with_percent(50),
/// ];
/// let conflicts = ConflictDetector::new().detect(
///     &resources,
///     &allocations,
///     &[],
///     &TimeWindow::new(0, 24 * HOUR_MS),
/// );
/// assert_eq!(conflicts.len(), 1);
/// assert_eq!(conflicts[0].kind, ConflictKind::OverAllocation);
/// assert_eq!(conflicts[0].peak_percent, 130);
/// assert_eq!(conflicts[0].window, TimeWindow::new(2 * HOUR_MS, 4 * HOUR_MS));
/// ```
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    capacity_percent: u32,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self {
            capacity_percent: 100,
        }
    }
}

impl ConflictDetector {
    /// Creates a detector with 100% capacity per resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-resource capacity (percent, at least 1).
    pub fn with_capacity(mut self, capacity_percent: u32) -> Self {
        self.capacity_percent = capacity_percent.max(1);
        self
    }

    /// Finds conflicts among `allocations` inside `horizon`.
    ///
    /// Allocations on resources not in `resources` are ignored. `tasks`
    /// supplies dependency slack for `can_reschedule`; tasks it does not
    /// contain count as having none. Results are ordered by resource (in
    /// input order), then window start.
    pub fn detect(
        &self,
        resources: &[Resource],
        allocations: &[Allocation],
        tasks: &[Task],
        horizon: &TimeWindow,
    ) -> Vec<Conflict> {
        let slack = dependency_slack(tasks).unwrap_or_default();
        let has_slack = |allocs: &[Allocation]| {
            allocs
                .iter()
                .any(|a| slack.get(&a.task_id).is_some_and(|s| *s > 0))
        };

        let mut by_resource: BTreeMap<&str, Vec<&Allocation>> = BTreeMap::new();
        for alloc in allocations {
            if alloc.window().overlaps(horizon) {
                by_resource.entry(alloc.resource_id.as_str()).or_default().push(alloc);
            }
        }

        let mut conflicts = Vec::new();
        for resource in resources {
            let Some(allocs) = by_resource.get(resource.id.as_str()) else {
                continue;
            };
            let mut found = Vec::new();

            for (window, peak) in self.over_capacity(allocs) {
                let involved: Vec<Allocation> = allocs
                    .iter()
                    .filter(|a| a.window().overlaps(&window))
                    .map(|a| (*a).clone())
                    .collect();
                let excess = f64::from(peak - self.capacity_percent) * 100.0
                    / f64::from(self.capacity_percent);
                found.push(Conflict {
                    resource_id: resource.id.clone(),
                    kind: ConflictKind::OverAllocation,
                    window,
                    can_reschedule: has_slack(&involved),
                    allocations: involved,
                    peak_percent: peak,
                    excess_percent: excess,
                    severity: ConflictSeverity::from_excess(excess),
                });
            }

            if !resource.availability.is_empty() {
                for alloc in allocs {
                    let window = alloc.window();
                    let duration = window.duration_ms();
                    let outside = duration - resource.available_time_in(&window);
                    if duration <= 0 || outside <= 0 {
                        continue;
                    }
                    let excess = f64::from(alloc.percent) * outside as f64 / duration as f64;
                    let involved = vec![(*alloc).clone()];
                    found.push(Conflict {
                        resource_id: resource.id.clone(),
                        kind: ConflictKind::OutsideAvailability,
                        window,
                        can_reschedule: has_slack(&involved),
                        allocations: involved,
                        peak_percent: u32::from(alloc.percent),
                        excess_percent: excess,
                        severity: ConflictSeverity::from_excess(excess),
                    });
                }
            }

            found.sort_by_key(|c| (c.window.start_ms, c.window.end_ms));
            conflicts.extend(found);
        }
        conflicts
    }

    /// Maximal windows where the summed load exceeds capacity, with the
    /// peak load inside each.
    fn over_capacity(&self, allocs: &[&Allocation]) -> Vec<(TimeWindow, u32)> {
        let mut events: Vec<(i64, i64)> = Vec::with_capacity(allocs.len() * 2);
        for a in allocs {
            if a.end_ms > a.start_ms {
                events.push((a.start_ms, i64::from(a.percent)));
                events.push((a.end_ms, -i64::from(a.percent)));
            }
        }
        events.sort_unstable();

        let cap = i64::from(self.capacity_percent);
        let mut windows: Vec<(TimeWindow, u32)> = Vec::new();
        let mut load = 0i64;
        let mut i = 0;
        while i < events.len() {
            let time = events[i].0;
            while i < events.len() && events[i].0 == time {
                load += events[i].1;
                i += 1;
            }
            let Some(&(next, _)) = events.get(i) else {
                break;
            };
            if load <= cap {
                continue;
            }
            let peak = u32::try_from(load).unwrap_or(u32::MAX);
            match windows.last_mut() {
                // Contiguous with the previous over-capacity segment
                Some((w, p)) if w.end_ms == time => {
                    w.end_ms = next;
                    *p = (*p).max(peak);
                }
                _ => windows.push((TimeWindow::new(time, next), peak)),
            }
        }
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DAY_MS, HOUR_MS};

    fn horizon() -> TimeWindow {
        TimeWindow::new(0, 10 * DAY_MS)
    }

    #[test]
    fn test_severity_scale() {
        assert_eq!(ConflictSeverity::from_excess(5.0), ConflictSeverity::Low);
        assert_eq!(ConflictSeverity::from_excess(10.0), ConflictSeverity::Low);
        assert_eq!(ConflictSeverity::from_excess(20.0), ConflictSeverity::Medium);
        assert_eq!(ConflictSeverity::from_excess(50.0), ConflictSeverity::High);
        assert_eq!(ConflictSeverity::from_excess(50.1), ConflictSeverity::Critical);
    }

    #[test]
    fn test_no_conflict_when_within_capacity() {
        let resources = vec![Resource::worker("W1")];
        let allocations = vec![
            Allocation::new("W1", "T1", 0, 4 * HOUR_MS).with_percent(50),
            Allocation::new("W1", "T2", 0, 4 * HOUR_MS).with_percent(50),
            Allocation::new("W1", "T3", 4 * HOUR_MS, 8 * HOUR_MS),
        ];
        let conflicts = ConflictDetector::new().detect(&resources, &allocations, &[], &horizon());
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_double_booking_is_critical() {
        let resources = vec![Resource::worker("W1")];
        let allocations = vec![
            Allocation::new("W1", "T1", 0, 4 * HOUR_MS),
            Allocation::new("W1", "T2", HOUR_MS, 3 * HOUR_MS),
        ];
        let conflicts = ConflictDetector::new().detect(&resources, &allocations, &[], &horizon());
        assert_eq!(conflicts.len(), 1);
        let c = &conflicts[0];
        assert_eq!(c.window, TimeWindow::new(HOUR_MS, 3 * HOUR_MS));
        assert_eq!(c.peak_percent, 200);
        assert!((c.excess_percent - 100.0).abs() < 1e-10);
        assert_eq!(c.severity, ConflictSeverity::Critical);
        assert_eq!(c.task_ids(), vec!["T1", "T2"]);
    }

    #[test]
    fn test_contiguous_segments_merge() {
        let resources = vec![Resource::worker("W1")];
        let allocations = vec![
            Allocation::new("W1", "T1", 0, 6 * HOUR_MS).with_percent(60),
            Allocation::new("W1", "T2", HOUR_MS, 3 * HOUR_MS).with_percent(50),
            Allocation::new("W1", "T3", 3 * HOUR_MS, 5 * HOUR_MS).with_percent(70),
        ];
        let conflicts = ConflictDetector::new().detect(&resources, &allocations, &[], &horizon());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].window, TimeWindow::new(HOUR_MS, 5 * HOUR_MS));
        assert_eq!(conflicts[0].peak_percent, 130);
        assert_eq!(conflicts[0].severity, ConflictSeverity::High);
        assert_eq!(conflicts[0].allocations.len(), 3);
    }

    #[test]
    fn test_outside_availability() {
        let resources = vec![Resource::equipment("CRANE").with_availability(0, 2 * HOUR_MS)];
        let allocations = vec![Allocation::new("CRANE", "T1", HOUR_MS, 5 * HOUR_MS)];
        let conflicts = ConflictDetector::new().detect(&resources, &allocations, &[], &horizon());
        assert_eq!(conflicts.len(), 1);
        let c = &conflicts[0];
        assert_eq!(c.kind, ConflictKind::OutsideAvailability);
        // 3 of 4 hours outside
        assert!((c.excess_percent - 75.0).abs() < 1e-10);
        assert_eq!(c.severity, ConflictSeverity::Critical);
    }

    #[test]
    fn test_can_reschedule_uses_slack() {
        let tasks = vec![
            Task::new("LONG", 3 * DAY_MS).with_project("P1"),
            Task::new("SHORT", DAY_MS).with_project("P1"),
        ];
        let resources = vec![Resource::worker("W1")];
        let critical = vec![
            Allocation::new("W1", "LONG", 0, DAY_MS),
            Allocation::new("W1", "OTHER", 0, DAY_MS),
        ];
        let c = ConflictDetector::new().detect(&resources, &critical, &tasks, &horizon());
        assert!(!c[0].can_reschedule);

        let flexible = vec![
            Allocation::new("W1", "SHORT", 0, DAY_MS),
            Allocation::new("W1", "OTHER", 0, DAY_MS),
        ];
        let c = ConflictDetector::new().detect(&resources, &flexible, &tasks, &horizon());
        assert!(c[0].can_reschedule);
    }

    #[test]
    fn test_outside_horizon_and_unknown_resources_ignored() {
        let resources = vec![Resource::worker("W1")];
        let allocations = vec![
            Allocation::new("W1", "T1", 20 * DAY_MS, 21 * DAY_MS),
            Allocation::new("W1", "T2", 20 * DAY_MS, 21 * DAY_MS),
            Allocation::new("GHOST", "T3", 0, DAY_MS),
            Allocation::new("GHOST", "T4", 0, DAY_MS),
        ];
        let conflicts = ConflictDetector::new().detect(&resources, &allocations, &[], &horizon());
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_reduced_capacity() {
        let resources = vec![Resource::worker("W1")];
        let allocations = vec![Allocation::new("W1", "T1", 0, HOUR_MS).with_percent(90)];
        let conflicts = ConflictDetector::new()
            .with_capacity(80)
            .detect(&resources, &allocations, &[], &horizon());
        assert_eq!(conflicts.len(), 1);
        assert!((conflicts[0].excess_percent - 12.5).abs() < 1e-10);
        assert_eq!(conflicts[0].severity, ConflictSeverity::Medium);
    }
}
