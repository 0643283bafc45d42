//! Allocation model.
//!
//! An allocation records that a resource is committed to a task, at some
//! percentage of its capacity, for a time window.

use serde::{Deserialize, Serialize};

use super::TimeWindow;

/// A (resource, task) commitment over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Committed resource.
    pub resource_id: String,
    /// Task being worked.
    pub task_id: String,
    /// Start time (ms).
    pub start_ms: i64,
    /// End time (ms, exclusive).
    pub end_ms: i64,
    /// Share of the resource's capacity (0-100).
    pub percent: u8,
    /// Estimated cost of this commitment.
    pub estimated_cost: f64,
}

impl Allocation {
    /// Creates a full-time allocation with zero cost.
    pub fn new(
        resource_id: impl Into<String>,
        task_id: impl Into<String>,
        start_ms: i64,
        end_ms: i64,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            task_id: task_id.into(),
            start_ms,
            end_ms,
            percent: 100,
            estimated_cost: 0.0,
        }
    }

    /// Sets the allocation percentage (clamped to 0..=100).
    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent = percent.min(100);
        self
    }

    /// Sets the estimated cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = cost;
        self
    }

    /// Duration (end - start) in ms.
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// The allocation's time window.
    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_ms, self.end_ms)
    }

    /// Whether two allocations overlap in time.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.window().overlaps(&other.window())
    }

    /// Capacity-time consumed: duration weighted by percentage.
    pub fn load_ms(&self) -> f64 {
        self.duration_ms() as f64 * f64::from(self.percent) / 100.0
    }
}

/// Peak summed percentage of `allocations` over any instant in `window`.
///
/// Allocations are assumed to share one resource.
pub fn peak_load(allocations: &[&Allocation], window: &TimeWindow) -> u32 {
    let mut events: Vec<(i64, i32)> = Vec::with_capacity(allocations.len() * 2);
    for a in allocations {
        let start = a.start_ms.max(window.start_ms);
        let end = a.end_ms.min(window.end_ms);
        if end > start {
            events.push((start, i32::from(a.percent)));
            events.push((end, -i32::from(a.percent)));
        }
    }
    // Ends sort before starts at the same instant (half-open windows).
    events.sort_unstable();
    let mut current = 0i32;
    let mut peak = 0i32;
    for (_, delta) in events {
        current += delta;
        peak = peak.max(current);
    }
    peak.max(0) as u32
}
