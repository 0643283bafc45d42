//! Time windows and resource availability.
//!
//! # Time Model
//! All times are in milliseconds relative to a scheduling epoch.
//! The consumer defines what epoch means.
//!
//! # Availability
//! A resource's availability is a list of windows that must be
//! non-overlapping and chronologically ordered. An empty list means the
//! resource is always available.

use serde::{Deserialize, Serialize};

/// One hour in milliseconds.
pub const HOUR_MS: i64 = 3_600_000;
/// One day in milliseconds.
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    /// Interval start (ms, inclusive).
    pub start_ms: i64,
    /// Interval end (ms, exclusive).
    pub end_ms: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Duration of this window (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Whether `[start_ms, end_ms)` lies entirely inside this window.
    #[inline]
    pub fn encloses(&self, start_ms: i64, end_ms: i64) -> bool {
        start_ms >= self.start_ms && end_ms <= self.end_ms
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    /// Overlap duration with another window (0 when disjoint).
    pub fn overlap_ms(&self, other: &Self) -> i64 {
        let start = self.start_ms.max(other.start_ms);
        let end = self.end_ms.min(other.end_ms);
        (end - start).max(0)
    }
}

/// Whether availability windows are well-formed: each non-empty, ordered,
/// and non-overlapping.
pub fn windows_well_formed(windows: &[TimeWindow]) -> bool {
    windows.iter().all(|w| w.end_ms > w.start_ms)
        && windows.windows(2).all(|pair| pair[0].end_ms <= pair[1].start_ms)
}

/// Finds the earliest start `>= from_ms` such that `[start, start + duration_ms)`
/// fits entirely inside one availability window.
///
/// An empty window list means unrestricted availability. Returns `None`
/// if no remaining window is long enough.
pub fn earliest_fit(windows: &[TimeWindow], from_ms: i64, duration_ms: i64) -> Option<i64> {
    if windows.is_empty() {
        return Some(from_ms);
    }
    windows
        .iter()
        .filter(|w| w.end_ms > from_ms)
        .find_map(|w| {
            let start = w.start_ms.max(from_ms);
            (start + duration_ms <= w.end_ms).then_some(start)
        })
}

/// Total available time within a range [start, end).
pub fn available_time_in_range(windows: &[TimeWindow], start_ms: i64, end_ms: i64) -> i64 {
    if end_ms <= start_ms {
        return 0;
    }
    let range = TimeWindow::new(start_ms, end_ms);
    if windows.is_empty() {
        return range.duration_ms();
    }
    windows.iter().map(|w| w.overlap_ms(&range)).sum()
}

/// Whether `[start_ms, end_ms)` fits inside a single availability window.
pub fn within_availability(windows: &[TimeWindow], start_ms: i64, end_ms: i64) -> bool {
    windows.is_empty() || windows.iter().any(|w| w.encloses(start_ms, end_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window() {
        let w = TimeWindow::new(100, 200);
        assert_eq!(w.duration_ms(), 100);
        assert!(w.contains(100));
        assert!(w.contains(199));
        assert!(!w.contains(200)); // exclusive end
        assert!(!w.contains(50));
    }

    #[test]
    fn test_time_window_overlap() {
        let a = TimeWindow::new(0, 100);
        let b = TimeWindow::new(50, 150);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert_eq!(a.overlap_ms(&b), 50);

        let c = TimeWindow::new(100, 200); // touching but not overlapping
        assert!(!a.overlaps(&c));
        assert_eq!(a.overlap_ms(&c), 0);
    }

    #[test]
    fn test_windows_well_formed() {
        assert!(windows_well_formed(&[]));
        assert!(windows_well_formed(&[
            TimeWindow::new(0, 10),
            TimeWindow::new(10, 20)
        ]));
        assert!(!windows_well_formed(&[
            TimeWindow::new(0, 15),
            TimeWindow::new(10, 20)
        ]));
        assert!(!windows_well_formed(&[
            TimeWindow::new(20, 30),
            TimeWindow::new(0, 10)
        ]));
        assert!(!windows_well_formed(&[TimeWindow::new(5, 5)]));
    }

    #[test]
    fn test_earliest_fit_unrestricted() {
        assert_eq!(earliest_fit(&[], 500, 1_000), Some(500));
    }

    #[test]
    fn test_earliest_fit_skips_short_window() {
        let shifts = [
            TimeWindow::new(0, 8_000),
            TimeWindow::new(16_000, 24_000),
        ];
        assert_eq!(earliest_fit(&shifts, 0, 4_000), Some(0));
        // Only 2s left in the first shift, so wait for the second one.
        assert_eq!(earliest_fit(&shifts, 6_000, 4_000), Some(16_000));
        assert_eq!(earliest_fit(&shifts, 10_000, 4_000), Some(16_000));
        assert_eq!(earliest_fit(&shifts, 22_000, 4_000), None);
        assert_eq!(earliest_fit(&shifts, 0, 9_000), None);
    }

    #[test]
    fn test_available_time_in_range() {
        let windows = [TimeWindow::new(0, 40_000), TimeWindow::new(60_000, 100_000)];
        assert_eq!(available_time_in_range(&windows, 0, 100_000), 80_000);
        assert_eq!(available_time_in_range(&windows, 50_000, 70_000), 10_000);
        assert_eq!(available_time_in_range(&[], 0, 500), 500);
        assert_eq!(available_time_in_range(&windows, 10, 10), 0);
    }

    #[test]
    fn test_within_availability() {
        let windows = [TimeWindow::new(0, 100)];
        assert!(within_availability(&windows, 0, 100));
        assert!(!within_availability(&windows, 50, 150));
        assert!(within_availability(&[], 50, 150));
    }
}
