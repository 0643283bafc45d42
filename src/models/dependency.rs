//! Task dependency model.
//!
//! A dependency orders two tasks. The four classic link types are
//! supported, each with an optional lag (negative lag = lead time).

use serde::{Deserialize, Serialize};

/// How a successor is tied to its predecessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// Successor starts no earlier than predecessor finish + lag.
    #[default]
    FinishToStart,
    /// Successor starts no earlier than predecessor start + lag.
    StartToStart,
    /// Successor finishes no earlier than predecessor finish + lag.
    FinishToFinish,
    /// Successor finishes no earlier than predecessor start + lag.
    StartToFinish,
}

/// An ordering constraint between two tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Task that constrains.
    pub predecessor_id: String,
    /// Task that is constrained.
    pub successor_id: String,
    /// Link type.
    pub dependency_type: DependencyType,
    /// Lag (ms). Negative values are leads.
    pub lag_ms: i64,
}

impl Dependency {
    /// Creates a dependency.
    pub fn new(
        predecessor_id: impl Into<String>,
        successor_id: impl Into<String>,
        dependency_type: DependencyType,
        lag_ms: i64,
    ) -> Self {
        Self {
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
            dependency_type,
            lag_ms,
        }
    }

    /// Creates a zero-lag finish-to-start dependency.
    pub fn finish_to_start(
        predecessor_id: impl Into<String>,
        successor_id: impl Into<String>,
    ) -> Self {
        Self::new(predecessor_id, successor_id, DependencyType::FinishToStart, 0)
    }

    /// Earliest successor start allowed by this link, given the predecessor's
    /// resolved window and the successor's duration.
    pub fn earliest_successor_start(
        &self,
        pred_start_ms: i64,
        pred_end_ms: i64,
        successor_duration_ms: i64,
    ) -> i64 {
        match self.dependency_type {
            DependencyType::FinishToStart => pred_end_ms + self.lag_ms,
            DependencyType::StartToStart => pred_start_ms + self.lag_ms,
            DependencyType::FinishToFinish => pred_end_ms + self.lag_ms - successor_duration_ms,
            DependencyType::StartToFinish => pred_start_ms + self.lag_ms - successor_duration_ms,
        }
    }

    /// Latest predecessor finish allowed by this link, given the successor's
    /// latest window and the predecessor's duration.
    pub fn latest_predecessor_finish(
        &self,
        succ_latest_start_ms: i64,
        succ_latest_finish_ms: i64,
        predecessor_duration_ms: i64,
    ) -> i64 {
        match self.dependency_type {
            DependencyType::FinishToStart => succ_latest_start_ms - self.lag_ms,
            DependencyType::StartToStart => {
                succ_latest_start_ms - self.lag_ms + predecessor_duration_ms
            }
            DependencyType::FinishToFinish => succ_latest_finish_ms - self.lag_ms,
            DependencyType::StartToFinish => {
                succ_latest_finish_ms - self.lag_ms + predecessor_duration_ms
            }
        }
    }

    /// Whether resolved windows honor this link.
    pub fn is_satisfied(
        &self,
        pred_start_ms: i64,
        pred_end_ms: i64,
        succ_start_ms: i64,
        succ_end_ms: i64,
    ) -> bool {
        match self.dependency_type {
            DependencyType::FinishToStart => succ_start_ms >= pred_end_ms + self.lag_ms,
            DependencyType::StartToStart => succ_start_ms >= pred_start_ms + self.lag_ms,
            DependencyType::FinishToFinish => succ_end_ms >= pred_end_ms + self.lag_ms,
            DependencyType::StartToFinish => succ_end_ms >= pred_start_ms + self.lag_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earliest_successor_start() {
        let fs = Dependency::new("A", "B", DependencyType::FinishToStart, 10);
        assert_eq!(fs.earliest_successor_start(0, 100, 50), 110);

        let ss = Dependency::new("A", "B", DependencyType::StartToStart, 10);
        assert_eq!(ss.earliest_successor_start(0, 100, 50), 10);

        let ff = Dependency::new("A", "B", DependencyType::FinishToFinish, 10);
        assert_eq!(ff.earliest_successor_start(0, 100, 50), 60);

        let sf = Dependency::new("A", "B", DependencyType::StartToFinish, 10);
        assert_eq!(sf.earliest_successor_start(0, 100, 50), -40);
    }

    #[test]
    fn test_negative_lag_is_lead() {
        let fs = Dependency::new("A", "B", DependencyType::FinishToStart, -20);
        assert_eq!(fs.earliest_successor_start(0, 100, 50), 80);
        assert!(fs.is_satisfied(0, 100, 80, 130));
        assert!(!fs.is_satisfied(0, 100, 79, 129));
    }

    #[test]
    fn test_latest_predecessor_finish_mirrors_forward_rule() {
        // Successor window [110, 160); predecessor duration 100.
        for dep_type in [
            DependencyType::FinishToStart,
            DependencyType::StartToStart,
            DependencyType::FinishToFinish,
            DependencyType::StartToFinish,
        ] {
            let dep = Dependency::new("A", "B", dep_type, 10);
            let lf = dep.latest_predecessor_finish(110, 160, 100);
            // A predecessor finishing exactly at lf keeps the link satisfied.
            assert!(dep.is_satisfied(lf - 100, lf, 110, 160), "{dep_type:?}");
            assert!(!dep.is_satisfied(lf - 99, lf + 1, 110, 160), "{dep_type:?}");
        }
    }

    #[test]
    fn test_default_type() {
        assert_eq!(DependencyType::default(), DependencyType::FinishToStart);
        let d = Dependency::finish_to_start("A", "B");
        assert_eq!(d.lag_ms, 0);
    }
}
