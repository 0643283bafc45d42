//! Optimization request model.
//!
//! A request is created by the caller and is immutable once submitted.
//! It names what to optimize (scope), toward what (objective), under
//! which rules (constraints, preferences), and over which horizon.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TimeWindow;
use crate::error::EngineError;
use crate::ga::GaConfig;

/// What the optimization should emphasize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Cheapest plan.
    MinimizeCost,
    /// Shortest plan.
    MinimizeDuration,
    /// Best-rated resources.
    MaximizeQuality,
    /// Equal emphasis on cost, time, and quality.
    #[default]
    Balanced,
    /// Keep resources busy.
    MaximizeUtilization,
    /// Avoid gaps in resource timelines.
    MinimizeIdleTime,
}

impl Objective {
    /// All objectives, in declaration order.
    pub const ALL: [Objective; 6] = [
        Objective::MinimizeCost,
        Objective::MinimizeDuration,
        Objective::MaximizeQuality,
        Objective::Balanced,
        Objective::MaximizeUtilization,
        Objective::MinimizeIdleTime,
    ];

    /// Wire name of this objective.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinimizeCost => "minimize_cost",
            Self::MinimizeDuration => "minimize_duration",
            Self::MaximizeQuality => "maximize_quality",
            Self::Balanced => "balanced",
            Self::MaximizeUtilization => "maximize_utilization",
            Self::MinimizeIdleTime => "minimize_idle_time",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Objective {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| EngineError::UnknownObjective(s.to_string()))
    }
}

/// Which tasks and resources the request covers.
///
/// Empty lists mean "everything the snapshot provides".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    /// Projects whose tasks are in scope.
    pub project_ids: Vec<String>,
    /// Explicit task ids.
    pub task_ids: Vec<String>,
    /// Explicit resource ids.
    pub resource_ids: Vec<String>,
}

/// Hard rules the plan must respect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    /// Permit a resource to exceed 100% over overlapping windows.
    pub allow_overtime: bool,
    /// Upper bound on total plan cost.
    pub max_budget: Option<f64>,
    /// Latest completion for the whole plan (ms).
    pub deadline_ms: Option<i64>,
    /// Resources that must not be used.
    pub excluded_resources: Vec<String>,
    /// Per-resource capacity cap (percent).
    pub max_allocation_percent: u8,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            allow_overtime: false,
            max_budget: None,
            deadline_ms: None,
            excluded_resources: Vec::new(),
            max_allocation_percent: 100,
        }
    }
}

/// Soft preferences shaping the fitness function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Relative weight of cost.
    pub cost_weight: Option<f64>,
    /// Relative weight of duration.
    pub time_weight: Option<f64>,
    /// Relative weight of quality.
    pub quality_weight: Option<f64>,
    /// Resources to favor when otherwise equal.
    pub preferred_resources: Vec<String>,
}

/// Normalized cost/time/quality weights (sum to 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    /// Cost share.
    pub cost: f64,
    /// Time share.
    pub time: f64,
    /// Quality share.
    pub quality: f64,
}

impl Preferences {
    /// Normalized weights. Unspecified weights default to 1/3 before
    /// normalization; an all-zero set falls back to equal thirds.
    pub fn weights(&self) -> ObjectiveWeights {
        let third = 1.0 / 3.0;
        let pick = |w: Option<f64>| w.filter(|v| v.is_finite()).unwrap_or(third).max(0.0);
        let (c, t, q) = (
            pick(self.cost_weight),
            pick(self.time_weight),
            pick(self.quality_weight),
        );
        let sum = c + t + q;
        if sum <= 0.0 {
            return ObjectiveWeights {
                cost: third,
                time: third,
                quality: third,
            };
        }
        ObjectiveWeights {
            cost: c / sum,
            time: t / sum,
            quality: q / sum,
        }
    }

    /// Whether `resource_id` is preferred.
    pub fn prefers(&self, resource_id: &str) -> bool {
        self.preferred_resources.iter().any(|r| r == resource_id)
    }
}

/// One invocation of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRequest {
    /// Caller-assigned request id.
    pub id: String,
    /// Tasks and resources in scope.
    #[serde(default)]
    pub scope: Scope,
    /// Optimization goal.
    #[serde(default)]
    pub objective: Objective,
    /// Hard rules.
    #[serde(default)]
    pub constraints: Constraints,
    /// Soft preferences.
    #[serde(default)]
    pub preferences: Preferences,
    /// Planning horizon [start, end).
    pub horizon: TimeWindow,
    /// Search parameters.
    #[serde(default)]
    pub ga: GaConfig,
    /// How many alternatives to return besides the chosen plan.
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,
}

fn default_max_alternatives() -> usize {
    3
}

impl OptimizationRequest {
    /// Creates a balanced request over `[start_ms, end_ms)` with default settings.
    pub fn new(id: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            id: id.into(),
            scope: Scope::default(),
            objective: Objective::Balanced,
            constraints: Constraints::default(),
            preferences: Preferences::default(),
            horizon: TimeWindow::new(start_ms, end_ms),
            ga: GaConfig::default(),
            max_alternatives: default_max_alternatives(),
        }
    }

    /// Sets the objective.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Sets the scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the constraints.
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets the preferences.
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Sets the search parameters.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ga.seed = Some(seed);
        self
    }

    /// Sets the alternative count.
    pub fn with_max_alternatives(mut self, n: usize) -> Self {
        self.max_alternatives = n;
        self
    }

    /// Structural checks done before any computation.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.horizon.start_ms >= self.horizon.end_ms {
            return Err(EngineError::InvalidRequest(format!(
                "time horizon start ({}) must be before end ({})",
                self.horizon.start_ms, self.horizon.end_ms
            )));
        }
        if self.constraints.max_allocation_percent == 0
            || self.constraints.max_allocation_percent > 100
        {
            return Err(EngineError::InvalidRequest(format!(
                "max_allocation_percent must be in 1..=100, got {}",
                self.constraints.max_allocation_percent
            )));
        }
        if let Some(budget) = self.constraints.max_budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(EngineError::InvalidRequest(format!(
                    "max_budget must be a non-negative number, got {budget}"
                )));
            }
        }
        let p = &self.preferences;
        for (name, w) in [
            ("cost_weight", p.cost_weight),
            ("time_weight", p.time_weight),
            ("quality_weight", p.quality_weight),
        ] {
            if let Some(w) = w {
                if !w.is_finite() || w < 0.0 {
                    return Err(EngineError::InvalidRequest(format!(
                        "{name} must be a non-negative number, got {w}"
                    )));
                }
            }
        }
        self.ga.validate()
    }
}
