//! Resource model.
//!
//! Resources are what gets allocated to tasks: workers, equipment units,
//! and material lots. Kind-specific details live in [`ResourceKind`]; the
//! optimizer and scheduler only read the shared fields (capabilities,
//! cost rate, quality rating, availability).

use serde::{Deserialize, Serialize};

use super::calendar::{self, TimeWindow};

/// A resource that can be allocated to tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Kind-specific details.
    pub kind: ResourceKind,
    /// Skills or capabilities this resource provides.
    pub capabilities: Vec<String>,
    /// Cost per hour of full (100%) allocation.
    pub cost_rate: f64,
    /// Expected work quality (0.0 to 1.0).
    pub quality_rating: f64,
    /// Availability windows, ordered and non-overlapping.
    /// Empty = always available.
    pub availability: Vec<TimeWindow>,
}

/// Resource classification with kind-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceKind {
    /// A person on site.
    Worker {
        /// Trade (e.g., "electrician").
        trade: Option<String>,
        /// Cost multiplier applied to overtime hours.
        overtime_multiplier: f64,
    },
    /// A piece of plant or machinery.
    Equipment {
        /// Whether an operator must be booked separately.
        operator_required: bool,
    },
    /// A lot of consumable material.
    Material {
        /// Quantity on hand.
        quantity: f64,
        /// Unit of measure.
        unit: String,
    },
}

/// Kind discriminant, used to group resources for demand forecasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// See [`ResourceKind::Worker`].
    Worker,
    /// See [`ResourceKind::Equipment`].
    Equipment,
    /// See [`ResourceKind::Material`].
    Material,
}

impl ResourceKind {
    /// The discriminant of this kind.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::Worker { .. } => ResourceType::Worker,
            Self::Equipment { .. } => ResourceType::Equipment,
            Self::Material { .. } => ResourceType::Material,
        }
    }
}

impl Resource {
    /// Creates a resource of the given kind.
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            kind,
            capabilities: Vec::new(),
            cost_rate: 0.0,
            quality_rating: 0.8,
            availability: Vec::new(),
        }
    }

    /// Creates a worker.
    pub fn worker(id: impl Into<String>) -> Self {
        Self::new(
            id,
            ResourceKind::Worker {
                trade: None,
                overtime_multiplier: 1.5,
            },
        )
    }

    /// Creates an equipment unit.
    pub fn equipment(id: impl Into<String>) -> Self {
        Self::new(
            id,
            ResourceKind::Equipment {
                operator_required: false,
            },
        )
    }

    /// Creates a material lot.
    pub fn material(id: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self::new(
            id,
            ResourceKind::Material {
                quantity,
                unit: unit.into(),
            },
        )
    }

    /// Sets the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a capability.
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Sets the hourly cost rate.
    pub fn with_cost_rate(mut self, cost_rate: f64) -> Self {
        self.cost_rate = cost_rate.max(0.0);
        self
    }

    /// Sets the quality rating (clamped to 0.0..=1.0).
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality_rating = quality.clamp(0.0, 1.0);
        self
    }

    /// Appends an availability window.
    pub fn with_availability(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.availability.push(TimeWindow::new(start_ms, end_ms));
        self
    }

    /// The kind discriminant.
    pub fn resource_type(&self) -> ResourceType {
        self.kind.resource_type()
    }

    /// Whether this resource has a given capability.
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c == name)
    }

    /// Whether this resource covers every listed skill.
    pub fn covers(&self, skills: &[String]) -> bool {
        skills.iter().all(|s| self.has_capability(s))
    }

    /// Cost of holding this resource for `duration_ms` at `percent` allocation.
    pub fn cost_for(&self, duration_ms: i64, percent: u8) -> f64 {
        let hours = duration_ms as f64 / calendar::HOUR_MS as f64;
        self.cost_rate * hours * f64::from(percent) / 100.0
    }

    /// Earliest start `>= from_ms` at which the resource is available for
    /// `duration_ms` without interruption.
    pub fn earliest_fit(&self, from_ms: i64, duration_ms: i64) -> Option<i64> {
        calendar::earliest_fit(&self.availability, from_ms, duration_ms)
    }

    /// Whether the resource is available over all of `[start_ms, end_ms)`.
    pub fn is_available(&self, start_ms: i64, end_ms: i64) -> bool {
        calendar::within_availability(&self.availability, start_ms, end_ms)
    }

    /// Total available time inside `window`.
    pub fn available_time_in(&self, window: &TimeWindow) -> i64 {
        calendar::available_time_in_range(&self.availability, window.start_ms, window.end_ms)
    }
}
