//! Demand forecasting per resource type.
//!
//! Projects historical utilization forward over the planning horizon and
//! flags windows where predicted demand outruns the resources on hand.
//!
//! # Output contract
//!
//! Every [`ForecastPoint`] carries a prediction, a lower and upper bound,
//! and a confidence. The interval width (`upper - lower`, always twice
//! [`ForecastPoint::margin`]) never shrinks as the projection reaches
//! further past the last sample; near zero the band is shifted up rather
//! than cut off.
//!
//! # Models
//!
//! | Model | Trend | Spread |
//! |-------|-------|--------|
//! | [`LinearRegression`] | Least-squares line | Residual std. error |
//! | [`WeightedMovingAverage`] | Flat at the weighted mean | Std. dev. of the window |
//!
//! Which model a resource type uses comes from a [`ModelRegistry`]; an
//! empty registry means linear regression everywhere.
//!
//! # Reference
//! Hyndman & Athanasopoulos (2021), "Forecasting: Principles and Practice",
//! Ch. 5 (prediction intervals) and Ch. 7 (regression)

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ForecastError;
use crate::models::{ResourceType, TimeWindow, DAY_MS};

/// Fewest samples a forecast is fitted on.
pub const MIN_SAMPLES: usize = 3;
/// Most points a single forecast emits.
const MAX_POINTS: usize = 366;
/// Two-sided 95% normal quantile.
const Z_95: f64 = 1.96;

/// One historical demand observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSample {
    /// When the sample was taken (ms).
    pub timestamp_ms: i64,
    /// Resource type measured.
    pub resource_type: ResourceType,
    /// Units of that type in use.
    pub demand: f64,
}

impl UtilizationSample {
    /// Creates a sample.
    pub fn new(timestamp_ms: i64, resource_type: ResourceType, demand: f64) -> Self {
        Self {
            timestamp_ms,
            resource_type,
            demand,
        }
    }
}

/// One projected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Projected instant (ms).
    pub time_ms: i64,
    /// Predicted demand (never negative).
    pub predicted: f64,
    /// Lower bound (never negative).
    pub lower: f64,
    /// Upper bound; `upper - lower == 2 * margin`.
    pub upper: f64,
    /// Interval half-width.
    pub margin: f64,
    /// Confidence in the prediction (0.0..1.0).
    pub confidence: f64,
}

/// Highest predicted demand in a forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakDemand {
    /// When (ms).
    pub time_ms: i64,
    /// How much.
    pub demand: f64,
}

/// A stretch where predicted demand exceeds capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckWindow {
    /// Affected window.
    pub window: TimeWindow,
    /// Highest predicted demand inside it.
    pub peak_demand: f64,
    /// Capacity it was compared against.
    pub capacity: f64,
}

/// Demand projection for one resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    /// Resource type.
    pub resource_type: ResourceType,
    /// Name of the model used.
    pub model: String,
    /// Projected series.
    pub points: Vec<ForecastPoint>,
    /// Peak of the series.
    pub peak: PeakDemand,
    /// Units of this type available.
    pub capacity: f64,
    /// Over-capacity windows.
    pub bottlenecks: Vec<BottleneckWindow>,
    /// Whether any bottleneck was found.
    pub is_bottleneck: bool,
}

/// Fitted trend: `demand(x) = intercept + slope · x`, with `x` in sample
/// intervals since the first sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    /// Value at `x = 0`.
    pub intercept: f64,
    /// Change per sample interval.
    pub slope: f64,
    /// Spread of observations around the trend.
    pub sigma: f64,
}

/// A demand model.
pub trait ForecastModel: Send + Sync + fmt::Debug {
    /// Model name.
    fn name(&self) -> &'static str;

    /// Fits `(x, demand)` observations, sorted by `x`, at least
    /// [`MIN_SAMPLES`] of them.
    fn fit(&self, observations: &[(f64, f64)]) -> Fit;
}

/// Ordinary least squares.
#[derive(Debug, Clone, Copy)]
pub struct LinearRegression;

impl ForecastModel for LinearRegression {
    fn name(&self) -> &'static str {
        "linear_regression"
    }

    fn fit(&self, observations: &[(f64, f64)]) -> Fit {
        let n = observations.len() as f64;
        let mean_x = observations.iter().map(|o| o.0).sum::<f64>() / n;
        let mean_y = observations.iter().map(|o| o.1).sum::<f64>() / n;
        let sxx: f64 = observations.iter().map(|o| (o.0 - mean_x).powi(2)).sum();
        let sxy: f64 = observations
            .iter()
            .map(|o| (o.0 - mean_x) * (o.1 - mean_y))
            .sum();
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = mean_y - slope * mean_x;

        let sse: f64 = observations
            .iter()
            .map(|o| (o.1 - intercept - slope * o.0).powi(2))
            .sum();
        let sigma = if observations.len() > 2 {
            (sse / (n - 2.0)).sqrt()
        } else {
            0.0
        };
        Fit {
            intercept,
            slope,
            sigma,
        }
    }
}

/// Linearly weighted mean of the most recent `window` samples; the newest
/// weighs most.
#[derive(Debug, Clone, Copy)]
pub struct WeightedMovingAverage {
    /// Samples averaged.
    pub window: usize,
}

impl ForecastModel for WeightedMovingAverage {
    fn name(&self) -> &'static str {
        "weighted_moving_average"
    }

    fn fit(&self, observations: &[(f64, f64)]) -> Fit {
        let take = self.window.clamp(1, observations.len().max(1));
        let recent = &observations[observations.len().saturating_sub(take)..];

        let mut weighted = 0.0;
        let mut total = 0.0;
        for (i, (_, y)) in recent.iter().enumerate() {
            let w = (i + 1) as f64;
            weighted += w * y;
            total += w;
        }
        let mean = if total > 0.0 { weighted / total } else { 0.0 };
        let variance = recent.iter().map(|(_, y)| (y - mean).powi(2)).sum::<f64>()
            / recent.len().max(1) as f64;
        Fit {
            intercept: mean,
            slope: 0.0,
            sigma: variance.sqrt(),
        }
    }
}

/// Available forecast models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForecastModelKind {
    /// See [`LinearRegression`].
    #[default]
    LinearRegression,
    /// See [`WeightedMovingAverage`].
    WeightedMovingAverage {
        /// Samples averaged.
        window: usize,
    },
}

impl ForecastModelKind {
    /// Instantiates the model.
    pub fn model(&self) -> Box<dyn ForecastModel> {
        match *self {
            Self::LinearRegression => Box::new(LinearRegression),
            Self::WeightedMovingAverage { window } => Box::new(WeightedMovingAverage { window }),
        }
    }
}

/// Descriptor of a registered model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Display name.
    pub name: String,
    /// Version label.
    pub version: String,
    /// Model to run.
    pub kind: ForecastModelKind,
    /// Last measured accuracy (0.0..1.0), if known.
    pub accuracy: Option<f64>,
}

impl ModelMetadata {
    /// Creates metadata for `kind`.
    pub fn new(name: impl Into<String>, version: impl Into<String>, kind: ForecastModelKind) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind,
            accuracy: None,
        }
    }

    /// Sets the accuracy.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy.clamp(0.0, 1.0));
        self
    }
}

/// Read-only mapping from resource type to forecast model.
///
/// Passed to the engine explicitly; there is no process-wide registry.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<ResourceType, ModelMetadata>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model, replacing any previous one for the type.
    pub fn register(&mut self, resource_type: ResourceType, metadata: ModelMetadata) {
        self.models.insert(resource_type, metadata);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_model(mut self, resource_type: ResourceType, metadata: ModelMetadata) -> Self {
        self.register(resource_type, metadata);
        self
    }

    /// Registered metadata for a type.
    pub fn get(&self, resource_type: ResourceType) -> Option<&ModelMetadata> {
        self.models.get(&resource_type)
    }

    /// Model kind for a type, defaulting to linear regression.
    pub fn kind_for(&self, resource_type: ResourceType) -> ForecastModelKind {
        self.get(resource_type).map(|m| m.kind).unwrap_or_default()
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Demand forecaster.
///
/// # Example
///
/// ```
/// use u_resource_optim::forecast::{Forecaster, ModelRegistry, UtilizationSample};
/// use u_resource_optim::models::{ResourceType, TimeWindow, DAY_MS};
///
/// let history: Vec<_> = (0..10)
///     .map(|d| UtilizationSample::new(d * DAY_MS, ResourceType::Worker, 2.0 + d as f64 * 0.5))
///     .collect();
/// let registry = ModelRegistry::new();
/// let forecast = Forecaster::new(&registry)
///     .forecast(
///         ResourceType::Worker,
///         &history,
///         &TimeWindow::new(10 * DAY_MS, 20 * DAY_MS),
///         5.0,
///     )
///     .unwrap();
///
/// assert_eq!(forecast.points.len(), 10);
/// assert!(forecast.is_bottleneck);
/// ```
#[derive(Debug, Clone)]
pub struct Forecaster<'a> {
    registry: &'a ModelRegistry,
    step_ms: i64,
}

impl<'a> Forecaster<'a> {
    /// Daily forecaster backed by `registry`.
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self {
            registry,
            step_ms: DAY_MS,
        }
    }

    /// Sets the spacing of forecast points (ms, at least 1).
    pub fn with_step(mut self, step_ms: i64) -> Self {
        self.step_ms = step_ms.max(1);
        self
    }

    /// Projects demand for `resource_type` over `horizon`.
    ///
    /// Samples of other types in `history` are ignored. `capacity` is the
    /// number of units on hand; predicted demand above it for at least two
    /// consecutive points forms a bottleneck.
    ///
    /// # Errors
    /// - [`ForecastError::EmptyHorizon`] if the horizon has no length.
    /// - [`ForecastError::InsufficientData`] with fewer than
    ///   [`MIN_SAMPLES`] usable samples.
    pub fn forecast(
        &self,
        resource_type: ResourceType,
        history: &[UtilizationSample],
        horizon: &TimeWindow,
        capacity: f64,
    ) -> Result<DemandForecast, ForecastError> {
        if horizon.duration_ms() <= 0 {
            return Err(ForecastError::EmptyHorizon);
        }
        let mut samples: Vec<&UtilizationSample> = history
            .iter()
            .filter(|s| s.resource_type == resource_type && s.demand.is_finite())
            .collect();
        if samples.len() < MIN_SAMPLES {
            return Err(ForecastError::InsufficientData {
                required: MIN_SAMPLES,
                available: samples.len(),
            });
        }
        samples.sort_by_key(|s| s.timestamp_ms);

        let first = samples[0].timestamp_ms;
        let last = samples[samples.len() - 1].timestamp_ms;
        let interval = ((last - first) as f64 / (samples.len() - 1) as f64).max(1.0);
        let observations: Vec<(f64, f64)> = samples
            .iter()
            .map(|s| ((s.timestamp_ms - first) as f64 / interval, s.demand))
            .collect();

        let model = self.registry.kind_for(resource_type).model();
        let fit = model.fit(&observations);
        let mean = observations.iter().map(|o| o.1).sum::<f64>() / observations.len() as f64;
        let sigma = fit.sigma.max(0.01 * mean.abs()).max(1e-6);
        let scale = mean.abs().max(1.0);
        debug!(
            ?resource_type,
            model = model.name(),
            slope = fit.slope,
            sigma,
            "forecast model fitted"
        );

        let count = usize::try_from((horizon.duration_ms() + self.step_ms - 1) / self.step_ms)
            .unwrap_or(MAX_POINTS)
            .clamp(1, MAX_POINTS);
        let points: Vec<ForecastPoint> = (0..count)
            .map(|i| {
                let time_ms = horizon.start_ms + i as i64 * self.step_ms;
                let x = (time_ms - first) as f64 / interval;
                let ahead = 1.0 + ((time_ms - last) as f64 / interval).max(0.0);
                let predicted = (fit.intercept + fit.slope * x).max(0.0);
                let margin = Z_95 * sigma * ahead.sqrt();
                let lower = (predicted - margin).max(0.0);
                ForecastPoint {
                    time_ms,
                    predicted,
                    lower,
                    upper: lower + 2.0 * margin,
                    margin,
                    confidence: 1.0 / (1.0 + margin / scale),
                }
            })
            .collect();

        let peak = points
            .iter()
            .fold(None::<&ForecastPoint>, |best, p| match best {
                Some(b) if b.predicted >= p.predicted => Some(b),
                _ => Some(p),
            })
            .map(|p| PeakDemand {
                time_ms: p.time_ms,
                demand: p.predicted,
            })
            .unwrap_or_default();

        let bottlenecks = self.bottlenecks(&points, capacity, horizon);
        Ok(DemandForecast {
            resource_type,
            model: model.name().to_string(),
            is_bottleneck: !bottlenecks.is_empty(),
            points,
            peak,
            capacity,
            bottlenecks,
        })
    }

    fn bottlenecks(
        &self,
        points: &[ForecastPoint],
        capacity: f64,
        horizon: &TimeWindow,
    ) -> Vec<BottleneckWindow> {
        let mut windows = Vec::new();
        let mut run: Vec<&ForecastPoint> = Vec::new();
        // Trailing sentinel closes the last run
        for point in points.iter().map(Some).chain(std::iter::once(None)) {
            match point {
                Some(p) if p.predicted > capacity => run.push(p),
                _ => {
                    if let (true, Some(first), Some(last)) = (run.len() >= 2, run.first(), run.last()) {
                        windows.push(BottleneckWindow {
                            window: TimeWindow::new(
                                first.time_ms,
                                (last.time_ms + self.step_ms).min(horizon.end_ms),
                            ),
                            peak_demand: run.iter().map(|p| p.predicted).fold(0.0, f64::max),
                            capacity,
                        });
                    }
                    run.clear();
                }
            }
        }
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<UtilizationSample> {
        values
            .iter()
            .enumerate()
            .map(|(d, v)| UtilizationSample::new(d as i64 * DAY_MS, ResourceType::Worker, *v))
            .collect()
    }

    #[test]
    fn test_linear_regression_exact_line() {
        let obs = vec![(0.0, 1.0), (1.0, 3.0), (2.0, 5.0), (3.0, 7.0)];
        let fit = LinearRegression.fit(&obs);
        assert!((fit.slope - 2.0).abs() < 1e-10);
        assert!((fit.intercept - 1.0).abs() < 1e-10);
        assert!(fit.sigma.abs() < 1e-10);
    }

    #[test]
    fn test_weighted_moving_average() {
        let obs = vec![(0.0, 100.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)];
        let fit = WeightedMovingAverage { window: 3 }.fit(&obs);
        // (1·1 + 2·2 + 3·3) / 6
        assert!((fit.intercept - 14.0 / 6.0).abs() < 1e-10);
        assert!((fit.slope).abs() < 1e-12);
        assert!(fit.sigma > 0.0);
    }

    #[test]
    fn test_insufficient_data() {
        let registry = ModelRegistry::new();
        let err = Forecaster::new(&registry)
            .forecast(
                ResourceType::Worker,
                &series(&[1.0, 2.0]),
                &TimeWindow::new(0, DAY_MS),
                1.0,
            )
            .unwrap_err();
        assert_eq!(
            err,
            ForecastError::InsufficientData {
                required: 3,
                available: 2
            }
        );
    }

    #[test]
    fn test_other_types_ignored() {
        let mut history = series(&[1.0, 2.0]);
        history.push(UtilizationSample::new(2 * DAY_MS, ResourceType::Equipment, 9.0));
        let registry = ModelRegistry::new();
        let result = Forecaster::new(&registry).forecast(
            ResourceType::Worker,
            &history,
            &TimeWindow::new(0, DAY_MS),
            1.0,
        );
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { available: 2, .. })
        ));
    }

    #[test]
    fn test_empty_horizon() {
        let registry = ModelRegistry::new();
        let err = Forecaster::new(&registry)
            .forecast(
                ResourceType::Worker,
                &series(&[1.0, 2.0, 3.0]),
                &TimeWindow::new(DAY_MS, DAY_MS),
                1.0,
            )
            .unwrap_err();
        assert_eq!(err, ForecastError::EmptyHorizon);
    }

    #[test]
    fn test_interval_widens_with_distance() {
        let registry = ModelRegistry::new();
        let f = Forecaster::new(&registry)
            .forecast(
                ResourceType::Worker,
                &series(&[2.0, 4.0, 3.0, 5.0, 4.0, 6.0]),
                &TimeWindow::new(6 * DAY_MS, 36 * DAY_MS),
                100.0,
            )
            .unwrap();
        assert_eq!(f.points.len(), 30);
        for pair in f.points.windows(2) {
            assert!(pair[1].margin >= pair[0].margin);
            assert!(pair[1].confidence <= pair[0].confidence + 1e-12);
        }
        for p in &f.points {
            assert!(p.lower <= p.predicted && p.predicted <= p.upper);
            assert!(p.lower >= 0.0);
        }
        assert!(!f.is_bottleneck);
    }

    #[test]
    fn test_bottleneck_needs_two_points() {
        let registry = ModelRegistry::new();
        let forecaster = Forecaster::new(&registry);
        let history = series(&[1.0, 2.0, 3.0, 4.0]);

        // Trend reaches 5 at day 4, 6 at day 5
        let f = forecaster
            .forecast(ResourceType::Worker, &history, &TimeWindow::new(4 * DAY_MS, 6 * DAY_MS), 4.5)
            .unwrap();
        assert!(f.is_bottleneck);
        assert_eq!(f.bottlenecks[0].window, TimeWindow::new(4 * DAY_MS, 6 * DAY_MS));
        assert!((f.bottlenecks[0].peak_demand - 6.0).abs() < 1e-9);
        assert!((f.peak.demand - 6.0).abs() < 1e-9);
        assert_eq!(f.peak.time_ms, 5 * DAY_MS);

        let single = forecaster
            .forecast(ResourceType::Worker, &history, &TimeWindow::new(0, 5 * DAY_MS), 4.5)
            .unwrap();
        assert!(!single.is_bottleneck);
    }

    #[test]
    fn test_registry_selects_model() {
        let registry = ModelRegistry::new().with_model(
            ResourceType::Worker,
            ModelMetadata::new(
                "wma-3",
                "1.0",
                ForecastModelKind::WeightedMovingAverage { window: 3 },
            )
            .with_accuracy(0.8),
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.kind_for(ResourceType::Equipment),
            ForecastModelKind::LinearRegression
        );

        let f = Forecaster::new(&registry)
            .forecast(
                ResourceType::Worker,
                &series(&[1.0, 2.0, 3.0, 4.0]),
                &TimeWindow::new(4 * DAY_MS, 8 * DAY_MS),
                10.0,
            )
            .unwrap();
        assert_eq!(f.model, "weighted_moving_average");
        let first = f.points[0].predicted;
        assert!(f.points.iter().all(|p| (p.predicted - first).abs() < 1e-12));
    }

    #[test]
    fn test_declining_demand_clamps_at_zero() {
        let registry = ModelRegistry::new();
        let f = Forecaster::new(&registry)
            .forecast(
                ResourceType::Worker,
                &series(&[9.0, 6.0, 3.0]),
                &TimeWindow::new(3 * DAY_MS, 10 * DAY_MS),
                1.0,
            )
            .unwrap();
        assert!(f.points.iter().all(|p| p.predicted >= 0.0 && p.lower >= 0.0));
        assert!((f.points.last().map_or(1.0, |p| p.predicted)).abs() < 1e-12);
    }

    #[test]
    fn test_declining_demand_band_keeps_widening() {
        let registry = ModelRegistry::new();
        let f = Forecaster::new(&registry)
            .forecast(
                ResourceType::Worker,
                &series(&[20.0, 17.0, 14.0]),
                &TimeWindow::new(3 * DAY_MS, 12 * DAY_MS),
                10.0,
            )
            .unwrap();
        // Trend hits zero inside the horizon
        assert!(f.points.iter().any(|p| p.predicted.abs() < 1e-12));
        for p in &f.points {
            assert!(p.lower >= 0.0);
            assert!(p.lower <= p.predicted && p.predicted <= p.upper);
            assert!((p.upper - p.lower - 2.0 * p.margin).abs() < 1e-9);
        }
        for pair in f.points.windows(2) {
            let (w0, w1) = (pair[0].upper - pair[0].lower, pair[1].upper - pair[1].lower);
            assert!(w1 >= w0 - 1e-12, "band narrowed: {w0} -> {w1}");
        }
    }
}
