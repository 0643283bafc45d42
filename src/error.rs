//! Error types.
//!
//! Only structurally invalid input is reported through these; everything
//! else the engine finds is carried in-band on the result.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that reject a request before any optimization runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Unknown objective: {0}")]
    UnknownObjective(String),
    #[error("Circular dependency detected involving task '{task_id}'")]
    CyclicDependency { task_id: String },
    #[error("Invalid snapshot: {}", summarize(.0))]
    Validation(Vec<ValidationError>),
    #[error("Snapshot unavailable: {0}")]
    Snapshot(String),
}

/// Errors from the demand forecaster.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForecastError {
    #[error("Insufficient history: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },
    #[error("Forecast horizon is empty")]
    EmptyHorizon,
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
