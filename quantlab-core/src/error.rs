//! Error taxonomy for the simulation core.
//!
//! Data sparsity inside a run resolves to neutral sentinel values; only the
//! outermost boundary (too few bars to backtest at all) and caller mistakes
//! (malformed configuration) surface as errors, so the two causes stay
//! distinguishable in the result.

use thiserror::Error;

/// Errors returned by `engine::run_backtest`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("insufficient data: {got} bars < minimum {needed}")]
    InsufficientData { needed: usize, got: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Malformed configuration, reported with the offending values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("warmup window {warmup} must be shorter than the series ({series_len} bars)")]
    WarmupTooLong { warmup: usize, series_len: usize },
    #[error("RSI exit threshold {exit} must be above the entry threshold {entry}")]
    RsiThresholdsInverted { entry: f64, exit: f64 },
    #[error("RSI threshold {value} outside [0, 100]")]
    RsiThresholdOutOfRange { value: f64 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}
