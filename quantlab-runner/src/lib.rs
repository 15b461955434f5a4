//! QuantLab Runner — orchestration around the core engine.
//!
//! Loads bar series from CSV, carries the reproducible run configuration
//! (content-addressed by hash), fans parameter sweeps out over rayon, and
//! hosts the Monte Carlo capital simulation.

pub mod config;
pub mod loader;
pub mod montecarlo;
pub mod sweep;

pub use config::{RunConfig, RunId};
pub use loader::{load_bars, LoadError};
pub use montecarlo::{MonteCarloConfig, MonteCarloSummary};
pub use sweep::{ParamGrid, ParamSweep, SweepCell, SweepResults};
