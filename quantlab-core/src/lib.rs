//! QuantLab Core — backtest simulation and risk-adjusted statistics.
//!
//! This crate contains the whole evaluation pipeline:
//! - Domain types (bars, positions, trades)
//! - Incremental technical-indicator engine and per-bar snapshots
//! - Weighted-vote directional signal classifier
//! - Three-state backtest simulator with ATR stops and trailing logic
//! - Performance metrics over the closed-trade ledger
//! - Statistical risk adjustment (Kelly, Bayes, LLN, CLT)
//! - Volatility estimation and position sizing

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod signal;
pub mod stats;
pub mod volatility;
