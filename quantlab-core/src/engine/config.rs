//! Simulator configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// All knobs of one backtest. Deserializable from TOML or JSON; every field
/// falls back to its default so partial config files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Bars fed to the indicators before the first trade decision.
    pub warmup_bars: usize,
    /// RSI must exceed this to open a long (mirrored at 100 − x for shorts).
    pub rsi_entry: f64,
    /// RSI beyond this reads as overextension and closes the position.
    pub rsi_exit: f64,
    pub atr_stop_mult: f64,
    pub atr_target_mult: f64,
    pub allow_short: bool,
    pub use_volume_confirmation: bool,
    /// Unrealized run-up, in ATRs, that arms the trailing stop.
    pub trail_trigger_atr: f64,
    /// Distance, in ATRs, the armed stop trails behind the best price.
    pub trail_distance_atr: f64,
    /// Periods per year for Sharpe/Sortino annualization.
    pub annualization_factor: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            warmup_bars: 50,
            rsi_entry: 60.0,
            rsi_exit: 70.0,
            atr_stop_mult: 2.0,
            atr_target_mult: 3.0,
            allow_short: false,
            use_volume_confirmation: false,
            trail_trigger_atr: 1.0,
            trail_distance_atr: 0.5,
            annualization_factor: 252.0,
        }
    }
}

impl BacktestConfig {
    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self, series_len: usize) -> Result<(), ConfigError> {
        if self.warmup_bars >= series_len {
            return Err(ConfigError::WarmupTooLong {
                warmup: self.warmup_bars,
                series_len,
            });
        }
        for value in [self.rsi_entry, self.rsi_exit] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::RsiThresholdOutOfRange { value });
            }
        }
        if self.rsi_exit <= self.rsi_entry {
            return Err(ConfigError::RsiThresholdsInverted {
                entry: self.rsi_entry,
                exit: self.rsi_exit,
            });
        }
        for (name, value) in [
            ("atr_stop_mult", self.atr_stop_mult),
            ("atr_target_mult", self.atr_target_mult),
            ("trail_trigger_atr", self.trail_trigger_atr),
            ("trail_distance_atr", self.trail_distance_atr),
            ("annualization_factor", self.annualization_factor),
        ] {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }
}
