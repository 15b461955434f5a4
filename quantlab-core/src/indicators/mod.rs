//! Technical indicator suite.
//!
//! Every indicator yields a neutral sentinel instead of an error when the
//! series is shorter than its window: RSI → 50, stochastic → 50/50, CCI → 0,
//! ATR → 0, MACD → zeros, EMA → last close. The per-bar [`IndicatorSnapshot`]
//! therefore always has the same shape regardless of how much history exists.

pub mod atr;
pub mod cci;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod rsi;
pub mod stochastic;
pub mod vwap;
pub mod volume_profile;

pub use atr::{atr_latest, AtrState, ATR_PERIOD};
pub use cci::{cci_latest, CCI_PERIOD};
pub use ema::{ema_latest, ema_series, EmaState};
pub use engine::IndicatorEngine;
pub use macd::{macd_latest, MacdDirection, MacdOutput, MacdState};
pub use rsi::{rsi_latest, RsiState};
pub use stochastic::{stochastic_latest, StochOutput, StochZone, STOCH_PERIOD};
pub use vwap::{vwap_latest, VwapLevels, VwapState};
pub use volume_profile::{volume_profile, VolumeProfile, PROFILE_MIN_BARS};

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

pub const EMA_FAST_PERIOD: usize = 20;
pub const EMA_SLOW_PERIOD: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const VOLUME_SMA_PERIOD: usize = 20;

/// All indicator readings at one bar. The shape never varies; sparse history
/// shows up as the per-indicator neutral sentinels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd: MacdOutput,
    pub stochastic: StochOutput,
    pub cci: f64,
    pub atr: f64,
    pub vwap: VwapLevels,
    pub volume_profile: Option<VolumeProfile>,
    /// Last bar's volume above its trailing average.
    pub volume_rising: bool,
}

impl Default for IndicatorSnapshot {
    fn default() -> Self {
        Self {
            close: 0.0,
            rsi: 50.0,
            ema_fast: 0.0,
            ema_slow: 0.0,
            macd: MacdOutput::default(),
            stochastic: StochOutput::default(),
            cci: 0.0,
            atr: 0.0,
            vwap: VwapLevels::default(),
            volume_profile: None,
            volume_rising: false,
        }
    }
}

/// Snapshot at the last bar of `bars`.
pub fn snapshot(bars: &[PriceBar]) -> IndicatorSnapshot {
    let mut engine = IndicatorEngine::new();
    let mut snap = IndicatorSnapshot::default();
    for bar in bars {
        snap = engine.update(bar);
    }
    snap
}

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-9;

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() <= epsilon,
        "expected {expected}, got {actual} (epsilon {epsilon})"
    );
}

/// Synthetic hourly bars: each close gets a ±0.5% high/low band and unit-lot
/// volume, enough structure for range-based indicators to have work to do.
#[cfg(test)]
pub(crate) fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            open_time: i as i64 * 3_600_000,
            open: if i == 0 { close } else { closes[i - 1] },
            high: close * 1.005,
            low: close * 0.995,
            close,
            volume: 1_000.0,
        })
        .collect()
}
