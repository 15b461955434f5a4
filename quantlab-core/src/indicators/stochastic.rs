//! Stochastic oscillator (%K over the lookback range, %D as a 3-point mean).
//!
//! %K = 100 * (close - lowest_low) / (highest_high - lowest_low).
//! Degenerate range (high == low) → 50. Fewer bars than the period → 50/50.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

pub const STOCH_PERIOD: usize = 14;
pub const STOCH_SMOOTH: usize = 3;

pub const OVERBOUGHT: f64 = 80.0;
pub const OVERSOLD: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StochZone {
    Overbought,
    Oversold,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochOutput {
    pub k: f64,
    pub d: f64,
    pub zone: StochZone,
}

impl Default for StochOutput {
    fn default() -> Self {
        Self {
            k: 50.0,
            d: 50.0,
            zone: StochZone::Neutral,
        }
    }
}

/// %K at the last bar of `bars`, using the trailing `period` window.
fn percent_k(bars: &[PriceBar], period: usize) -> f64 {
    if bars.len() < period {
        return 50.0;
    }
    let window = &bars[bars.len() - period..];
    let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let highest = window
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let range = highest - lowest;
    if range <= 0.0 {
        return 50.0;
    }
    let close = window[window.len() - 1].close;
    100.0 * (close - lowest) / range
}

/// Latest stochastic: %K on the full series, %D as the mean of the last
/// `STOCH_SMOOTH` per-prefix %K values.
pub fn stochastic_latest(bars: &[PriceBar], period: usize) -> StochOutput {
    if bars.len() < period {
        return StochOutput::default();
    }
    let k = percent_k(bars, period);
    let smooth = STOCH_SMOOTH.min(bars.len() - period + 1);
    let mut sum = 0.0;
    for back in 0..smooth {
        sum += percent_k(&bars[..bars.len() - back], period);
    }
    let d = sum / smooth as f64;
    let zone = classify_zone(k);
    StochOutput { k, d, zone }
}

fn classify_zone(k: f64) -> StochZone {
    if k > OVERBOUGHT {
        StochZone::Overbought
    } else if k < OVERSOLD {
        StochZone::Oversold
    } else {
        StochZone::Neutral
    }
}
