//! Volatility estimation and volatility-aware position sizing.
//!
//! Two estimators — realized volatility of log returns and a GARCH(1,1)
//! recurrence — both clamped to [0.001, 0.5] per-bar, a coarse regime
//! bucketing, and a sizer that combines fractional Kelly with a hard
//! risk-per-trade cap derived from the stop distance.

use serde::{Deserialize, Serialize};

pub const VOL_MIN: f64 = 0.001;
pub const VOL_MAX: f64 = 0.5;
/// Reported when there is too little history to estimate anything.
pub const VOL_FALLBACK: f64 = 0.02;

pub const REALIZED_VOL_WINDOW: usize = 20;

const GARCH_ALPHA: f64 = 0.1;
const GARCH_BETA: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolRegime {
    VeryLow,
    Low,
    Moderate,
    High,
    Extreme,
}

impl VolRegime {
    pub fn from_volatility(vol: f64) -> Self {
        if vol < 0.01 {
            Self::VeryLow
        } else if vol < 0.02 {
            Self::Low
        } else if vol < 0.04 {
            Self::Moderate
        } else if vol < 0.08 {
            Self::High
        } else {
            Self::Extreme
        }
    }
}

fn log_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect()
}

/// Standard deviation of log returns over the trailing window, per bar.
pub fn realized_volatility(closes: &[f64]) -> f64 {
    let returns = log_returns(closes);
    if returns.len() < 2 {
        return VOL_FALLBACK;
    }
    let start = returns.len().saturating_sub(REALIZED_VOL_WINDOW);
    let window = &returns[start..];
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt().clamp(VOL_MIN, VOL_MAX)
}

/// GARCH(1,1) one-step volatility: omega anchored to the mean squared
/// return so the process is stationary around the sample level.
pub fn garch_volatility(closes: &[f64]) -> f64 {
    let returns = log_returns(closes);
    if returns.len() < REALIZED_VOL_WINDOW {
        return realized_volatility(closes);
    }
    let mean_sq = returns.iter().map(|r| r * r).sum::<f64>() / returns.len() as f64;
    let omega = (1.0 - GARCH_ALPHA - GARCH_BETA) * mean_sq;
    let mut variance = mean_sq;
    for r in &returns {
        variance = omega + GARCH_ALPHA * r * r + GARCH_BETA * variance;
    }
    variance.max(0.0).sqrt().clamp(VOL_MIN, VOL_MAX)
}

/// Fractional-Kelly sizer with a stop-distance risk cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionSizer {
    /// Fraction of full Kelly actually deployed (0.25 = quarter-Kelly).
    pub fractional_kelly: f64,
    /// Largest capital fraction a single stopped-out trade may lose.
    pub max_risk_per_trade: f64,
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self {
            fractional_kelly: 0.25,
            max_risk_per_trade: 0.02,
        }
    }
}

impl PositionSizer {
    /// Dollar stake for one trade. `stop_distance_fraction` is the stop's
    /// distance from entry relative to the entry price.
    pub fn position_size(
        &self,
        capital: f64,
        kelly_fraction: f64,
        stop_distance_fraction: f64,
    ) -> f64 {
        if capital <= 0.0 {
            return 0.0;
        }
        let kelly_stake = (kelly_fraction * self.fractional_kelly).max(0.0) * capital;
        if stop_distance_fraction <= 0.0 {
            return kelly_stake;
        }
        let risk_cap = capital * self.max_risk_per_trade / stop_distance_fraction;
        kelly_stake.min(risk_cap)
    }
}

/// Horizon the ruin estimate is quoted over.
pub const RUIN_HORIZON_TRADES: usize = 100;

/// Volatility read of one bar series plus the stake the sizer would put
/// on at the given Kelly fraction. This is what the reporting surface
/// prints next to the Kelly block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityReport {
    pub realized: f64,
    pub garch: f64,
    pub regime: VolRegime,
    pub suggested_stake: f64,
    pub ruin_probability: f64,
}

impl VolatilityReport {
    /// Build the report from closes and the strategy's sizing inputs.
    /// `win_rate` is a fraction in [0, 1]; the stop distance handed to the
    /// sizer is proxied by the realized per-bar volatility.
    pub fn from_closes(closes: &[f64], capital: f64, kelly_fraction: f64, win_rate: f64) -> Self {
        let realized = realized_volatility(closes);
        let garch = garch_volatility(closes);
        let sizer = PositionSizer::default();
        Self {
            realized,
            garch,
            regime: VolRegime::from_volatility(realized),
            suggested_stake: sizer.position_size(capital, kelly_fraction, realized),
            ruin_probability: ruin_probability(win_rate, kelly_fraction, RUIN_HORIZON_TRADES),
        }
    }
}

/// Gambler's-ruin style estimate: `((1−W)/W)^(kelly·n)`, clamped to [0, 1].
/// A sub-coin-flip win rate reads as certain ruin at size.
pub fn ruin_probability(win_rate: f64, kelly_fraction: f64, horizon_trades: usize) -> f64 {
    if win_rate <= 0.0 {
        return 1.0;
    }
    if win_rate >= 1.0 {
        return 0.0;
    }
    let ratio = (1.0 - win_rate) / win_rate;
    let exponent = kelly_fraction.max(0.0) * horizon_trades as f64;
    ratio.powf(exponent).clamp(0.0, 1.0)
}
