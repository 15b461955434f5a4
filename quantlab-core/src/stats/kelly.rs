//! Kelly-criterion position sizing.
//!
//! f = (W·B − L) / B with B = avg_win / avg_loss, W the win rate and
//! L = 1 − W. The raw fraction is clamped to [0.001, 0.25], scaled by a
//! trade-count confidence ramp (`min(1, trades/100)`) and by the configured
//! safety fraction. Thin or loss-free ledgers get a fixed conservative
//! fallback instead of a formula that would misfire.

use serde::{Deserialize, Serialize};

use crate::metrics::Metrics;

use super::StatsConfig;

pub const KELLY_MIN: f64 = 0.001;
pub const KELLY_MAX: f64 = 0.25;

/// Ledgers smaller than this use the fixed fallback.
pub const MIN_TRADES_FOR_KELLY: usize = 5;

const FALLBACK_KELLY: f64 = 0.02;
const FALLBACK_ADJUSTED: f64 = 0.01;

/// Trades needed before the confidence ramp saturates.
const FULL_CONFIDENCE_TRADES: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KellySizing {
    /// Clamped raw Kelly fraction.
    pub kelly_fraction: f64,
    /// Kelly after the confidence ramp and safety fraction.
    pub adjusted_kelly: f64,
    /// Dollar stake: `adjusted_kelly · initial_capital`.
    pub position_size: f64,
    /// `min(1, trades / 100)`.
    pub trade_confidence: f64,
}

pub fn kelly_sizing(metrics: &Metrics, config: &StatsConfig) -> KellySizing {
    let trade_confidence =
        (metrics.total_trades as f64 / FULL_CONFIDENCE_TRADES).min(1.0);

    if metrics.total_trades < MIN_TRADES_FOR_KELLY || metrics.avg_loss_pct <= 0.0 {
        return KellySizing {
            kelly_fraction: FALLBACK_KELLY,
            adjusted_kelly: FALLBACK_ADJUSTED,
            position_size: FALLBACK_ADJUSTED * config.initial_capital,
            trade_confidence,
        };
    }

    let win_rate = metrics.win_rate_pct / 100.0;
    let payoff = metrics.avg_win_pct / metrics.avg_loss_pct;
    let raw = if payoff > 0.0 {
        (win_rate * payoff - (1.0 - win_rate)) / payoff
    } else {
        0.0
    };
    let kelly_fraction = raw.clamp(KELLY_MIN, KELLY_MAX);
    let adjusted_kelly = kelly_fraction * trade_confidence * config.kelly_safety_fraction;

    KellySizing {
        kelly_fraction,
        adjusted_kelly,
        position_size: adjusted_kelly * config.initial_capital,
        trade_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, Side, Trade};

    fn metrics_for(pnls: &[f64]) -> Metrics {
        let mut equity = vec![1.0];
        let trades: Vec<Trade> = pnls
            .iter()
            .enumerate()
            .map(|(i, &pnl)| {
                let last = *equity.last().unwrap();
                equity.push(last * (1.0 + pnl));
                Trade::close(
                    Side::Long,
                    i,
                    i + 1,
                    100.0,
                    100.0 * (1.0 + pnl),
                    ExitReason::TakeProfit,
                )
            })
            .collect();
        Metrics::compute(&trades, &equity, 252.0)
    }

    #[test]
    fn thin_ledger_uses_the_fallback() {
        let metrics = metrics_for(&[0.05, -0.02, 0.03]);
        let sizing = kelly_sizing(&metrics, &StatsConfig::default());
        assert_eq!(sizing.kelly_fraction, FALLBACK_KELLY);
        assert_eq!(sizing.adjusted_kelly, FALLBACK_ADJUSTED);
    }

    #[test]
    fn loss_free_ledger_uses_the_fallback() {
        let metrics = metrics_for(&[0.05, 0.04, 0.03, 0.02, 0.01, 0.02]);
        let sizing = kelly_sizing(&metrics, &StatsConfig::default());
        assert_eq!(sizing.kelly_fraction, FALLBACK_KELLY);
    }

    #[test]
    fn strong_edge_is_clamped_at_the_cap() {
        // 90% win rate at 3:1 payoff would size far beyond a quarter-Kelly.
        let pnls: Vec<f64> = (0..100)
            .map(|i| if i % 10 == 0 { -0.02 } else { 0.06 })
            .collect();
        let metrics = metrics_for(&pnls);
        let sizing = kelly_sizing(&metrics, &StatsConfig::default());
        assert_eq!(sizing.kelly_fraction, KELLY_MAX);
        assert_eq!(sizing.trade_confidence, 1.0);
        assert!((sizing.adjusted_kelly - KELLY_MAX * 0.5).abs() < 1e-12);
    }

    #[test]
    fn losing_edge_is_floored() {
        let pnls: Vec<f64> = (0..40)
            .map(|i| if i % 4 == 0 { 0.01 } else { -0.03 })
            .collect();
        let metrics = metrics_for(&pnls);
        let sizing = kelly_sizing(&metrics, &StatsConfig::default());
        assert_eq!(sizing.kelly_fraction, KELLY_MIN);
    }

    #[test]
    fn confidence_ramps_with_trade_count() {
        let pnls: Vec<f64> = (0..20)
            .map(|i| if i % 3 == 0 { -0.02 } else { 0.03 })
            .collect();
        let metrics = metrics_for(&pnls);
        let sizing = kelly_sizing(&metrics, &StatsConfig::default());
        assert!((sizing.trade_confidence - 0.2).abs() < 1e-12);
        assert!(sizing.adjusted_kelly < sizing.kelly_fraction);
    }

    #[test]
    fn position_size_scales_with_capital() {
        let pnls: Vec<f64> = (0..60)
            .map(|i| if i % 3 == 0 { -0.02 } else { 0.03 })
            .collect();
        let metrics = metrics_for(&pnls);
        let config = StatsConfig {
            initial_capital: 50_000.0,
            ..StatsConfig::default()
        };
        let sizing = kelly_sizing(&metrics, &config);
        assert!((sizing.position_size - sizing.adjusted_kelly * 50_000.0).abs() < 1e-9);
    }
}
