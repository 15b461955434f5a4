//! Statistical risk adjustment on top of the raw performance metrics.
//!
//! Four estimators run over the closed-trade ledger: Kelly position sizing,
//! a Bayesian posterior on the win probability, a law-of-large-numbers
//! convergence check, and a central-limit normality test. Their outputs
//! combine into two heuristic dampeners, `risk_adjusted_drawdown` and
//! `adjusted_sharpe` — policy figures, not statistical identities.

pub mod bayes;
pub mod clt;
pub mod kelly;
pub mod lln;

pub use bayes::BayesianEstimate;
pub use clt::CltResult;
pub use kelly::KellySizing;
pub use lln::LlnResult;

use serde::{Deserialize, Serialize};

use crate::domain::Trade;
use crate::metrics::Metrics;

/// Knobs of the risk-adjustment layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Multiplier on the confidence-scaled Kelly fraction (0.5 = half-Kelly).
    pub kelly_safety_fraction: f64,
    /// Trades required before the convergence test says anything.
    pub lln_min_trades: usize,
    /// Trades summed per window for the normality test.
    pub clt_window: usize,
    /// Capital the dollar position size is quoted against.
    pub initial_capital: f64,
    /// Confidence level for the convergence test (0.95 → α = 0.05).
    pub confidence_level: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            kelly_safety_fraction: 0.5,
            lln_min_trades: 30,
            clt_window: 5,
            initial_capital: 10_000.0,
            confidence_level: 0.95,
        }
    }
}

/// The combined risk-adjustment report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalAdjustment {
    pub kelly: KellySizing,
    pub bayes: BayesianEstimate,
    pub lln: LlnResult,
    pub clt: CltResult,
    /// `max_drawdown_pct · (1 − adjusted_kelly)` — smaller stake, shallower
    /// realized drawdown.
    pub risk_adjusted_drawdown_pct: f64,
    /// `sharpe · (1 + adjusted_kelly)`.
    pub adjusted_sharpe: f64,
}

impl StatisticalAdjustment {
    pub fn compute(metrics: &Metrics, trades: &[Trade], config: &StatsConfig) -> Self {
        let returns: Vec<f64> = trades.iter().map(|t| t.pnl_fraction).collect();

        let kelly = kelly::kelly_sizing(metrics, config);
        let bayes = bayes::bayesian_win_estimate(metrics.win_rate_pct / 100.0);
        let lln = lln::convergence_test(&returns, config);
        let clt = clt::normality_test(&returns, config);

        let risk_adjusted_drawdown_pct =
            metrics.max_drawdown_pct * (1.0 - kelly.adjusted_kelly);
        let adjusted_sharpe = metrics.sharpe_ratio * (1.0 + kelly.adjusted_kelly);

        Self {
            kelly,
            bayes,
            lln,
            clt,
            risk_adjusted_drawdown_pct,
            adjusted_sharpe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, Side};

    fn ledger(pnls: &[f64]) -> (Metrics, Vec<Trade>) {
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
        (Metrics::compute(&trades, &equity, 252.0), trades)
    }

    #[test]
    fn adjustment_dampens_drawdown_and_lifts_sharpe() {
        let pnls: Vec<f64> = (0..60)
            .map(|i| if i % 3 == 0 { -0.02 } else { 0.03 })
            .collect();
        let (metrics, trades) = ledger(&pnls);
        let adj = StatisticalAdjustment::compute(&metrics, &trades, &StatsConfig::default());
        assert!(adj.kelly.adjusted_kelly > 0.0);
        assert!(adj.risk_adjusted_drawdown_pct.abs() <= metrics.max_drawdown_pct.abs());
        assert!(adj.adjusted_sharpe >= metrics.sharpe_ratio);
    }

    #[test]
    fn empty_ledger_degrades_gracefully() {
        let adj =
            StatisticalAdjustment::compute(&Metrics::empty(), &[], &StatsConfig::default());
        assert!(!adj.lln.converged);
        assert!(!adj.clt.normal);
        assert_eq!(adj.risk_adjusted_drawdown_pct, 0.0);
        assert_eq!(adj.adjusted_sharpe, 0.0);
    }
}
