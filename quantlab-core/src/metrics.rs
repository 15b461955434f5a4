//! Performance metrics over a closed-trade ledger and its equity curve.
//!
//! Every figure is derived deterministically from the inputs and every
//! output is finite: degenerate inputs (no trades, no losses, flat equity)
//! resolve to zeros or documented fallbacks, never NaN or infinity.

use serde::{Deserialize, Serialize};

use crate::domain::Trade;

/// Floor for the gross-loss denominator of the profit factor, in percent.
const GROSS_LOSS_FLOOR_PCT: f64 = 0.01;

const ZERO_STD_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate_pct: f64,
    pub profit_factor: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub gross_profit_pct: f64,
    pub gross_loss_pct: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    /// Deepest peak-to-trough equity drop, as a non-positive percentage.
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub recovery_factor: f64,
    pub total_return_pct: f64,
}

impl Metrics {
    /// The flagged result for an empty ledger: `total_trades == 0`, every
    /// figure zero.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn compute(trades: &[Trade], equity_curve: &[f64], annualization: f64) -> Self {
        if trades.is_empty() {
            return Self::empty();
        }

        // ─── ledger aggregates ───
        let returns: Vec<f64> = trades.iter().map(|t| t.pnl_fraction).collect();
        let wins = trades.iter().filter(|t| t.is_winner()).count();
        let losses = trades.len() - wins;
        let win_rate_pct = wins as f64 / trades.len() as f64 * 100.0;

        let gross_profit_pct: f64 = returns.iter().filter(|r| **r > 0.0).sum::<f64>() * 100.0;
        let gross_loss_pct: f64 = -returns.iter().filter(|r| **r <= 0.0).sum::<f64>() * 100.0;
        let profit_factor = gross_profit_pct / gross_loss_pct.max(GROSS_LOSS_FLOOR_PCT);

        let avg_win_pct = if wins > 0 {
            gross_profit_pct / wins as f64
        } else {
            0.0
        };
        let avg_loss_pct = if losses > 0 {
            gross_loss_pct / losses as f64
        } else {
            0.0
        };
        let (max_consecutive_wins, max_consecutive_losses) = streaks(trades);

        // ─── equity-curve figures ───
        let total_return_pct =
            (equity_curve.last().copied().unwrap_or(1.0) - 1.0) * 100.0;
        let max_drawdown_pct = max_drawdown_pct(equity_curve);
        let sharpe_ratio = sharpe(&returns, annualization);
        let sortino_ratio = sortino(&returns, annualization, sharpe_ratio);
        let calmar_ratio = ratio_over_drawdown(total_return_pct, max_drawdown_pct);
        let recovery_factor = ratio_over_drawdown(total_return_pct, max_drawdown_pct);

        Self {
            total_trades: trades.len(),
            wins,
            losses,
            win_rate_pct,
            profit_factor,
            avg_win_pct,
            avg_loss_pct,
            gross_profit_pct,
            gross_loss_pct,
            max_consecutive_wins,
            max_consecutive_losses,
            max_drawdown_pct,
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            recovery_factor,
            total_return_pct,
        }
    }
}

fn streaks(trades: &[Trade]) -> (usize, usize) {
    let mut max_wins = 0usize;
    let mut max_losses = 0usize;
    let mut run_wins = 0usize;
    let mut run_losses = 0usize;
    for trade in trades {
        if trade.is_winner() {
            run_wins += 1;
            run_losses = 0;
        } else {
            run_losses += 1;
            run_wins = 0;
        }
        max_wins = max_wins.max(run_wins);
        max_losses = max_losses.max(run_losses);
    }
    (max_wins, max_losses)
}

/// Deepest drop from a running equity peak, ≤ 0, in percent.
fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &equity in equity_curve {
        peak = peak.max(equity);
        if peak > 0.0 {
            worst = worst.min((equity - peak) / peak);
        }
    }
    worst * 100.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

fn sharpe(returns: &[f64], annualization: f64) -> f64 {
    let std = population_std(returns);
    if std < ZERO_STD_EPSILON {
        return 0.0;
    }
    mean(returns) / std * annualization.sqrt()
}

/// Sortino penalizes only downside deviation; with no losing returns there
/// is no downside to measure, so it falls back to the Sharpe figure.
fn sortino(returns: &[f64], annualization: f64, sharpe_fallback: f64) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.is_empty() {
        return sharpe_fallback;
    }
    let downside_std =
        (downside.iter().map(|r| r.powi(2)).sum::<f64>() / returns.len() as f64).sqrt();
    if downside_std < ZERO_STD_EPSILON {
        return sharpe_fallback;
    }
    mean(returns) / downside_std * annualization.sqrt()
}

fn ratio_over_drawdown(total_return_pct: f64, max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct == 0.0 {
        return 0.0;
    }
    total_return_pct / max_drawdown_pct.abs()
}
