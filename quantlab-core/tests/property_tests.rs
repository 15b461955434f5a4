//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Kelly bounds — the clamped fraction never leaves [0.001, 0.25]
//! 2. Signal monotonicity — more bullish evidence never lowers the tally
//! 3. Equity accounting — the curve compounds exactly one factor per trade
//! 4. Ratchet monotonicity — stops only tighten, never loosen

use proptest::prelude::*;
use quantlab_core::domain::{ExitReason, Position, PriceBar, Side, Trade};
use quantlab_core::engine::{run_backtest, BacktestConfig};
use quantlab_core::indicators::IndicatorSnapshot;
use quantlab_core::metrics::Metrics;
use quantlab_core::signal::{classify, Direction};
use quantlab_core::stats::{kelly::kelly_sizing, StatsConfig};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_pnl() -> impl Strategy<Value = f64> {
    (-0.2..0.2_f64).prop_map(|p| (p * 1_000.0).round() / 1_000.0)
}

fn arb_rsi() -> impl Strategy<Value = f64> {
    0.0..100.0_f64
}

fn ledger_from(pnls: &[f64]) -> (Vec<Trade>, Vec<f64>) {
    let mut equity = vec![1.0];
    let trades = pnls
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
    (trades, equity)
}

// ── 1. Kelly bounds ──────────────────────────────────────────────────

proptest! {
    /// For any ledger the clamped Kelly fraction stays inside its bounds
    /// and the adjusted fraction never exceeds the raw one.
    #[test]
    fn kelly_fraction_is_bounded(pnls in prop::collection::vec(arb_pnl(), 5..200)) {
        let (trades, equity) = ledger_from(&pnls);
        let metrics = Metrics::compute(&trades, &equity, 252.0);
        let sizing = kelly_sizing(&metrics, &StatsConfig::default());

        prop_assert!(sizing.kelly_fraction >= 0.0);
        prop_assert!(sizing.kelly_fraction <= 0.25);
        prop_assert!(sizing.adjusted_kelly <= sizing.kelly_fraction + 1e-12);
        prop_assert!(sizing.adjusted_kelly >= 0.0);
    }
}

// ── 2. Signal monotonicity ───────────────────────────────────────────

fn direction_rank(d: Direction) -> u8 {
    match d {
        Direction::Bullish => 2,
        Direction::Neutral => 1,
        Direction::Bearish => 0,
    }
}

proptest! {
    /// Dropping RSI from a neutral reading into oversold territory never
    /// makes the verdict more bearish.
    #[test]
    fn deeper_oversold_never_reads_more_bearish(rsi in arb_rsi()) {
        let base = IndicatorSnapshot {
            close: 100.0,
            rsi,
            ema_fast: 101.0,
            ema_slow: 100.0,
            ..IndicatorSnapshot::default()
        };
        let oversold = IndicatorSnapshot { rsi: rsi.min(25.0), ..base.clone() };

        let before = classify(&base, false);
        let after = classify(&oversold, false);
        prop_assert!(direction_rank(after.direction) >= direction_rank(before.direction));
    }

    /// Pushing RSI past the overbought threshold never makes the verdict
    /// more bullish.
    #[test]
    fn deeper_overbought_never_reads_more_bullish(rsi in arb_rsi()) {
        let base = IndicatorSnapshot {
            close: 100.0,
            rsi,
            ema_fast: 101.0,
            ema_slow: 100.0,
            ..IndicatorSnapshot::default()
        };
        let overbought = IndicatorSnapshot { rsi: rsi.max(75.0), ..base.clone() };

        let before = classify(&base, false);
        let after = classify(&overbought, false);
        prop_assert!(direction_rank(after.direction) <= direction_rank(before.direction));
    }

    /// Lifting the fast EMA from below the slow EMA to above it never
    /// lowers the verdict, whatever the rest of the snapshot says.
    #[test]
    fn fast_ema_above_slow_never_reads_more_bearish(rsi in arb_rsi(), gap in 0.1..10.0_f64) {
        let below = IndicatorSnapshot {
            close: 100.0,
            rsi,
            ema_fast: 100.0 - gap,
            ema_slow: 100.0,
            ..IndicatorSnapshot::default()
        };
        let above = IndicatorSnapshot { ema_fast: 100.0 + gap, ..below.clone() };

        let crossed_down = classify(&below, false);
        let crossed_up = classify(&above, false);
        prop_assert!(direction_rank(crossed_up.direction) >= direction_rank(crossed_down.direction));
    }
}

// ── 3. Equity accounting ─────────────────────────────────────────────

proptest! {
    /// The simulator's equity curve is exactly the compounded product of
    /// its own trade returns, regardless of the price path.
    #[test]
    fn equity_curve_compounds_trade_returns(
        seed_amp in 1.0..30.0_f64,
        seed_freq in 0.05..0.5_f64,
        drift in -0.1..0.1_f64,
    ) {
        let closes: Vec<f64> = (0..300)
            .map(|i| 200.0 + (i as f64 * seed_freq).sin() * seed_amp + i as f64 * drift)
            .collect();
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                open_time: i as i64 * 3_600_000,
                open: if i == 0 { close } else { closes[i - 1] },
                high: close * 1.003,
                low: close * 0.997,
                close,
                volume: 1_000.0,
            })
            .collect();
        let config = BacktestConfig { allow_short: true, ..BacktestConfig::default() };
        let run = run_backtest(&bars, &config).unwrap();

        prop_assert_eq!(run.equity_curve.len(), run.trades.len() + 1);
        let mut equity = 1.0;
        for (k, trade) in run.trades.iter().enumerate() {
            equity *= 1.0 + trade.pnl_fraction;
            prop_assert!((run.equity_curve[k + 1] - equity).abs() < 1e-9);
        }
    }
}

// ── 4. Ratchet monotonicity ──────────────────────────────────────────

proptest! {
    /// A long stop never moves down, a short stop never moves up, no
    /// matter what candidate sequence is offered.
    #[test]
    fn stops_only_tighten(candidates in prop::collection::vec(50.0..150.0_f64, 1..50)) {
        let mut long = Position::open_long(100.0, 90.0, 120.0, 0);
        let mut short = Position::open_short(100.0, 110.0, 80.0, 0);
        for &candidate in &candidates {
            let prev_long = long.stop_loss;
            let prev_short = short.stop_loss;
            long.ratchet_stop(candidate);
            short.ratchet_stop(candidate);
            prop_assert!(long.stop_loss >= prev_long);
            prop_assert!(short.stop_loss <= prev_short);
        }
    }
}
