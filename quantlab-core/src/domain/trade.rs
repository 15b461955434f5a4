//! Trade — one closed round trip produced by the simulator.

use serde::{Deserialize, Serialize};

use super::Side;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    OpposingSignal,
    EndOfSeries,
}

/// A closed trade. `pnl_fraction` is the return relative to the entry price,
/// sign-flipped for shorts, so positive always means a win. The ordered list
/// of trades from one run is the ledger every metric derives from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl_fraction: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn close(
        side: Side,
        entry_index: usize,
        exit_index: usize,
        entry_price: f64,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Self {
        let raw = (exit_price - entry_price) / entry_price;
        let pnl_fraction = match side {
            Side::Short => -raw,
            _ => raw,
        };
        Self {
            side,
            entry_index,
            exit_index,
            entry_price,
            exit_price,
            pnl_fraction,
            exit_reason,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl_fraction > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_pnl_is_relative_to_entry() {
        let t = Trade::close(Side::Long, 0, 5, 100.0, 110.0, ExitReason::TakeProfit);
        assert!((t.pnl_fraction - 0.10).abs() < 1e-12);
        assert!(t.is_winner());
    }

    #[test]
    fn short_pnl_is_sign_flipped() {
        let t = Trade::close(Side::Short, 0, 5, 100.0, 90.0, ExitReason::TakeProfit);
        assert!((t.pnl_fraction - 0.10).abs() < 1e-12);

        let losing = Trade::close(Side::Short, 0, 5, 100.0, 105.0, ExitReason::StopLoss);
        assert!((losing.pnl_fraction + 0.05).abs() < 1e-12);
        assert!(!losing.is_winner());
    }
}
