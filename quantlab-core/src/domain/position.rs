//! Position — transient state of the backtest state machine.

use serde::{Deserialize, Serialize};

use super::PriceBar;

/// Which side of the market the simulator currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Flat,
    Long,
    Short,
}

/// An open position inside one simulation run.
///
/// Never persisted: created on entry, destroyed on exit. The extremes since
/// entry feed the trailing-stop logic; the stop itself only ever tightens.
#[derive(Debug, Clone)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub entry_index: usize,
    pub highest_since_entry: f64,
    pub lowest_since_entry: f64,
}

impl Position {
    pub fn open_long(entry_price: f64, stop_loss: f64, take_profit: f64, index: usize) -> Self {
        Self {
            side: Side::Long,
            entry_price,
            stop_loss,
            take_profit,
            entry_index: index,
            highest_since_entry: entry_price,
            lowest_since_entry: entry_price,
        }
    }

    pub fn open_short(entry_price: f64, stop_loss: f64, take_profit: f64, index: usize) -> Self {
        Self {
            side: Side::Short,
            entry_price,
            stop_loss,
            take_profit,
            entry_index: index,
            highest_since_entry: entry_price,
            lowest_since_entry: entry_price,
        }
    }

    /// Record the bar's extremes. Called once per bar before exit checks.
    pub fn track_extremes(&mut self, bar: &PriceBar) {
        if bar.high > self.highest_since_entry {
            self.highest_since_entry = bar.high;
        }
        if bar.low < self.lowest_since_entry {
            self.lowest_since_entry = bar.low;
        }
    }

    /// Best unrealized profit as a fraction of entry, measured at the most
    /// favorable price seen since entry (sign-adjusted for shorts).
    pub fn best_unrealized_fraction(&self) -> f64 {
        match self.side {
            Side::Long => (self.highest_since_entry - self.entry_price) / self.entry_price,
            Side::Short => (self.entry_price - self.lowest_since_entry) / self.entry_price,
            Side::Flat => 0.0,
        }
    }

    /// Tighten the stop toward `candidate`; a long stop only moves up, a
    /// short stop only moves down.
    pub fn ratchet_stop(&mut self, candidate: f64) {
        match self.side {
            Side::Long => {
                if candidate > self.stop_loss {
                    self.stop_loss = candidate;
                }
            }
            Side::Short => {
                if candidate < self.stop_loss {
                    self.stop_loss = candidate;
                }
            }
            Side::Flat => {}
        }
    }
}
