//! MACD: fast/slow EMA spread with a signal-line EMA over the spread.
//!
//! Direction is bullish iff histogram > 0 once the slow window is filled;
//! shorter series report zeros with a neutral direction.

use serde::{Deserialize, Serialize};

use super::ema::EmaState;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacdDirection {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
    pub direction: MacdDirection,
}

impl Default for MacdOutput {
    fn default() -> Self {
        Self {
            line: 0.0,
            signal: 0.0,
            histogram: 0.0,
            direction: MacdDirection::Neutral,
        }
    }
}

/// Latest MACD over the whole series.
pub fn macd_latest(closes: &[f64]) -> MacdOutput {
    let mut state = MacdState::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let mut out = MacdOutput::default();
    for &close in closes {
        out = state.update(close);
    }
    out
}

/// Incremental MACD accumulator: three EMA recurrences, O(1) per bar.
#[derive(Debug, Clone)]
pub struct MacdState {
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
    slow_period: usize,
    count: usize,
}

impl MacdState {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast < slow, "MACD fast period must be below slow period");
        Self {
            fast: EmaState::new(fast),
            slow: EmaState::new(slow),
            signal: EmaState::new(signal),
            slow_period: slow,
            count: 0,
        }
    }

    pub fn update(&mut self, close: f64) -> MacdOutput {
        self.fast.update(close);
        self.slow.update(close);
        let line = self.fast.raw() - self.slow.raw();
        self.signal.update(line);
        self.count += 1;
        self.current()
    }

    pub fn current(&self) -> MacdOutput {
        if self.count < self.slow_period {
            return MacdOutput::default();
        }
        let line = self.fast.raw() - self.slow.raw();
        let signal = self.signal.raw();
        let histogram = line - signal;
        let direction = if histogram > 0.0 {
            MacdDirection::Bullish
        } else {
            MacdDirection::Bearish
        };
        MacdOutput {
            line,
            signal,
            histogram,
            direction,
        }
    }
}
