//! Average True Range with Wilder smoothing.
//!
//! TR = max(high - low, |high - prev_close|, |low - prev_close|); the first
//! bar uses high - low. Seed: mean of the first `period` true ranges, then
//! ATR = (ATR * (period - 1) + TR) / period. Fewer bars than the period → 0.

use crate::domain::PriceBar;

pub const ATR_PERIOD: usize = 14;

/// Latest Wilder ATR over the whole series.
pub fn atr_latest(bars: &[PriceBar], period: usize) -> f64 {
    let mut state = AtrState::new(period);
    let mut atr = 0.0;
    for bar in bars {
        atr = state.update(bar);
    }
    atr
}

/// Incremental Wilder ATR accumulator, O(1) per bar.
#[derive(Debug, Clone)]
pub struct AtrState {
    period: usize,
    prev_close: Option<f64>,
    trs_seen: usize,
    seed_sum: f64,
    value: f64,
}

impl AtrState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            prev_close: None,
            trs_seen: 0,
            seed_sum: 0.0,
            value: 0.0,
        }
    }

    /// Feed the next bar and return the current ATR (0 until seeded).
    pub fn update(&mut self, bar: &PriceBar) -> f64 {
        let tr = match self.prev_close.replace(bar.close) {
            Some(prev) => (bar.high - bar.low)
                .max((bar.high - prev).abs())
                .max((bar.low - prev).abs()),
            None => bar.high - bar.low,
        };
        self.trs_seen += 1;

        if self.trs_seen <= self.period {
            self.seed_sum += tr;
            if self.trs_seen == self.period {
                self.value = self.seed_sum / self.period as f64;
            }
        } else {
            let p = self.period as f64;
            self.value = (self.value * (p - 1.0) + tr) / p;
        }
        self.current()
    }

    pub fn current(&self) -> f64 {
        if self.trs_seen < self.period {
            0.0
        } else {
            self.value
        }
    }
}
