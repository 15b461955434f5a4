//! Relative Strength Index with Wilder smoothing.
//!
//! Seed: average gain and average loss over the first `period` deltas.
//! Recurrence: avg = (avg * (period - 1) + new) / period.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Edge cases: avg_loss == 0 && avg_gain == 0 → 50; avg_loss == 0 → 100.
//! Fewer than period + 1 closes → 50 (neutral sentinel).

const NEUTRAL_RSI: f64 = 50.0;

/// Latest Wilder RSI over the whole series.
pub fn rsi_latest(closes: &[f64], period: usize) -> f64 {
    let mut state = RsiState::new(period);
    let mut rsi = NEUTRAL_RSI;
    for &close in closes {
        rsi = state.update(close);
    }
    rsi
}

/// Incremental Wilder RSI accumulator, O(1) per bar.
#[derive(Debug, Clone)]
pub struct RsiState {
    period: usize,
    prev_close: Option<f64>,
    deltas_seen: usize,
    seed_gain: f64,
    seed_loss: f64,
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            prev_close: None,
            deltas_seen: 0,
            seed_gain: 0.0,
            seed_loss: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    /// Feed the next close and return the current RSI (50 until seeded).
    pub fn update(&mut self, close: f64) -> f64 {
        let Some(prev) = self.prev_close.replace(close) else {
            return NEUTRAL_RSI;
        };
        let delta = close - prev;
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };
        self.deltas_seen += 1;

        if self.deltas_seen <= self.period {
            self.seed_gain += gain;
            self.seed_loss += loss;
            if self.deltas_seen == self.period {
                self.avg_gain = self.seed_gain / self.period as f64;
                self.avg_loss = self.seed_loss / self.period as f64;
            }
        } else {
            let p = self.period as f64;
            self.avg_gain = (self.avg_gain * (p - 1.0) + gain) / p;
            self.avg_loss = (self.avg_loss * (p - 1.0) + loss) / p;
        }
        self.current()
    }

    pub fn current(&self) -> f64 {
        if self.deltas_seen < self.period {
            return NEUTRAL_RSI;
        }
        compute_rsi(self.avg_gain, self.avg_loss)
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        NEUTRAL_RSI // no movement at all
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rsi_short_series_is_neutral() {
        assert_eq!(rsi_latest(&[100.0, 101.0], 14), 50.0);
        assert_eq!(rsi_latest(&[], 14), 50.0);
    }

    #[test]
    fn rsi_all_gains_saturates_at_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_approx(rsi_latest(&closes, 14), 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert_approx(rsi_latest(&closes, 14), 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_flat_series_is_neutral() {
        let closes = vec![100.0; 30];
        assert_eq!(rsi_latest(&closes, 14), 50.0);
    }

    #[test]
    fn rsi_mixed_stays_in_bounds() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.8).sin() * 5.0)
            .collect();
        let rsi = rsi_latest(&closes, 14);
        assert!((0.0..=100.0).contains(&rsi), "RSI out of bounds: {rsi}");
        assert!(rsi > 0.0 && rsi < 100.0);
    }

    #[test]
    fn rsi_known_seed_value() {
        // Closes: 44, 44.34, 44.09, 43.61, 44.33 with period 3.
        // Deltas: +0.34, -0.25, -0.48, +0.72.
        // Seed over first 3: avg_gain = 0.34/3, avg_loss = 0.73/3.
        // One Wilder step with delta +0.72:
        //   avg_gain = (0.34/3 * 2 + 0.72)/3, avg_loss = (0.73/3 * 2)/3.
        let closes = [44.0, 44.34, 44.09, 43.61, 44.33];
        let avg_gain = (0.34 / 3.0 * 2.0 + 0.72) / 3.0;
        let avg_loss = (0.73 / 3.0 * 2.0) / 3.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert_approx(rsi_latest(&closes, 3), expected, 1e-10);
    }

    #[test]
    fn incremental_matches_batch() {
        let closes: Vec<f64> = (0..50)
            .map(|i| 100.0 + (i as f64 * 1.3).sin() * 3.0)
            .collect();
        let mut state = RsiState::new(14);
        for (i, &c) in closes.iter().enumerate() {
            let incremental = state.update(c);
            let batch = rsi_latest(&closes[..=i], 14);
            assert_approx(incremental, batch, DEFAULT_EPSILON);
        }
    }
}
