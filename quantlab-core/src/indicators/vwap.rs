//! Volume-weighted average price over rolling hourly-bar windows.
//!
//! VWAP = Σ(typical_price * volume) / Σ(volume) over the trailing window,
//! with typical price (high + low + close) / 3. Window lengths assume hourly
//! bars: 24 (day), 168 (week), 720 (month), 2160 (quarter), and the whole
//! series (year-to-date). Zero traded volume in a window falls back to the
//! last close.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

pub const VWAP_DAILY_BARS: usize = 24;
pub const VWAP_WEEKLY_BARS: usize = 168;
pub const VWAP_MONTHLY_BARS: usize = 720;
pub const VWAP_QUARTERLY_BARS: usize = 2160;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VwapLevels {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
    pub quarterly: f64,
    pub yearly: f64,
}

/// VWAP levels at the last bar of the series.
pub fn vwap_latest(bars: &[PriceBar]) -> VwapLevels {
    let mut state = VwapState::new();
    let mut levels = VwapLevels::default();
    for bar in bars {
        levels = state.update(bar);
    }
    levels
}

/// Incremental VWAP accumulator. Prefix sums of price*volume and volume make
/// every trailing-window query a pair of subtractions.
#[derive(Debug, Clone, Default)]
pub struct VwapState {
    cum_pv: Vec<f64>,
    cum_vol: Vec<f64>,
    last_close: f64,
}

impl VwapState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bar: &PriceBar) -> VwapLevels {
        let prev_pv = self.cum_pv.last().copied().unwrap_or(0.0);
        let prev_vol = self.cum_vol.last().copied().unwrap_or(0.0);
        self.cum_pv.push(prev_pv + bar.typical_price() * bar.volume);
        self.cum_vol.push(prev_vol + bar.volume);
        self.last_close = bar.close;
        self.current()
    }

    pub fn current(&self) -> VwapLevels {
        VwapLevels {
            daily: self.window_vwap(VWAP_DAILY_BARS),
            weekly: self.window_vwap(VWAP_WEEKLY_BARS),
            monthly: self.window_vwap(VWAP_MONTHLY_BARS),
            quarterly: self.window_vwap(VWAP_QUARTERLY_BARS),
            yearly: self.window_vwap(usize::MAX),
        }
    }

    fn window_vwap(&self, window: usize) -> f64 {
        let n = self.cum_pv.len();
        if n == 0 {
            return 0.0;
        }
        let start = n.saturating_sub(window);
        let (base_pv, base_vol) = if start == 0 {
            (0.0, 0.0)
        } else {
            (self.cum_pv[start - 1], self.cum_vol[start - 1])
        };
        let vol = self.cum_vol[n - 1] - base_vol;
        if vol <= 0.0 {
            return self.last_close;
        }
        (self.cum_pv[n - 1] - base_pv) / vol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn vwap_empty_is_zero() {
        assert_eq!(vwap_latest(&[]), VwapLevels::default());
    }

    #[test]
    fn vwap_flat_series_equals_typical_price() {
        let bars = make_bars(&[100.0; 30]);
        let levels = vwap_latest(&bars);
        let tp = bars[0].typical_price();
        assert_approx(levels.daily, tp, DEFAULT_EPSILON);
        assert_approx(levels.yearly, tp, DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_daily_window_is_trailing_24_bars() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let levels = vwap_latest(&bars);
        let window = &bars[bars.len() - VWAP_DAILY_BARS..];
        let pv: f64 = window.iter().map(|b| b.typical_price() * b.volume).sum();
        let vol: f64 = window.iter().map(|b| b.volume).sum();
        assert_approx(levels.daily, pv / vol, DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_zero_volume_falls_back_to_last_close() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        for bar in &mut bars {
            bar.volume = 0.0;
        }
        let levels = vwap_latest(&bars);
        assert_approx(levels.daily, 102.0, DEFAULT_EPSILON);
        assert_approx(levels.yearly, 102.0, DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_uptrend_daily_sits_above_yearly() {
        let closes: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let levels = vwap_latest(&bars);
        assert!(levels.daily > levels.yearly);
    }

    #[test]
    fn incremental_matches_batch() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.4).sin() * 5.0)
            .collect();
        let bars = make_bars(&closes);
        let mut state = VwapState::new();
        for (i, bar) in bars.iter().enumerate() {
            let incremental = state.update(bar);
            let batch = vwap_latest(&bars[..=i]);
            assert_approx(incremental.daily, batch.daily, DEFAULT_EPSILON);
            assert_approx(incremental.yearly, batch.yearly, DEFAULT_EPSILON);
        }
    }
}
