//! Incremental indicator engine.
//!
//! Feeds one bar at a time and keeps the recursive indicators (EMA, RSI,
//! MACD, ATR, VWAP) as O(1) accumulators. The window indicators (stochastic,
//! CCI, volume profile) are recomputed over the retained history, which the
//! engine owns. The snapshot after feeding bar `t` is identical to a batch
//! computation over `bars[..=t]`.

use crate::domain::PriceBar;

use super::{
    cci_latest, stochastic_latest, volume_profile, AtrState, EmaState, IndicatorSnapshot,
    MacdState, RsiState, VwapState, ATR_PERIOD, CCI_PERIOD, EMA_FAST_PERIOD, EMA_SLOW_PERIOD,
    RSI_PERIOD, STOCH_PERIOD, VOLUME_SMA_PERIOD,
};
use super::macd::{MACD_FAST, MACD_SIGNAL, MACD_SLOW};

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    bars: Vec<PriceBar>,
    ema_fast: EmaState,
    ema_slow: EmaState,
    rsi: RsiState,
    macd: MacdState,
    atr: AtrState,
    vwap: VwapState,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            ema_fast: EmaState::new(EMA_FAST_PERIOD),
            ema_slow: EmaState::new(EMA_SLOW_PERIOD),
            rsi: RsiState::new(RSI_PERIOD),
            macd: MacdState::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL),
            atr: AtrState::new(ATR_PERIOD),
            vwap: VwapState::new(),
        }
    }

    pub fn bars_seen(&self) -> usize {
        self.bars.len()
    }

    /// Feed the next bar and return the snapshot at that bar.
    pub fn update(&mut self, bar: &PriceBar) -> IndicatorSnapshot {
        self.ema_fast.update(bar.close);
        self.ema_slow.update(bar.close);
        self.rsi.update(bar.close);
        self.macd.update(bar.close);
        self.atr.update(bar);
        self.vwap.update(bar);
        self.bars.push(bar.clone());
        self.current()
    }

    /// Snapshot at the most recently fed bar.
    pub fn current(&self) -> IndicatorSnapshot {
        let Some(last) = self.bars.last() else {
            return IndicatorSnapshot::default();
        };
        IndicatorSnapshot {
            close: last.close,
            rsi: self.rsi.current(),
            ema_fast: self.ema_fast.current(),
            ema_slow: self.ema_slow.current(),
            macd: self.macd.current(),
            stochastic: stochastic_latest(&self.bars, STOCH_PERIOD),
            cci: cci_of_closes(&self.bars),
            atr: self.atr.current(),
            vwap: self.vwap.current(),
            volume_profile: volume_profile(&self.bars),
            volume_rising: volume_above_average(&self.bars),
        }
    }
}

fn cci_of_closes(bars: &[PriceBar]) -> f64 {
    let start = bars.len().saturating_sub(CCI_PERIOD);
    let closes: Vec<f64> = bars[start..].iter().map(|b| b.close).collect();
    cci_latest(&closes, CCI_PERIOD)
}

fn volume_above_average(bars: &[PriceBar]) -> bool {
    if bars.len() < VOLUME_SMA_PERIOD {
        return false;
    }
    let window = &bars[bars.len() - VOLUME_SMA_PERIOD..];
    let avg = window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64;
    bars[bars.len() - 1].volume > avg
}
