//! Commodity Channel Index over closes.
//!
//! CCI = (close - SMA) / (0.015 * mean absolute deviation), computed on the
//! trailing `period` closes. Zero deviation → 0. Short series → 0.

pub const CCI_PERIOD: usize = 20;

const CCI_SCALE: f64 = 0.015;

/// Latest CCI over the trailing `period` closes.
pub fn cci_latest(closes: &[f64], period: usize) -> f64 {
    if closes.len() < period || period == 0 {
        return 0.0;
    }
    let window = &closes[closes.len() - period..];
    let n = period as f64;
    let sma = window.iter().sum::<f64>() / n;
    let mean_dev = window.iter().map(|c| (c - sma).abs()).sum::<f64>() / n;
    if mean_dev == 0.0 {
        return 0.0;
    }
    (window[window.len() - 1] - sma) / (CCI_SCALE * mean_dev)
}
