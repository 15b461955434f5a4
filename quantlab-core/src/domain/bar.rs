//! PriceBar — the fundamental market data unit.

use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument at a single open time.
///
/// `open_time` is a unix timestamp in milliseconds. Within a series it is
/// strictly increasing with no duplicates — the ingestion boundary validates
/// this once; everything downstream assumes it and consumes bars read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Typical price: (high + low + close) / 3. VWAP and volume profile
    /// anchor on this rather than the close.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Basic OHLCV sanity check: finite fields, high >= low, the body
    /// inside the range, positive prices, non-negative volume.
    pub fn is_sane(&self) -> bool {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }
}
