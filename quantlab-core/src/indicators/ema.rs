//! Exponential Moving Average seeded with the first close.
//!
//! Recursive: EMA[t] = close[t] * k + EMA[t-1] * (1 - k), k = 2/(period+1).
//! Seed: EMA[0] = close[0].
//! Fewer closes than the period → the latest close (neutral trend sentinel).

/// Latest EMA value over the whole series.
pub fn ema_latest(closes: &[f64], period: usize) -> f64 {
    let Some(&last) = closes.last() else {
        return 0.0;
    };
    if closes.len() < period {
        return last;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = closes[0];
    for &price in &closes[1..] {
        ema = price * k + ema * (1.0 - k);
    }
    ema
}

/// Full EMA series (same recurrence, one value per input).
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() || period == 0 {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = values[0];
    out.push(ema);
    for &v in &values[1..] {
        ema = v * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}

/// Incremental EMA accumulator: one O(1) update per bar, identical results
/// to recomputing `ema_latest` over the growing prefix.
#[derive(Debug, Clone)]
pub struct EmaState {
    k: f64,
    period: usize,
    value: f64,
    count: usize,
    last_input: f64,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            k: 2.0 / (period as f64 + 1.0),
            period,
            value: 0.0,
            count: 0,
            last_input: 0.0,
        }
    }

    /// Feed the next value and return the current EMA (or the sentinel when
    /// fewer values than the period have been seen).
    pub fn update(&mut self, price: f64) -> f64 {
        if self.count == 0 {
            self.value = price;
        } else {
            self.value = price * self.k + self.value * (1.0 - self.k);
        }
        self.count += 1;
        self.last_input = price;
        self.current()
    }

    /// Current EMA; before the warm-up period this is the latest input.
    pub fn current(&self) -> f64 {
        if self.count >= self.period {
            self.value
        } else {
            self.last_input
        }
    }

    /// Raw recurrence value, ignoring the warm-up sentinel. The MACD signal
    /// line uses this form.
    pub fn raw(&self) -> f64 {
        self.value
    }
}
