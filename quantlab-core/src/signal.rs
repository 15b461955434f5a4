//! Directional signal classifier.
//!
//! Each indicator casts a weighted vote into a bullish or bearish tally:
//! RSI extremes (±2 deep, ±1 shallow), MACD histogram side (±1.5, plus ±0.5
//! once the histogram clears ±0.001), stochastic zone (±1.5), CCI momentum
//! beyond ±100 (±1), and the EMA cross (±2). The bullish share of the total
//! tally becomes a percentage; above 65 reads bullish, below 35 bearish,
//! anything between is neutral at 50. Reported probability is capped at 95.

use serde::{Deserialize, Serialize};

use crate::indicators::{IndicatorSnapshot, MacdDirection, StochZone};

const BULLISH_THRESHOLD: f64 = 65.0;
const BEARISH_THRESHOLD: f64 = 35.0;
const PROBABILITY_CAP: f64 = 95.0;
const MACD_STRONG_HISTOGRAM: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

/// Classifier verdict for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    /// Confidence in the called direction, percent, capped at 95.
    pub probability: f64,
    /// How lopsided the vote was, percent.
    pub confidence: f64,
    /// Net vote margin in raw weight units.
    pub strength: f64,
    pub reasons: Vec<String>,
}

impl Signal {
    pub fn neutral() -> Self {
        Self {
            direction: Direction::Neutral,
            probability: 50.0,
            confidence: 0.0,
            strength: 0.0,
            reasons: Vec::new(),
        }
    }
}

/// Classify one snapshot. `volume_confirmation` adds a half-weight vote when
/// rising volume agrees with the close's side of the daily VWAP.
pub fn classify(snap: &IndicatorSnapshot, volume_confirmation: bool) -> Signal {
    let mut bullish = 0.0_f64;
    let mut bearish = 0.0_f64;
    let mut reasons = Vec::new();

    if snap.rsi < 30.0 {
        bullish += 2.0;
        reasons.push(format!("RSI deeply oversold ({:.1})", snap.rsi));
    } else if snap.rsi < 40.0 {
        bullish += 1.0;
        reasons.push(format!("RSI oversold ({:.1})", snap.rsi));
    } else if snap.rsi > 70.0 {
        bearish += 2.0;
        reasons.push(format!("RSI deeply overbought ({:.1})", snap.rsi));
    } else if snap.rsi > 60.0 {
        bearish += 1.0;
        reasons.push(format!("RSI overbought ({:.1})", snap.rsi));
    }

    match snap.macd.direction {
        MacdDirection::Bullish => {
            bullish += 1.5;
            reasons.push("MACD histogram positive".to_string());
            if snap.macd.histogram > MACD_STRONG_HISTOGRAM {
                bullish += 0.5;
            }
        }
        MacdDirection::Bearish => {
            bearish += 1.5;
            reasons.push("MACD histogram negative".to_string());
            if snap.macd.histogram < -MACD_STRONG_HISTOGRAM {
                bearish += 0.5;
            }
        }
        MacdDirection::Neutral => {}
    }

    match snap.stochastic.zone {
        StochZone::Oversold => {
            bullish += 1.5;
            reasons.push(format!("stochastic oversold (%K {:.1})", snap.stochastic.k));
        }
        StochZone::Overbought => {
            bearish += 1.5;
            reasons.push(format!(
                "stochastic overbought (%K {:.1})",
                snap.stochastic.k
            ));
        }
        StochZone::Neutral => {}
    }

    if snap.cci > 100.0 {
        bullish += 1.0;
        reasons.push(format!("CCI momentum up ({:.0})", snap.cci));
    } else if snap.cci < -100.0 {
        bearish += 1.0;
        reasons.push(format!("CCI momentum down ({:.0})", snap.cci));
    }

    if snap.ema_fast > snap.ema_slow {
        bullish += 2.0;
        reasons.push("fast EMA above slow EMA".to_string());
    } else {
        bearish += 2.0;
        reasons.push("fast EMA at or below slow EMA".to_string());
    }

    if volume_confirmation && snap.volume_rising {
        if snap.close > snap.vwap.daily {
            bullish += 0.5;
            reasons.push("rising volume above daily VWAP".to_string());
        } else if snap.close < snap.vwap.daily {
            bearish += 0.5;
            reasons.push("rising volume below daily VWAP".to_string());
        }
    }

    let total = bullish + bearish;
    if total == 0.0 {
        return Signal::neutral();
    }
    let bullish_pct = bullish / total * 100.0;
    let strength = (bullish - bearish).abs();
    let confidence = (strength * 10.0).min(100.0);

    let (direction, probability) = if bullish_pct > BULLISH_THRESHOLD {
        (Direction::Bullish, bullish_pct.min(PROBABILITY_CAP))
    } else if bullish_pct < BEARISH_THRESHOLD {
        (Direction::Bearish, (100.0 - bullish_pct).min(PROBABILITY_CAP))
    } else {
        (Direction::Neutral, 50.0)
    };

    Signal {
        direction,
        probability,
        confidence,
        strength,
        reasons,
    }
}
