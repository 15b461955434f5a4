//! Volume profile: volume binned by price, with point of control and value
//! area.
//!
//! The full low..high price range is split into `PROFILE_BINS` equal bins and
//! each bar's volume is spread across the bins its own range overlaps,
//! proportionally to the overlap. The point of control (POC) is the midpoint
//! of the heaviest bin. The value area grows outward from the POC toward the
//! heavier neighbor (downward on ties) until it holds at least 70% of total
//! volume. Fewer than `PROFILE_MIN_BARS` bars → no profile.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

pub const PROFILE_BINS: usize = 30;
pub const PROFILE_MIN_BARS: usize = 10;
pub const VALUE_AREA_FRACTION: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub poc: f64,
    pub value_area_high: f64,
    pub value_area_low: f64,
    pub total_volume: f64,
}

/// Build the profile over the whole series, or `None` when it is too short.
pub fn volume_profile(bars: &[PriceBar]) -> Option<VolumeProfile> {
    if bars.len() < PROFILE_MIN_BARS {
        return None;
    }
    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let high = bars
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let total_volume: f64 = bars.iter().map(|b| b.volume).sum();
    let span = high - low;
    if span <= 0.0 {
        // All trading at a single price level.
        return Some(VolumeProfile {
            poc: low,
            value_area_high: low,
            value_area_low: low,
            total_volume,
        });
    }

    let bin_width = span / PROFILE_BINS as f64;
    let mut bins = [0.0_f64; PROFILE_BINS];
    for bar in bars {
        distribute(&mut bins, bar, low, bin_width);
    }

    let poc_bin = bins
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let (va_low_bin, va_high_bin) = value_area_bins(&bins, poc_bin, total_volume);

    let midpoint = |bin: usize| low + (bin as f64 + 0.5) * bin_width;
    Some(VolumeProfile {
        poc: midpoint(poc_bin),
        value_area_high: midpoint(va_high_bin),
        value_area_low: midpoint(va_low_bin),
        total_volume,
    })
}

/// Spread one bar's volume over the bins its price range overlaps.
fn distribute(bins: &mut [f64; PROFILE_BINS], bar: &PriceBar, low: f64, bin_width: f64) {
    let range = bar.high - bar.low;
    if range <= 0.0 {
        let bin = (((bar.close - low) / bin_width) as usize).min(PROFILE_BINS - 1);
        bins[bin] += bar.volume;
        return;
    }
    for (i, slot) in bins.iter_mut().enumerate() {
        let bin_lo = low + i as f64 * bin_width;
        let bin_hi = bin_lo + bin_width;
        let overlap = bar.high.min(bin_hi) - bar.low.max(bin_lo);
        if overlap > 0.0 {
            *slot += bar.volume * overlap / range;
        }
    }
}

/// Expand from the POC bin until the covered bins hold the value-area share.
fn value_area_bins(bins: &[f64; PROFILE_BINS], poc: usize, total: f64) -> (usize, usize) {
    let target = total * VALUE_AREA_FRACTION;
    let mut lo = poc;
    let mut hi = poc;
    let mut covered = bins[poc];
    while covered < target && (lo > 0 || hi < PROFILE_BINS - 1) {
        let below = if lo > 0 { Some(bins[lo - 1]) } else { None };
        let above = if hi < PROFILE_BINS - 1 {
            Some(bins[hi + 1])
        } else {
            None
        };
        match (below, above) {
            (Some(b), Some(a)) if b >= a => {
                lo -= 1;
                covered += b;
            }
            (_, Some(a)) => {
                hi += 1;
                covered += a;
            }
            (Some(b), None) => {
                lo -= 1;
                covered += b;
            }
            (None, None) => break,
        }
    }
    (lo, hi)
}
