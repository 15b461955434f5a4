//! Central-limit normality check on windowed return sums.
//!
//! Sums the trade returns in fixed-size windows and runs a Jarque–Bera test
//! on the sums: JB = m/6 · (S² + K²/4) against a chi-squared(2). If the
//! central limit theorem is doing its job the window sums should look
//! normal even when individual trade returns do not.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::StatsConfig;

/// Windows required per the test, as a multiple of the window size.
const MIN_WINDOWS: usize = 5;

const NORMALITY_ALPHA: f64 = 0.05;
const MOMENT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CltResult {
    pub normal: bool,
    pub p_value: f64,
    pub skewness: f64,
    pub excess_kurtosis: f64,
    pub window_count: usize,
}

pub fn normality_test(returns: &[f64], config: &StatsConfig) -> CltResult {
    let window = config.clt_window.max(1);
    if returns.len() < window * MIN_WINDOWS {
        // Not enough windows for the sums to say anything; report the
        // shape of the raw returns instead.
        let (skewness, excess_kurtosis) = shape_moments(returns);
        return CltResult {
            normal: false,
            p_value: 0.0,
            skewness,
            excess_kurtosis,
            window_count: returns.len() / window,
        };
    }

    let sums: Vec<f64> = returns
        .chunks_exact(window)
        .map(|chunk| chunk.iter().sum())
        .collect();
    let (skewness, excess_kurtosis) = shape_moments(&sums);
    let m = sums.len() as f64;
    let jb = m / 6.0 * (skewness.powi(2) + excess_kurtosis.powi(2) / 4.0);
    let p_value = jarque_bera_p(jb);

    CltResult {
        normal: p_value > NORMALITY_ALPHA,
        p_value,
        skewness,
        excess_kurtosis,
        window_count: sums.len(),
    }
}

/// Population skewness and excess kurtosis; a flat sample has no shape and
/// reports (0, 0).
fn shape_moments(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if m2 < MOMENT_EPSILON {
        return (0.0, 0.0);
    }
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    let m4 = values.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n;
    (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
}

fn jarque_bera_p(jb: f64) -> f64 {
    match ChiSquared::new(2.0) {
        Ok(dist) => (1.0 - dist.cdf(jb)).clamp(0.0, 1.0),
        Err(_) => 0.0,
    }
}
