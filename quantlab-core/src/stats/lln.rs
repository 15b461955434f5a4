//! Law-of-large-numbers convergence check.
//!
//! Splits the trade returns into first and second halves and runs a Welch
//! two-sample t-test. A high p-value means the halves are statistically
//! indistinguishable — the realized edge has stabilized — so the strategy
//! is marked converged when `p > 1 − confidence_level`.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::StatsConfig;

const VARIANCE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LlnResult {
    pub converged: bool,
    /// 1 − p: how distinguishable the two halves still are.
    pub confidence: f64,
    pub p_value: f64,
    pub first_half_mean: f64,
    pub second_half_mean: f64,
    pub sample_size: usize,
}

impl LlnResult {
    fn insufficient(sample_size: usize) -> Self {
        Self {
            converged: false,
            confidence: 0.0,
            p_value: 0.0,
            first_half_mean: 0.0,
            second_half_mean: 0.0,
            sample_size,
        }
    }
}

pub fn convergence_test(returns: &[f64], config: &StatsConfig) -> LlnResult {
    if returns.len() < config.lln_min_trades {
        return LlnResult::insufficient(returns.len());
    }

    let mid = returns.len() / 2;
    let (first, second) = returns.split_at(mid);
    let (m1, v1) = mean_and_variance(first);
    let (m2, v2) = mean_and_variance(second);

    // Zero-variance halves break the t statistic; resolve them by direct
    // mean comparison.
    if v1 < VARIANCE_EPSILON && v2 < VARIANCE_EPSILON {
        let equal = (m1 - m2).abs() < VARIANCE_EPSILON;
        return LlnResult {
            converged: equal,
            confidence: if equal { 1.0 } else { 0.0 },
            p_value: if equal { 1.0 } else { 0.0 },
            first_half_mean: m1,
            second_half_mean: m2,
            sample_size: returns.len(),
        };
    }

    let n1 = first.len() as f64;
    let n2 = second.len() as f64;
    let se_sq = v1 / n1 + v2 / n2;
    let t = (m1 - m2) / se_sq.sqrt();
    let df = welch_satterthwaite(v1, n1, v2, n2);
    let p_value = two_sided_p(t, df);

    let alpha = 1.0 - config.confidence_level;
    LlnResult {
        converged: p_value > alpha,
        confidence: 1.0 - p_value,
        p_value,
        first_half_mean: m1,
        second_half_mean: m2,
        sample_size: returns.len(),
    }
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    if values.len() < 2 {
        return (values.first().copied().unwrap_or(0.0), 0.0);
    }
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance)
}

fn welch_satterthwaite(v1: f64, n1: f64, v2: f64, n2: f64) -> f64 {
    let num = (v1 / n1 + v2 / n2).powi(2);
    let den = (v1 / n1).powi(2) / (n1 - 1.0) + (v2 / n2).powi(2) / (n2 - 1.0);
    if den > 0.0 {
        num / den
    } else {
        1.0
    }
}

fn two_sided_p(t: f64, df: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, df.max(1.0)) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
