//! Bayesian update of the win probability.
//!
//! Prior = historical win rate; likelihood = signal accuracy, clamped to
//! [0.51, 0.99] so the update never treats the signal as worse than a coin
//! flip or as an oracle. Posterior via Bayes' rule, clamped to [0.01, 0.99].

use serde::{Deserialize, Serialize};

const ACCURACY_MIN: f64 = 0.51;
const ACCURACY_MAX: f64 = 0.99;
const POSTERIOR_MIN: f64 = 0.01;
const POSTERIOR_MAX: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BayesianEstimate {
    pub prior: f64,
    pub likelihood: f64,
    pub posterior: f64,
}

/// Posterior win probability given the historical win rate. The win rate
/// serves as both the prior and the accuracy evidence, which keeps the
/// estimate self-contained in the ledger.
pub fn bayesian_win_estimate(win_rate: f64) -> BayesianEstimate {
    let prior = win_rate.clamp(POSTERIOR_MIN, POSTERIOR_MAX);
    let likelihood = win_rate.clamp(ACCURACY_MIN, ACCURACY_MAX);

    let evidence = prior * likelihood + (1.0 - prior) * (1.0 - likelihood);
    let posterior = if evidence > 0.0 {
        (prior * likelihood / evidence).clamp(POSTERIOR_MIN, POSTERIOR_MAX)
    } else {
        POSTERIOR_MIN
    };

    BayesianEstimate {
        prior,
        likelihood,
        posterior,
    }
}
