//! Serializable run configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use quantlab_core::engine::BacktestConfig;
use quantlab_core::stats::StatsConfig;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

/// Everything needed to reproduce one run: the instrument, the simulator
/// knobs, and the statistics knobs. Loadable from TOML; missing sections
/// fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub symbol: String,
    /// Bar interval label, e.g. "1h". Informational; the engine only sees
    /// ordered bars.
    pub interval: String,
    /// Optional date window applied by the loader (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: "1h".to_string(),
            start_date: None,
            end_date: None,
            backtest: BacktestConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Deterministic hash of the full configuration. Two identical configs
    /// share a RunId, so downstream caches can key on it.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
