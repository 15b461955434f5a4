//! Parameter sweep over the simulator's entry/exit/stop grid.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use quantlab_core::domain::PriceBar;
use quantlab_core::engine::{run_backtest, BacktestConfig};
use quantlab_core::error::EngineError;
use quantlab_core::metrics::Metrics;

/// Parameter grid specification: one axis per swept knob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub rsi_entry_values: Vec<f64>,
    pub rsi_exit_values: Vec<f64>,
    pub atr_stop_mults: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            rsi_entry_values: vec![50.0, 55.0, 60.0, 65.0],
            rsi_exit_values: vec![65.0, 70.0, 75.0, 80.0],
            atr_stop_mults: vec![1.5, 2.0, 2.5],
        }
    }
}

impl ParamGrid {
    /// Upper bound on the cell count (invalid entry/exit pairs are skipped).
    pub fn size(&self) -> usize {
        self.rsi_entry_values.len() * self.rsi_exit_values.len() * self.atr_stop_mults.len()
    }

    /// All valid configurations in the grid. Pairs where the exit threshold
    /// does not exceed the entry threshold cannot trade and are skipped.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let mut configs = Vec::new();
        for &entry in &self.rsi_entry_values {
            for &exit in &self.rsi_exit_values {
                if exit <= entry {
                    continue;
                }
                for &stop_mult in &self.atr_stop_mults {
                    configs.push(BacktestConfig {
                        rsi_entry: entry,
                        rsi_exit: exit,
                        atr_stop_mult: stop_mult,
                        ..base.clone()
                    });
                }
            }
        }
        configs
    }
}

/// One evaluated grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepCell {
    pub config: BacktestConfig,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    pub cells: Vec<SweepCell>,
}

impl SweepResults {
    /// Best cell by profit factor; ties go to the higher Sharpe ratio.
    pub fn best(&self) -> Option<&SweepCell> {
        self.cells.iter().max_by(|a, b| {
            a.metrics
                .profit_factor
                .total_cmp(&b.metrics.profit_factor)
                .then(a.metrics.sharpe_ratio.total_cmp(&b.metrics.sharpe_ratio))
        })
    }
}

/// Sweep executor. Parallel by rayon unless opted out.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn sweep(
        &self,
        bars: &[PriceBar],
        grid: &ParamGrid,
        base: &BacktestConfig,
    ) -> Result<SweepResults, EngineError> {
        let configs = grid.generate_configs(base);
        info!(cells = configs.len(), parallel = self.parallel, "starting sweep");

        let evaluate = |config: &BacktestConfig| -> Result<SweepCell, EngineError> {
            let run = run_backtest(bars, config)?;
            let metrics =
                Metrics::compute(&run.trades, &run.equity_curve, config.annualization_factor);
            Ok(SweepCell {
                config: config.clone(),
                metrics,
            })
        };

        let cells: Vec<SweepCell> = if self.parallel {
            configs
                .par_iter()
                .map(evaluate)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            configs
                .iter()
                .map(evaluate)
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults { cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_bars(n: usize) -> Vec<PriceBar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.3 + (i as f64 * 0.2).sin() * 3.0;
                PriceBar {
                    open_time: i as i64 * 3_600_000,
                    open: close,
                    high: close * 1.004,
                    low: close * 0.996,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    #[test]
    fn invalid_threshold_pairs_are_skipped() {
        let grid = ParamGrid {
            rsi_entry_values: vec![60.0, 70.0],
            rsi_exit_values: vec![65.0, 75.0],
            atr_stop_mults: vec![2.0],
        };
        let configs = grid.generate_configs(&BacktestConfig::default());
        // (60,65), (60,75), (70,75) survive; (70,65) is skipped.
        assert_eq!(configs.len(), 3);
        assert!(configs.iter().all(|c| c.rsi_exit > c.rsi_entry));
    }

    #[test]
    fn parallel_and_sequential_sweeps_agree() {
        let bars = trending_bars(300);
        let grid = ParamGrid::default();
        let base = BacktestConfig::default();

        let parallel = ParamSweep::new().sweep(&bars, &grid, &base).unwrap();
        let sequential = ParamSweep::new()
            .with_parallelism(false)
            .sweep(&bars, &grid, &base)
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn best_cell_matches_a_manual_scan() {
        let bars = trending_bars(300);
        let grid = ParamGrid::default();
        let results = ParamSweep::new()
            .sweep(&bars, &grid, &BacktestConfig::default())
            .unwrap();

        let best = results.best().unwrap();
        for cell in &results.cells {
            assert!(
                best.metrics.profit_factor >= cell.metrics.profit_factor
                    || (best.metrics.profit_factor == cell.metrics.profit_factor
                        && best.metrics.sharpe_ratio >= cell.metrics.sharpe_ratio)
            );
        }
    }
}
