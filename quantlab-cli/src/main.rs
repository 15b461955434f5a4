//! QuantLab CLI — backtest, sweep, and Monte Carlo commands.
//!
//! Commands:
//! - `run` — simulate a strategy over a CSV bar series and print metrics
//! - `sweep` — grid-search RSI thresholds and stop multipliers
//! - `montecarlo` — fixed risk/reward capital simulation

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use quantlab_core::engine::run_backtest;
use quantlab_core::metrics::Metrics;
use quantlab_core::stats::StatisticalAdjustment;
use quantlab_core::volatility::VolatilityReport;
use quantlab_runner::montecarlo::{run_monte_carlo, MonteCarloConfig};
use quantlab_runner::{load_bars, loader, ParamGrid, ParamSweep, RunConfig};

#[derive(Parser)]
#[command(
    name = "quantlab",
    about = "QuantLab CLI — backtest simulation and risk-adjusted statistics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a strategy over a CSV bar series.
    Run {
        /// CSV file with open_time,open,high,low,close,volume rows.
        csv: PathBuf,

        /// Optional TOML run configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also compute the statistical risk adjustment.
        #[arg(long, default_value_t = false)]
        stats: bool,

        /// Emit JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Grid-search RSI entry/exit thresholds and ATR stop multipliers.
    Sweep {
        /// CSV file with open_time,open,high,low,close,volume rows.
        csv: PathBuf,

        /// Optional TOML run configuration used as the grid's base.
        #[arg(long)]
        config: Option<PathBuf>,

        /// RSI entry thresholds to sweep (comma separated).
        #[arg(long, value_delimiter = ',')]
        rsi_entry: Vec<f64>,

        /// RSI exit thresholds to sweep (comma separated).
        #[arg(long, value_delimiter = ',')]
        rsi_exit: Vec<f64>,

        /// ATR stop multipliers to sweep (comma separated).
        #[arg(long, value_delimiter = ',')]
        stop_mult: Vec<f64>,

        /// Run cells sequentially instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Emit JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fixed risk/reward Monte Carlo capital simulation.
    Montecarlo {
        /// Number of simulated accounts.
        #[arg(long, default_value_t = 1_000)]
        simulations: usize,

        /// Starting capital per account.
        #[arg(long, default_value_t = 10_000.0)]
        capital: f64,

        /// RNG seed; the same seed always reproduces the same summary.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Emit JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            csv,
            config,
            stats,
            json,
        } => cmd_run(csv, config, stats, json),
        Commands::Sweep {
            csv,
            config,
            rsi_entry,
            rsi_exit,
            stop_mult,
            sequential,
            json,
        } => {
            let grid = build_grid(rsi_entry, rsi_exit, stop_mult);
            cmd_sweep(csv, config, grid, sequential, json)
        }
        Commands::Montecarlo {
            simulations,
            capital,
            seed,
            json,
        } => cmd_montecarlo(simulations, capital, seed, json),
    }
}

fn load_run_config(path: Option<PathBuf>) -> Result<RunConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            RunConfig::from_toml(&text)
                .with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(RunConfig::default()),
    }
}

fn cmd_run(csv: PathBuf, config: Option<PathBuf>, stats: bool, json: bool) -> Result<()> {
    let run_config = load_run_config(config)?;
    let bars = load_bars(&csv).with_context(|| format!("loading bars from {}", csv.display()))?;
    let bars = loader::clip_to_window(bars, run_config.start_date, run_config.end_date);

    let run = run_backtest(&bars, &run_config.backtest)?;
    let metrics = Metrics::compute(
        &run.trades,
        &run.equity_curve,
        run_config.backtest.annualization_factor,
    );
    let adjustment = stats
        .then(|| StatisticalAdjustment::compute(&metrics, &run.trades, &run_config.stats));
    let volatility = adjustment.as_ref().map(|adj| {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        VolatilityReport::from_closes(
            &closes,
            run_config.stats.initial_capital,
            adj.kelly.adjusted_kelly,
            metrics.win_rate_pct / 100.0,
        )
    });

    if json {
        let payload = serde_json::json!({
            "run_id": run_config.run_id(),
            "symbol": run_config.symbol,
            "bars": bars.len(),
            "trades": run.trades,
            "equity_curve": run.equity_curve,
            "metrics": metrics,
            "adjustment": adjustment,
            "volatility": volatility,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    print_run_summary(&run_config, bars.len(), &metrics);
    if let Some(adjustment) = &adjustment {
        print_adjustment_summary(adjustment);
    }
    if let Some(volatility) = &volatility {
        print_volatility_summary(volatility);
    }
    Ok(())
}

/// Start from the default grid and replace any axis the flags populate.
fn build_grid(rsi_entry: Vec<f64>, rsi_exit: Vec<f64>, stop_mult: Vec<f64>) -> ParamGrid {
    let mut grid = ParamGrid::default();
    if !rsi_entry.is_empty() {
        grid.rsi_entry_values = rsi_entry;
    }
    if !rsi_exit.is_empty() {
        grid.rsi_exit_values = rsi_exit;
    }
    if !stop_mult.is_empty() {
        grid.atr_stop_mults = stop_mult;
    }
    grid
}

fn cmd_sweep(
    csv: PathBuf,
    config: Option<PathBuf>,
    grid: ParamGrid,
    sequential: bool,
    json: bool,
) -> Result<()> {
    let run_config = load_run_config(config)?;
    let bars = load_bars(&csv).with_context(|| format!("loading bars from {}", csv.display()))?;
    let bars = loader::clip_to_window(bars, run_config.start_date, run_config.end_date);

    let results = ParamSweep::new()
        .with_parallelism(!sequential)
        .sweep(&bars, &grid, &run_config.backtest)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!();
    println!("=== Parameter Sweep ===");
    println!("Cells evaluated: {}", results.cells.len());
    match results.best() {
        Some(best) => {
            println!();
            println!("--- Best Cell ---");
            println!("RSI entry:      {:.0}", best.config.rsi_entry);
            println!("RSI exit:       {:.0}", best.config.rsi_exit);
            println!("ATR stop mult:  {:.1}", best.config.atr_stop_mult);
            println!("Profit Factor:  {:.2}", best.metrics.profit_factor);
            println!("Sharpe:         {:.3}", best.metrics.sharpe_ratio);
            println!("Total Return:   {:.2}%", best.metrics.total_return_pct);
            println!("Trades:         {}", best.metrics.total_trades);
        }
        None => println!("No valid cells in the grid."),
    }
    println!();
    Ok(())
}

fn cmd_montecarlo(simulations: usize, capital: f64, seed: u64, json: bool) -> Result<()> {
    let config = MonteCarloConfig {
        simulations,
        initial_capital: capital,
        seed,
        ..MonteCarloConfig::default()
    };
    let summary = run_monte_carlo(&config);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("=== Monte Carlo ===");
    println!("Simulations:    {}", summary.simulations);
    println!("Mean final:     ${:.2}", summary.mean_final);
    println!("Median final:   ${:.2}", summary.median_final);
    println!("Std dev:        ${:.2}", summary.std_final);
    println!(
        "Percentiles:    5% ${:.0} | 25% ${:.0} | 75% ${:.0} | 95% ${:.0}",
        summary.percentile_5, summary.percentile_25, summary.percentile_75, summary.percentile_95
    );
    println!("Worst DD:       {:.2}%", summary.worst_drawdown_pct);
    println!("Survival:       {:.1}%", summary.survival_rate * 100.0);
    println!(
        "P(profit):      {:.1}%",
        summary.probability_of_profit * 100.0
    );
    println!();
    Ok(())
}

fn print_run_summary(config: &RunConfig, bar_count: usize, metrics: &Metrics) {
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", config.symbol);
    println!("Run ID:         {}", &config.run_id()[..16]);
    println!(
        "Bars:           {} ({} warmup)",
        bar_count, config.backtest.warmup_bars
    );
    println!("Trades:         {}", metrics.total_trades);
    if metrics.total_trades == 0 {
        println!();
        println!("No trades were taken; metrics are empty.");
        println!();
        return;
    }
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", metrics.total_return_pct);
    println!("Win Rate:       {:.1}%", metrics.win_rate_pct);
    println!("Profit Factor:  {:.2}", metrics.profit_factor);
    println!("Sharpe:         {:.3}", metrics.sharpe_ratio);
    println!("Sortino:        {:.3}", metrics.sortino_ratio);
    println!("Calmar:         {:.3}", metrics.calmar_ratio);
    println!("Max Drawdown:   {:.2}%", metrics.max_drawdown_pct);
    println!("Avg Win:        {:.2}%", metrics.avg_win_pct);
    println!("Avg Loss:       {:.2}%", metrics.avg_loss_pct);
    println!("Max Consec Win: {}", metrics.max_consecutive_wins);
    println!("Max Consec Loss:{}", metrics.max_consecutive_losses);
    println!();
}

fn print_adjustment_summary(adjustment: &StatisticalAdjustment) {
    println!("--- Risk Adjustment ---");
    println!("Kelly fraction: {:.4}", adjustment.kelly.kelly_fraction);
    println!("Adjusted Kelly: {:.4}", adjustment.kelly.adjusted_kelly);
    println!("Position size:  ${:.2}", adjustment.kelly.position_size);
    println!("Bayes posterior:{:.3}", adjustment.bayes.posterior);
    println!(
        "LLN converged:  {} (p = {:.3})",
        adjustment.lln.converged, adjustment.lln.p_value
    );
    println!(
        "CLT normal:     {} (p = {:.3})",
        adjustment.clt.normal, adjustment.clt.p_value
    );
    println!(
        "Risk-adj DD:    {:.2}%",
        adjustment.risk_adjusted_drawdown_pct
    );
    println!("Adjusted Sharpe:{:.3}", adjustment.adjusted_sharpe);
    println!();
}

fn print_volatility_summary(volatility: &VolatilityReport) {
    println!("--- Volatility ---");
    println!("Realized:       {:.4}", volatility.realized);
    println!("GARCH:          {:.4}", volatility.garch);
    println!("Regime:         {:?}", volatility.regime);
    println!("Suggested stake:${:.2}", volatility.suggested_stake);
    println!("Ruin estimate:  {:.4}", volatility.ruin_probability);
    println!();
}
