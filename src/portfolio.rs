use crate::config::OptimizerConfig;
use crate::data::{self, AssetSeries, SyntheticMarket};
use crate::error::{OptimizerError, Result};
use crate::evaluator::{PortfolioSample, evaluate};
use crate::report::{SelectionResult, assemble, print_selection};
use crate::returns::{ReturnsMatrix, compute_returns};
use crate::sampler::{SeededSource, sample_weight_sequence};
use crate::selector::select;
use crate::stats::{Statistics, compute_statistics};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

// ──────────────────────────────────────────────────────────────────────────────
// Data Structures
// ──────────────────────────────────────────────────────────────────────────────

/// Everything a run produces, for display and export layers.
#[derive(Clone, Debug, Serialize)]
pub struct OptimizationReport {
    pub symbols: Vec<String>,
    pub sample_count: usize,
    pub random_seed: u64,
    pub returns: ReturnsMatrix,
    pub statistics: Statistics,
    pub ensemble: Vec<PortfolioSample>,
    pub max_sharpe: SelectionResult,
    pub max_return: SelectionResult,
    pub min_risk: SelectionResult,
}

impl OptimizationReport {
    pub fn selections(&self) -> [&SelectionResult; 3] {
        [&self.max_sharpe, &self.max_return, &self.min_risk]
    }
}

/// Where the CLI and web layers take price history from.
#[derive(Clone, Debug)]
pub enum PriceInput {
    File(PathBuf),
    Synthetic { days: usize },
}

// ──────────────────────────────────────────────────────────────────────────────
// Monte Carlo Ensemble
// ──────────────────────────────────────────────────────────────────────────────

/// Simulates `sample_count` random portfolios.
///
/// Weights are drawn on one thread from a single seeded stream in index order;
/// only evaluation is spread across the rayon pool, so sample `i` is the same
/// for any thread count.
pub fn simulate_ensemble(
    stats: &Statistics,
    sample_count: usize,
    seed: u64,
) -> Result<Vec<PortfolioSample>> {
    if sample_count < 1 {
        return Err(OptimizerError::invalid_config("sample count must be at least 1"));
    }

    let mut rng = SeededSource::new(seed);
    let weights = sample_weight_sequence(stats.n_assets(), sample_count, &mut rng)?;

    weights
        .into_par_iter()
        .map(|w| evaluate(&w, stats).map(|metrics| PortfolioSample { weights: w, metrics }))
        .collect()
}

// ──────────────────────────────────────────────────────────────────────────────
// Pipeline
// ──────────────────────────────────────────────────────────────────────────────

/// prices → returns → statistics → ensemble → selection → report.
///
/// All data checks happen before any sampling.
pub fn optimize(series: &[AssetSeries], config: &OptimizerConfig) -> Result<OptimizationReport> {
    config.validate()?;

    let picked: Vec<AssetSeries> = data::select_series(series, &config.symbols)?
        .iter()
        .map(|s| s.within(config.start_date, config.end_date))
        .collect();

    let returns = compute_returns(&picked)?;
    let statistics = compute_statistics(&returns, config.periods_per_year)?;

    info!(
        "Optimizing portfolio with {} assets over {} return rows, {} random samples (seed {})",
        statistics.n_assets(),
        returns.n_rows(),
        config.sample_count,
        config.random_seed
    );
    for (i, symbol) in statistics.symbols().iter().enumerate() {
        info!(
            "  {}: E[r]={:.4}, σ={:.4}",
            symbol,
            statistics.mean_returns()[i],
            statistics.asset_volatility(i)
        );
    }

    let ensemble = simulate_ensemble(&statistics, config.sample_count, config.random_seed)?;
    let selection = select(&ensemble)?;
    info!(
        "Selected max-sharpe #{}, max-return #{}, min-risk #{}",
        selection.max_sharpe, selection.max_return, selection.min_risk
    );

    let [max_sharpe, max_return, min_risk]: [SelectionResult; 3] =
        assemble(&selection, &ensemble, statistics.symbols())?
            .try_into()
            .map_err(|_| OptimizerError::EmptyEnsemble)?;

    Ok(OptimizationReport {
        symbols: statistics.symbols().to_vec(),
        sample_count: config.sample_count,
        random_seed: config.random_seed,
        returns,
        statistics,
        ensemble,
        max_sharpe,
        max_return,
        min_risk,
    })
}

// ──────────────────────────────────────────────────────────────────────────────
// Top-Level Command: Run Portfolio Optimization
// ──────────────────────────────────────────────────────────────────────────────

pub async fn load_series(input: &PriceInput, config: &OptimizerConfig) -> anyhow::Result<Vec<AssetSeries>> {
    match input {
        PriceInput::File(path) => data::load_price_file(path).await,
        PriceInput::Synthetic { days } => {
            warn!(
                "No price file given; generating {} days of synthetic prices for {:?}",
                days, config.symbols
            );
            Ok(SyntheticMarket::new(config.random_seed, *days).generate(&config.symbols)?)
        }
    }
}

/// Full pipeline: load prices → optimize (on the blocking pool).
pub async fn run_portfolio_optimization(
    input: &PriceInput,
    config: OptimizerConfig,
) -> anyhow::Result<OptimizationReport> {
    info!(
        "=== Portfolio Simulation ===\n  Assets: {:?}\n  Window: {} .. {}\n  Samples: {}\n  Periods/Year: {}",
        config.symbols,
        config
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "start".to_string()),
        config
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "end".to_string()),
        config.sample_count,
        config.periods_per_year
    );

    let series = load_series(input, &config).await?;
    let report = tokio::task::spawn_blocking(move || optimize(&series, &config)).await??;
    Ok(report)
}

/// Pretty-prints the three selected portfolios to stdout.
pub fn print_report(report: &OptimizationReport) {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║           Portfolio Simulation Results                     ║");
    println!(
        "║  {:<58}║",
        format!(
            "{} portfolios over {} assets, {} return rows",
            report.sample_count,
            report.symbols.len(),
            report.returns.n_rows()
        )
    );
    for result in report.selections() {
        print_selection(result);
    }
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
    println!(
        "Returns are annualized over {} periods; Sharpe assumes a 0% risk-free rate.",
        report.statistics.periods_per_year()
    );
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────
