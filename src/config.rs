use crate::error::{OptimizerError, Result};
use chrono::NaiveDate;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{info, warn};

static RAYON_INIT: OnceLock<()> = OnceLock::new();

/// Trading periods per year used for annualization.
pub const TRADING_DAYS: u32 = 252;

/// Number of random portfolios simulated per run.
pub const DEFAULT_SAMPLE_COUNT: usize = 5000;

/// Seed for the portfolio sampler when none is configured.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Length of generated history when no price file is supplied.
pub const DEFAULT_SYNTHETIC_DAYS: usize = 365;

/// Default symbols when none are specified.
pub const DEFAULT_PORTFOLIO_SYMBOLS: &[&str] = &["REE", "FMC", "DHC"];

pub fn init_cpu_parallelism() {
    RAYON_INIT.get_or_init(|| {
        let num_threads = num_cpus::get().max(1);
        match ThreadPoolBuilder::new().num_threads(num_threads).build_global() {
            Ok(_) => info!(
                "Initialized Rayon thread pool with {} threads (all logical CPU cores)",
                num_threads
            ),
            Err(e) => warn!(
                "Rayon thread pool already initialized or unavailable ({}). Using existing configuration.",
                e
            ),
        }
    });
}

/// Splits a comma-separated ticker list, trimming and uppercasing each entry.
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Options for a single optimization run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub symbols: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sample_count: usize,
    pub periods_per_year: u32,
    pub random_seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_PORTFOLIO_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            start_date: None,
            end_date: None,
            sample_count: DEFAULT_SAMPLE_COUNT,
            periods_per_year: TRADING_DAYS,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl OptimizerConfig {
    /// Defaults overlaid with `PORTFOLIO_SIM_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("PORTFOLIO_SIM_SYMBOLS") {
            let symbols = parse_symbol_list(&raw);
            if symbols.is_empty() {
                warn!("PORTFOLIO_SIM_SYMBOLS is set but lists no symbols; keeping defaults");
            } else {
                config.symbols = symbols;
            }
        }
        if let Some(v) = env_parse::<usize>("PORTFOLIO_SIM_SAMPLES") {
            config.sample_count = v;
        }
        if let Some(v) = env_parse::<u32>("PORTFOLIO_SIM_PERIODS_PER_YEAR") {
            config.periods_per_year = v;
        }
        if let Some(v) = env_parse::<u64>("PORTFOLIO_SIM_SEED") {
            config.random_seed = v;
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(OptimizerError::invalid_config("asset symbol list is empty"));
        }
        let mut seen = HashSet::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            if symbol.trim().is_empty() {
                return Err(OptimizerError::invalid_config("asset symbol is blank"));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(OptimizerError::invalid_config(format!(
                    "asset symbol {} is listed more than once",
                    symbol
                )));
            }
        }
        if self.sample_count < 1 {
            return Err(OptimizerError::invalid_config(
                "sample count must be at least 1",
            ));
        }
        if self.periods_per_year == 0 {
            return Err(OptimizerError::invalid_config(
                "periods per year must be positive",
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(OptimizerError::invalid_config(format!(
                    "start date {} is after end date {}",
                    start, end
                )));
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}={} (not a valid value)", key, raw);
            None
        }
    }
}
