use chrono::NaiveDate;
use clap::Parser;
use portfolio_sim::config::{self, OptimizerConfig};
use portfolio_sim::portfolio::{self, PriceInput};
use portfolio_sim::webui;
use std::io;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Portfolio-Sim: Monte Carlo search for max-Sharpe, max-return and min-risk allocations",
    after_help = "EXAMPLES:
    # Optimize three tickers from a price file
    cargo run --release -- --prices prices.json --symbols REE,FMC,DHC

    # Restrict the window and simulate more portfolios
    cargo run --release -- --prices prices.json --start 2024-01-01 --end 2025-03-19 --samples 10000

    # Serve the JSON API
    cargo run --release -- --webui"
)]
struct Args {
    /// Comma-separated symbols (e.g., REE,FMC,DHC)
    #[arg(long)]
    symbols: Option<String>,

    /// JSON price file: [{"symbol": "REE", "history": [{"date": "2024-01-02", "close": 61.2}]}]
    #[arg(long, conflicts_with = "synthetic_days")]
    prices: Option<PathBuf>,

    /// Days of synthetic prices to generate when no price file is given
    #[arg(long, default_value_t = config::DEFAULT_SYNTHETIC_DAYS)]
    synthetic_days: usize,

    /// First date of the price window (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date of the price window (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Number of random portfolios to simulate (default: 5000)
    #[arg(long)]
    samples: Option<usize>,

    /// Periods per year used for annualization (default: 252)
    #[arg(long)]
    periods_per_year: Option<u32>,

    /// Seed for the portfolio sampler (default: 42)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the full report as JSON instead of the text summary
    #[arg(long)]
    json: bool,

    /// Keep the simulated ensemble in JSON output
    #[arg(long, requires = "json")]
    include_ensemble: bool,

    /// Launch the JSON web API
    #[arg(long)]
    webui: bool,

    /// WebUI server port
    #[arg(long, default_value_t = 8080)]
    webui_port: u16,
}

impl Args {
    fn optimizer_config(&self) -> OptimizerConfig {
        let mut cfg = OptimizerConfig::from_env();
        if let Some(ref raw) = self.symbols {
            cfg.symbols = config::parse_symbol_list(raw);
        }
        cfg.start_date = self.start.or(cfg.start_date);
        cfg.end_date = self.end.or(cfg.end_date);
        if let Some(n) = self.samples {
            cfg.sample_count = n;
        }
        if let Some(p) = self.periods_per_year {
            cfg.periods_per_year = p;
        }
        if let Some(s) = self.seed {
            cfg.random_seed = s;
        }
        cfg
    }

    fn price_input(&self) -> PriceInput {
        match self.prices {
            Some(ref path) => PriceInput::File(path.clone()),
            None => PriceInput::Synthetic {
                days: self.synthetic_days,
            },
        }
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("portfolio_sim=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    config::init_cpu_parallelism();
    let cfg = args.optimizer_config();

    if args.webui {
        match webui::run_webui_server(args.webui_port, cfg).await {
            Ok(_) => info!("WebUI exited."),
            Err(e) => error!("WebUI failed: {}", e),
        }
        return Ok(());
    }

    match portfolio::run_portfolio_optimization(&args.price_input(), cfg).await {
        Ok(mut report) => {
            if args.json {
                if !args.include_ensemble {
                    report.ensemble.clear();
                }
                let text = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
                println!("{}", text);
            } else {
                portfolio::print_report(&report);
            }
            info!("Portfolio optimization completed.");
        }
        Err(e) => error!("Portfolio optimization failed: {:#}", e),
    }

    Ok(())
}
