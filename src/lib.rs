//! Monte Carlo portfolio simulation over historical asset returns.
//!
//! Raw close prices are aligned into a [`ReturnsMatrix`], reduced to annualized
//! [`Statistics`], and a seeded ensemble of random simplex weights is scored
//! for return, risk and a zero-risk-free-rate Sharpe ratio. The allocations
//! with the highest Sharpe, the highest return and the lowest risk are reported.

pub mod config;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod portfolio;
pub mod report;
pub mod returns;
pub mod sampler;
pub mod selector;
pub mod stats;
pub mod webui;

pub use config::OptimizerConfig;
pub use data::{AssetSeries, PricePoint};
pub use error::{OptimizerError, Result};
pub use evaluator::{Evaluation, PortfolioSample, evaluate};
pub use portfolio::{OptimizationReport, optimize, simulate_ensemble};
pub use report::{SelectionKind, SelectionResult, assemble};
pub use returns::{ReturnsMatrix, compute_returns};
pub use sampler::{RandomSource, SeededSource, WeightVector, sample_weights};
pub use selector::{Selection, select};
pub use stats::{Statistics, compute_statistics};
