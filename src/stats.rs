use crate::error::{OptimizerError, Result};
use crate::returns::ReturnsMatrix;
use serde::Serialize;

/// Annualized mean-return vector and covariance matrix.
///
/// `symbols`, `mean_returns` and the covariance rows all have the same length,
/// and the covariance is square.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Statistics {
    symbols: Vec<String>,
    mean_returns: Vec<f64>,
    covariance: Vec<Vec<f64>>,
    periods_per_year: u32,
}

impl Statistics {
    pub fn new(
        symbols: Vec<String>,
        mean_returns: Vec<f64>,
        covariance: Vec<Vec<f64>>,
        periods_per_year: u32,
    ) -> Result<Self> {
        let n = mean_returns.len();
        if n == 0 {
            return Err(OptimizerError::invalid_config("statistics need at least one asset"));
        }
        if symbols.len() != n {
            return Err(OptimizerError::invalid_config(format!(
                "{} symbols for {} mean returns",
                symbols.len(),
                n
            )));
        }
        if covariance.len() != n || covariance.iter().any(|row| row.len() != n) {
            return Err(OptimizerError::invalid_config(format!(
                "covariance must be {}x{}",
                n, n
            )));
        }
        Ok(Self {
            symbols,
            mean_returns,
            covariance,
            periods_per_year,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn mean_returns(&self) -> &[f64] {
        &self.mean_returns
    }

    pub fn covariance(&self) -> &[Vec<f64>] {
        &self.covariance
    }

    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    pub fn n_assets(&self) -> usize {
        self.mean_returns.len()
    }

    /// Annualized volatility of a single asset.
    pub fn asset_volatility(&self, asset: usize) -> f64 {
        self.covariance[asset][asset].max(0.0).sqrt()
    }
}

/// Two-pass sample statistics (mean first, then deviations), scaled by
/// `periods_per_year`.
pub fn compute_statistics(returns: &ReturnsMatrix, periods_per_year: u32) -> Result<Statistics> {
    if periods_per_year == 0 {
        return Err(OptimizerError::invalid_config("periods per year must be positive"));
    }
    let rows = returns.n_rows();
    if rows < 2 {
        return Err(OptimizerError::insufficient_data(format!(
            "sample covariance needs at least 2 return rows, got {}",
            rows
        )));
    }

    let n = returns.n_assets();
    let scale = periods_per_year as f64;

    let means: Vec<f64> = (0..n)
        .map(|i| returns.column(i).sum::<f64>() / rows as f64)
        .collect();

    let mut cov = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let sum: f64 = returns
                .rows()
                .iter()
                .map(|r| (r[i] - means[i]) * (r[j] - means[j]))
                .sum();
            let covariance = sum / (rows as f64 - 1.0) * scale;
            cov[i][j] = covariance;
            cov[j][i] = covariance;
        }
    }

    Statistics::new(
        returns.symbols().to_vec(),
        means.iter().map(|m| m * scale).collect(),
        cov,
        periods_per_year,
    )
}
