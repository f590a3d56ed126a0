use crate::error::{OptimizerError, Result};
use crate::sampler::WeightVector;
use crate::stats::Statistics;
use serde::Serialize;

/// Expected return, risk and Sharpe-like ratio of one allocation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Evaluation {
    #[serde(rename = "return")]
    pub expected_return: f64,
    pub risk: f64,
    pub sharpe: f64,
}

/// One simulated portfolio.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PortfolioSample {
    pub weights: WeightVector,
    #[serde(flatten)]
    pub metrics: Evaluation,
}

impl PortfolioSample {
    pub fn expected_return(&self) -> f64 {
        self.metrics.expected_return
    }

    pub fn risk(&self) -> f64 {
        self.metrics.risk
    }

    pub fn sharpe(&self) -> f64 {
        self.metrics.sharpe
    }
}

pub(crate) fn portfolio_return(weights: &[f64], means: &[f64]) -> f64 {
    weights.iter().zip(means.iter()).map(|(w, r)| w * r).sum()
}

pub(crate) fn portfolio_variance(weights: &[f64], cov: &[Vec<f64>]) -> f64 {
    let n = weights.len();
    let mut var = 0.0;
    for i in 0..n {
        for j in 0..n {
            var += weights[i] * weights[j] * cov[i][j];
        }
    }
    var
}

/// Return over risk with a zero risk-free rate; zero when risk is zero.
pub fn safe_sharpe(expected_return: f64, risk: f64) -> f64 {
    if risk > 0.0 { expected_return / risk } else { 0.0 }
}

/// Scores one weight vector against the annualized statistics.
pub fn evaluate(weights: &WeightVector, stats: &Statistics) -> Result<Evaluation> {
    let w = weights.as_slice();
    if w.len() != stats.n_assets() {
        return Err(OptimizerError::invalid_config(format!(
            "weight vector has {} entries for {} assets",
            w.len(),
            stats.n_assets()
        )));
    }

    let expected_return = portfolio_return(w, stats.mean_returns());
    // Near-singular covariance can yield a tiny negative quadratic form.
    let risk = portfolio_variance(w, stats.covariance()).max(0.0).sqrt();

    Ok(Evaluation {
        expected_return,
        risk,
        sharpe: safe_sharpe(expected_return, risk),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(means: Vec<f64>, cov: Vec<Vec<f64>>) -> Statistics {
        let symbols = (0..means.len()).map(|i| format!("A{}", i)).collect();
        Statistics::new(symbols, means, cov, 252).unwrap()
    }

    fn weights(w: Vec<f64>) -> WeightVector {
        WeightVector::from_draws(w).unwrap()
    }

    #[test]
    fn test_return_and_risk() {
        let s = stats(vec![0.10, 0.20], vec![vec![0.04, 0.0], vec![0.0, 0.09]]);
        let e = evaluate(&weights(vec![0.5, 0.5]), &s).unwrap();
        assert!((e.expected_return - 0.15).abs() < 1e-12);
        // 0.25*0.04 + 0.25*0.09 = 0.0325
        assert!((e.risk - 0.0325f64.sqrt()).abs() < 1e-12);
        assert_eq!(e.sharpe, e.expected_return / e.risk);
    }

    #[test]
    fn test_zero_risk_gives_zero_sharpe() {
        let s = stats(vec![0.05], vec![vec![0.0]]);
        let e = evaluate(&weights(vec![1.0]), &s).unwrap();
        assert_eq!(e.risk, 0.0);
        assert_eq!(e.sharpe, 0.0);
    }

    #[test]
    fn test_negative_quadratic_form_is_clamped() {
        let s = stats(vec![0.05, 0.05], vec![vec![1.0, -1.0 - 1e-12], vec![-1.0 - 1e-12, 1.0]]);
        let e = evaluate(&weights(vec![0.5, 0.5]), &s).unwrap();
        assert_eq!(e.risk, 0.0);
        assert_eq!(e.sharpe, 0.0);
        assert!(!e.risk.is_nan());
    }

    #[test]
    fn test_negative_return_keeps_sign() {
        let s = stats(vec![-0.10], vec![vec![0.04]]);
        let e = evaluate(&weights(vec![1.0]), &s).unwrap();
        assert!((e.sharpe + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let s = stats(vec![0.10, 0.20], vec![vec![0.04, 0.0], vec![0.0, 0.09]]);
        let result = evaluate(&weights(vec![0.2, 0.3, 0.5]), &s);
        assert!(matches!(result, Err(OptimizerError::InvalidConfiguration { .. })));
        assert!(evaluate(&weights(vec![1.0]), &s).is_err());
    }

    #[test]
    fn test_safe_sharpe() {
        assert_eq!(safe_sharpe(0.3, 0.0), 0.0);
        assert_eq!(safe_sharpe(0.3, 0.5), 0.6);
    }
}
