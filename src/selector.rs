use crate::error::{OptimizerError, Result};
use crate::evaluator::PortfolioSample;
use serde::Serialize;

/// Ensemble indices of the three extremal portfolios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub max_sharpe: usize,
    pub max_return: usize,
    pub min_risk: usize,
}

/// Single scan over the ensemble. Ties go to the lowest index.
pub fn select(ensemble: &[PortfolioSample]) -> Result<Selection> {
    let first = ensemble.first().ok_or(OptimizerError::EmptyEnsemble)?;

    let mut selection = Selection {
        max_sharpe: 0,
        max_return: 0,
        min_risk: 0,
    };
    let mut best_sharpe = first.sharpe();
    let mut best_return = first.expected_return();
    let mut lowest_risk = first.risk();

    for (i, sample) in ensemble.iter().enumerate().skip(1) {
        if sample.sharpe() > best_sharpe {
            best_sharpe = sample.sharpe();
            selection.max_sharpe = i;
        }
        if sample.expected_return() > best_return {
            best_return = sample.expected_return();
            selection.max_return = i;
        }
        if sample.risk() < lowest_risk {
            lowest_risk = sample.risk();
            selection.min_risk = i;
        }
    }

    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluation;
    use crate::sampler::WeightVector;

    fn sample(expected_return: f64, risk: f64, sharpe: f64) -> PortfolioSample {
        PortfolioSample {
            weights: WeightVector::from_draws(vec![1.0]).unwrap(),
            metrics: Evaluation {
                expected_return,
                risk,
                sharpe,
            },
        }
    }

    #[test]
    fn test_empty_ensemble() {
        assert_eq!(select(&[]), Err(OptimizerError::EmptyEnsemble));
    }

    #[test]
    fn test_picks_extremes() {
        let ensemble = vec![
            sample(0.10, 0.20, 0.5),
            sample(0.30, 0.40, 0.75),
            sample(0.05, 0.05, 1.0),
            sample(0.20, 0.30, 0.66),
        ];
        let s = select(&ensemble).unwrap();
        assert_eq!(s.max_sharpe, 2);
        assert_eq!(s.max_return, 1);
        assert_eq!(s.min_risk, 2);
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let ensemble = vec![
            sample(0.10, 0.30, 0.2),
            sample(0.25, 0.10, 0.9),
            sample(0.25, 0.10, 0.9),
            sample(0.25, 0.10, 0.9),
        ];
        let s = select(&ensemble).unwrap();
        assert_eq!(s.max_sharpe, 1);
        assert_eq!(s.max_return, 1);
        assert_eq!(s.min_risk, 1);
    }

    #[test]
    fn test_single_sample() {
        let s = select(&[sample(0.1, 0.2, 0.5)]).unwrap();
        assert_eq!(
            s,
            Selection {
                max_sharpe: 0,
                max_return: 0,
                min_risk: 0
            }
        );
    }
}
