use crate::error::{OptimizerError, Result};
use crate::evaluator::{PortfolioSample, safe_sharpe};
use crate::selector::Selection;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    MaxSharpe,
    MaxReturn,
    MinRisk,
}

impl SelectionKind {
    pub const ALL: [SelectionKind; 3] = [Self::MaxSharpe, Self::MaxReturn, Self::MinRisk];

    pub fn title(self) -> &'static str {
        match self {
            Self::MaxSharpe => "Maximum Sharpe Ratio",
            Self::MaxReturn => "Maximum Return",
            Self::MinRisk => "Minimum Variance",
        }
    }

    fn index_in(self, selection: &Selection) -> usize {
        match self {
            Self::MaxSharpe => selection.max_sharpe,
            Self::MaxReturn => selection.max_return,
            Self::MinRisk => selection.min_risk,
        }
    }
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A selected portfolio with its weights keyed by symbol, in column order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectionResult {
    pub kind: SelectionKind,
    pub index: usize,
    #[serde(rename = "return")]
    pub expected_return: f64,
    pub risk: f64,
    pub sharpe: f64,
    pub weights: Vec<(String, f64)>,
}

/// Packages each selected sample, in [`SelectionKind::ALL`] order.
pub fn assemble(
    selection: &Selection,
    ensemble: &[PortfolioSample],
    symbols: &[String],
) -> Result<Vec<SelectionResult>> {
    if ensemble.is_empty() {
        return Err(OptimizerError::EmptyEnsemble);
    }

    SelectionKind::ALL
        .iter()
        .map(|&kind| {
            let index = kind.index_in(selection);
            let sample = ensemble.get(index).ok_or_else(|| {
                OptimizerError::invalid_config(format!(
                    "{} index {} is outside an ensemble of {}",
                    kind,
                    index,
                    ensemble.len()
                ))
            })?;
            let weights = sample.weights.as_slice();
            if weights.len() != symbols.len() {
                return Err(OptimizerError::invalid_config(format!(
                    "{} symbols for {} weights",
                    symbols.len(),
                    weights.len()
                )));
            }

            Ok(SelectionResult {
                kind,
                index,
                expected_return: sample.expected_return(),
                risk: sample.risk(),
                sharpe: safe_sharpe(sample.expected_return(), sample.risk()),
                weights: symbols.iter().cloned().zip(weights.iter().copied()).collect(),
            })
        })
        .collect()
}

/// Pretty-prints one selected portfolio.
pub fn print_selection(result: &SelectionResult) {
    println!("╠════════════════════════════════════════════════════════════╣");
    println!("║  {:<58}║", format!("{} Portfolio (#{})", result.kind, result.index));
    println!("╠════════════════════════════════════════════════════════════╣");
    println!(
        "║  Expected Annual Return : {:>+8.2}%                        ║",
        result.expected_return * 100.0
    );
    println!(
        "║  Annual Risk (Std Dev)  : {:>8.2}%                        ║",
        result.risk * 100.0
    );
    println!(
        "║  Sharpe Ratio           : {:>8.4}                         ║",
        result.sharpe
    );
    println!("║  Symbol        Weight                                      ║");
    for (symbol, weight) in &result.weights {
        println!("║    {:<8} {:>7.2}%                                        ║", symbol, weight * 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluation;
    use crate::sampler::WeightVector;

    fn sample(w: Vec<f64>, expected_return: f64, risk: f64, sharpe: f64) -> PortfolioSample {
        PortfolioSample {
            weights: WeightVector::from_draws(w).unwrap(),
            metrics: Evaluation {
                expected_return,
                risk,
                sharpe,
            },
        }
    }

    fn symbols() -> Vec<String> {
        vec!["REE".into(), "FMC".into()]
    }

    #[test]
    fn test_assemble_preserves_column_order() {
        let ensemble = vec![
            sample(vec![0.3, 0.7], 0.12, 0.2, 0.6),
            sample(vec![0.9, 0.1], 0.20, 0.4, 0.5),
        ];
        let selection = Selection {
            max_sharpe: 0,
            max_return: 1,
            min_risk: 0,
        };
        let results = assemble(&selection, &ensemble, &symbols()).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].kind, SelectionKind::MaxSharpe);
        assert_eq!(results[1].kind, SelectionKind::MaxReturn);
        assert_eq!(results[2].kind, SelectionKind::MinRisk);
        assert_eq!(results[1].index, 1);
        assert_eq!(results[1].weights[0].0, "REE");
        assert_eq!(results[1].weights[1].0, "FMC");
        assert!((results[1].weights[0].1 - 0.9).abs() < 1e-12);
        assert_eq!(results[0].weights.len(), symbols().len());
    }

    #[test]
    fn test_display_sharpe_is_recomputed() {
        let ensemble = vec![sample(vec![1.0, 1.0], 0.3, 0.0, 5.0)];
        let selection = Selection {
            max_sharpe: 0,
            max_return: 0,
            min_risk: 0,
        };
        let results = assemble(&selection, &ensemble, &symbols()).unwrap();
        assert!(results.iter().all(|r| r.sharpe == 0.0));
    }

    #[test]
    fn test_symbol_mismatch_is_an_error() {
        let ensemble = vec![sample(vec![0.5, 0.5], 0.1, 0.1, 1.0)];
        let selection = Selection {
            max_sharpe: 0,
            max_return: 0,
            min_risk: 0,
        };
        let three: Vec<String> = vec!["A".into(), "B".into(), "C".into()];
        assert!(matches!(
            assemble(&selection, &ensemble, &three),
            Err(OptimizerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_out_of_range_index_is_an_error() {
        let ensemble = vec![sample(vec![0.5, 0.5], 0.1, 0.1, 1.0)];
        let selection = Selection {
            max_sharpe: 3,
            max_return: 0,
            min_risk: 0,
        };
        assert!(assemble(&selection, &ensemble, &symbols()).is_err());
    }

    #[test]
    fn test_serializes_with_return_key() {
        let ensemble = vec![sample(vec![0.5, 0.5], 0.1, 0.2, 0.5)];
        let selection = Selection {
            max_sharpe: 0,
            max_return: 0,
            min_risk: 0,
        };
        let results = assemble(&selection, &ensemble, &symbols()).unwrap();
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["kind"], "max_sharpe");
        assert_eq!(json["return"], 0.1);
        assert_eq!(json["weights"][0][0], "REE");
    }
}
