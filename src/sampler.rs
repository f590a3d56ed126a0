use crate::error::{OptimizerError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Source of uniform draws on `[0, 1)`.
pub trait RandomSource {
    fn next_uniform(&mut self) -> f64;
}

/// `StdRng` seeded once per run.
#[derive(Clone, Debug)]
pub struct SeededSource {
    rng: StdRng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededSource {
    fn next_uniform(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// Non-negative portfolio weights summing to one.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeightVector(Vec<f64>);

impl WeightVector {
    /// Normalizes raw non-negative draws onto the simplex.
    ///
    /// An all-zero draw maps to equal weights.
    pub fn from_draws(draws: Vec<f64>) -> Result<Self> {
        if draws.is_empty() {
            return Err(OptimizerError::invalid_config("asset count must be at least 1"));
        }
        if draws.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(OptimizerError::invalid_config(
                "weight draws must be finite and non-negative",
            ));
        }
        let sum: f64 = draws.iter().sum();
        if sum <= 0.0 {
            let n = draws.len();
            return Ok(Self(vec![1.0 / n as f64; n]));
        }
        Ok(Self(draws.into_iter().map(|d| d / sum).collect()))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Draws `asset_count` uniforms and normalizes them.
pub fn sample_weights(asset_count: usize, rng: &mut impl RandomSource) -> Result<WeightVector> {
    if asset_count == 0 {
        return Err(OptimizerError::invalid_config("asset count must be at least 1"));
    }
    let draws: Vec<f64> = (0..asset_count).map(|_| rng.next_uniform()).collect();
    WeightVector::from_draws(draws)
}

/// `count` weight vectors, consuming the source in index order.
pub fn sample_weight_sequence(
    asset_count: usize,
    count: usize,
    rng: &mut impl RandomSource,
) -> Result<Vec<WeightVector>> {
    (0..count)
        .map(|_| sample_weights(asset_count, &mut *rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedSource(VecDeque<f64>);

    impl RandomSource for ScriptedSource {
        fn next_uniform(&mut self) -> f64 {
            self.0.pop_front().unwrap_or(0.5)
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let mut rng = SeededSource::new(42);
        for _ in 0..1000 {
            let w = sample_weights(5, &mut rng).unwrap();
            let sum: f64 = w.as_slice().iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "Weights should sum to 1.0, got {}", sum);
            assert!(w.as_slice().iter().all(|&v| v >= 0.0), "Weights should be non-negative");
        }
    }

    #[test]
    fn test_scripted_draws_are_normalized_in_order() {
        let mut rng = ScriptedSource(VecDeque::from(vec![0.2, 0.6, 0.3, 0.1]));
        let seq = sample_weight_sequence(2, 2, &mut rng).unwrap();
        assert!((seq[0].as_slice()[0] - 0.25).abs() < 1e-15);
        assert!((seq[0].as_slice()[1] - 0.75).abs() < 1e-15);
        assert!((seq[1].as_slice()[0] - 0.75).abs() < 1e-15);
        assert!((seq[1].as_slice()[1] - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = sample_weight_sequence(4, 200, &mut SeededSource::new(7)).unwrap();
        let b = sample_weight_sequence(4, 200, &mut SeededSource::new(7)).unwrap();
        let c = sample_weight_sequence(4, 200, &mut SeededSource::new(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_single_asset_is_full_weight() {
        let mut rng = SeededSource::new(1);
        for _ in 0..10 {
            assert_eq!(sample_weights(1, &mut rng).unwrap().as_slice(), &[1.0]);
        }
    }

    #[test]
    fn test_zero_assets_rejected() {
        let mut rng = SeededSource::new(1);
        assert!(matches!(
            sample_weights(0, &mut rng),
            Err(OptimizerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_all_zero_draw_falls_back_to_equal_weights() {
        let w = WeightVector::from_draws(vec![0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(w.as_slice(), &[0.25; 4]);
    }
}
