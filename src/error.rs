use thiserror::Error;

/// Failures reported by the simulation and selection engine.
///
/// Every variant is recoverable; the engine never substitutes defaults for
/// malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizerError {
    #[error("insufficient data: {reason}")]
    InsufficientData { reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("cannot select from an empty portfolio ensemble")]
    EmptyEnsemble,

    #[error("invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },
}

impl OptimizerError {
    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
