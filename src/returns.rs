use crate::data::AssetSeries;
use crate::error::{OptimizerError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Aligned matrix of fractional period-over-period returns.
///
/// Rows are timestamps in strictly increasing order, columns follow `symbols`.
/// Every cell is defined.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReturnsMatrix {
    symbols: Vec<String>,
    timestamps: Vec<DateTime<Utc>>,
    rows: Vec<Vec<f64>>,
}

impl ReturnsMatrix {
    /// Builds a matrix from already-aligned rows.
    pub fn from_rows(
        symbols: Vec<String>,
        timestamps: Vec<DateTime<Utc>>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if symbols.is_empty() {
            return Err(OptimizerError::invalid_config("returns matrix needs at least one asset"));
        }
        if timestamps.len() != rows.len() {
            return Err(OptimizerError::invalid_config(format!(
                "{} timestamps for {} rows",
                timestamps.len(),
                rows.len()
            )));
        }
        if rows.iter().any(|r| r.len() != symbols.len()) {
            return Err(OptimizerError::invalid_config(format!(
                "every row must hold {} returns",
                symbols.len()
            )));
        }
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(OptimizerError::invalid_config(
                "row timestamps must be strictly increasing",
            ));
        }
        for (t, row) in timestamps.iter().zip(&rows) {
            if let Some(col) = row.iter().position(|v| !v.is_finite()) {
                return Err(OptimizerError::InvalidSeries {
                    symbol: symbols[col].clone(),
                    reason: format!("return at {} is not finite", t),
                });
            }
        }
        Ok(Self {
            symbols,
            timestamps,
            rows,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    pub fn column(&self, asset: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |r| r[asset])
    }
}

/// Aligns the series on their timestamps and converts prices to returns.
///
/// The timeline is the union of all timestamps. A cell is defined only when the
/// asset has a price at both the row and the preceding timeline point; rows with
/// any undefined cell are dropped.
pub fn compute_returns(series: &[AssetSeries]) -> Result<ReturnsMatrix> {
    if series.is_empty() {
        return Err(OptimizerError::invalid_config("no asset series supplied"));
    }

    let mut seen = HashSet::with_capacity(series.len());
    for s in series {
        if !seen.insert(s.symbol()) {
            return Err(OptimizerError::invalid_config(format!(
                "asset {} supplied more than once",
                s.symbol()
            )));
        }
        if s.is_empty() {
            return Err(OptimizerError::insufficient_data(format!(
                "{} has no price history",
                s.symbol()
            )));
        }
        if s.len() < 2 {
            debug!("{} has a single price point and contributes no returns", s.symbol());
        }
    }

    // Outer join: timestamp -> one optional price per column.
    let mut aligned: BTreeMap<DateTime<Utc>, Vec<Option<f64>>> = BTreeMap::new();
    for (col, s) in series.iter().enumerate() {
        for point in s.history() {
            aligned.entry(point.date).or_insert_with(|| vec![None; series.len()])[col] =
                Some(point.close);
        }
    }

    let timeline: Vec<(&DateTime<Utc>, &Vec<Option<f64>>)> = aligned.iter().collect();
    let mut timestamps = Vec::new();
    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for pair in timeline.windows(2) {
        let (_, prev) = pair[0];
        let (ts, curr) = pair[1];

        let row: Option<Vec<f64>> = prev
            .iter()
            .zip(curr.iter())
            .map(|(p, c)| match (p, c) {
                (Some(p), Some(c)) => Some((c - p) / p),
                _ => None,
            })
            .collect();

        match row {
            Some(r) => {
                timestamps.push(*ts);
                rows.push(r);
            }
            None => dropped += 1,
        }
    }

    if rows.is_empty() {
        let short: Vec<&str> = series
            .iter()
            .filter(|s| s.len() < 2)
            .map(|s| s.symbol())
            .collect();
        let reason = if short.is_empty() {
            format!(
                "no aligned time points across {} assets produce a complete return row",
                series.len()
            )
        } else {
            format!("fewer than 2 aligned time points for {}", short.join(", "))
        };
        return Err(OptimizerError::insufficient_data(reason));
    }

    info!(
        "Aligned {} assets over {} time points -> {} return rows ({} dropped)",
        series.len(),
        aligned.len(),
        rows.len(),
        dropped + 1
    );

    ReturnsMatrix::from_rows(
        series.iter().map(|s| s.symbol().to_string()).collect(),
        timestamps,
        rows,
    )
}
