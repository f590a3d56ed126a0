use crate::error::{OptimizerError, Result};
use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::info;

/// A single closing price observation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub date: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: DateTime<Utc>, close: f64) -> Self {
        Self { date, close }
    }
}

/// Close-price history for one symbol.
///
/// Timestamps are strictly increasing and every price is finite and positive;
/// [`AssetSeries::new`] is the only way to build one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct AssetSeries {
    symbol: String,
    history: Vec<PricePoint>,
}

#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    history: Vec<PricePoint>,
}

impl TryFrom<RawSeries> for AssetSeries {
    type Error = OptimizerError;

    fn try_from(raw: RawSeries) -> Result<Self> {
        AssetSeries::new(raw.symbol, raw.history)
    }
}

impl AssetSeries {
    pub fn new(symbol: impl Into<String>, history: Vec<PricePoint>) -> Result<Self> {
        let symbol = symbol.into().trim().to_uppercase();
        if symbol.is_empty() {
            return Err(OptimizerError::InvalidSeries {
                symbol,
                reason: "symbol is blank".to_string(),
            });
        }

        for (i, point) in history.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(OptimizerError::InvalidSeries {
                    symbol,
                    reason: format!("price {} at {} is not a positive number", point.close, point.date),
                });
            }
            if i > 0 && history[i - 1].date >= point.date {
                return Err(OptimizerError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "timestamp {} does not follow {}",
                        point.date,
                        history[i - 1].date
                    ),
                });
            }
        }

        Ok(Self { symbol, history })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn history(&self) -> &[PricePoint] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Restricts the history to the inclusive `[start, end]` date window.
    pub fn within(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let history = self
            .history
            .iter()
            .filter(|p| {
                let day = p.date.date_naive();
                start.is_none_or(|s| day >= s) && end.is_none_or(|e| day <= e)
            })
            .copied()
            .collect();
        Self {
            symbol: self.symbol.clone(),
            history,
        }
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .ok_or_else(|| format!("unrecognized timestamp '{}'", raw))
}

/// Parses a JSON array of `{ "symbol", "history": [{ "date", "close" }] }`.
pub fn parse_price_json(text: &str) -> anyhow::Result<Vec<AssetSeries>> {
    let series: Vec<AssetSeries> =
        serde_json::from_str(text).context("price data is not a valid series array")?;
    Ok(series)
}

pub async fn load_price_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<AssetSeries>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read price file {}", path.display()))?;
    let series = parse_price_json(&text)
        .with_context(|| format!("failed to parse price file {}", path.display()))?;
    for s in &series {
        info!("Loaded {} records for {}", s.len(), s.symbol());
    }
    Ok(series)
}

/// Picks the series for `symbols`, in that order.
pub fn select_series(all: &[AssetSeries], symbols: &[String]) -> Result<Vec<AssetSeries>> {
    symbols
        .iter()
        .map(|symbol| {
            all.iter()
                .find(|s| s.symbol().eq_ignore_ascii_case(symbol))
                .cloned()
                .ok_or_else(|| {
                    OptimizerError::insufficient_data(format!("no price series for {}", symbol))
                })
        })
        .collect()
}

/// Deterministic random-walk price generator for demos and tests.
#[derive(Clone, Debug)]
pub struct SyntheticMarket {
    pub seed: u64,
    pub days: usize,
    pub start: DateTime<Utc>,
}

impl SyntheticMarket {
    pub fn new(seed: u64, days: usize) -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self { seed, days, start }
    }

    /// One series per symbol, drawn from a single stream in symbol order.
    pub fn generate(&self, symbols: &[String]) -> Result<Vec<AssetSeries>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = Vec::with_capacity(symbols.len());

        for (i, symbol) in symbols.iter().enumerate() {
            let drift = 0.0002 + 0.0001 * i as f64;
            let volatility = 0.012 + 0.004 * (i % 4) as f64;
            let daily = Normal::new(drift, volatility).map_err(|e| {
                OptimizerError::invalid_config(format!("synthetic series for {}: {}", symbol, e))
            })?;

            let mut price = 20.0 + 15.0 * i as f64;
            let mut history = Vec::with_capacity(self.days);
            for day in 0..self.days {
                history.push(PricePoint::new(self.start + Duration::days(day as i64), price));
                let step: f64 = daily.sample(&mut rng);
                price *= step.exp();
            }

            out.push(AssetSeries::new(symbol.as_str(), history)?);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_series_rejects_unsorted_timestamps() {
        let result = AssetSeries::new(
            "REE",
            vec![PricePoint::new(day(2), 10.0), PricePoint::new(day(1), 11.0)],
        );
        assert!(matches!(result, Err(OptimizerError::InvalidSeries { .. })));

        let dup = AssetSeries::new(
            "REE",
            vec![PricePoint::new(day(1), 10.0), PricePoint::new(day(1), 11.0)],
        );
        assert!(dup.is_err(), "Duplicate timestamps must be rejected");
    }

    #[test]
    fn test_series_rejects_non_positive_price() {
        let result = AssetSeries::new("ree", vec![PricePoint::new(day(1), 0.0)]);
        assert!(matches!(result, Err(OptimizerError::InvalidSeries { .. })));
    }

    #[test]
    fn test_within_is_inclusive() {
        let series = AssetSeries::new(
            "FMC",
            (1..=5).map(|d| PricePoint::new(day(d), 10.0 + d as f64)).collect(),
        )
        .unwrap();
        let window = series.within(NaiveDate::from_ymd_opt(2024, 1, 2), NaiveDate::from_ymd_opt(2024, 1, 4));
        assert_eq!(window.len(), 3);
        assert_eq!(window.history()[0].date, day(2));
        assert_eq!(window.history()[2].date, day(4));
    }

    #[test]
    fn test_parse_price_json_accepts_dates_and_rfc3339() {
        let text = r#"[
            {"symbol": "ree", "history": [
                {"date": "2024-01-01", "close": 60.0},
                {"date": "2024-01-02T00:00:00Z", "close": 61.5}
            ]}
        ]"#;
        let series = parse_price_json(text).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].symbol(), "REE");
        assert_eq!(series[0].history()[1].date, day(2));
    }

    #[test]
    fn test_parse_price_json_validates_series() {
        let text = r#"[{"symbol": "DHC", "history": [
            {"date": "2024-01-02", "close": 60.0},
            {"date": "2024-01-01", "close": 61.5}
        ]}]"#;
        assert!(parse_price_json(text).is_err());
    }

    #[tokio::test]
    async fn test_load_price_file_reports_missing_file() {
        let result = load_price_file("definitely/not/here.json").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_select_series_keeps_config_order_and_flags_missing() {
        let market = SyntheticMarket::new(7, 10);
        let all = market.generate(&["REE".to_string(), "FMC".to_string()]).unwrap();

        let picked = select_series(&all, &["FMC".to_string(), "REE".to_string()]).unwrap();
        assert_eq!(picked[0].symbol(), "FMC");
        assert_eq!(picked[1].symbol(), "REE");

        let missing = select_series(&all, &["DHC".to_string()]);
        assert!(matches!(missing, Err(OptimizerError::InsufficientData { .. })));
    }

    #[test]
    fn test_synthetic_market_is_deterministic() {
        let symbols = vec!["REE".to_string(), "FMC".to_string(), "DHC".to_string()];
        let a = SyntheticMarket::new(42, 50).generate(&symbols).unwrap();
        let b = SyntheticMarket::new(42, 50).generate(&symbols).unwrap();
        assert_eq!(a, b);
        for s in &a {
            assert_eq!(s.len(), 50);
            assert!(s.history().iter().all(|p| p.close > 0.0));
            assert!(s.history().windows(2).all(|w| w[0].date < w[1].date));
        }
    }
}
