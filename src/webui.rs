use crate::config::{OptimizerConfig, parse_symbol_list};
use crate::data::AssetSeries;
use crate::error::OptimizerError;
use crate::portfolio::{self, OptimizationReport};
use crate::report::SelectionResult;
use anyhow::Result;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Clone)]
struct WebState {
    defaults: OptimizerConfig,
    runtime: Arc<Mutex<RuntimeState>>,
}

#[derive(Clone, Debug, Serialize)]
struct ApiError {
    error: String,
}

#[derive(Clone, Debug, Serialize, Default)]
struct RuntimeState {
    last_symbols: Vec<String>,
    last_result: Option<OptimizeSummary>,
    last_error: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OptimizeRequest {
    series: Vec<AssetSeries>,
    symbols: Option<Vec<String>>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    sample_count: Option<usize>,
    periods_per_year: Option<u32>,
    random_seed: Option<u64>,
    #[serde(default)]
    include_ensemble: bool,
}

#[derive(Clone, Debug, Serialize)]
struct EnsemblePoint {
    #[serde(rename = "return")]
    expected_return: f64,
    risk: f64,
    sharpe: f64,
}

#[derive(Clone, Debug, Serialize)]
struct OptimizeSummary {
    symbols: Vec<String>,
    sample_count: usize,
    random_seed: u64,
    return_rows: usize,
    max_sharpe: SelectionResult,
    max_return: SelectionResult,
    min_risk: SelectionResult,
}

#[derive(Clone, Debug, Serialize)]
struct OptimizeResponse {
    #[serde(flatten)]
    summary: OptimizeSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    ensemble: Option<Vec<EnsemblePoint>>,
}

impl From<&OptimizationReport> for OptimizeSummary {
    fn from(report: &OptimizationReport) -> Self {
        Self {
            symbols: report.symbols.clone(),
            sample_count: report.sample_count,
            random_seed: report.random_seed,
            return_rows: report.returns.n_rows(),
            max_sharpe: report.max_sharpe.clone(),
            max_return: report.max_return.clone(),
            min_risk: report.min_risk.clone(),
        }
    }
}

impl OptimizeRequest {
    fn into_parts(self, defaults: &OptimizerConfig) -> (Vec<AssetSeries>, OptimizerConfig, bool) {
        let symbols = match self.symbols {
            Some(list) => parse_symbol_list(&list.join(",")),
            None => self.series.iter().map(|s| s.symbol().to_string()).collect(),
        };
        let config = OptimizerConfig {
            symbols,
            start_date: self.start_date.or(defaults.start_date),
            end_date: self.end_date.or(defaults.end_date),
            sample_count: self.sample_count.unwrap_or(defaults.sample_count),
            periods_per_year: self.periods_per_year.unwrap_or(defaults.periods_per_year),
            random_seed: self.random_seed.unwrap_or(defaults.random_seed),
        };
        (self.series, config, self.include_ensemble)
    }
}

fn router(state: WebState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/state", get(full_state))
        .route("/api/optimize", post(optimize))
        .with_state(state)
}

pub async fn run_webui_server(port: u16, defaults: OptimizerConfig) -> Result<()> {
    let state = WebState {
        defaults,
        runtime: Arc::new(Mutex::new(RuntimeState::default())),
    };

    let app = router(state);
    let addr = format!("0.0.0.0:{}", port);
    info!("WebUI listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn full_state(State(state): State<WebState>) -> Json<RuntimeState> {
    Json(state.runtime.lock().await.clone())
}

async fn optimize(
    State(state): State<WebState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizeResponse>, (StatusCode, Json<ApiError>)> {
    // Series validation runs during deserialization.
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => {
            let message = rejection.body_text();
            warn!("Rejected optimization request: {}", message);
            record_failure(&state, Vec::new(), message.clone()).await;
            return Err(api_err(StatusCode::BAD_REQUEST, &message));
        }
    };

    let (series, config, include_ensemble) = req.into_parts(&state.defaults);
    let symbols = config.symbols.clone();

    let outcome = tokio::task::spawn_blocking(move || portfolio::optimize(&series, &config))
        .await
        .map_err(internal_err)?;

    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            warn!("Optimization request for {:?} failed: {}", symbols, err);
            record_failure(&state, symbols, err.to_string()).await;
            return Err(optimizer_err(err));
        }
    };

    let summary = OptimizeSummary::from(&report);
    let ensemble = include_ensemble.then(|| {
        report
            .ensemble
            .iter()
            .map(|s| EnsemblePoint {
                expected_return: s.expected_return(),
                risk: s.risk(),
                sharpe: s.sharpe(),
            })
            .collect()
    });

    {
        let mut rs = state.runtime.lock().await;
        rs.last_symbols = symbols;
        rs.last_result = Some(summary.clone());
        rs.last_error = None;
        rs.updated_at = Some(chrono::Local::now().to_rfc3339());
    }

    Ok(Json(OptimizeResponse { summary, ensemble }))
}

async fn record_failure(state: &WebState, symbols: Vec<String>, message: String) {
    let mut rs = state.runtime.lock().await;
    rs.last_symbols = symbols;
    rs.last_error = Some(message);
    rs.updated_at = Some(chrono::Local::now().to_rfc3339());
}

fn api_err(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: message.to_string(),
        }),
    )
}

fn optimizer_err(err: OptimizerError) -> (StatusCode, Json<ApiError>) {
    api_err(StatusCode::BAD_REQUEST, &err.to_string())
}

fn internal_err<E: std::fmt::Display>(err: E) -> (StatusCode, Json<ApiError>) {
    api_err(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
}
