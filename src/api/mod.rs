use axum::{
    Router,
    extract::{Json, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::core::{
    AdviceConfig, AdviceEngine, HouseholdParams, Milestone, ProjectionSummary, ScenarioOutput,
    Snapshot, StrategyKind, compare_scenarios,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliStrategy {
    Debt,
    Offset,
    Investment,
    Allocation,
    Expense,
    Income,
    Person,
}

impl From<CliStrategy> for StrategyKind {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Debt => StrategyKind::Debt,
            CliStrategy::Offset => StrategyKind::Offset,
            CliStrategy::Investment => StrategyKind::InvestmentContribution,
            CliStrategy::Allocation => StrategyKind::Allocation,
            CliStrategy::Expense => StrategyKind::Expense,
            CliStrategy::Income => StrategyKind::Income,
            CliStrategy::Person => StrategyKind::PersonSpecific,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long,
        default_value_t = 20.0,
        help = "Drop advice whose effectiveness score is below this value (0-100)"
    )]
    pub min_effectiveness: f64,
    #[arg(long, default_value_t = 10, help = "Maximum recommendations per response")]
    pub max_recommendations: usize,
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        help = "Comma-separated strategies to run; all when omitted"
    )]
    pub strategies: Vec<CliStrategy>,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            port: 8080,
            min_effectiveness: 20.0,
            max_recommendations: 10,
            strategies: Vec::new(),
        }
    }
}

pub fn build_config(args: &ServeArgs) -> Result<AdviceConfig, String> {
    if !(0.0..=100.0).contains(&args.min_effectiveness) {
        return Err("--min-effectiveness must be between 0 and 100".to_string());
    }
    if args.max_recommendations == 0 {
        return Err("--max-recommendations must be > 0".to_string());
    }

    let mut config = AdviceConfig {
        min_effectiveness: args.min_effectiveness,
        max_recommendations: args.max_recommendations,
        ..AdviceConfig::default()
    };
    if !args.strategies.is_empty() {
        config.enabled_strategies = args.strategies.iter().copied().map(StrategyKind::from).collect();
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdviceRequest {
    #[serde(default)]
    params: HouseholdParams,
    snapshots: Vec<Snapshot>,
    #[serde(default)]
    summary: ProjectionSummary,
    #[serde(default)]
    milestones: Option<Vec<Milestone>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompareRequest {
    scenario_a: ScenarioOutput,
    scenario_b: ScenarioOutput,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<AdviceEngine>>,
}

pub async fn run_http_server(port: u16, config: AdviceConfig) -> std::io::Result<()> {
    let engine = AdviceEngine::new(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let config = engine.config();
    tracing::info!(
        min_effectiveness = config.min_effectiveness,
        max_recommendations = config.max_recommendations,
        strategies = config.enabled_strategies.len(),
        "advice engine configured"
    );
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "advice HTTP API listening");

    axum::serve(listener, router(engine)).await
}

fn router(engine: AdviceEngine) -> Router {
    let state = AppState {
        engine: Arc::new(Mutex::new(engine)),
    };
    Router::new()
        .route("/api/advice", post(advice_handler))
        .route("/api/compare", post(compare_handler))
        .route("/api/cache", get(cache_stats_handler).delete(clear_cache_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn advice_handler(State(state): State<AppState>, body: String) -> Response {
    let request = match advice_request_from_json(&body) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let Ok(mut engine) = state.engine.lock() else {
        return engine_unavailable();
    };
    let result = engine.generate(
        &request.snapshots,
        &request.summary,
        &request.params,
        request.milestones.as_deref(),
    );
    json_response(StatusCode::OK, result)
}

async fn compare_handler(body: String) -> Response {
    match compare_request_from_json(&body) {
        Ok(request) => json_response(
            StatusCode::OK,
            compare_scenarios(request.scenario_a, request.scenario_b),
        ),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn cache_stats_handler(State(state): State<AppState>) -> Response {
    match state.engine.lock() {
        Ok(engine) => json_response(StatusCode::OK, engine.cache_stats()),
        Err(_) => engine_unavailable(),
    }
}

async fn clear_cache_handler(State(state): State<AppState>) -> Response {
    match state.engine.lock() {
        Ok(mut engine) => {
            engine.clear_caches();
            tracing::info!("advice caches cleared");
            with_cache_control(StatusCode::NO_CONTENT)
        }
        Err(_) => engine_unavailable(),
    }
}

fn engine_unavailable() -> Response {
    tracing::error!("advice engine lock poisoned");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Advice engine unavailable")
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn advice_request_from_json(json: &str) -> Result<AdviceRequest, String> {
    serde_json::from_str::<AdviceRequest>(json).map_err(|e| format!("Invalid advice payload: {e}"))
}

fn compare_request_from_json(json: &str) -> Result<CompareRequest, String> {
    serde_json::from_str::<CompareRequest>(json)
        .map_err(|e| format!("Invalid comparison payload: {e}"))
}
