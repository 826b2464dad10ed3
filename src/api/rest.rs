// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The service is a local simulation, so
// there is no authentication layer; CORS is configured permissively for the
// dashboard dev server.

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::feed::run_feed_loop;
use crate::fetch::fetch_series;
use crate::types::{RangePreset, TimeInterval};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/series", get(full_series))
        .route("/api/v1/hover", get(hover))
        .route("/api/v1/intervals", get(intervals))
        .route("/api/v1/control/interval", post(control_interval))
        .route("/api/v1/control/range", post(control_range))
        .route("/api/v1/refetch", post(refetch))
        // ── WebSocket (handled in the ws module but mounted here) ───────
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Snapshot & series
// =============================================================================

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

/// The complete accumulated history, unwindowed.
async fn full_series(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let history = state.chart.read().history.clone();
    Json(history)
}

// =============================================================================
// Hover — merged crosshair record
// =============================================================================

#[derive(Deserialize)]
struct HoverQuery {
    time: i64,
}

/// Returns the merged `{ohlc, volume, ma7?, ma14?, ma30?}` record for the
/// given timestamp, or `null` when hovering off-data.
async fn hover(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HoverQuery>,
) -> impl IntoResponse {
    let record = state.chart.read().hover(query.time);
    Json(record)
}

// =============================================================================
// Interval metadata
// =============================================================================

#[derive(Serialize)]
struct IntervalInfo {
    tag: &'static str,
    duration_minutes: u32,
    update_cadence_ms: u64,
}

async fn intervals() -> impl IntoResponse {
    let infos: Vec<IntervalInfo> = TimeInterval::all()
        .iter()
        .map(|iv| IntervalInfo {
            tag: iv.tag(),
            duration_minutes: iv.duration_minutes(),
            update_cadence_ms: iv.update_cadence_ms(),
        })
        .collect();
    Json(infos)
}

// =============================================================================
// Control: interval switch
// =============================================================================

#[derive(Deserialize)]
struct IntervalRequest {
    interval: String,
}

#[derive(Serialize)]
struct IntervalResponse {
    interval: &'static str,
    candle_count: usize,
    fetch_error: Option<String>,
}

/// Switch the active interval.
///
/// Order matters: the feed epoch is bumped first so the old append loop is
/// cancelled before the new generator run starts, then a fresh loop is armed.
/// If the (simulated) fetch fails, the previous data and interval are kept
/// and the error is surfaced; a loop is re-armed either way so the chart
/// keeps ticking.
async fn control_interval(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IntervalRequest>,
) -> impl IntoResponse {
    // Unknown tags fall back to the default interval rather than erroring.
    let interval = TimeInterval::parse(&req.interval);
    let epoch = state.next_feed_epoch();

    let config = state.runtime_config.read().clone();
    let mut fetch_error = None;

    match fetch_series(&config, interval).await {
        Ok(series) => {
            info!(interval = %interval, candles = series.len(), "interval switched");
            state.replace_chart(interval, series);
            state.record_fetch_ok();
            state.runtime_config.write().interval = interval.tag().to_string();
        }
        Err(e) => {
            warn!(interval = %interval, error = %e, "interval switch fetch failed — keeping previous data");
            fetch_error = Some(e.to_string());
            state.record_fetch_error(e.to_string());
        }
    }

    tokio::spawn(run_feed_loop(state.clone(), epoch));

    let chart = state.chart.read();
    Json(IntervalResponse {
        interval: chart.interval.tag(),
        candle_count: chart.history.len(),
        fetch_error,
    })
}

// =============================================================================
// Control: display range
// =============================================================================

#[derive(Deserialize)]
struct RangeRequest {
    range: String,
}

#[derive(Serialize)]
struct RangeResponse {
    range: RangePreset,
    visible_candles: usize,
}

async fn control_range(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RangeRequest>,
) -> impl IntoResponse {
    let preset = RangePreset::parse(&req.range);
    state.set_range(preset);
    info!(range = %preset, "display range changed");

    let visible = state
        .chart
        .read()
        .visible(chrono::Utc::now().timestamp());
    Json(RangeResponse {
        range: preset,
        visible_candles: visible.candles.len(),
    })
}

// =============================================================================
// Re-fetch — explicit retry of the fetch stub
// =============================================================================

#[derive(Serialize)]
struct RefetchResponse {
    ok: bool,
    candle_count: usize,
    fetch_error: Option<String>,
}

async fn refetch(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let interval = state.chart.read().interval;
    let config = state.runtime_config.read().clone();

    match fetch_series(&config, interval).await {
        Ok(series) => {
            info!(candles = series.len(), "re-fetch succeeded");
            state.replace_chart(interval, series);
            state.record_fetch_ok();
            let count = state.chart.read().history.len();
            Json(RefetchResponse {
                ok: true,
                candle_count: count,
                fetch_error: None,
            })
        }
        Err(e) => {
            warn!(error = %e, "re-fetch failed — keeping previous data");
            state.record_fetch_error(e.to_string());
            let count = state.chart.read().history.len();
            Json(RefetchResponse {
                ok: false,
                candle_count: count,
                fetch_error: Some(e.to_string()),
            })
        }
    }
}
