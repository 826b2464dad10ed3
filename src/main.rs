// =============================================================================
// candlesim — Simulated Candlestick Market-Data Service
// =============================================================================
//
// Serves a synthetically generated OHLC chart (candles, volume histogram,
// MA-7/14/30 overlays) over REST and WebSocket, extending the series on a
// per-interval cadence. All data is process-memory only and discarded on
// shutdown.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod chart;
mod clock;
mod feed;
mod fetch;
mod runtime_config;
mod series;
mod sim;
mod types;
mod window;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::chart::ChartState;
use crate::fetch::fetch_series;
use crate::runtime_config::RuntimeConfig;
use crate::series::SeriesSet;
use crate::types::TimeInterval;

const CONFIG_PATH: &str = "candlesim_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("candlesim starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Env overrides for quick experiments.
    if let Ok(interval) = std::env::var("CANDLESIM_INTERVAL") {
        config.interval = interval;
    }
    if let Ok(points) = std::env::var("CANDLESIM_POINTS") {
        match points.parse::<usize>() {
            Ok(n) => config.initial_points = n,
            Err(_) => warn!(points = %points, "ignoring unparsable CANDLESIM_POINTS"),
        }
    }

    let interval = TimeInterval::parse(&config.interval);
    info!(
        symbol = %config.symbol,
        interval = %interval,
        points = config.initial_points,
        cadence_ms = interval.update_cadence_ms(),
        "configured simulation"
    );

    // ── 2. Initial data load via the fetch stub ──────────────────────────
    // A fetch failure is not fatal: start with an empty history, keep the
    // error visible, and let the dashboard trigger a re-fetch.
    let (initial_series, initial_error) = match fetch_series(&config, interval).await {
        Ok(series) => (series, None),
        Err(e) => {
            warn!(error = %e, "initial fetch failed — starting empty");
            (SeriesSet::empty(), Some(e.to_string()))
        }
    };

    // ── 3. Build shared state ────────────────────────────────────────────
    let chart = ChartState::new(interval, initial_series, config.palette.clone());
    let state = Arc::new(AppState::new(config, chart));
    match initial_error {
        Some(message) => state.record_fetch_error(message),
        None => state.record_fetch_ok(),
    }

    // ── 4. Periodic loops ────────────────────────────────────────────────
    // Data-extension tick at the interval's cadence (epoch 1 is armed here;
    // interval switches bump the epoch and arm replacements).
    tokio::spawn(feed::run_feed_loop(state.clone(), state.current_feed_epoch()));

    // Independent 1 s wall-clock display tick.
    tokio::spawn(clock::run_clock_loop(state.clone()));

    // ── 5. API server ────────────────────────────────────────────────────
    let bind_addr =
        std::env::var("CANDLESIM_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());
    let api_state = state.clone();
    let bind_addr_clone = bind_addr.clone();

    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app)
            .await
            .expect("API server failed");
    });

    info!("all subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("shutdown signal received — stopping");

    // Stop the feed loop; the chart history is in-memory only and dropped.
    state.next_feed_epoch();

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "failed to save runtime config on shutdown");
    }

    info!("candlesim shut down complete");
    Ok(())
}
