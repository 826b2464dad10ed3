// =============================================================================
// Central Application State — candlesim service
// =============================================================================
//
// The single source of truth for the running simulation. The chart state
// machine lives behind a parking_lot RwLock; every meaningful mutation bumps
// an atomic version counter, which is what the WebSocket feed watches to
// decide when to push a fresh snapshot. The feed epoch counter is how timer
// loops learn they have been superseded after an interval switch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::chart::{ChartEvent, ChartState};
use crate::runtime_config::{Palette, RuntimeConfig};
use crate::series::SeriesSet;
use crate::types::{RangePreset, TimeInterval};

/// Maximum number of recent errors to retain for the dashboard error log.
const MAX_RECENT_ERRORS: usize = 50;

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter. Incremented on every
    /// meaningful state mutation; the WebSocket feed uses it to detect
    /// changes and push updates.
    pub state_version: AtomicU64,

    /// WebSocket message sequence number (incremented per message sent).
    pub ws_sequence_number: AtomicU64,

    /// Generation counter for the data-extension loop. A loop captures the
    /// epoch at spawn and exits as soon as the counter moves on, so an
    /// interval switch can never leave two append streams running.
    pub feed_epoch: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    /// The chart state machine: history, buffers, interval, range selector.
    pub chart: RwLock<ChartState>,

    /// Display-time string maintained by the independent 1 s clock loop.
    /// Deliberately separate from the chart data; the two tickers share no
    /// mutable state.
    pub wall_clock: RwLock<String>,

    // ── Fetch status ────────────────────────────────────────────────────
    pub last_fetch_ok: RwLock<Option<std::time::Instant>>,
    pub last_fetch_error: RwLock<Option<String>>,

    // ── Error Log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    /// Instant when the service was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct the shared state around an already-initialised chart.
    pub fn new(config: RuntimeConfig, chart: ChartState) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            ws_sequence_number: AtomicU64::new(0),
            feed_epoch: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            chart: RwLock::new(chart),
            wall_clock: RwLock::new(String::new()),
            last_fetch_ok: RwLock::new(None),
            last_fetch_error: RwLock::new(None),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version. Call after every meaningful
    /// mutation to signal WebSocket clients that fresh data is available.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Feed epoch ──────────────────────────────────────────────────────

    /// Invalidate the running data loop and return the fresh epoch the next
    /// loop should carry.
    pub fn next_feed_epoch(&self) -> u64 {
        self.feed_epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_feed_epoch(&self) -> u64 {
        self.feed_epoch.load(Ordering::SeqCst)
    }

    // ── Chart mutations ─────────────────────────────────────────────────

    /// Append one synthetic point (the data-extension tick).
    pub fn advance_chart(&self) {
        let mut rng = rand::thread_rng();
        self.chart.write().apply(ChartEvent::Tick, &mut rng);
        self.increment_version();
    }

    /// Select the displayed range.
    pub fn set_range(&self, preset: RangePreset) {
        let mut rng = rand::thread_rng();
        self.chart
            .write()
            .apply(ChartEvent::SetRange(preset), &mut rng);
        self.increment_version();
    }

    /// Replace the whole history (interval switch or re-fetch).
    pub fn replace_chart(&self, interval: TimeInterval, series: SeriesSet) {
        let mut rng = rand::thread_rng();
        self.chart
            .write()
            .apply(ChartEvent::Replace { interval, series }, &mut rng);
        self.increment_version();
    }

    // ── Fetch status ────────────────────────────────────────────────────

    pub fn record_fetch_ok(&self) {
        *self.last_fetch_ok.write() = Some(std::time::Instant::now());
        *self.last_fetch_error.write() = None;
        self.increment_version();
    }

    pub fn record_fetch_error(&self, message: String) {
        *self.last_fetch_error.write() = Some(message.clone());
        self.push_error(message);
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. The ring buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted at the limit.
    pub fn push_error(&self, message: String) {
        let record = ErrorRecord {
            message,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build the serialisable snapshot sent to the dashboard via
    /// `GET /api/v1/state` and the WebSocket push feed.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let now = Utc::now();
        let config = self.runtime_config.read();
        let chart = self.chart.read();

        let interval = chart.interval;
        let visible = chart.visible(now.timestamp());

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: now.timestamp_millis(),
            wall_clock: self.wall_clock.read().clone(),
            symbol: config.symbol.clone(),
            interval: interval.tag(),
            update_cadence_ms: interval.update_cadence_ms(),
            range: chart.range,
            candle_count: chart.history.len(),
            last_price: chart.last_close(),
            visible,
            palette: config.palette.clone(),
            last_fetch_ok_age_s: self.last_fetch_ok.read().map(|t| t.elapsed().as_secs()),
            last_fetch_error: self.last_fetch_error.read().clone(),
            recent_errors: self.recent_errors.read().clone(),
            uptime_s: self.start_time.elapsed().as_secs(),
        }
    }
}

// =============================================================================
// Serialisable snapshot
// =============================================================================

/// Full service snapshot sent to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub wall_clock: String,
    pub symbol: String,
    pub interval: &'static str,
    pub update_cadence_ms: u64,
    pub range: RangePreset,
    /// Size of the full backing history (the visible slice may be smaller).
    pub candle_count: usize,
    pub last_price: Option<f64>,
    /// The windowed slice the dashboard should draw.
    pub visible: SeriesSet,
    pub palette: Palette,
    pub last_fetch_ok_age_s: Option<u64>,
    pub last_fetch_error: Option<String>,
    pub recent_errors: Vec<ErrorRecord>,
    pub uptime_s: u64,
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::generate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fresh_state(count: usize) -> AppState {
        let config = RuntimeConfig::default();
        let series = generate(
            TimeInterval::M5,
            count,
            None,
            &config.palette,
            &mut StdRng::seed_from_u64(21),
        );
        let chart = ChartState::new(TimeInterval::M5, series, config.palette.clone());
        AppState::new(config, chart)
    }

    #[test]
    fn advance_chart_appends_and_bumps_version() {
        let state = fresh_state(40);
        let v0 = state.current_state_version();
        state.advance_chart();
        assert_eq!(state.chart.read().history.len(), 41);
        assert!(state.current_state_version() > v0);
    }

    #[test]
    fn error_ring_is_capped() {
        let state = fresh_state(1);
        for i in 0..80 {
            state.push_error(format!("error {i}"));
        }
        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), 50);
        assert_eq!(errors[0].message, "error 30");
    }

    #[test]
    fn snapshot_windows_to_fifty_in_auto() {
        let state = fresh_state(200);
        let snapshot = state.build_snapshot();
        assert_eq!(snapshot.candle_count, 200);
        assert_eq!(snapshot.range, RangePreset::Auto);
        assert_eq!(snapshot.visible.candles.len(), 50);
        assert!(snapshot.last_price.is_some());
    }

    #[test]
    fn fetch_error_keeps_last_known_good_data() {
        let state = fresh_state(60);
        let before = state.chart.read().history.clone();

        state.record_fetch_error("simulated upstream fetch failure".into());

        let snapshot = state.build_snapshot();
        assert_eq!(
            snapshot.last_fetch_error.as_deref(),
            Some("simulated upstream fetch failure")
        );
        assert_eq!(state.chart.read().history, before);
        assert_eq!(snapshot.candle_count, 60);

        // A later success clears the error.
        state.record_fetch_ok();
        let snapshot = state.build_snapshot();
        assert_eq!(snapshot.last_fetch_error, None);
        assert!(snapshot.last_fetch_ok_age_s.is_some());
    }

    #[test]
    fn feed_epoch_moves_forward() {
        let state = fresh_state(1);
        assert_eq!(state.current_feed_epoch(), 1);
        let next = state.next_feed_epoch();
        assert_eq!(next, 2);
        assert_eq!(state.current_feed_epoch(), 2);
    }

    #[test]
    fn set_range_reflects_in_snapshot() {
        let state = fresh_state(10);
        state.set_range(RangePreset::Month);
        let snapshot = state.build_snapshot();
        assert_eq!(snapshot.range, RangePreset::Month);
    }
}
