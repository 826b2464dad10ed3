// =============================================================================
// Feed loop — the cadence-driven data-extension tick
// =============================================================================
//
// One loop per feed epoch. The loop captures the epoch it was spawned with
// and exits the moment the shared counter moves past it, so switching
// intervals (which bumps the epoch before arming a new loop) can never leave
// two append streams racing on the same history, and no tick lands on a
// discarded series.

use std::sync::Arc;

use tokio::time::{interval, Duration};
use tracing::{debug, info};

use crate::app_state::AppState;

/// Run the data-extension loop for the given epoch until superseded.
///
/// The cadence comes from the interval active at spawn time; an interval
/// switch replaces the loop rather than retuning it.
pub async fn run_feed_loop(state: Arc<AppState>, epoch: u64) {
    let cadence_ms = state.chart.read().interval.update_cadence_ms();
    info!(epoch, cadence_ms, "feed loop starting");

    let mut ticker = interval(Duration::from_millis(cadence_ms));
    // The first tick of a tokio interval fires immediately; the initial
    // history was just generated, so skip it.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if state.current_feed_epoch() != epoch {
            info!(epoch, "feed loop superseded — exiting");
            return;
        }

        state.advance_chart();
        debug!(
            epoch,
            candles = state.chart.read().history.len(),
            "appended one candle"
        );
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartState;
    use crate::runtime_config::RuntimeConfig;
    use crate::sim::generate;
    use crate::types::TimeInterval;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn shared_state(count: usize) -> Arc<AppState> {
        let config = RuntimeConfig::default();
        let series = generate(
            TimeInterval::M5,
            count,
            None,
            &config.palette,
            &mut StdRng::seed_from_u64(33),
        );
        let chart = ChartState::new(TimeInterval::M5, series, config.palette.clone());
        Arc::new(AppState::new(config, chart))
    }

    #[tokio::test(start_paused = true)]
    async fn stale_epoch_exits_without_appending() {
        let state = shared_state(20);
        // Supersede before the loop ever ticks.
        state.next_feed_epoch();

        let handle = tokio::spawn(run_feed_loop(state.clone(), 1));
        handle.await.unwrap();

        assert_eq!(state.chart.read().history.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn live_epoch_appends_on_each_tick() {
        let state = shared_state(20);
        let handle = tokio::spawn(run_feed_loop(state.clone(), 1));

        // M5 cadence is 1000 ms; let a few ticks elapse under paused time.
        tokio::time::sleep(Duration::from_millis(3_100)).await;

        let appended = state.chart.read().history.len() - 20;
        assert!(appended >= 2, "expected several appends, got {appended}");

        // Cancel and confirm the loop winds down.
        state.next_feed_epoch();
        handle.await.unwrap();
    }
}
