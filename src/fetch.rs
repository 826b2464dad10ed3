// =============================================================================
// Fetch stub — the future real-data hook, backed by the local generator
// =============================================================================
//
// Stands where a real market-data fetch would go: it suspends for a simulated
// upstream latency, can fail transiently at a configured rate, and then
// returns locally generated data. Callers treat failures as boundary errors:
// keep the last-known-good series, surface the message, and offer an explicit
// retry. Cancellation is the caller aborting the task; nothing here touches
// shared state.

use anyhow::{bail, Result};
use rand::Rng;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::runtime_config::RuntimeConfig;
use crate::series::SeriesSet;
use crate::sim::generate;
use crate::types::TimeInterval;

/// Fetch a fresh series for the configured interval and length.
///
/// The only suspension point in the service outside the timer loops.
pub async fn fetch_series(config: &RuntimeConfig, interval: TimeInterval) -> Result<SeriesSet> {
    sleep(Duration::from_millis(config.fetch_delay_ms)).await;

    let mut rng = rand::thread_rng();
    if config.fetch_failure_rate > 0.0 && rng.gen::<f64>() < config.fetch_failure_rate {
        bail!("simulated upstream fetch failure");
    }

    let set = generate(
        interval,
        config.initial_points,
        Some(config.base_price),
        &config.palette,
        &mut rng,
    );
    debug!(
        interval = %interval,
        candles = set.len(),
        "fetch stub produced series"
    );
    Ok(set)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn instant_config() -> RuntimeConfig {
        RuntimeConfig {
            fetch_delay_ms: 0,
            ..RuntimeConfig::default()
        }
    }

    #[tokio::test]
    async fn fetch_returns_the_configured_length() {
        let mut config = instant_config();
        config.initial_points = 75;
        let set = fetch_series(&config, TimeInterval::M5).await.unwrap();
        assert_eq!(set.len(), 75);
        assert_eq!(set.ma7.len(), 69);
    }

    #[tokio::test]
    async fn fetch_with_certain_failure_errors_out() {
        let mut config = instant_config();
        config.fetch_failure_rate = 1.0;
        let err = fetch_series(&config, TimeInterval::M5).await.unwrap_err();
        assert!(err.to_string().contains("fetch failure"));
    }

    #[tokio::test]
    async fn fetch_with_zero_points_is_empty_not_an_error() {
        let mut config = instant_config();
        config.initial_points = 0;
        let set = fetch_series(&config, TimeInterval::H1).await.unwrap();
        assert!(set.is_empty());
    }
}
