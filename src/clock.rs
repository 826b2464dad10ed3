// =============================================================================
// Clock loop — the 1 s wall-clock display tick
// =============================================================================
//
// Completely independent of the data-extension loop: it only refreshes the
// display-time string in the shared state. The two periodic triggers share no
// mutable chart data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::{interval, Duration};

use crate::app_state::AppState;

/// Format a timestamp the way the dashboard header shows it.
pub fn format_wall_clock(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Refresh the wall-clock string once per second, forever.
pub async fn run_clock_loop(state: Arc<AppState>) {
    let mut ticker = interval(Duration::from_secs(1));
    loop {
        ticker.tick().await;
        *state.wall_clock.write() = format_wall_clock(Utc::now());
        state.increment_version();
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wall_clock_format_is_stable() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 30, 14, 5, 9).unwrap();
        assert_eq!(format_wall_clock(ts), "2026-08-30 14:05:09 UTC");
    }
}
