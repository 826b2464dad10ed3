// =============================================================================
// Windowing/Filter Stage — derive the visible slice of the history
// =============================================================================
//
// The backing history is append-only; what the dashboard sees is a windowed
// copy. The same time predicate is applied to every series so that after
// filtering, equal timestamps still refer to the same market moment (the MA
// series are shorter than the candles near the startup gap, so alignment is
// by time value, never by index). Selection never mutates the source.

use serde::{Deserialize, Serialize};

use crate::series::SeriesSet;
use crate::types::RangePreset;

const DAY_SECS: i64 = 86_400;

/// How the visible slice is selected from the full history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WindowMode {
    /// Keep the last `n` candles (all of them if fewer exist).
    Count { n: usize },
    /// Keep every point with `time >= earliest`.
    Range { earliest: i64 },
}

impl RangePreset {
    /// Resolve this preset into a concrete window mode, anchored at `now`
    /// (Unix seconds) for the calendar presets.
    pub fn window_mode(self, now: i64) -> WindowMode {
        match self {
            RangePreset::Auto => WindowMode::Count { n: 50 },
            RangePreset::Day => WindowMode::Range {
                earliest: now - DAY_SECS,
            },
            RangePreset::Week => WindowMode::Range {
                earliest: now - 7 * DAY_SECS,
            },
            RangePreset::Month => WindowMode::Range {
                earliest: now - 30 * DAY_SECS,
            },
        }
    }

}

/// Select the visible sub-sequence of `history` without mutating it.
///
/// `Count` resolves to the timestamp of the n-th-from-last candle and then
/// filters every series by that cutoff, which keeps the series mutually
/// consistent. `Count { n: 0 }` and an empty history both yield an empty set.
pub fn select_window(history: &SeriesSet, mode: WindowMode) -> SeriesSet {
    let earliest = match mode {
        WindowMode::Range { earliest } => earliest,
        WindowMode::Count { n } => {
            if n == 0 || history.is_empty() {
                return SeriesSet::empty();
            }
            let start = history.candles.len().saturating_sub(n);
            history.candles[start].time
        }
    };

    SeriesSet {
        candles: history
            .candles
            .iter()
            .filter(|c| c.time >= earliest)
            .cloned()
            .collect(),
        volumes: history
            .volumes
            .iter()
            .filter(|v| v.time >= earliest)
            .cloned()
            .collect(),
        ma7: history
            .ma7
            .iter()
            .filter(|m| m.time >= earliest)
            .cloned()
            .collect(),
        ma14: history
            .ma14
            .iter()
            .filter(|m| m.time >= earliest)
            .cloned()
            .collect(),
        ma30: history
            .ma30
            .iter()
            .filter(|m| m.time >= earliest)
            .cloned()
            .collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::Palette;
    use crate::sim::generator::generate;
    use crate::types::TimeInterval;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn history(count: usize) -> SeriesSet {
        generate(
            TimeInterval::M5,
            count,
            None,
            &Palette::default(),
            &mut StdRng::seed_from_u64(7),
        )
    }

    #[test]
    fn count_window_returns_exactly_the_last_n() {
        let full = history(100);
        let windowed = select_window(&full, WindowMode::Count { n: 50 });
        assert_eq!(windowed.candles.len(), 50);
        assert_eq!(windowed.candles.as_slice(), &full.candles[50..]);
        assert_eq!(windowed.volumes.as_slice(), &full.volumes[50..]);
    }

    #[test]
    fn count_window_larger_than_history_returns_all() {
        let full = history(20);
        let windowed = select_window(&full, WindowMode::Count { n: 50 });
        assert_eq!(windowed, full);
    }

    #[test]
    fn count_window_keeps_series_time_aligned() {
        let full = history(100);
        let windowed = select_window(&full, WindowMode::Count { n: 40 });
        let cutoff = windowed.candles[0].time;
        // Every surviving MA point maps onto a surviving candle timestamp.
        for p in windowed.ma7.iter().chain(&windowed.ma14).chain(&windowed.ma30) {
            assert!(p.time >= cutoff);
            assert!(windowed.candles.iter().any(|c| c.time == p.time));
        }
        // MA windows over the same time range as the candles.
        assert_eq!(windowed.ma30.last().map(|p| p.time), full.ma30.last().map(|p| p.time));
    }

    #[test]
    fn range_window_filters_by_time_and_is_idempotent() {
        let full = history(60);
        let earliest = full.candles[30].time;
        let once = select_window(&full, WindowMode::Range { earliest });
        assert!(once.candles.iter().all(|c| c.time >= earliest));
        assert_eq!(once.candles.len(), 30);

        let twice = select_window(&once, WindowMode::Range { earliest });
        assert_eq!(once, twice);
    }

    #[test]
    fn degenerate_inputs_yield_empty_not_error() {
        let empty = SeriesSet::empty();
        assert!(select_window(&empty, WindowMode::Count { n: 50 }).is_empty());

        let full = history(10);
        assert!(select_window(&full, WindowMode::Count { n: 0 }).is_empty());
    }

    #[test]
    fn selection_never_mutates_the_history() {
        let full = history(30);
        let before = full.clone();
        let _ = select_window(&full, WindowMode::Count { n: 5 });
        let _ = select_window(&full, WindowMode::Range { earliest: 0 });
        assert_eq!(full, before);
    }

    #[test]
    fn presets_resolve_to_the_documented_modes() {
        let now = 1_700_000_000;
        assert_eq!(
            RangePreset::Auto.window_mode(now),
            WindowMode::Count { n: 50 }
        );
        assert_eq!(
            RangePreset::Day.window_mode(now),
            WindowMode::Range {
                earliest: now - 86_400
            }
        );
        assert_eq!(
            RangePreset::Week.window_mode(now),
            WindowMode::Range {
                earliest: now - 7 * 86_400
            }
        );
        assert_eq!(
            RangePreset::Month.window_mode(now),
            WindowMode::Range {
                earliest: now - 30 * 86_400
            }
        );
    }
}
