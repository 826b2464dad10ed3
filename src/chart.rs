// =============================================================================
// ChartState — the append-only history and its event reducer
// =============================================================================
//
// The original UI mutated a state container from a periodic callback; here
// the periodic trigger is just a message fed into `apply`, so the whole
// lifecycle (mount, tick, range change, interval switch) is testable without
// a timer. The history only ever grows within a session; the displayed slice
// is derived on demand and eviction happens there, never in the backing
// arrays.

use rand::Rng;

use crate::runtime_config::Palette;
use crate::series::{HoverRecord, SeriesSet};
use crate::sim::{step, CloseBuffers};
use crate::types::{RangePreset, TimeInterval};
use crate::window::select_window;

/// Messages that drive the chart state machine.
#[derive(Debug, Clone)]
pub enum ChartEvent {
    /// Append exactly one candle/volume/MA tuple via the incremental
    /// extender. A no-op on an empty history (there is nothing to extend).
    Tick,
    /// Select which slice of the history is displayed.
    SetRange(RangePreset),
    /// Replace the whole history with a fresh generator run, e.g. after an
    /// interval switch or an explicit re-fetch.
    Replace {
        interval: TimeInterval,
        series: SeriesSet,
    },
}

/// Everything one mounted chart view owns: the active interval, the selected
/// display range, the accumulated series, and the sliding close windows the
/// extender feeds on.
#[derive(Debug, Clone)]
pub struct ChartState {
    pub interval: TimeInterval,
    pub range: RangePreset,
    pub history: SeriesSet,
    buffers: CloseBuffers,
    palette: Palette,
}

impl ChartState {
    /// Build a state around an initial generator run. The close windows are
    /// re-derived from the series so incremental ticks continue seamlessly.
    pub fn new(interval: TimeInterval, series: SeriesSet, palette: Palette) -> Self {
        let buffers = CloseBuffers::seed_from(&series.candles);
        Self {
            interval,
            range: RangePreset::default(),
            history: series,
            buffers,
            palette,
        }
    }

    /// Apply one event, advancing the state machine.
    pub fn apply(&mut self, event: ChartEvent, rng: &mut impl Rng) {
        match event {
            ChartEvent::Tick => {
                let Some(last) = self.history.last_candle().cloned() else {
                    return;
                };
                let out = step(
                    &last,
                    self.interval,
                    &mut self.buffers,
                    &self.palette,
                    rng,
                );
                self.history.candles.push(out.candle);
                self.history.volumes.push(out.volume);
                self.history.ma7.extend(out.ma7);
                self.history.ma14.extend(out.ma14);
                self.history.ma30.extend(out.ma30);
            }
            ChartEvent::SetRange(preset) => {
                self.range = preset;
            }
            ChartEvent::Replace { interval, series } => {
                self.buffers = CloseBuffers::seed_from(&series.candles);
                self.interval = interval;
                self.history = series;
            }
        }
    }

    /// The windowed slice the dashboard should draw, anchored at `now`.
    pub fn visible(&self, now: i64) -> SeriesSet {
        select_window(&self.history, self.range.window_mode(now))
    }

    /// Merged crosshair record for `time`, looked up in the full history.
    pub fn hover(&self, time: i64) -> Option<HoverRecord> {
        self.history.merged_at(time)
    }

    /// Close price of the most recent candle, if any.
    pub fn last_close(&self) -> Option<f64> {
        self.history.last_close()
    }
}
