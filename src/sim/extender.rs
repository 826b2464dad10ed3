// =============================================================================
// Incremental Extender — one-step extension of the random walk
// =============================================================================
//
// Given the last candle and the sliding close windows, produce exactly one new
// candle/volume pair plus any MA points that are due. Uses the same per-step
// formulas as the generator, so a history built by repeated `step` calls is
// statistically indistinguishable from a single generator run and satisfies
// the same structural invariants exactly.
//
// Each call advances the walk by one step. The caller (the chart reducer,
// driven by a single feed loop) guarantees `step` is never invoked
// concurrently on the same buffers.

use rand::Rng;

use crate::runtime_config::Palette;
use crate::series::{Candle, MaPoint, VolumePoint};
use crate::sim::close_buffer::CloseBuffers;
use crate::sim::generator::walk_candle;
use crate::types::TimeInterval;

/// The output of one incremental step.
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub candle: Candle,
    pub volume: VolumePoint,
    /// Present only once the corresponding window has filled.
    pub ma7: Option<MaPoint>,
    pub ma14: Option<MaPoint>,
    pub ma30: Option<MaPoint>,
}

/// Extend the series by one candle.
///
/// The new candle opens exactly at `last.close` (the walk never jumps across
/// a bucket boundary) and its bucket starts one interval duration after
/// `last.time`. `buffers` are updated in place: the new close is appended and
/// the oldest entry drops out once a window is at capacity.
pub fn step(
    last: &Candle,
    interval: TimeInterval,
    buffers: &mut CloseBuffers,
    palette: &Palette,
    rng: &mut impl Rng,
) -> StepOutput {
    let time = last.time + interval.duration_secs();
    let (candle, volume) = walk_candle(time, last.close, rng);

    let volume = VolumePoint {
        time,
        value: volume,
        color: palette.volume_color(candle.is_up()).to_string(),
    };

    buffers.push(candle.close);

    let ma_point = |full: bool, avg: Option<f64>| -> Option<MaPoint> {
        match (full, avg) {
            (true, Some(value)) => Some(MaPoint { time, value }),
            _ => None,
        }
    };

    let ma7 = ma_point(buffers.ma7.is_full(), buffers.ma7.average());
    let ma14 = ma_point(buffers.ma14.is_full(), buffers.ma14.average());
    let ma30 = ma_point(buffers.ma30.is_full(), buffers.ma30.average());

    StepOutput {
        candle,
        volume,
        ma7,
        ma14,
        ma30,
    }
}
