// =============================================================================
// Series Generator — synthetic random-walk candle history
// =============================================================================
//
// Produces a complete, self-consistent initial dataset: OHLC candles, volume
// bars, and the three moving-average overlays, for a requested interval and
// length. The walk continues candle-to-candle (each open equals the previous
// close) and the first timestamp is anchored at today's midnight UTC so one
// run is internally consistent.
//
// Generation is total: a zero count returns empty series, and an unknown
// interval tag has already fallen back to the default upstream.

use chrono::{NaiveTime, Utc};
use rand::Rng;

use crate::runtime_config::Palette;
use crate::series::{Candle, MaPoint, SeriesSet, VolumePoint};
use crate::sim::close_buffer::CloseBuffers;
use crate::types::TimeInterval;

/// Price the walk is seeded near when the caller has no preference.
pub const DEFAULT_BASE_PRICE: f64 = 107_000.0;

/// Hard lower bound for the walk. Unreachable from the default base price,
/// but keeps a long-running low-priced simulation from collapsing to zero.
pub(crate) const PRICE_FLOOR: f64 = 50_000.0;

/// Half-width of the per-step close perturbation.
const CLOSE_STEP: f64 = 75.0;

/// Upper bound of the wick extension beyond the candle body.
const WICK_RANGE: f64 = 100.0;

/// Advance the walk by one candle: given the bucket timestamp and the opening
/// price, roll the close, wicks, and volume. Shared by the initial generator
/// and the incremental extender so the two produce statistically identical
/// sequences.
pub(crate) fn walk_candle(time: i64, open: f64, rng: &mut impl Rng) -> (Candle, f64) {
    let close = (open + rng.gen_range(-CLOSE_STEP..CLOSE_STEP)).max(PRICE_FLOOR);
    let high = open.max(close) + rng.gen_range(0.0..WICK_RANGE);
    let low = open.min(close) - rng.gen_range(0.0..WICK_RANGE);

    // Volume correlates loosely with the intra-candle range rather than
    // being independent noise.
    let base_volume = rng.gen_range(0.1..0.6);
    let volume = base_volume * (1.0 + 0.001 * (high - low));

    (
        Candle {
            time,
            open,
            high,
            low,
            close,
        },
        volume,
    )
}

/// Unix timestamp of today's midnight UTC — the anchor for candle index 0.
pub(crate) fn midnight_anchor() -> i64 {
    Utc::now()
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp()
}

/// Generate `count` candles (plus volumes and MA overlays) for `interval`.
///
/// `base_price` defaults to [`DEFAULT_BASE_PRICE`]; the actual seed price is
/// perturbed upward by a bounded random offset so consecutive runs differ.
/// `count == 0` yields an all-empty [`SeriesSet`], not an error.
pub fn generate(
    interval: TimeInterval,
    count: usize,
    base_price: Option<f64>,
    palette: &Palette,
    rng: &mut impl Rng,
) -> SeriesSet {
    if count == 0 {
        return SeriesSet::empty();
    }

    let mut set = SeriesSet {
        candles: Vec::with_capacity(count),
        volumes: Vec::with_capacity(count),
        ma7: Vec::with_capacity(count.saturating_sub(6)),
        ma14: Vec::with_capacity(count.saturating_sub(13)),
        ma30: Vec::with_capacity(count.saturating_sub(29)),
    };

    let anchor = midnight_anchor();
    let step_secs = interval.duration_secs();

    let base = base_price.unwrap_or(DEFAULT_BASE_PRICE);
    let mut price = base + rng.gen_range(0.0..1000.0);

    let mut buffers = CloseBuffers::new();

    for i in 0..count {
        let time = anchor + step_secs * i as i64;
        let (candle, volume) = walk_candle(time, price, rng);

        set.volumes.push(VolumePoint {
            time,
            value: volume,
            color: palette.volume_color(candle.is_up()).to_string(),
        });

        buffers.push(candle.close);
        if let Some(avg) = buffers.ma7.average().filter(|_| buffers.ma7.is_full()) {
            set.ma7.push(MaPoint { time, value: avg });
        }
        if let Some(avg) = buffers.ma14.average().filter(|_| buffers.ma14.is_full()) {
            set.ma14.push(MaPoint { time, value: avg });
        }
        if let Some(avg) = buffers.ma30.average().filter(|_| buffers.ma30.is_full()) {
            set.ma30.push(MaPoint { time, value: avg });
        }

        price = candle.close;
        set.candles.push(candle);
    }

    set
}
