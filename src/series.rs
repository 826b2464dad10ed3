// =============================================================================
// Chart series records — candles, volume bars, moving-average points
// =============================================================================
//
// These are the tagged records the dashboard consumes. All series inside a
// `SeriesSet` are ordered ascending by `time`; alignment between series is by
// timestamp, never by index, because the MA series start `period - 1` points
// later than the candles.

use serde::{Deserialize, Serialize};

/// A single OHLC candle covering one interval bucket.
///
/// Invariants (upheld by the generator and extender by construction):
/// `low <= min(open, close)`, `high >= max(open, close)`, and consecutive
/// candles are spaced exactly one interval duration apart with
/// `open == previous close`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix timestamp in seconds of the bucket start.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Whether the candle closed at or above its open.
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// One volume histogram bar, paired 1:1 with a candle by timestamp.
///
/// The color is a pure function of the paired candle's direction and the
/// configured palette; core logic never hardcodes color values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    pub time: i64,
    pub value: f64,
    pub color: String,
}

/// One moving-average line point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaPoint {
    pub time: i64,
    pub value: f64,
}

// =============================================================================
// SeriesSet
// =============================================================================

/// The full bundle of aligned series backing one chart view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    pub candles: Vec<Candle>,
    pub volumes: Vec<VolumePoint>,
    pub ma7: Vec<MaPoint>,
    pub ma14: Vec<MaPoint>,
    pub ma30: Vec<MaPoint>,
}

impl SeriesSet {
    /// An all-empty bundle (degenerate inputs produce this, not an error).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of candles in the set.
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// The most recent candle, if any.
    pub fn last_candle(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Close price of the most recent candle, if any.
    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    /// Build the merged crosshair-hover record for the given timestamp.
    ///
    /// Returns `None` when hovering off-data. MA values that do not exist yet
    /// at that timestamp (the startup gap) stay `None` and serialize as
    /// `null`, never as zero.
    pub fn merged_at(&self, time: i64) -> Option<HoverRecord> {
        let candle = self.candles.iter().find(|c| c.time == time)?;
        let volume = self
            .volumes
            .iter()
            .find(|v| v.time == time)
            .map(|v| v.value)
            .unwrap_or(0.0);

        let ma_value = |series: &[MaPoint]| -> Option<f64> {
            series.iter().find(|m| m.time == time).map(|m| m.value)
        };

        Some(HoverRecord {
            time,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            value: volume,
            ma7: ma_value(&self.ma7),
            ma14: ma_value(&self.ma14),
            ma30: ma_value(&self.ma30),
        })
    }
}

/// Merged record for the crosshair tooltip: the candle, its volume, and
/// whichever MA values exist at that timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverRecord {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Volume of the paired histogram bar.
    pub value: f64,
    pub ma7: Option<f64>,
    pub ma14: Option<f64>,
    pub ma30: Option<f64>,
}
