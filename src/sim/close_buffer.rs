// =============================================================================
// CloseBuffer — bounded sliding window of recent close prices
// =============================================================================
//
// One buffer exists per moving-average period. Appends are FIFO with a fixed
// capacity equal to the period; an MA point may be emitted only once the
// buffer is full, which is what creates the `period - 1` startup gap at the
// head of each MA series.

use std::collections::VecDeque;

use crate::series::Candle;

/// Fixed-capacity FIFO of the most recent `period` close prices.
#[derive(Debug, Clone)]
pub struct CloseBuffer {
    window: VecDeque<f64>,
    period: usize,
}

impl CloseBuffer {
    /// Create an empty buffer for the given period. `period` must be >= 1.
    pub fn new(period: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(period),
            period,
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Whether the window has reached full capacity. Only then does the
    /// owning MA series emit a point.
    pub fn is_full(&self) -> bool {
        self.window.len() >= self.period
    }

    /// Append a close price, evicting the oldest entry when over capacity.
    pub fn push(&mut self, close: f64) {
        self.window.push_back(close);
        while self.window.len() > self.period {
            self.window.pop_front();
        }
    }

    /// Arithmetic mean over the current contents. `None` when empty.
    ///
    /// The window is small (<= 30), so a direct recompute is exact and cheap;
    /// no incremental running-sum bookkeeping to drift.
    pub fn average(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.window.len() as f64)
    }
}

// =============================================================================
// CloseBuffers — the three parallel windows backing MA-7/14/30
// =============================================================================

/// The trio of sliding windows the chart maintains alongside its candles.
#[derive(Debug, Clone)]
pub struct CloseBuffers {
    pub ma7: CloseBuffer,
    pub ma14: CloseBuffer,
    pub ma30: CloseBuffer,
}

impl Default for CloseBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl CloseBuffers {
    pub fn new() -> Self {
        Self {
            ma7: CloseBuffer::new(7),
            ma14: CloseBuffer::new(14),
            ma30: CloseBuffer::new(30),
        }
    }

    /// Push one close into all three windows.
    pub fn push(&mut self, close: f64) {
        self.ma7.push(close);
        self.ma14.push(close);
        self.ma30.push(close);
    }

    /// Rebuild the windows from an existing candle history, as if every close
    /// had been pushed in order. Used when a fresh generator run replaces the
    /// chart state so that subsequent incremental steps continue seamlessly.
    pub fn seed_from(candles: &[Candle]) -> Self {
        let mut buffers = Self::new();
        // Only the trailing 30 closes can still be inside any window.
        let start = candles.len().saturating_sub(30);
        for candle in &candles[start..] {
            buffers.push(candle.close);
        }
        buffers
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_eviction_keeps_the_newest() {
        let mut buf = CloseBuffer::new(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buf.push(v);
        }
        assert_eq!(buf.len(), 3);
        assert!(buf.is_full());
        // (3 + 4 + 5) / 3
        assert!((buf.average().unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn not_full_until_period_reached() {
        let mut buf = CloseBuffer::new(7);
        for i in 0..6 {
            buf.push(i as f64);
            assert!(!buf.is_full());
        }
        buf.push(6.0);
        assert!(buf.is_full());
    }

    #[test]
    fn average_of_empty_is_none() {
        let buf = CloseBuffer::new(5);
        assert_eq!(buf.average(), None);
    }

    #[test]
    fn seed_from_matches_sequential_pushes() {
        let candles: Vec<Candle> = (0..50)
            .map(|i| Candle {
                time: i64::from(i) * 60,
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0 + f64::from(i),
            })
            .collect();

        let seeded = CloseBuffers::seed_from(&candles);

        let mut sequential = CloseBuffers::new();
        for c in &candles {
            sequential.push(c.close);
        }

        assert_eq!(seeded.ma7.average(), sequential.ma7.average());
        assert_eq!(seeded.ma14.average(), sequential.ma14.average());
        assert_eq!(seeded.ma30.average(), sequential.ma30.average());
        assert!(seeded.ma30.is_full());
    }

    #[test]
    fn seed_from_short_history_stays_partial() {
        let candles: Vec<Candle> = (0..10)
            .map(|i| Candle {
                time: i64::from(i) * 60,
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
            })
            .collect();
        let seeded = CloseBuffers::seed_from(&candles);
        assert!(seeded.ma7.is_full());
        assert!(!seeded.ma14.is_full());
        assert!(!seeded.ma30.is_full());
        assert_eq!(seeded.ma30.len(), 10);
    }
}
