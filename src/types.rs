// =============================================================================
// Shared types used across the candlesim service
// =============================================================================

use serde::{Deserialize, Serialize};

// =============================================================================
// TimeInterval — the interval metadata table
// =============================================================================

/// A candle time interval from the fixed supported set.
///
/// Every variant maps to exactly one duration-in-minutes and one dashboard
/// update cadence. Parsing is total: unknown tags fall back to the documented
/// default ([`TimeInterval::M5`]) instead of erroring, so callers never have
/// to handle a failure case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInterval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "3h")]
    H3,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "D")]
    Day,
    #[serde(rename = "W")]
    Week,
}

impl Default for TimeInterval {
    fn default() -> Self {
        Self::M5
    }
}

impl TimeInterval {
    /// Parse an interval tag. Unknown tags fail closed to the default
    /// (5 minutes) so the generator stays total.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "1m" => Self::M1,
            "5m" => Self::M5,
            "15m" => Self::M15,
            "30m" => Self::M30,
            "1h" => Self::H1,
            "3h" => Self::H3,
            "4h" => Self::H4,
            "6h" => Self::H6,
            "12h" => Self::H12,
            "D" => Self::Day,
            "W" => Self::Week,
            _ => Self::default(),
        }
    }

    /// Duration of one candle in minutes. Always positive.
    pub fn duration_minutes(self) -> u32 {
        match self {
            Self::M1 => 1,
            Self::M5 => 5,
            Self::M15 => 15,
            Self::M30 => 30,
            Self::H1 => 60,
            Self::H3 => 180,
            Self::H4 => 240,
            Self::H6 => 360,
            Self::H12 => 720,
            Self::Day => 1440,
            Self::Week => 10080,
        }
    }

    /// Duration of one candle in seconds.
    pub fn duration_secs(self) -> i64 {
        i64::from(self.duration_minutes()) * 60
    }

    /// How often the live feed appends a new candle, in milliseconds.
    ///
    /// Short intervals tick quickly so the chart feels alive; long intervals
    /// are graded down to avoid pointless churn.
    pub fn update_cadence_ms(self) -> u64 {
        match self {
            Self::M1 | Self::M5 => 1000,
            Self::M15 | Self::M30 => 2000,
            Self::H1 | Self::H3 | Self::H4 | Self::H6 => 5000,
            Self::H12 | Self::Day | Self::Week => 10000,
        }
    }

    /// The canonical string tag for this interval.
    pub fn tag(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H3 => "3h",
            Self::H4 => "4h",
            Self::H6 => "6h",
            Self::H12 => "12h",
            Self::Day => "D",
            Self::Week => "W",
        }
    }

    /// All supported intervals, in ascending duration order.
    pub fn all() -> &'static [TimeInterval] {
        &[
            Self::M1,
            Self::M5,
            Self::M15,
            Self::M30,
            Self::H1,
            Self::H3,
            Self::H4,
            Self::H6,
            Self::H12,
            Self::Day,
            Self::Week,
        ]
    }
}

impl std::fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// =============================================================================
// RangePreset — display-range selection state machine
// =============================================================================

/// Which slice of the accumulated history the dashboard is looking at.
///
/// `Auto` shows the most recent 50 candles; the calendar presets show
/// everything newer than now minus 1/7/30 days. Transitions happen only on
/// explicit user selection; the initial state is `Auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangePreset {
    Auto,
    Day,
    Week,
    Month,
}

impl Default for RangePreset {
    fn default() -> Self {
        Self::Auto
    }
}

impl RangePreset {
    /// Parse a preset tag, falling back to `Auto` for unknown input.
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            _ => Self::Auto,
        }
    }
}

impl std::fmt::Display for RangePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_interval_has_positive_duration() {
        for iv in TimeInterval::all() {
            assert!(iv.duration_minutes() > 0, "{iv} has zero duration");
            assert!(iv.update_cadence_ms() > 0, "{iv} has zero cadence");
        }
    }

    #[test]
    fn known_durations() {
        assert_eq!(TimeInterval::M1.duration_minutes(), 1);
        assert_eq!(TimeInterval::M5.duration_minutes(), 5);
        assert_eq!(TimeInterval::H1.duration_minutes(), 60);
        assert_eq!(TimeInterval::H12.duration_minutes(), 720);
        assert_eq!(TimeInterval::Day.duration_minutes(), 1440);
        assert_eq!(TimeInterval::Week.duration_minutes(), 10080);
    }

    #[test]
    fn unknown_tag_falls_back_to_default() {
        let iv = TimeInterval::parse("7x");
        assert_eq!(iv, TimeInterval::M5);
        assert_eq!(iv.duration_minutes(), 5);
        assert_eq!(iv.update_cadence_ms(), 1000);
    }

    #[test]
    fn parse_roundtrips_every_tag() {
        for iv in TimeInterval::all() {
            assert_eq!(TimeInterval::parse(iv.tag()), *iv);
        }
    }

    #[test]
    fn serde_uses_the_wire_tags() {
        let json = serde_json::to_string(&TimeInterval::M15).unwrap();
        assert_eq!(json, "\"15m\"");
        let back: TimeInterval = serde_json::from_str("\"W\"").unwrap();
        assert_eq!(back, TimeInterval::Week);
    }

    #[test]
    fn cadences_come_from_the_supported_set() {
        for iv in TimeInterval::all() {
            assert!(matches!(
                iv.update_cadence_ms(),
                1000 | 2000 | 5000 | 10000
            ));
        }
    }

    #[test]
    fn range_preset_parse_and_default() {
        assert_eq!(RangePreset::default(), RangePreset::Auto);
        assert_eq!(RangePreset::parse("day"), RangePreset::Day);
        assert_eq!(RangePreset::parse("WEEK"), RangePreset::Week);
        assert_eq!(RangePreset::parse("month"), RangePreset::Month);
        assert_eq!(RangePreset::parse("garbage"), RangePreset::Auto);
    }
}
