// =============================================================================
// Runtime Configuration — chart simulation settings with atomic save
// =============================================================================
//
// Every tunable for the simulated chart feed lives here. Persistence uses an
// atomic tmp + rename pattern to prevent corruption on crash, and all fields
// carry serde defaults so that adding new fields never breaks loading an
// older config file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_interval() -> String {
    "5m".to_string()
}

fn default_initial_points() -> usize {
    300
}

fn default_base_price() -> f64 {
    107_000.0
}

fn default_fetch_delay_ms() -> u64 {
    500
}

fn default_fetch_failure_rate() -> f64 {
    0.0
}

fn default_volume_up() -> String {
    "#00d4aa".to_string()
}

fn default_volume_down() -> String {
    "#ff6b6b".to_string()
}

fn default_ma7_color() -> String {
    "#f7931a".to_string()
}

fn default_ma14_color() -> String {
    "#00d4aa".to_string()
}

fn default_ma30_color() -> String {
    "#e052a0".to_string()
}

// =============================================================================
// Palette
// =============================================================================

/// Named color palette handed to the presentation side.
///
/// Lifted out of the core logic on purpose: the generator asks the palette
/// for a volume color instead of hardcoding hex strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    /// Volume bar color when the paired candle closed at or above its open.
    #[serde(default = "default_volume_up")]
    pub volume_up: String,
    /// Volume bar color when the paired candle closed below its open.
    #[serde(default = "default_volume_down")]
    pub volume_down: String,
    #[serde(default = "default_ma7_color")]
    pub ma7: String,
    #[serde(default = "default_ma14_color")]
    pub ma14: String,
    #[serde(default = "default_ma30_color")]
    pub ma30: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            volume_up: default_volume_up(),
            volume_down: default_volume_down(),
            ma7: default_ma7_color(),
            ma14: default_ma14_color(),
            ma30: default_ma30_color(),
        }
    }
}

impl Palette {
    /// Color for a volume bar given the paired candle's direction.
    pub fn volume_color(&self, is_up: bool) -> &str {
        if is_up {
            &self.volume_up
        } else {
            &self.volume_down
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the candlesim service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Display symbol for the simulated feed. Cosmetic only; the walk is
    /// synthetic regardless.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Active interval tag. Parsed fail-closed (unknown tags become "5m").
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Number of candles the initial generator run produces.
    #[serde(default = "default_initial_points")]
    pub initial_points: usize,

    /// Price the random walk is seeded near.
    #[serde(default = "default_base_price")]
    pub base_price: f64,

    /// Simulated upstream latency of the fetch stub, in milliseconds.
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,

    /// Probability in [0, 1] that a fetch fails with a transient error.
    /// Zero by default; raise it to exercise the error path.
    #[serde(default = "default_fetch_failure_rate")]
    pub fetch_failure_rate: f64,

    /// Colors for volume bars and MA overlays.
    #[serde(default)]
    pub palette: Palette,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            interval: default_interval(),
            initial_points: default_initial_points(),
            base_price: default_base_price(),
            fetch_delay_ms: default_fetch_delay_ms(),
            fetch_failure_rate: default_fetch_failure_rate(),
            palette: Palette::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbol = %config.symbol,
            interval = %config.interval,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.symbol, "BTCUSDT");
        assert_eq!(cfg.interval, "5m");
        assert_eq!(cfg.initial_points, 300);
        assert!((cfg.base_price - 107_000.0).abs() < f64::EPSILON);
        assert_eq!(cfg.fetch_delay_ms, 500);
        assert_eq!(cfg.fetch_failure_rate, 0.0);
        assert_eq!(cfg.palette.volume_up, "#00d4aa");
        assert_eq!(cfg.palette.volume_down, "#ff6b6b");
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.interval, "5m");
        assert_eq!(cfg.initial_points, 300);
        assert_eq!(cfg.palette.ma30, "#e052a0");
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "interval": "1h", "initial_points": 50 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.interval, "1h");
        assert_eq!(cfg.initial_points, 50);
        assert!((cfg.base_price - 107_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = RuntimeConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.symbol, cfg2.symbol);
        assert_eq!(cfg.interval, cfg2.interval);
        assert_eq!(cfg.palette.volume_up, cfg2.palette.volume_up);
    }

    #[test]
    fn palette_volume_color_follows_direction() {
        let palette = Palette::default();
        assert_eq!(palette.volume_color(true), "#00d4aa");
        assert_eq!(palette.volume_color(false), "#ff6b6b");
    }
}
