//! Engine configuration.

use crate::history::DEFAULT_MAX_HISTORY;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default long-press duration before a touch becomes a drag.
pub const DEFAULT_LONG_PRESS_MS: u64 = 500;
/// Default pointer travel that turns a press into a scroll or click.
pub const DEFAULT_TOUCH_SLOP: f64 = 8.0;
/// Minimum time between two live reorder moves.
pub const DEFAULT_MOVE_DEBOUNCE_MS: u64 = 150;

/// How zoom animations are advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationDriver {
    /// A background ticker advances the animation every frame.
    #[default]
    Background,
    /// The host calls `tick_animations` once per frame.
    Manual,
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_history_size must be at least 1")]
    EmptyHistory,
    #[error("scroll_edge_zone must be in (0, 0.5], got {0}")]
    EdgeZone(f64),
    #[error("{field} must be a finite, non-negative number, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },
}

/// Behavior switches and tuning values for a board engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub enable_card_drag: bool,
    pub enable_column_reorder: bool,
    pub enable_zoom_out_drag: bool,
    pub zoom_out_duration_ms: u64,
    pub zoom_in_duration_ms: u64,
    pub max_history_size: usize,
    pub long_press_ms: u64,
    pub touch_slop: f64,
    /// Scroll speed at the very edge, in pixels per second.
    pub max_scroll_speed: f64,
    /// Edge zone size as a fraction of the viewport extent.
    pub scroll_edge_zone: f64,
    pub enforce_wip_limits: bool,
    pub move_debounce_ms: u64,
    pub animation_driver: AnimationDriver,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            enable_card_drag: true,
            enable_column_reorder: true,
            enable_zoom_out_drag: true,
            zoom_out_duration_ms: 300,
            zoom_in_duration_ms: 250,
            max_history_size: DEFAULT_MAX_HISTORY,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            touch_slop: DEFAULT_TOUCH_SLOP,
            max_scroll_speed: 1200.0,
            scroll_edge_zone: 0.15,
            enforce_wip_limits: true,
            move_debounce_ms: DEFAULT_MOVE_DEBOUNCE_MS,
            animation_driver: AnimationDriver::default(),
        }
    }
}

impl BoardConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history_size == 0 {
            return Err(ConfigError::EmptyHistory);
        }
        if !(self.scroll_edge_zone > 0.0 && self.scroll_edge_zone <= 0.5) {
            return Err(ConfigError::EdgeZone(self.scroll_edge_zone));
        }
        for (field, value) in [
            ("touch_slop", self.touch_slop),
            ("max_scroll_speed", self.max_scroll_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidNumber { field, value });
            }
        }
        Ok(())
    }

    pub fn zoom_out_duration(&self) -> Duration {
        Duration::from_millis(self.zoom_out_duration_ms)
    }

    pub fn zoom_in_duration(&self) -> Duration {
        Duration::from_millis(self.zoom_in_duration_ms)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn move_debounce(&self) -> Duration {
        Duration::from_millis(self.move_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(BoardConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "enable_zoom_out_drag": false, "animation_driver": "manual" }"#;
        let config: BoardConfig = serde_json::from_str(json).unwrap();
        assert!(!config.enable_zoom_out_drag);
        assert_eq!(config.animation_driver, AnimationDriver::Manual);
        assert_eq!(config.max_history_size, 50);
        assert_eq!(config.move_debounce(), Duration::from_millis(150));
    }

    #[test]
    fn test_validation_errors() {
        let config = BoardConfig {
            max_history_size: 0,
            ..BoardConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyHistory));

        let config = BoardConfig {
            scroll_edge_zone: 0.9,
            ..BoardConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EdgeZone(0.9)));

        let config = BoardConfig {
            touch_slop: f64::NAN,
            ..BoardConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidNumber { field: "touch_slop", .. })
        ));
    }
}
