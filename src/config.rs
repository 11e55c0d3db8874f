//! Engine configuration
//!
//! All thresholds have defaults matching the reference model tuning. A config
//! is consumed at engine construction; changing a value mid-session means
//! rebuilding the engine with the new config.

use serde::{Deserialize, Serialize};

use crate::error::LivenessError;

/// Horizontal asymmetry ratio above which a left/right turn is accepted
pub const DEFAULT_HORIZONTAL_THRESHOLD: f32 = 2.5;
/// Vertical asymmetry ratio above which an up/down tilt is accepted
pub const DEFAULT_VERTICAL_THRESHOLD: f32 = 1.5;
/// Eye aspect ratio below which an eye counts as open
pub const DEFAULT_EYE_CLOSED_THRESHOLD: f32 = 0.2;
/// Consecutive closed-eye frames required to confirm a blink
pub const DEFAULT_BLINK_DEBOUNCE_FRAMES: u32 = 5;

/// Tunable thresholds for pose and blink classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessConfig {
    /// Ratio of contour distances that confirms a horizontal head turn
    #[serde(default = "default_horizontal_threshold")]
    pub horizontal_threshold: f32,

    /// Ratio of forehead/chin distances that confirms a vertical head tilt
    #[serde(default = "default_vertical_threshold")]
    pub vertical_threshold: f32,

    /// Eye aspect ratio boundary between open and closed
    #[serde(default = "default_eye_closed_threshold")]
    pub eye_closed_threshold: f32,

    /// Closed-frame count at which a blink is confirmed
    #[serde(default = "default_blink_debounce_frames")]
    pub blink_debounce_frames: u32,
}

fn default_horizontal_threshold() -> f32 {
    DEFAULT_HORIZONTAL_THRESHOLD
}

fn default_vertical_threshold() -> f32 {
    DEFAULT_VERTICAL_THRESHOLD
}

fn default_eye_closed_threshold() -> f32 {
    DEFAULT_EYE_CLOSED_THRESHOLD
}

fn default_blink_debounce_frames() -> u32 {
    DEFAULT_BLINK_DEBOUNCE_FRAMES
}

impl Default for LivenessConfig {
    fn default() -> Self {
        LivenessConfig {
            horizontal_threshold: DEFAULT_HORIZONTAL_THRESHOLD,
            vertical_threshold: DEFAULT_VERTICAL_THRESHOLD,
            eye_closed_threshold: DEFAULT_EYE_CLOSED_THRESHOLD,
            blink_debounce_frames: DEFAULT_BLINK_DEBOUNCE_FRAMES,
        }
    }
}

impl LivenessConfig {
    /// Parse a config from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, LivenessError> {
        serde_json::from_str(json).map_err(|e| LivenessError::ConfigError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, LivenessError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LivenessConfig::default();
        assert!((config.horizontal_threshold - 2.5).abs() < f32::EPSILON);
        assert!((config.vertical_threshold - 1.5).abs() < f32::EPSILON);
        assert!((config.eye_closed_threshold - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.blink_debounce_frames, 5);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config = LivenessConfig::from_json(r#"{"vertical_threshold": 1.8}"#).unwrap();
        assert!((config.vertical_threshold - 1.8).abs() < f32::EPSILON);
        assert!((config.horizontal_threshold - 2.5).abs() < f32::EPSILON);
        assert_eq!(config.blink_debounce_frames, 5);
    }

    #[test]
    fn test_json_round_trip() {
        let config = LivenessConfig {
            vertical_threshold: 2.0,
            blink_debounce_frames: 3,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        let back = LivenessConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = LivenessConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, LivenessError::ConfigError(_)));
    }
}
