//! Head pose classification
//!
//! Pose is decided from asymmetry ratios between fixed landmark distances:
//! nose-to-contour for left/right, nose-to-forehead/chin for up/down.
//! Horizontal checks run first and short-circuit, so a frame showing both a
//! strong turn and a strong tilt is always classified horizontally.

use crate::config::LivenessConfig;
use crate::error::LivenessError;
use crate::types::{
    ensure_topology, Landmark, PoseClass, CHIN, CONTOUR_LEFT, CONTOUR_RIGHT, FOREHEAD, NOSE_TIP,
};

/// Classifier deciding straight/left/right/up/down from landmark distances
#[derive(Debug, Clone)]
pub struct PoseClassifier {
    horizontal_threshold: f32,
    vertical_threshold: f32,
}

impl Default for PoseClassifier {
    fn default() -> Self {
        Self::new(&LivenessConfig::default())
    }
}

impl PoseClassifier {
    pub fn new(config: &LivenessConfig) -> Self {
        PoseClassifier {
            horizontal_threshold: config.horizontal_threshold,
            vertical_threshold: config.vertical_threshold,
        }
    }

    /// Classify one face's normalized landmarks.
    ///
    /// Returns `Ok(None)` for an empty landmark set (a no-op frame, not an
    /// error) and `Err` if the set is non-empty but shorter than the fixed
    /// topology requires.
    ///
    /// Ratio comparisons are strict; ties resolve to `Straight`.
    pub fn classify(&self, landmarks: &[Landmark]) -> Result<Option<PoseClass>, LivenessError> {
        if landmarks.is_empty() {
            return Ok(None);
        }
        ensure_topology(landmarks)?;

        let left = distance(landmarks[NOSE_TIP], landmarks[CONTOUR_LEFT]);
        let right = distance(landmarks[NOSE_TIP], landmarks[CONTOUR_RIGHT]);

        if left < right && right / left > self.horizontal_threshold {
            return Ok(Some(PoseClass::Left));
        }
        if right < left && left / right > self.horizontal_threshold {
            return Ok(Some(PoseClass::Right));
        }

        let up = distance(landmarks[NOSE_TIP], landmarks[FOREHEAD]);
        let down = distance(landmarks[NOSE_TIP], landmarks[CHIN]);

        if up < down && down / up > self.vertical_threshold {
            return Ok(Some(PoseClass::Up));
        }
        if down < up && up / down > self.vertical_threshold {
            return Ok(Some(PoseClass::Down));
        }

        Ok(Some(PoseClass::Straight))
    }
}

fn distance(a: Landmark, b: Landmark) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}
