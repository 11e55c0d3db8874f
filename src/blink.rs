//! Blink detection
//!
//! Eye openness is judged from an aspect ratio between the inner and outer
//! eye-corner landmarks. Closed-eye frames accumulate in a per-session
//! counter; the blink is confirmed when the counter hits the debounce count
//! exactly. The counter keeps incrementing afterwards and never re-fires, so
//! the signal is single-fire until the session is reset.
//!
//! Both eyes' ratios are computed but only the left eye drives the counter,
//! matching the reference model tuning. Averaging the eyes would change
//! sensitivity and is deliberately not done.

use serde::{Deserialize, Serialize};

use crate::config::LivenessConfig;
use crate::error::LivenessError;
use crate::types::{
    ensure_topology, BlinkOutcome, Landmark, LEFT_EYE_INNER, LEFT_EYE_OUTER, RIGHT_EYE_INNER,
    RIGHT_EYE_OUTER,
};

/// Per-session counter of closed-eye classifications.
///
/// Single-writer: exactly one classification pass may mutate it at a time.
/// Lifetime is one liveness session; `reset` starts a fresh accumulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkAccumulator {
    pub closed_frames: u32,
}

impl BlinkAccumulator {
    pub fn reset(&mut self) {
        self.closed_frames = 0;
    }
}

/// Per-eye measurements for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeScan {
    pub left_aspect_ratio: f32,
    pub right_aspect_ratio: f32,
    /// Whether the left eye counted as closed on this frame
    pub left_closed: bool,
}

/// Detector deciding eye open/closed and accumulating a debounced blink
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    eye_closed_threshold: f32,
    debounce_frames: u32,
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new(&LivenessConfig::default())
    }
}

impl BlinkDetector {
    pub fn new(config: &LivenessConfig) -> Self {
        BlinkDetector {
            eye_closed_threshold: config.eye_closed_threshold,
            debounce_frames: config.blink_debounce_frames,
        }
    }

    /// Measure both eyes without touching the accumulator
    pub fn scan(&self, landmarks: &[Landmark]) -> Result<EyeScan, LivenessError> {
        ensure_topology(landmarks)?;

        let left_aspect_ratio =
            aspect_ratio(landmarks[LEFT_EYE_INNER], landmarks[LEFT_EYE_OUTER]);
        let right_aspect_ratio =
            aspect_ratio(landmarks[RIGHT_EYE_INNER], landmarks[RIGHT_EYE_OUTER]);

        Ok(EyeScan {
            left_aspect_ratio,
            right_aspect_ratio,
            left_closed: left_aspect_ratio >= self.eye_closed_threshold,
        })
    }

    /// Evaluate one frame and fold the left eye's state into the accumulator.
    ///
    /// Emits `BlinkDetected` on the frame where the closed count reaches the
    /// debounce threshold exactly; earlier and later frames emit `None`.
    /// Empty landmark sets are no-op frames.
    pub fn update(
        &self,
        landmarks: &[Landmark],
        accumulator: &mut BlinkAccumulator,
    ) -> Result<BlinkOutcome, LivenessError> {
        if landmarks.is_empty() {
            return Ok(BlinkOutcome::None);
        }

        let scan = self.scan(landmarks)?;
        if scan.left_closed {
            accumulator.closed_frames += 1;
        }

        if accumulator.closed_frames == self.debounce_frames {
            Ok(BlinkOutcome::BlinkDetected)
        } else {
            Ok(BlinkOutcome::None)
        }
    }
}

/// Horizontal over vertical corner distance.
///
/// A zero vertical distance yields infinity, which classifies as closed;
/// this mirrors the unguarded division in the reference implementation.
fn aspect_ratio(inner: Landmark, outer: Landmark) -> f32 {
    (inner.x - outer.x).abs() / (inner.y - outer.y).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::REQUIRED_LANDMARKS;
    use pretty_assertions::assert_eq;

    fn face_with_left_eye(inner: Landmark, outer: Landmark) -> Vec<Landmark> {
        let mut face = vec![Landmark::new(0.5, 0.5); REQUIRED_LANDMARKS];
        face[LEFT_EYE_INNER] = inner;
        face[LEFT_EYE_OUTER] = outer;
        // Right eye wide open so it would never count as closed
        face[RIGHT_EYE_INNER] = Landmark::new(0.6, 0.4);
        face[RIGHT_EYE_OUTER] = Landmark::new(0.61, 0.5);
        face
    }

    /// Left eye with aspect ratio 1.0 (well above the 0.2 boundary)
    fn closed_left_eye() -> Vec<Landmark> {
        face_with_left_eye(Landmark::new(0.4, 0.5), Landmark::new(0.45, 0.55))
    }

    /// Left eye with aspect ratio 0.1 (below the boundary)
    fn open_left_eye() -> Vec<Landmark> {
        face_with_left_eye(Landmark::new(0.4, 0.5), Landmark::new(0.41, 0.6))
    }

    #[test]
    fn test_aspect_ratio_formula() {
        let ratio = aspect_ratio(Landmark::new(0.4, 0.5), Landmark::new(0.43, 0.56));
        assert!((ratio - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_open_eye_does_not_increment() {
        let detector = BlinkDetector::default();
        let mut acc = BlinkAccumulator::default();
        for _ in 0..10 {
            let outcome = detector.update(&open_left_eye(), &mut acc).unwrap();
            assert_eq!(outcome, BlinkOutcome::None);
        }
        assert_eq!(acc.closed_frames, 0);
    }

    #[test]
    fn test_blink_fires_on_exactly_fifth_closed_frame() {
        let detector = BlinkDetector::default();
        let mut acc = BlinkAccumulator::default();

        for frame in 1..=4 {
            let outcome = detector.update(&closed_left_eye(), &mut acc).unwrap();
            assert_eq!(outcome, BlinkOutcome::None, "frame {frame}");
        }
        let outcome = detector.update(&closed_left_eye(), &mut acc).unwrap();
        assert_eq!(outcome, BlinkOutcome::BlinkDetected);
        assert_eq!(acc.closed_frames, 5);

        // The counter keeps climbing past the threshold and never re-fires
        let outcome = detector.update(&closed_left_eye(), &mut acc).unwrap();
        assert_eq!(outcome, BlinkOutcome::None);
        assert_eq!(acc.closed_frames, 6);
    }

    #[test]
    fn test_only_left_eye_drives_counter() {
        let detector = BlinkDetector::default();
        let mut acc = BlinkAccumulator::default();

        // Right eye flat (ratio inf), left eye open
        let mut face = open_left_eye();
        face[RIGHT_EYE_INNER] = Landmark::new(0.6, 0.5);
        face[RIGHT_EYE_OUTER] = Landmark::new(0.7, 0.5);

        let scan = detector.scan(&face).unwrap();
        assert!(scan.right_aspect_ratio.is_infinite());
        assert!(!scan.left_closed);

        detector.update(&face, &mut acc).unwrap();
        assert_eq!(acc.closed_frames, 0);
    }

    #[test]
    fn test_zero_vertical_distance_counts_as_closed() {
        let detector = BlinkDetector::default();
        let face = face_with_left_eye(Landmark::new(0.4, 0.5), Landmark::new(0.5, 0.5));
        let scan = detector.scan(&face).unwrap();
        assert!(scan.left_aspect_ratio.is_infinite());
        assert!(scan.left_closed);
    }

    #[test]
    fn test_custom_debounce_count() {
        let detector = BlinkDetector::new(&LivenessConfig {
            blink_debounce_frames: 2,
            ..Default::default()
        });
        let mut acc = BlinkAccumulator::default();
        assert_eq!(
            detector.update(&closed_left_eye(), &mut acc).unwrap(),
            BlinkOutcome::None
        );
        assert_eq!(
            detector.update(&closed_left_eye(), &mut acc).unwrap(),
            BlinkOutcome::BlinkDetected
        );
    }

    #[test]
    fn test_empty_input_is_no_op() {
        let detector = BlinkDetector::default();
        let mut acc = BlinkAccumulator::default();
        assert_eq!(
            detector.update(&[], &mut acc).unwrap(),
            BlinkOutcome::None
        );
        assert_eq!(acc.closed_frames, 0);
    }

    #[test]
    fn test_short_set_is_malformed() {
        let detector = BlinkDetector::default();
        let mut acc = BlinkAccumulator::default();
        let short = vec![Landmark::new(0.5, 0.5); 200];
        assert!(matches!(
            detector.update(&short, &mut acc),
            Err(LivenessError::MalformedLandmarkSet { actual: 200, .. })
        ));
    }
}
