//! Coordinate normalization
//!
//! Raw landmark coordinates arrive in the device/camera orientation. This
//! module remaps them into the canonical upright space the classifiers
//! expect. The remap is pure and index-preserving: every later stage indexes
//! landmark sets by fixed topology constants.

use crate::types::{Landmark, Orientation};

/// Normalizer for mapping raw landmarks into upright coordinate space
pub struct Normalizer;

impl Normalizer {
    /// Remap a face's landmarks according to the capture orientation.
    ///
    /// - `RotatedLeft`: `(x, y) → (y, 1 − x)`
    /// - `RotatedRight`: `(x, y) → (1 − y, x)`
    /// - `Upright`: identity
    ///
    /// Output has the same length and ordering as the input; `z` passes
    /// through unchanged.
    pub fn normalize(landmarks: &[Landmark], orientation: Orientation) -> Vec<Landmark> {
        match orientation {
            Orientation::Upright => landmarks.to_vec(),
            Orientation::RotatedLeft => landmarks
                .iter()
                .map(|lm| Landmark {
                    x: lm.y,
                    y: 1.0 - lm.x,
                    z: lm.z,
                })
                .collect(),
            Orientation::RotatedRight => landmarks
                .iter()
                .map(|lm| Landmark {
                    x: 1.0 - lm.y,
                    y: lm.x,
                    z: lm.z,
                })
                .collect(),
        }
    }
}
