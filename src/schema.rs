//! face.landmark_frame.v1 schema definition
//!
//! The in-memory and NDJSON contract between the upstream landmark model and
//! the engine: one event per processed frame, carrying every detected face's
//! landmark set plus the capture orientation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Landmark, Orientation, REQUIRED_LANDMARKS};

/// Current schema version
pub const SCHEMA_VERSION: &str = "face.landmark_frame.v1";

/// Provenance of a frame's landmarks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameSource {
    /// Landmark model identifier (e.g. "face_landmarker")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Capturing device identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// One frame's worth of landmark data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameEvent {
    /// Schema version identifier
    pub schema_version: String,
    /// Unique frame identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    /// Capture timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// Device/camera orientation of the raw coordinates
    #[serde(default)]
    pub orientation: Orientation,
    /// Landmark set per detected face; may be empty when no face was found
    pub faces: Vec<Vec<Landmark>>,
    /// Optional provenance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<FrameSource>,
}

impl FrameEvent {
    /// Create a new frame event with a generated frame id
    pub fn new(timestamp: DateTime<Utc>, orientation: Orientation, faces: Vec<Vec<Landmark>>) -> Self {
        FrameEvent {
            schema_version: SCHEMA_VERSION.to_string(),
            frame_id: Some(uuid::Uuid::new_v4().to_string()),
            timestamp,
            orientation,
            faces,
            source: None,
        }
    }

    pub fn with_source(mut self, source: FrameSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Validate the frame against the schema.
    ///
    /// An empty face list and empty per-face landmark sets are valid (no-op
    /// frames); a non-empty face with fewer landmarks than the fixed
    /// topology is rejected.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        for (face, landmarks) in self.faces.iter().enumerate() {
            if !landmarks.is_empty() && landmarks.len() < REQUIRED_LANDMARKS {
                return Err(ValidationError::ShortLandmarkSet {
                    face,
                    actual: landmarks.len(),
                    required: REQUIRED_LANDMARKS,
                });
            }
        }

        Ok(())
    }
}

/// Validation errors for frame events
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Face {face} has {actual} landmarks, topology requires {required}")]
    ShortLandmarkSet {
        face: usize,
        actual: usize,
        required: usize,
    },
}
