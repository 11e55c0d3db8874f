//! Error types for facegate

use thiserror::Error;

/// Errors that can occur while classifying frames or driving a session.
///
/// An empty landmark set is not an error: the classifiers treat it as a
/// no-op frame and produce no classification.
#[derive(Debug, Error)]
pub enum LivenessError {
    #[error("Malformed landmark set: topology requires {required} landmarks, got {actual}")]
    MalformedLandmarkSet { required: usize, actual: usize },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
