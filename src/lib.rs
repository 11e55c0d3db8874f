//! facegate - On-device liveness-challenge engine for facial landmark streams
//!
//! facegate turns per-frame 3D facial landmark sets into a completed liveness
//! challenge through a deterministic pipeline: coordinate normalization →
//! pose classification (and, at the blink step, blink detection) → step
//! sequencing. A spoofed or stale input stream fails implicitly because the
//! challenge requires a specific temporal sequence of distinct poses:
//! face-to-camera → left → right → down → up → blink.
//!
//! The engine is pure computation over small landmark sets; camera capture,
//! landmark inference and UI rendering are collaborators that feed frames in
//! and consume sequencer notifications.

pub mod blink;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod pose;
pub mod schema;
pub mod sequencer;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use blink::{BlinkAccumulator, BlinkDetector};
pub use config::LivenessConfig;
pub use error::LivenessError;
pub use normalizer::Normalizer;
pub use pipeline::{run_challenge, ChallengeReport, LivenessEngine};
pub use pose::PoseClassifier;
pub use sequencer::{LivenessSession, StepSequencer};
pub use types::{
    BlinkOutcome, Landmark, LivenessStep, Orientation, PoseClass, SequencerNotification,
    StepEvent, StepOutcome,
};

// Schema exports
pub use schema::{FrameEvent, FrameSource, SCHEMA_VERSION};

/// facegate version embedded in challenge reports
pub const FACEGATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for challenge reports
pub const PRODUCER_NAME: &str = "facegate";
