//! Core types for the facegate engine
//!
//! This module defines the data that flows through each stage of the
//! pipeline: landmarks, orientations, pose classes, challenge steps and the
//! events exchanged with the step sequencer.

use serde::{Deserialize, Serialize};

use crate::error::LivenessError;

// Landmark topology constants, fixed by the upstream face-landmarker model.
// Later stages index landmark sets by these positions, so the normalizer must
// preserve ordering exactly.

/// Nose tip region
pub const NOSE_TIP: usize = 5;
/// Left face contour
pub const CONTOUR_LEFT: usize = 234;
/// Right face contour
pub const CONTOUR_RIGHT: usize = 454;
/// Forehead point
pub const FOREHEAD: usize = 10;
/// Chin point
pub const CHIN: usize = 152;
/// Left eye inner corner
pub const LEFT_EYE_INNER: usize = 145;
/// Left eye outer corner
pub const LEFT_EYE_OUTER: usize = 159;
/// Right eye inner corner
pub const RIGHT_EYE_INNER: usize = 374;
/// Right eye outer corner
pub const RIGHT_EYE_OUTER: usize = 386;

/// Minimum landmark count required by the classifiers (highest referenced
/// index plus one).
pub const REQUIRED_LANDMARKS: usize = CONTOUR_RIGHT + 1;

/// Validate that a non-empty landmark set covers the full topology.
///
/// A set shorter than [`REQUIRED_LANDMARKS`] is a contract violation by the
/// upstream model, caught here rather than as an out-of-bounds access inside
/// a distance computation.
pub fn ensure_topology(landmarks: &[Landmark]) -> Result<(), LivenessError> {
    if landmarks.len() < REQUIRED_LANDMARKS {
        return Err(LivenessError::MalformedLandmarkSet {
            required: REQUIRED_LANDMARKS,
            actual: landmarks.len(),
        });
    }
    Ok(())
}

/// A normalized facial keypoint in [0,1] image-relative space.
///
/// Identified positionally by its index within a face's landmark set; the
/// index semantics are fixed by the upstream model topology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth coordinate; optional in input payloads, carried through untouched.
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Landmark { x, y, z: 0.0 }
    }
}

/// Device/camera orientation of the raw landmark coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Upright,
    RotatedLeft,
    RotatedRight,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Upright => "upright",
            Orientation::RotatedLeft => "rotated_left",
            Orientation::RotatedRight => "rotated_right",
        }
    }
}

/// Instantaneous head pose decided from landmark distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseClass {
    Straight,
    Left,
    Right,
    Up,
    Down,
}

impl PoseClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoseClass::Straight => "straight",
            PoseClass::Left => "left",
            PoseClass::Right => "right",
            PoseClass::Up => "up",
            PoseClass::Down => "down",
        }
    }

    /// The challenge step satisfied by this pose
    pub fn step(&self) -> LivenessStep {
        match self {
            PoseClass::Straight => LivenessStep::Normal,
            PoseClass::Left => LivenessStep::MoveLeft,
            PoseClass::Right => LivenessStep::MoveRight,
            PoseClass::Up => LivenessStep::Up,
            PoseClass::Down => LivenessStep::Down,
        }
    }
}

/// One step of the liveness challenge, in fixed order.
///
/// `Blink` is terminal: advancing from it yields `Blink` again, and overall
/// completion is tracked by a separate flag on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessStep {
    Normal,
    MoveLeft,
    MoveRight,
    Down,
    Up,
    Blink,
}

/// The full challenge in execution order
pub const STEP_SEQUENCE: [LivenessStep; 6] = [
    LivenessStep::Normal,
    LivenessStep::MoveLeft,
    LivenessStep::MoveRight,
    LivenessStep::Down,
    LivenessStep::Up,
    LivenessStep::Blink,
];

impl LivenessStep {
    /// The step that follows this one in the fixed challenge order
    pub fn next(&self) -> LivenessStep {
        match self {
            LivenessStep::Normal => LivenessStep::MoveLeft,
            LivenessStep::MoveLeft => LivenessStep::MoveRight,
            LivenessStep::MoveRight => LivenessStep::Down,
            LivenessStep::Down => LivenessStep::Up,
            LivenessStep::Up => LivenessStep::Blink,
            LivenessStep::Blink => LivenessStep::Blink,
        }
    }

    /// Position within [`STEP_SEQUENCE`]
    pub fn order(&self) -> usize {
        match self {
            LivenessStep::Normal => 0,
            LivenessStep::MoveLeft => 1,
            LivenessStep::MoveRight => 2,
            LivenessStep::Down => 3,
            LivenessStep::Up => 4,
            LivenessStep::Blink => 5,
        }
    }

    /// Instruction text shown to the subject for this step
    pub fn prompt(&self) -> &'static str {
        match self {
            LivenessStep::Normal => "Move face to Camera",
            LivenessStep::MoveLeft => "Move face to Left",
            LivenessStep::MoveRight => "Move face to Right",
            LivenessStep::Down => "Move face to Down",
            LivenessStep::Up => "Move face to Up",
            LivenessStep::Blink => "Blink your eye",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LivenessStep::Normal => "normal",
            LivenessStep::MoveLeft => "move_left",
            LivenessStep::MoveRight => "move_right",
            LivenessStep::Down => "down",
            LivenessStep::Up => "up",
            LivenessStep::Blink => "blink",
        }
    }
}

/// Classification result for a single evaluated step on a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Success,
    Failure,
}

/// Result of the debounced blink check on one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkOutcome {
    None,
    BlinkDetected,
}

/// A classification event produced by the pipeline for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    pub step: LivenessStep,
    pub outcome: StepOutcome,
}

impl StepEvent {
    pub fn success(step: LivenessStep) -> Self {
        StepEvent {
            step,
            outcome: StepOutcome::Success,
        }
    }
}

/// What the sequencer reports back to observers after consuming an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerNotification {
    /// The step the notification refers to
    pub step: LivenessStep,
    /// Outcome for that step
    pub outcome: StepOutcome,
    /// Whether the whole challenge has been completed
    pub is_complete: bool,
}
