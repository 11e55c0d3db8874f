//! Pipeline orchestration
//!
//! This module provides the public API for facegate. One engine instance
//! owns one liveness session: classifiers, blink accumulator and step
//! sequencer. All per-frame processing is synchronous and bounded; callers
//! feeding frames from an asynchronous producer must serialize calls onto
//! one logical worker, since the blink accumulator and session state are
//! single-writer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blink::{BlinkAccumulator, BlinkDetector};
use crate::config::LivenessConfig;
use crate::error::LivenessError;
use crate::normalizer::Normalizer;
use crate::pose::PoseClassifier;
use crate::schema::FrameEvent;
use crate::sequencer::{LivenessSession, StepSequencer};
use crate::types::{
    BlinkOutcome, Landmark, LivenessStep, Orientation, PoseClass, SequencerNotification,
    StepEvent, StepOutcome,
};
use crate::{FACEGATE_VERSION, PRODUCER_NAME};

/// Snapshot of engine state for save/resume
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionState {
    session: LivenessSession,
    blink: BlinkAccumulator,
}

/// Summary of a batch challenge replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeReport {
    pub producer: String,
    pub version: String,
    pub session_id: Uuid,
    /// Whether the challenge reached completion
    pub completed: bool,
    pub frames_processed: usize,
    /// Steps passed, in the order they were satisfied
    pub steps_passed: Vec<LivenessStep>,
}

/// Stateful liveness engine: one instance per challenge attempt.
///
/// Constructed explicitly with a configuration; there is no process-wide
/// instance. Thresholds are applied at construction, so hot-swapping config
/// means building a new engine (or calling [`LivenessEngine::reconfigure`]).
pub struct LivenessEngine {
    config: LivenessConfig,
    pose: PoseClassifier,
    blink: BlinkDetector,
    accumulator: BlinkAccumulator,
    sequencer: StepSequencer,
}

impl Default for LivenessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessEngine {
    /// Create an engine with default thresholds
    pub fn new() -> Self {
        Self::with_config(LivenessConfig::default())
    }

    pub fn with_config(config: LivenessConfig) -> Self {
        LivenessEngine {
            pose: PoseClassifier::new(&config),
            blink: BlinkDetector::new(&config),
            accumulator: BlinkAccumulator::default(),
            sequencer: StepSequencer::new(),
            config,
        }
    }

    /// Rebuild the classifiers with new thresholds, keeping session state
    pub fn reconfigure(&mut self, config: LivenessConfig) {
        self.pose = PoseClassifier::new(&config);
        self.blink = BlinkDetector::new(&config);
        self.config = config;
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    pub fn session(&self) -> &LivenessSession {
        self.sequencer.session()
    }

    pub fn current_step(&self) -> LivenessStep {
        self.sequencer.current_step()
    }

    /// UI prompt for the step the subject should satisfy next
    pub fn prompt(&self) -> &'static str {
        self.sequencer.current_step().prompt()
    }

    pub fn is_complete(&self) -> bool {
        self.sequencer.is_complete()
    }

    /// Classify one frame's faces into step events without touching the
    /// sequencer.
    ///
    /// Per face, in order: normalize to upright space, report
    /// `(Normal, Success)`, then the pose check. A directional pose emits
    /// its event and short-circuits the face. Only when no direction fired
    /// and the current expected step is `Blink` does the blink detector run,
    /// emitting `(Blink, Success)` once the debounced blink confirms.
    ///
    /// Empty faces are skipped; an empty face list yields no events.
    pub fn process(
        &mut self,
        faces: &[Vec<Landmark>],
        orientation: Orientation,
    ) -> Result<Vec<StepEvent>, LivenessError> {
        let mut events = Vec::new();

        for face in faces {
            if face.is_empty() {
                continue;
            }
            let upright = Normalizer::normalize(face, orientation);

            // The face-to-camera step passes on any classifiable frame; the
            // sequencer's step matching makes this a no-op past step one.
            events.push(StepEvent::success(LivenessStep::Normal));

            match self.pose.classify(&upright)? {
                Some(PoseClass::Straight) | None => {
                    if self.sequencer.current_step() == LivenessStep::Blink
                        && self.blink.update(&upright, &mut self.accumulator)?
                            == BlinkOutcome::BlinkDetected
                    {
                        events.push(StepEvent::success(LivenessStep::Blink));
                    }
                }
                Some(direction) => {
                    events.push(StepEvent::success(direction.step()));
                }
            }
        }

        Ok(events)
    }

    /// Feed one classification event into the step sequencer
    pub fn advance(&mut self, event: StepEvent) -> SequencerNotification {
        self.sequencer.advance(event)
    }

    /// Validate a frame, classify it, and feed every event to the sequencer.
    ///
    /// Faces are evaluated independently; the first matching success wins
    /// and the sequencer discards the rest. Returns the notifications for
    /// events that advanced the session.
    pub fn process_frame(
        &mut self,
        frame: &FrameEvent,
    ) -> Result<Vec<SequencerNotification>, LivenessError> {
        frame
            .validate()
            .map_err(|e| LivenessError::InvalidFrame(e.to_string()))?;

        let events = self.process(&frame.faces, frame.orientation)?;

        let mut notifications = Vec::new();
        for event in events {
            let note = self.advance(event);
            if note.outcome == StepOutcome::Success {
                notifications.push(note);
            }
        }
        Ok(notifications)
    }

    /// Discard all session state for a fresh attempt
    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.sequencer.reset();
    }

    /// Serialize sequencer and blink state to JSON
    pub fn save_session(&self) -> Result<String, LivenessError> {
        let state = SessionState {
            session: self.sequencer.session().clone(),
            blink: self.accumulator.clone(),
        };
        Ok(serde_json::to_string(&state)?)
    }

    /// Restore sequencer and blink state from JSON
    pub fn load_session(&mut self, json: &str) -> Result<(), LivenessError> {
        let state: SessionState = serde_json::from_str(json)?;
        self.sequencer = StepSequencer::from_session(state.session);
        self.accumulator = state.blink;
        Ok(())
    }
}

/// Replay a batch of frames through a fresh engine and report the result.
///
/// Frames past completion are not processed.
pub fn run_challenge(
    frames: &[FrameEvent],
    config: LivenessConfig,
) -> Result<ChallengeReport, LivenessError> {
    let mut engine = LivenessEngine::with_config(config);
    let mut steps_passed = Vec::new();
    let mut frames_processed = 0;

    for frame in frames {
        if engine.is_complete() {
            break;
        }
        for note in engine.process_frame(frame)? {
            steps_passed.push(note.step);
        }
        frames_processed += 1;
    }

    Ok(ChallengeReport {
        producer: PRODUCER_NAME.to_string(),
        version: FACEGATE_VERSION.to_string(),
        session_id: engine.session().session_id,
        completed: engine.is_complete(),
        frames_processed,
        steps_passed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CHIN, CONTOUR_LEFT, CONTOUR_RIGHT, FOREHEAD, LEFT_EYE_INNER, LEFT_EYE_OUTER, NOSE_TIP,
        REQUIRED_LANDMARKS, STEP_SEQUENCE,
    };
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn straight_face() -> Vec<Landmark> {
        let mut face = vec![Landmark::new(0.5, 0.5); REQUIRED_LANDMARKS];
        face[NOSE_TIP] = Landmark::new(0.5, 0.5);
        face[CONTOUR_LEFT] = Landmark::new(0.4, 0.5);
        face[CONTOUR_RIGHT] = Landmark::new(0.6, 0.5);
        face[FOREHEAD] = Landmark::new(0.5, 0.4);
        face[CHIN] = Landmark::new(0.5, 0.6);
        // Eyes open
        face[LEFT_EYE_INNER] = Landmark::new(0.45, 0.45);
        face[LEFT_EYE_OUTER] = Landmark::new(0.46, 0.55);
        face
    }

    fn turned_face(pose: PoseClass) -> Vec<Landmark> {
        let mut face = straight_face();
        match pose {
            PoseClass::Left => face[CONTOUR_RIGHT] = Landmark::new(0.9, 0.5),
            PoseClass::Right => face[CONTOUR_LEFT] = Landmark::new(0.1, 0.5),
            PoseClass::Up => face[CHIN] = Landmark::new(0.5, 0.7),
            PoseClass::Down => face[FOREHEAD] = Landmark::new(0.5, 0.3),
            PoseClass::Straight => {}
        }
        face
    }

    fn blinking_face() -> Vec<Landmark> {
        let mut face = straight_face();
        // Left eye closed: wide horizontally, flat vertically
        face[LEFT_EYE_INNER] = Landmark::new(0.44, 0.5);
        face[LEFT_EYE_OUTER] = Landmark::new(0.47, 0.5);
        face
    }

    fn frame(faces: Vec<Vec<Landmark>>) -> FrameEvent {
        FrameEvent::new(Utc::now(), Orientation::Upright, faces)
    }

    #[test]
    fn test_straight_face_emits_only_normal() {
        let mut engine = LivenessEngine::new();
        let events = engine
            .process(&[straight_face()], Orientation::Upright)
            .unwrap();
        assert_eq!(events, vec![StepEvent::success(LivenessStep::Normal)]);
    }

    #[test]
    fn test_turned_face_emits_direction_after_normal() {
        let mut engine = LivenessEngine::new();
        let events = engine
            .process(&[turned_face(PoseClass::Left)], Orientation::Upright)
            .unwrap();
        assert_eq!(
            events,
            vec![
                StepEvent::success(LivenessStep::Normal),
                StepEvent::success(LivenessStep::MoveLeft),
            ]
        );
    }

    #[test]
    fn test_no_faces_yields_no_events() {
        let mut engine = LivenessEngine::new();
        let events = engine.process(&[], Orientation::Upright).unwrap();
        assert!(events.is_empty());
        let events = engine.process(&[vec![]], Orientation::Upright).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_blink_only_evaluated_at_blink_step() {
        let mut engine = LivenessEngine::new();
        // Closed-eye frames before the blink step never touch the counter
        for _ in 0..10 {
            engine
                .process(&[blinking_face()], Orientation::Upright)
                .unwrap();
        }
        assert_eq!(engine.current_step(), LivenessStep::Normal);

        // Walk the session to the blink step
        for step in &STEP_SEQUENCE[..5] {
            engine.advance(StepEvent::success(*step));
        }
        assert_eq!(engine.current_step(), LivenessStep::Blink);

        // Five closed frames confirm the blink on the fifth
        for i in 0..5 {
            let events = engine
                .process(&[blinking_face()], Orientation::Upright)
                .unwrap();
            let blink_fired = events.contains(&StepEvent::success(LivenessStep::Blink));
            assert_eq!(blink_fired, i == 4, "frame {i}");
        }
    }

    #[test]
    fn test_directional_pose_short_circuits_blink() {
        let mut engine = LivenessEngine::new();
        for step in &STEP_SEQUENCE[..5] {
            engine.advance(StepEvent::success(*step));
        }
        // A turned face with closed eyes: the direction event wins and the
        // blink counter stays untouched.
        let mut face = blinking_face();
        face[CONTOUR_RIGHT] = Landmark::new(0.9, 0.5);
        for _ in 0..10 {
            let events = engine.process(&[face.clone()], Orientation::Upright).unwrap();
            assert!(!events.contains(&StepEvent::success(LivenessStep::Blink)));
        }
    }

    #[test]
    fn test_rotated_frames_classify_after_normalization() {
        // Rotate a left-turned face into rotated-right coordinates; the
        // normalizer must undo it: (x, y) stored as (y, 1 - x) maps back
        // through (1 - y', x').
        let upright = turned_face(PoseClass::Left);
        let rotated: Vec<Landmark> = upright
            .iter()
            .map(|lm| Landmark {
                x: lm.y,
                y: 1.0 - lm.x,
                z: lm.z,
            })
            .collect();

        let mut engine = LivenessEngine::new();
        let events = engine
            .process(&[rotated], Orientation::RotatedRight)
            .unwrap();
        assert!(events.contains(&StepEvent::success(LivenessStep::MoveLeft)));
    }

    #[test]
    fn test_process_frame_rejects_invalid_frame() {
        let mut engine = LivenessEngine::new();
        let bad = frame(vec![vec![Landmark::new(0.5, 0.5); 7]]);
        assert!(matches!(
            engine.process_frame(&bad),
            Err(LivenessError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_multi_face_first_match_wins() {
        let mut engine = LivenessEngine::new();
        engine.advance(StepEvent::success(LivenessStep::Normal));
        assert_eq!(engine.current_step(), LivenessStep::MoveLeft);

        // Two faces both turned left: both produce MoveLeft events, only the
        // first advances the session.
        let notes = engine
            .process_frame(&frame(vec![
                turned_face(PoseClass::Left),
                turned_face(PoseClass::Left),
            ]))
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].step, LivenessStep::MoveLeft);
        assert_eq!(engine.current_step(), LivenessStep::MoveRight);
    }

    #[test]
    fn test_end_to_end_challenge() {
        let frames = vec![
            frame(vec![straight_face()]),
            frame(vec![turned_face(PoseClass::Left)]),
            frame(vec![turned_face(PoseClass::Right)]),
            frame(vec![turned_face(PoseClass::Down)]),
            frame(vec![turned_face(PoseClass::Up)]),
            // Five closed-eye frames to satisfy the debounce
            frame(vec![blinking_face()]),
            frame(vec![blinking_face()]),
            frame(vec![blinking_face()]),
            frame(vec![blinking_face()]),
            frame(vec![blinking_face()]),
            // Past completion, never processed
            frame(vec![straight_face()]),
        ];

        let report = run_challenge(&frames, LivenessConfig::default()).unwrap();
        assert!(report.completed);
        assert_eq!(report.frames_processed, 10);
        assert_eq!(report.steps_passed, STEP_SEQUENCE.to_vec());
        assert_eq!(report.producer, PRODUCER_NAME);
    }

    #[test]
    fn test_incomplete_challenge_reports_progress() {
        let frames = vec![
            frame(vec![straight_face()]),
            frame(vec![turned_face(PoseClass::Left)]),
        ];
        let report = run_challenge(&frames, LivenessConfig::default()).unwrap();
        assert!(!report.completed);
        assert_eq!(
            report.steps_passed,
            vec![LivenessStep::Normal, LivenessStep::MoveLeft]
        );
    }

    #[test]
    fn test_reset_clears_blink_progress() {
        let mut engine = LivenessEngine::new();
        for step in &STEP_SEQUENCE[..5] {
            engine.advance(StepEvent::success(*step));
        }
        for _ in 0..3 {
            engine
                .process(&[blinking_face()], Orientation::Upright)
                .unwrap();
        }
        engine.reset();
        assert_eq!(engine.current_step(), LivenessStep::Normal);

        // After reset the debounce starts over
        for step in &STEP_SEQUENCE[..5] {
            engine.advance(StepEvent::success(*step));
        }
        for i in 0..5 {
            let events = engine
                .process(&[blinking_face()], Orientation::Upright)
                .unwrap();
            let fired = events.contains(&StepEvent::success(LivenessStep::Blink));
            assert_eq!(fired, i == 4);
        }
    }

    #[test]
    fn test_save_and_load_session() {
        let mut engine = LivenessEngine::new();
        engine.advance(StepEvent::success(LivenessStep::Normal));
        engine.advance(StepEvent::success(LivenessStep::MoveLeft));
        let saved = engine.save_session().unwrap();

        let mut resumed = LivenessEngine::new();
        resumed.load_session(&saved).unwrap();
        assert_eq!(resumed.current_step(), LivenessStep::MoveRight);
        assert_eq!(
            resumed.session().session_id,
            engine.session().session_id
        );
    }

    #[test]
    fn test_prompt_follows_current_step() {
        let mut engine = LivenessEngine::new();
        assert_eq!(engine.prompt(), "Move face to Camera");
        engine.advance(StepEvent::success(LivenessStep::Normal));
        assert_eq!(engine.prompt(), "Move face to Left");
    }
}
