//! Challenge step sequencing
//!
//! The sequencer holds the single expected step and advances it only when a
//! classification event matches. Mismatched events are discarded, never
//! retried or treated as failures; the subject simply keeps attempting until
//! a matching classification arrives. There is no timeout or attempt limit.
//!
//! `current_step` only ever moves forward along the fixed order. `Blink` is
//! terminal: a successful blink marks the session complete and the sequencer
//! stops accepting transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{LivenessStep, SequencerNotification, StepEvent, StepOutcome};

/// State of one liveness attempt, owned exclusively by the sequencer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessSession {
    /// Unique id for this attempt
    pub session_id: Uuid,
    /// The step the subject is expected to satisfy next
    pub current_step: LivenessStep,
    /// Outcome for the current step; reset to `Failure` on every advance
    pub current_outcome: StepOutcome,
    /// Set exactly once, when `Blink` succeeds
    pub is_complete: bool,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl LivenessSession {
    pub fn new() -> Self {
        LivenessSession {
            session_id: Uuid::new_v4(),
            current_step: LivenessStep::Normal,
            current_outcome: StepOutcome::Failure,
            is_complete: false,
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

impl Default for LivenessSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered state machine driving the challenge to completion.
///
/// Single-writer: all transitions for a session must be serialized onto one
/// logical worker; concurrent transitions on the same session are not
/// meaningful.
#[derive(Debug, Clone, Default)]
pub struct StepSequencer {
    session: LivenessSession,
}

impl StepSequencer {
    pub fn new() -> Self {
        StepSequencer {
            session: LivenessSession::new(),
        }
    }

    /// Resume a previously saved session
    pub fn from_session(session: LivenessSession) -> Self {
        StepSequencer { session }
    }

    pub fn session(&self) -> &LivenessSession {
        &self.session
    }

    pub fn current_step(&self) -> LivenessStep {
        self.session.current_step
    }

    pub fn is_complete(&self) -> bool {
        self.session.is_complete
    }

    /// Consume one classification event.
    ///
    /// Events whose step does not equal the current step, or whose outcome
    /// is not `Success`, leave the state untouched. A matching success
    /// notifies for the passed step, advances to the next step and resets
    /// the outcome. A successful `Blink` completes the session; afterwards
    /// every event is ignored.
    pub fn advance(&mut self, event: StepEvent) -> SequencerNotification {
        if self.session.is_complete {
            return SequencerNotification {
                step: self.session.current_step,
                outcome: self.session.current_outcome,
                is_complete: true,
            };
        }

        if event.step != self.session.current_step || event.outcome != StepOutcome::Success {
            return SequencerNotification {
                step: self.session.current_step,
                outcome: self.session.current_outcome,
                is_complete: false,
            };
        }

        let passed = self.session.current_step;
        if passed == LivenessStep::Blink {
            self.session.is_complete = true;
            self.session.completed_at = Some(Utc::now());
        }
        self.session.current_step = passed.next();
        self.session.current_outcome = StepOutcome::Failure;

        SequencerNotification {
            step: passed,
            outcome: StepOutcome::Success,
            is_complete: self.session.is_complete,
        }
    }

    /// Discard all session state and start a fresh attempt
    pub fn reset(&mut self) {
        self.session = LivenessSession::new();
    }
}
