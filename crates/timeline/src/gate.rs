use jiff::Timestamp;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::clock::Clock;

/// Shown on a pre-target submit, one picked uniformly at random.
pub const REJECTION_PHRASES: [&str; 11] = [
    "Signal misaligned. Try again later.",
    "Temporal corridor not yet stable.",
    "Chronometric lock engaged.",
    "Phase variance exceeds threshold.",
    "Entry vector rejected by nexus.",
    "Calibration incomplete. Stand by.",
    "Temporal window is sealed.",
    "Sequence desynchronized — hold.",
    "Causality guardrails active.",
    "Phase gate denies ingress.",
    "Await synchronization pulse.",
];

/// Always appended after the random phrase.
pub const REJECTION_SUFFIX: &str = "It is not yet time.";

pub const SUCCESS_MESSAGE: &str = "Temporal lock disengaged.";

/// How long the front end lets the reveal settle before focusing the
/// input.
pub const FOCUS_SETTLE: std::time::Duration = std::time::Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Hidden,
    /// Revealed; whether a submit goes through depends on the clock.
    Visible,
    /// A submit went through at or after the target. Terminal, the form
    /// stays disabled for the rest of the session.
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    Rejected {
        phrase: &'static str,
        suffix: &'static str,
    },
    Unlocked,
    /// Already unlocked, the form is disabled.
    Ignored,
}

/// The time-locked portal form. Holds no submitted data, only which
/// message is on display.
#[derive(Debug)]
pub struct Gate {
    target: Timestamp,
    clock: Clock,
    state: GateState,
    rejection: Option<&'static str>,
}

impl Gate {
    pub fn new(target: Timestamp, clock: Clock) -> Self {
        Self {
            target,
            clock,
            state: GateState::Hidden,
            rejection: None,
        }
    }

    /// Reveals the portal. Returns true on the Hidden -> Visible
    /// transition so the front end can scroll it into view and focus the
    /// input after [`FOCUS_SETTLE`].
    pub fn show(&mut self) -> bool {
        if self.state != GateState::Hidden {
            return false;
        }
        self.state = GateState::Visible;
        info!("portal revealed");
        true
    }

    /// Pre-target the submit stays locked and draws a rejection; at or
    /// after the target it unlocks, terminally. The submitted value is
    /// never stored.
    pub fn submit(&mut self, rng: &mut impl Rng) -> Submit {
        if self.state == GateState::Unlocked {
            return Submit::Ignored;
        }

        if self.clock.now() >= self.target {
            self.state = GateState::Unlocked;
            self.rejection = None;
            info!("temporal lock disengaged");
            Submit::Unlocked
        } else {
            let phrase = *REJECTION_PHRASES
                .choose(rng)
                .expect("phrase list is not empty");
            self.rejection = Some(phrase);
            debug!("gate rejected: {phrase}");
            Submit::Rejected {
                phrase,
                suffix: REJECTION_SUFFIX,
            }
        }
    }

    /// The user editing the input clears a shown rejection. Lock state is
    /// untouched.
    pub fn input_changed(&mut self) {
        self.rejection = None;
    }

    pub fn is_locked(&self) -> bool {
        self.state != GateState::Unlocked && self.clock.now() < self.target
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn rejection(&self) -> Option<&'static str> {
        self.rejection
    }

    pub fn target(&self) -> Timestamp {
        self.target
    }

    /// Diagnostic hook: put a rejection on display regardless of the
    /// clock.
    pub fn force_rejection(&mut self, rng: &mut impl Rng) -> &'static str {
        let phrase = *REJECTION_PHRASES
            .choose(rng)
            .expect("phrase list is not empty");
        self.rejection = Some(phrase);
        phrase
    }

    /// Diagnostic hook: jump straight to the unlocked end state.
    pub fn force_success(&mut self) {
        self.state = GateState::Unlocked;
        self.rejection = None;
    }

    pub fn rejection_phrases() -> &'static [&'static str; 11] {
        &REJECTION_PHRASES
    }
}
