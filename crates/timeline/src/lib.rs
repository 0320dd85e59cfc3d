//! Coordination logic for the Timeline Reset experience: a countdown to a
//! fixed target instant, a glitch intensity that escalates as the target
//! nears, a one-shot audio transmission gated behind a user gesture and a
//! time-locked portal form.
//!
//! Everything here is pump driven: nothing owns a timer or a thread. The
//! front end (or a test) advances the components by calling their `tick`,
//! `pump` and `poll` operations. All reads of the current time go through
//! [`Clock`], which can be overridden to any instant.

pub mod clock;
pub mod countdown;
pub mod gate;
pub mod glitch;
pub mod persist;
pub mod player;

pub use clock::Clock;
pub use countdown::{Countdown, Tick, TimeParts};
pub use gate::{Gate, GateState, Submit};
pub use glitch::{Fade, GlitchFx, Tier};
pub use persist::PlayedFlag;
pub use player::{AudioSink, PlayError, Player, PlayerEvent, PlayerState, Trigger};

/// The instant everything counts down to: 2025-11-11 11:11 MT.
pub const TARGET: &str = "2025-11-11T18:11:00Z";

pub fn default_target() -> jiff::Timestamp {
    TARGET.parse().expect("compiled in target is valid rfc 3339")
}
