use std::sync::{Arc, Mutex};

use jiff::Timestamp;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a valid instant, expected rfc 3339 such as 2025-11-11T18:11:00Z: {0}")]
    InvalidOverride(#[from] jiff::Error),
}

/// Shared time source. Every component reads the current time through a
/// clone of the same `Clock`, so overriding it moves time for all of them
/// at once. Without an override this is a thin wrapper around the system
/// clock.
#[derive(Debug, Clone, Default)]
pub struct Clock(Arc<Mutex<Option<Timestamp>>>);

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Timestamp {
        self.0
            .lock()
            .expect("no lock user panics")
            .unwrap_or_else(Timestamp::now)
    }

    pub fn set_override(&self, instant: Timestamp) {
        *self.0.lock().expect("no lock user panics") = Some(instant);
        info!("clock override set to {instant}");
    }

    /// Parses and sets an override. Rejects malformed input without
    /// touching the current override.
    pub fn set_override_str(&self, input: &str) -> Result<Timestamp, Error> {
        let instant: Timestamp = input.trim().parse()?;
        self.set_override(instant);
        Ok(instant)
    }

    pub fn clear_override(&self) {
        *self.0.lock().expect("no lock user panics") = None;
        info!("clock override cleared, back to real time");
    }

    pub fn current_override(&self) -> Option<Timestamp> {
        *self.0.lock().expect("no lock user panics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_round_trip() {
        let clock = Clock::new();
        let instant = clock
            .set_override_str("2025-11-01T00:00:00Z")
            .expect("valid rfc 3339");
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.current_override(), Some(instant));

        clock.clear_override();
        assert!(clock.current_override().is_none());
        let wall = Timestamp::now();
        let diff = (clock.now().as_millisecond() - wall.as_millisecond()).abs();
        assert!(diff < 1000, "real clock restored, diff was {diff}ms");
    }

    #[test]
    fn malformed_override_is_rejected() {
        let clock = Clock::new();
        clock.set_override_str("2025-11-01T00:00:00Z").unwrap();
        let before = clock.current_override();

        assert!(clock.set_override_str("eleven past eleven").is_err());
        assert!(clock.set_override_str("").is_err());
        assert_eq!(clock.current_override(), before);
    }

    #[test]
    fn clones_share_the_override() {
        let clock = Clock::new();
        let other = clock.clone();
        let instant = "2025-11-11T18:11:00Z".parse().unwrap();
        clock.set_override(instant);
        assert_eq!(other.now(), instant);
    }
}
