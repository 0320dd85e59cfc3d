use jiff::{Timestamp, ToSpan};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::persist::PlayedFlag;

/// Time between the sink reporting the end of playback and
/// [`PlayerEvent::Completed`], leaving room for transition animations.
const COMPLETION_DELAY_MS: i64 = 500;

#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    /// The platform refuses to start audio until a user gesture unlocked
    /// it. Expected on some platforms, the user can simply try again.
    #[error("playback is blocked until a gesture unlocks audio")]
    Blocked,
    #[error("no audio device available")]
    NoDevice,
    #[error("could not start playback: {0}")]
    Other(String),
}

/// Seam between the player state machine and whatever produces sound.
pub trait AudioSink {
    fn start(&mut self) -> Result<(), PlayError>;
    /// Silent play/pause cycle, used once to satisfy platform gesture
    /// policies before real playback is requested.
    fn unlock(&mut self) -> Result<(), PlayError>;
    fn finished(&self) -> bool;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn start(&mut self) -> Result<(), PlayError> {
        (**self).start()
    }
    fn unlock(&mut self) -> Result<(), PlayError> {
        (**self).unlock()
    }
    fn finished(&self) -> bool {
        (**self).finished()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
    Ended,
}

/// Outcome of a play gesture.
#[derive(Debug)]
pub enum Trigger {
    Started,
    /// The gesture was ignored; the announcement says why.
    Refused(&'static str),
    Failed(PlayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Playback ended and the completion delay has passed. Fires once per
    /// session; the sole hook for downstream reveals.
    Completed,
}

/// One-shot transmission player: `Idle -> Playing -> Ended`. A session
/// where the persisted flag is still fresh starts in `Ended` without ever
/// touching the sink.
pub struct Player<S> {
    state: PlayerState,
    has_played: bool,
    message_revealed: bool,
    unlock_attempted: bool,
    completion_due: Option<Timestamp>,
    completed_fired: bool,
    store: PlayedFlag,
    clock: Clock,
    sink: S,
}

impl<S: AudioSink> Player<S> {
    pub fn new(sink: S, store: PlayedFlag, clock: Clock) -> Self {
        let has_played = store.load(clock.now());
        if has_played {
            info!("transmission was already played in an earlier session");
        }
        Self {
            state: if has_played {
                PlayerState::Ended
            } else {
                PlayerState::Idle
            },
            has_played,
            message_revealed: has_played,
            unlock_attempted: false,
            completion_due: None,
            completed_fired: has_played,
            store,
            clock,
            sink,
        }
    }

    /// A play gesture (click, Enter or Space on the play control).
    pub fn trigger(&mut self) -> Trigger {
        match self.state {
            PlayerState::Playing => Trigger::Refused("transmission already in progress"),
            PlayerState::Ended => Trigger::Refused("the transmission has already been received"),
            PlayerState::Idle => match self.sink.start() {
                Ok(()) => {
                    self.state = PlayerState::Playing;
                    self.has_played = true;
                    self.message_revealed = true;
                    if let Err(err) = self.store.save(self.clock.now()) {
                        warn!("could not persist played flag: {err}");
                    }
                    info!("transmission playing");
                    Trigger::Started
                }
                Err(err) => {
                    match &err {
                        PlayError::Blocked => warn!("playback blocked by gesture policy: {err}"),
                        other => error!("playback failed to start: {other}"),
                    }
                    Trigger::Failed(err)
                }
            },
        }
    }

    /// Observes the sink and the completion delay. Call once per frame.
    pub fn poll(&mut self) -> Option<PlayerEvent> {
        if self.state == PlayerState::Playing && self.sink.finished() {
            self.state = PlayerState::Ended;
            self.completion_due = Some(
                self.clock
                    .now()
                    .checked_add(COMPLETION_DELAY_MS.milliseconds())
                    .expect("delay does not overflow the timestamp range"),
            );
            info!("transmission ended");
        }

        match self.completion_due {
            Some(due) if self.clock.now() >= due && !self.completed_fired => {
                self.completed_fired = true;
                self.completion_due = None;
                Some(PlayerEvent::Completed)
            }
            _ => None,
        }
    }

    /// First pointer or key interaction of the session. Attempts a silent
    /// play/pause cycle; failures are swallowed.
    pub fn unlock_gesture(&mut self) {
        if self.unlock_attempted {
            return;
        }
        self.unlock_attempted = true;
        match self.sink.unlock() {
            Ok(()) => info!("audio unlocked"),
            Err(err) => debug!("audio unlock failed, ignoring: {err}"),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn has_played(&self) -> bool {
        self.has_played
    }

    /// Whether the hidden auxiliary message is to be shown. Revealed the
    /// moment playback starts, not when it completes. Stays hidden when
    /// playback failed to start.
    pub fn message_revealed(&self) -> bool {
        self.message_revealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeSink {
        fail_with: Option<fn() -> PlayError>,
        playing: Rc<Cell<bool>>,
        starts: usize,
        unlocks: usize,
    }

    impl AudioSink for FakeSink {
        fn start(&mut self) -> Result<(), PlayError> {
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            self.starts += 1;
            self.playing.set(true);
            Ok(())
        }
        fn unlock(&mut self) -> Result<(), PlayError> {
            self.unlocks += 1;
            Ok(())
        }
        fn finished(&self) -> bool {
            !self.playing.get()
        }
    }

    fn temp_store(name: &str) -> PlayedFlag {
        let dir = std::env::temp_dir()
            .join("timeline-player-tests")
            .join(format!("{name}-{}", std::process::id()));
        let store = PlayedFlag::new(&dir);
        store.clear().unwrap();
        store
    }

    fn test_clock() -> Clock {
        let clock = Clock::new();
        clock.set_override("2025-11-01T00:00:00Z".parse().unwrap());
        clock
    }

    fn advance(clock: &Clock, ms: i64) {
        let now = clock.now();
        clock.set_override(Timestamp::from_millisecond(now.as_millisecond() + ms).unwrap());
    }

    #[test]
    fn second_gesture_is_refused() {
        let clock = test_clock();
        let playing = Rc::new(Cell::new(false));
        let sink = FakeSink {
            playing: playing.clone(),
            ..FakeSink::default()
        };
        let mut player = Player::new(sink, temp_store("second-gesture"), clock);

        assert!(matches!(player.trigger(), Trigger::Started));
        assert!(player.is_playing());
        assert!(player.has_played());
        assert!(player.message_revealed());

        assert!(matches!(player.trigger(), Trigger::Refused(_)));
        assert_eq!(player.sink.starts, 1, "no duplicate playback");

        // also refused after playback ended
        playing.set(false);
        player.poll();
        assert!(matches!(player.trigger(), Trigger::Refused(_)));
        assert_eq!(player.sink.starts, 1);
    }

    #[test]
    fn completion_fires_once_after_the_delay() {
        let clock = test_clock();
        let playing = Rc::new(Cell::new(false));
        let sink = FakeSink {
            playing: playing.clone(),
            ..FakeSink::default()
        };
        let mut player = Player::new(sink, temp_store("completion"), clock.clone());

        player.trigger();
        assert_eq!(player.poll(), None, "still playing");

        playing.set(false);
        assert_eq!(player.poll(), None, "ended but delay not yet passed");
        assert_eq!(player.state(), PlayerState::Ended);

        advance(&clock, COMPLETION_DELAY_MS);
        assert_eq!(player.poll(), Some(PlayerEvent::Completed));
        assert_eq!(player.poll(), None, "completed fires only once");
    }

    #[test]
    fn failed_start_leaves_idle_and_suppresses_the_message() {
        let clock = test_clock();
        let store = temp_store("failed-start");
        let sink = FakeSink {
            fail_with: Some(|| PlayError::Blocked),
            ..FakeSink::default()
        };
        let mut player = Player::new(sink, store.clone(), clock.clone());

        assert!(matches!(player.trigger(), Trigger::Failed(PlayError::Blocked)));
        assert_eq!(player.state(), PlayerState::Idle);
        assert!(!player.has_played());
        assert!(!player.message_revealed());
        assert!(!store.load(clock.now()), "nothing persisted");

        // the user retrying is the only recovery path
        player.sink.fail_with = None;
        assert!(matches!(player.trigger(), Trigger::Started));
    }

    #[test]
    fn persisted_flag_restores_already_played() {
        let clock = test_clock();
        let store = temp_store("restore");
        store.save(clock.now()).unwrap();

        let mut player = Player::new(FakeSink::default(), store, clock);
        assert_eq!(player.state(), PlayerState::Ended);
        assert!(player.has_played());
        assert!(player.message_revealed());
        assert_eq!(player.sink.starts, 0, "no playback on resume");
        assert_eq!(player.poll(), None, "no completion event on resume");
        assert!(matches!(player.trigger(), Trigger::Refused(_)));
    }

    #[test]
    fn unlock_only_attempted_once() {
        let clock = test_clock();
        let mut player = Player::new(FakeSink::default(), temp_store("unlock"), clock);
        player.unlock_gesture();
        player.unlock_gesture();
        assert_eq!(player.sink.unlocks, 1);
    }
}
