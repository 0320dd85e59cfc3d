//! The full session walk: countdown escalation, zero event, one-shot
//! transmission, portal reveal and the time-locked gate.

use std::cell::Cell;
use std::rc::Rc;

use jiff::{Timestamp, ToSpan};
use rand::rngs::StdRng;
use rand::SeedableRng;

use timeline::{
    AudioSink, Clock, Countdown, Gate, GateState, GlitchFx, PlayError, PlayedFlag, Player,
    PlayerEvent, Submit, Tick, Trigger,
};

#[derive(Default)]
struct FakeSink {
    playing: Rc<Cell<bool>>,
}

impl AudioSink for FakeSink {
    fn start(&mut self) -> Result<(), PlayError> {
        self.playing.set(true);
        Ok(())
    }
    fn unlock(&mut self) -> Result<(), PlayError> {
        Ok(())
    }
    fn finished(&self) -> bool {
        !self.playing.get()
    }
}

fn days_before(target: Timestamp, days: i64) -> Timestamp {
    Timestamp::from_millisecond(target.as_millisecond() - days * 86_400_000).unwrap()
}

#[test]
fn full_session() {
    let target = timeline::default_target();
    let clock = Clock::new();
    let mut countdown = Countdown::new(target, clock.clone());
    let mut fx = GlitchFx::new();
    let mut gate = Gate::new(target, clock.clone());
    let mut rng = StdRng::seed_from_u64(1111);

    let store = PlayedFlag::new(
        &std::env::temp_dir()
            .join("timeline-scenario")
            .join(std::process::id().to_string()),
    );
    store.clear().unwrap();
    let playing = Rc::new(Cell::new(false));
    let mut player = Player::new(
        FakeSink {
            playing: playing.clone(),
        },
        store.clone(),
        clock.clone(),
    );

    // 25 days out the glitch sits on its floor
    clock.set_override(days_before(target, 25));
    let Tick::Running { level, parts } = countdown.tick() else {
        panic!("countdown must be running 25 days out");
    };
    assert!((level - 0.10).abs() < 1e-9);
    assert_eq!(parts.days, 25);
    fx.set_level(level);
    assert_eq!(fx.level(), level);

    // halfway through the window it reaches the midpoint
    clock.set_override(days_before(target, 12));
    let Tick::Running { level, .. } = countdown.tick() else {
        panic!("countdown must be running 12 days out");
    };
    assert!((level - 0.55).abs() < 1e-9);
    assert!(level > fx.level(), "escalation is monotone");
    fx.set_level(level);

    // pre-target the gate only hands out rejections
    gate.show();
    match gate.submit(&mut rng) {
        Submit::Rejected { phrase, suffix } => {
            assert!(Gate::rejection_phrases().contains(&phrase));
            assert_eq!(suffix, "It is not yet time.");
        }
        other => panic!("gate must reject before the target, got {other:?}"),
    }
    assert!(gate.is_locked());

    // the transmission plays once and only once
    player.unlock_gesture();
    assert!(matches!(player.trigger(), Trigger::Started));
    assert!(player.has_played());
    assert!(player.message_revealed());
    assert!(matches!(player.trigger(), Trigger::Refused(_)));

    playing.set(false);
    assert_eq!(player.poll(), None, "completion waits out the delay");
    clock.set_override(clock.now().checked_add(1.seconds()).unwrap());
    assert_eq!(player.poll(), Some(PlayerEvent::Completed));
    assert_eq!(player.poll(), None);

    // at the target: zero event once, level saturated
    clock.set_override(target);
    assert_eq!(countdown.tick(), Tick::Zero);
    fx.set_level(1.0);
    assert_eq!(countdown.tick(), Tick::Halted);
    assert!(countdown.reached_zero());
    assert_eq!(fx.level(), 1.0);

    // and the gate now opens, terminally
    assert_eq!(gate.submit(&mut rng), Submit::Unlocked);
    assert_eq!(gate.state(), GateState::Unlocked);
    assert_eq!(gate.submit(&mut rng), Submit::Ignored);

    // a fresh session sees the persisted flag and skips straight to played
    let resumed = Player::new(FakeSink::default(), store.clone(), clock.clone());
    assert!(resumed.has_played());
    store.clear().unwrap();
}
