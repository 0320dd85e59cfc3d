use std::fmt;

use jiff::Timestamp;
use tracing::info;

use crate::clock::Clock;

/// Length of the campaign window. With the full window remaining the
/// glitch sits at [`LEVEL_FLOOR`], at the target it saturates at 1.0.
const WINDOW_DAYS: f64 = 24.0;
const LEVEL_FLOOR: f64 = 0.10;
const LEVEL_CEILING: f64 = 1.0;
const MS_PER_DAY: f64 = (1000 * 60 * 60 * 24) as f64;

/// Pump driven countdown towards a fixed target instant. The owner calls
/// [`Countdown::tick`] about once a second; the countdown itself never
/// schedules anything.
#[derive(Debug)]
pub struct Countdown {
    target: Timestamp,
    clock: Clock,
    reached_zero: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Still counting down. `level` is the glitch intensity derived from
    /// the time remaining.
    Running { parts: TimeParts, level: f64 },
    /// The target has been reached. Emitted exactly once, the level is to
    /// be taken as saturated (1.0) from here on.
    Zero,
    /// Every tick after [`Tick::Zero`]; nothing left to do.
    Halted,
}

impl Countdown {
    pub fn new(target: Timestamp, clock: Clock) -> Self {
        Self {
            target,
            clock,
            reached_zero: false,
        }
    }

    pub fn tick(&mut self) -> Tick {
        if self.reached_zero {
            return Tick::Halted;
        }

        let now = self.clock.now();
        if now >= self.target {
            self.reached_zero = true;
            info!("target reached, countdown halted");
            return Tick::Zero;
        }

        let remaining_ms = self.target.as_millisecond() - now.as_millisecond();
        Tick::Running {
            parts: TimeParts::from_millis(remaining_ms),
            level: level_for(remaining_ms as f64 / MS_PER_DAY),
        }
    }

    /// Fractional days until the target, negative once it has passed.
    pub fn days_remaining(&self) -> f64 {
        let remaining_ms = self.target.as_millisecond() - self.clock.now().as_millisecond();
        remaining_ms as f64 / MS_PER_DAY
    }

    pub fn target(&self) -> Timestamp {
        self.target
    }

    pub fn reached_zero(&self) -> bool {
        self.reached_zero
    }
}

/// Linear ramp from [`LEVEL_FLOOR`] (full window remaining) to
/// [`LEVEL_CEILING`] (nothing remaining), clamped at both ends.
fn level_for(days_remaining: f64) -> f64 {
    let progress = 1.0 - days_remaining / WINDOW_DAYS;
    (LEVEL_FLOOR + progress * (LEVEL_CEILING - LEVEL_FLOOR)).clamp(LEVEL_FLOOR, LEVEL_CEILING)
}

/// Remaining time split into days, hours, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    pub days: u64,
    pub hours: u8,
    pub mins: u8,
    pub secs: u8,
}

impl TimeParts {
    pub const ZERO: Self = Self {
        days: 0,
        hours: 0,
        mins: 0,
        secs: 0,
    };

    pub fn from_millis(remaining_ms: i64) -> Self {
        let mut total = (remaining_ms.max(0) / 1000) as u64;
        let days = total / 86400;
        total %= 86400;
        let hours = total / 3600;
        total %= 3600;

        Self {
            days,
            hours: hours as u8,
            mins: (total / 60) as u8,
            secs: (total % 60) as u8,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.days * 86400 + self.hours as u64 * 3600 + self.mins as u64 * 60 + self.secs as u64
    }
}

impl fmt::Display for TimeParts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.days, self.hours, self.mins, self.secs
        )
    }
}
