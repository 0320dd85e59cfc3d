use std::time::Duration;

/// Discrete rendering buckets for the overlay, from the continuous level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    Off,
    Low,
    Medium,
    High,
    Extreme,
}

/// Result of pumping an in-flight fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fade {
    /// No fade in flight.
    Idle,
    Stepping,
    /// The fade just reached its target. Reported once.
    Done,
}

/// Holds the current glitch intensity, a value in `[0, 1]`. A fade started
/// with [`GlitchFx::step_to`] is advanced cooperatively through
/// [`GlitchFx::pump`]; whoever wrote the level last wins, there is no
/// separate cancel.
#[derive(Debug, Default)]
pub struct GlitchFx {
    level: f64,
    fade: Option<Step>,
}

#[derive(Debug)]
struct Step {
    from: f64,
    to: f64,
    elapsed: Duration,
    duration: Duration,
}

impl GlitchFx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamps to `[0, 1]` and stores. Supersedes any fade in flight.
    pub fn set_level(&mut self, level: f64) {
        self.fade = None;
        self.level = level.clamp(0.0, 1.0);
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn tier(&self) -> Tier {
        match self.level {
            l if l == 0.0 => Tier::Off,
            l if l < 0.3 => Tier::Low,
            l if l < 0.6 => Tier::Medium,
            l if l < 0.9 => Tier::High,
            _ => Tier::Extreme,
        }
    }

    /// Starts an eased fade from the current level. A later `step_to` or
    /// `set_level` replaces it.
    pub fn step_to(&mut self, target: f64, duration: Duration) {
        self.fade = Some(Step {
            from: self.level,
            to: target.clamp(0.0, 1.0),
            elapsed: Duration::ZERO,
            duration,
        });
    }

    /// Advances the fade by `dt` (one animation frame worth of time).
    pub fn pump(&mut self, dt: Duration) -> Fade {
        let Some(step) = &mut self.fade else {
            return Fade::Idle;
        };

        step.elapsed = step.elapsed.saturating_add(dt);
        let progress = if step.duration.is_zero() {
            1.0
        } else {
            (step.elapsed.as_secs_f64() / step.duration.as_secs_f64()).min(1.0)
        };
        self.level = step.from + (step.to - step.from) * ease_in_out(progress);

        if progress >= 1.0 {
            self.fade = None;
            Fade::Done
        } else {
            Fade::Stepping
        }
    }
}

/// Quadratic ease in/out.
fn ease_in_out(progress: f64) -> f64 {
    if progress < 0.5 {
        2.0 * progress * progress
    } else {
        1.0 - (-2.0 * progress + 2.0).powi(2) / 2.0
    }
}
