use std::io::stdout;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::{CrosstermBackend, Terminal};
use timeline::{
    gate, AudioSink, Clock, Countdown, Gate, GateState, GlitchFx, Player, PlayerEvent, Submit,
    Tick, TimeParts, Trigger,
};

mod render;

/// Revealed the moment the transmission starts playing.
const HIDDEN_MESSAGE: &str = "THE SIGNAL IS AUTHENTIC · HOLD FOR THE RESET";
/// Replaces the countdown once the target is reached.
const BREACH_MESSAGE: &str = "SIGNAL BREACHED";

const COUNTDOWN_CADENCE: Duration = Duration::from_secs(1);
const BREACH_FADE: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Play,
    Gate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Normal,
    /// Editing the clock override prompt.
    Override,
}

pub struct App {
    clock: Clock,
    countdown: Countdown,
    fx: GlitchFx,
    player: Player<Box<dyn AudioSink>>,
    gate: Gate,

    parts: TimeParts,
    breached: bool,
    announcement: Option<String>,
    gate_input: String,
    focus: Focus,
    mode: InputMode,
    override_buf: String,
    override_error: Option<String>,

    next_countdown_tick: Instant,
    focus_gate_at: Option<Instant>,
}

impl App {
    pub fn new(
        clock: Clock,
        countdown: Countdown,
        mut fx: GlitchFx,
        player: Player<Box<dyn AudioSink>>,
        mut gate: Gate,
    ) -> Self {
        fx.set_level(0.1);
        if player.has_played() {
            // the reveal chain already ran in an earlier session
            gate.show();
        }
        Self {
            clock,
            countdown,
            fx,
            player,
            gate,
            parts: TimeParts::ZERO,
            breached: false,
            announcement: None,
            gate_input: String::new(),
            focus: Focus::default(),
            mode: InputMode::default(),
            override_buf: String::new(),
            override_error: None,
            next_countdown_tick: Instant::now(),
            focus_gate_at: None,
        }
    }

    /// One cooperative step: countdown at its own cadence, fade and player
    /// every frame.
    fn advance(&mut self, dt: Duration) {
        if Instant::now() >= self.next_countdown_tick {
            self.next_countdown_tick = Instant::now() + COUNTDOWN_CADENCE;
            self.pump_countdown();
        }

        self.fx.pump(dt);

        if let Some(PlayerEvent::Completed) = self.player.poll() {
            if self.gate.show() {
                self.focus_gate_at = Some(Instant::now() + gate::FOCUS_SETTLE);
            }
        }

        if self
            .focus_gate_at
            .is_some_and(|due| Instant::now() >= due)
        {
            self.focus_gate_at = None;
            if self.gate.state() == GateState::Visible {
                self.focus = Focus::Gate;
            }
        }
    }

    fn pump_countdown(&mut self) {
        match self.countdown.tick() {
            Tick::Running { parts, level } => {
                self.parts = parts;
                self.fx.set_level(level);
            }
            Tick::Zero => {
                self.parts = TimeParts::ZERO;
                self.breached = true;
                self.fx.step_to(1.0, BREACH_FADE);
            }
            Tick::Halted => (),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> ShouldExit {
        tracing::trace!("key pressed: {key:?}");
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return ShouldExit::Yes;
        }

        match self.mode {
            InputMode::Override => self.handle_key_override(key),
            InputMode::Normal => self.handle_key_normal(key),
        }
    }

    fn handle_key_normal(&mut self, key: KeyEvent) -> ShouldExit {
        match key.code {
            KeyCode::Char('q') if self.focus != Focus::Gate => return ShouldExit::Yes,
            KeyCode::Char('`') if self.focus != Focus::Gate => {
                self.mode = InputMode::Override;
                self.override_error = None;
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Play if self.gate.state() == GateState::Visible => Focus::Gate,
                    Focus::Play => Focus::Play,
                    Focus::Gate => Focus::Play,
                };
            }
            KeyCode::Enter | KeyCode::Char(' ') if self.focus == Focus::Play => {
                self.play_gesture();
            }
            KeyCode::Enter if self.focus == Focus::Gate => {
                self.submit_gate();
            }
            KeyCode::Backspace if self.focus == Focus::Gate => {
                if self.gate.state() == GateState::Visible && self.gate_input.pop().is_some() {
                    self.gate.input_changed();
                }
            }
            KeyCode::Char(c) if self.focus == Focus::Gate => {
                if self.gate.state() == GateState::Visible {
                    self.gate_input.push(c);
                    self.gate.input_changed();
                }
            }
            _other => (),
        }
        ShouldExit::No
    }

    fn handle_key_override(&mut self, key: KeyEvent) -> ShouldExit {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.override_buf.clear();
                self.override_error = None;
            }
            KeyCode::Enter => {
                if self.override_buf.is_empty() {
                    self.clock.clear_override();
                    self.announcement = Some("clock override cleared".to_owned());
                    self.close_override_prompt();
                } else {
                    match self.clock.set_override_str(&self.override_buf) {
                        Ok(instant) => {
                            self.announcement = Some(format!("clock overridden to {instant}"));
                            self.close_override_prompt();
                        }
                        Err(err) => self.override_error = Some(err.to_string()),
                    }
                }
            }
            KeyCode::Backspace => {
                self.override_buf.pop();
            }
            KeyCode::Char(c) => self.override_buf.push(c),
            _other => (),
        }
        ShouldExit::No
    }

    fn close_override_prompt(&mut self) {
        self.mode = InputMode::Normal;
        self.override_buf.clear();
        self.override_error = None;
        // reflect the new time right away instead of at the next cadence
        self.next_countdown_tick = Instant::now();
    }

    fn play_gesture(&mut self) {
        match self.player.trigger() {
            Trigger::Started => self.announcement = None,
            Trigger::Refused(why) => self.announcement = Some(why.to_owned()),
            Trigger::Failed(err) => self.announcement = Some(err.to_string()),
        }
    }

    fn submit_gate(&mut self) {
        match self.gate.submit(&mut rand::rng()) {
            Submit::Unlocked => {
                tracing::debug!("gate accepted, input: {}", self.gate_input.trim());
                self.focus = Focus::Play;
            }
            Submit::Rejected { .. } | Submit::Ignored => (),
        }
    }
}

pub fn run(mut app: App) -> Result<(), std::io::Error> {
    stdout().execute(EnterAlternateScreen)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut last_frame = Instant::now();
    let res = loop {
        let dt = last_frame.elapsed();
        last_frame = Instant::now();
        app.advance(dt);

        if let Err(err) = terminal.draw(|frame| render::app(frame, &mut app)) {
            break Err(err);
        }

        match event::poll(Duration::from_millis(16)) {
            Ok(false) => continue,
            Ok(true) => (),
            Err(err) => break Err(err),
        }
        match event::read() {
            Ok(event::Event::Key(key)) if key.kind == KeyEventKind::Press => {
                // the first interaction of the session unlocks audio
                app.player.unlock_gesture();
                if let ShouldExit::Yes = app.handle_key(key) {
                    break Ok(());
                }
            }
            Ok(_other) => (),
            Err(err) => break Err(err),
        }
    };

    stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;
    res
}

enum ShouldExit {
    Yes,
    No,
}
