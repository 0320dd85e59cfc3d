use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use timeline::{Clock, Countdown, Gate, GlitchFx, PlayedFlag, Player};

mod audio;
mod tui;

#[derive(Parser)]
#[command(name = "timeline reset")]
#[command(about = "Terminal countdown to the timeline reset")]
struct Cli {
    /// the instant everything counts down to, rfc 3339
    #[arg(short, long, default_value = timeline::TARGET)]
    target: jiff::Timestamp,

    /// directory holding the played-transmission flag
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// start with the clock overridden to this instant
    #[arg(long)]
    mock_now: Option<jiff::Timestamp>,

    /// do not open an audio device, play a silent transmission
    #[arg(long)]
    mute: bool,
}

fn main() -> Result<()> {
    setup_tracing().wrap_err("could not set up logging")?;

    let Cli {
        target,
        state_dir,
        mock_now,
        mute,
    } = Cli::parse();

    let state_dir = match state_dir {
        Some(dir) => dir,
        None => PlayedFlag::default_dir()
            .ok_or_else(|| eyre!("no local data dir on this platform, pass --state-dir"))?,
    };

    let clock = Clock::new();
    if let Some(instant) = mock_now {
        clock.set_override(instant);
    }

    let player = Player::new(audio::open(mute), PlayedFlag::new(&state_dir), clock.clone());
    let countdown = Countdown::new(target, clock.clone());
    let gate = Gate::new(target, clock.clone());

    tracing::info!("counting down to {target}");
    let app = tui::App::new(clock, countdown, GlitchFx::new(), player, gate);
    tui::run(app).wrap_err("terminal ui failed")?;
    Ok(())
}

fn setup_tracing() -> Result<()> {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt, Layer};

    color_eyre::install().unwrap();

    let log_file = std::fs::File::create("log.txt")?;
    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::EnvFilter::from_default_env());
    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
