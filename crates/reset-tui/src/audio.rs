use std::f32::consts::PI;
use std::time::{Duration, Instant};

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use timeline::{AudioSink, PlayError};
use tracing::{error, info};

const SAMPLE_RATE: u32 = 44_100;
const TRANSMISSION_SECS: f32 = 6.0;

/// Picks the audio backend. Losing the audio device is not fatal: the
/// play control stays on screen but every gesture reports the failure.
pub fn open(mute: bool) -> Box<dyn AudioSink> {
    if mute {
        info!("muted, transmission will play silently");
        return Box::new(SilentSink::new());
    }
    match RodioSink::new() {
        Ok(sink) => Box::new(sink),
        Err(err) => {
            error!("could not open an audio device, play control will be inert: {err}");
            Box::new(Unavailable)
        }
    }
}

pub struct RodioSink {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioSink {
    pub fn new() -> Result<Self, rodio::StreamError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl AudioSink for RodioSink {
    fn start(&mut self) -> Result<(), PlayError> {
        let sink = Sink::try_new(&self.handle).map_err(|err| PlayError::Other(err.to_string()))?;
        sink.append(SamplesBuffer::new(
            1,
            SAMPLE_RATE,
            transmission(SAMPLE_RATE),
        ));
        self.sink = Some(sink);
        Ok(())
    }

    fn unlock(&mut self) -> Result<(), PlayError> {
        // a paused throwaway sink probes the device without making a sound
        let sink = Sink::try_new(&self.handle).map_err(|err| PlayError::Other(err.to_string()))?;
        sink.pause();
        Ok(())
    }

    fn finished(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::empty)
    }
}

/// The transmission: a carrier sweeping down from 880 Hz with a slow
/// tremolo, fading out over its full length.
fn transmission(sample_rate: u32) -> Vec<f32> {
    let count = (sample_rate as f32 * TRANSMISSION_SECS) as usize;
    let mut samples = Vec::with_capacity(count);
    let mut phase = 0.0f32;
    for i in 0..count {
        let t = i as f32 / sample_rate as f32;
        let progress = t / TRANSMISSION_SECS;
        let freq = 880.0 - 770.0 * progress;
        phase += 2.0 * PI * freq / sample_rate as f32;
        let tremolo = 0.6 + 0.4 * (2.0 * PI * 8.0 * t).sin();
        let envelope = (1.0 - progress).sqrt() * 0.25;
        samples.push(phase.sin() * tremolo * envelope);
    }
    samples
}

/// Stand-in for `--mute` runs: "plays" for the nominal transmission
/// length without touching any device.
pub struct SilentSink {
    started: Option<Instant>,
    duration: Duration,
}

impl SilentSink {
    pub fn new() -> Self {
        Self {
            started: None,
            duration: Duration::from_secs_f32(TRANSMISSION_SECS),
        }
    }
}

impl AudioSink for SilentSink {
    fn start(&mut self) -> Result<(), PlayError> {
        self.started = Some(Instant::now());
        Ok(())
    }

    fn unlock(&mut self) -> Result<(), PlayError> {
        Ok(())
    }

    fn finished(&self) -> bool {
        self.started
            .is_some_and(|started| started.elapsed() >= self.duration)
    }
}

/// Used when no audio device could be opened at startup.
pub struct Unavailable;

impl AudioSink for Unavailable {
    fn start(&mut self) -> Result<(), PlayError> {
        Err(PlayError::NoDevice)
    }

    fn unlock(&mut self) -> Result<(), PlayError> {
        Err(PlayError::NoDevice)
    }

    fn finished(&self) -> bool {
        false
    }
}
