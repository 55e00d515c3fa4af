//! Speaker output via `cpal`.
//!
//! [`AudioSink`] is the seam the narrator plays through. [`CpalOutput`] is
//! the production implementation: every [`AudioSink::play`] call opens its
//! own output stream on the default device, so overlapping calls play
//! concurrently. The stream lives on a dedicated thread (cpal streams are
//! not `Send` on every platform) until the buffer drains or
//! [`PlaybackHandle::stop`] is called.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use thiserror::Error;

use super::pcm::DecodedAudioBuffer;
use super::resample::{interleave, resample, ResampleError};

/// How often the playback thread checks for completion or a stop request.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Extra time the stream is kept open after the last sample was queued so
/// the device can drain its hardware buffer.
const DRAIN_TAIL: Duration = Duration::from_millis(150);

/// Slack on top of the buffer's own duration before a stalled stream is
/// abandoned (device unplugged, callbacks no longer firing).
const STALL_MARGIN: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can occur while opening or starting an output stream.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported output sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error(transparent)]
    Resample(#[from] ResampleError),

    #[error("playback thread failed: {0}")]
    Thread(String),
}

// ---------------------------------------------------------------------------
// PlaybackHandle
// ---------------------------------------------------------------------------

/// Shared flags for one playback.
///
/// Cloning shares the flags. Dropping a handle does **not** stop playback.
#[derive(Debug, Clone, Default)]
pub struct PlaybackHandle {
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl PlaybackHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle for a playback that had nothing to play.
    pub fn finished() -> Self {
        let handle = Self::default();
        handle.mark_finished();
        handle
    }

    /// Ask the playback to fall silent and release its stream.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// `true` once every sample has been queued, the playback was stopped,
    /// or the stream failed.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst) || self.is_stopped()
    }

    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// AudioSink
// ---------------------------------------------------------------------------

/// Something that can play a decoded buffer.
///
/// `play` may block briefly while the device is opened; call it from
/// `tokio::task::spawn_blocking` in async code.
pub trait AudioSink: Send + Sync {
    fn play(&self, buffer: DecodedAudioBuffer) -> Result<PlaybackHandle, PlaybackError>;
}

// ---------------------------------------------------------------------------
// CpalOutput
// ---------------------------------------------------------------------------

/// Plays buffers on the system default output device.
///
/// Holds no device state: each call acquires the device, and the stream is
/// released when that playback ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalOutput;

impl CpalOutput {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSink for CpalOutput {
    fn play(&self, buffer: DecodedAudioBuffer) -> Result<PlaybackHandle, PlaybackError> {
        if buffer.is_empty() {
            return Ok(PlaybackHandle::finished());
        }

        let handle = PlaybackHandle::new();
        let thread_handle = handle.clone();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), PlaybackError>>();

        thread::Builder::new()
            .name("narration-playback".into())
            .spawn(move || run_stream(buffer, thread_handle, ready_tx))
            .map_err(|e| PlaybackError::Thread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PlaybackError::Thread(
                "playback thread exited before the stream started".into(),
            )),
        }
    }
}

/// Body of the playback thread: open, report readiness, hold the stream
/// until the buffer drains or a stop is requested.
fn run_stream(
    buffer: DecodedAudioBuffer,
    handle: PlaybackHandle,
    ready: mpsc::Sender<Result<(), PlaybackError>>,
) {
    let deadline = buffer.duration() + STALL_MARGIN;
    let stream = match open_stream(buffer, &handle) {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            handle.mark_finished();
            let _ = ready.send(Err(e));
            return;
        }
    };

    if !wait_until_finished(&handle, deadline) {
        log::warn!("playback: stream stalled for {deadline:?}; releasing it");
        handle.mark_finished();
    } else if !handle.is_stopped() {
        thread::sleep(DRAIN_TAIL);
    }

    drop(stream);
    log::debug!("playback: stream released");
}

/// Poll `handle` until it finishes; `false` if `deadline` passes first.
fn wait_until_finished(handle: &PlaybackHandle, deadline: Duration) -> bool {
    let started = Instant::now();
    while !handle.is_finished() {
        if started.elapsed() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
    true
}

fn open_stream(
    buffer: DecodedAudioBuffer,
    handle: &PlaybackHandle,
) -> Result<cpal::Stream, PlaybackError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(PlaybackError::NoDevice)?;

    let (config, format) = choose_config(&device, buffer.sample_rate())?;

    let buffer = if config.sample_rate.0 != buffer.sample_rate() {
        log::debug!(
            "playback: resampling {} Hz → {} Hz",
            buffer.sample_rate(),
            config.sample_rate.0
        );
        resample(&buffer, config.sample_rate.0)?
    } else {
        buffer
    };
    let samples = interleave(&buffer, config.channels);

    let stream = match format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, samples, handle.clone())?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, samples, handle.clone())?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, samples, handle.clone())?,
        other => return Err(PlaybackError::UnsupportedFormat(format!("{other:?}"))),
    };

    stream.play()?;
    Ok(stream)
}

/// Prefer a device configuration that accepts `rate` directly (f32 first);
/// otherwise use the device default and let the caller resample.
fn choose_config(
    device: &cpal::Device,
    rate: u32,
) -> Result<(cpal::StreamConfig, SampleFormat), PlaybackError> {
    let wanted = cpal::SampleRate(rate);

    if let Ok(ranges) = device.supported_output_configs() {
        let exact = ranges
            .filter(|r| r.min_sample_rate() <= wanted && wanted <= r.max_sample_rate())
            .filter(|r| is_supported_format(r.sample_format()))
            .min_by_key(|r| r.sample_format() != SampleFormat::F32);
        if let Some(range) = exact {
            let supported = range.with_sample_rate(wanted);
            return Ok((supported.config(), supported.sample_format()));
        }
    }

    let supported = device.default_output_config()?;
    Ok((supported.config(), supported.sample_format()))
}

fn is_supported_format(format: SampleFormat) -> bool {
    matches!(format, SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Vec<f32>,
    handle: PlaybackHandle,
) -> Result<cpal::Stream, PlaybackError>
where
    T: SizedSample + FromSample<f32>,
{
    let mut cursor = 0usize;
    let on_error = handle.clone();

    let stream = device.build_output_stream(
        config,
        move |out: &mut [T], _: &cpal::OutputCallbackInfo| {
            let stopped = handle.is_stopped();
            for slot in out.iter_mut() {
                *slot = match samples.get(cursor) {
                    Some(&s) if !stopped => {
                        cursor += 1;
                        T::from_sample(s)
                    }
                    _ => T::EQUILIBRIUM,
                };
            }
            if cursor >= samples.len() {
                handle.mark_finished();
            }
        },
        move |err: cpal::StreamError| {
            log::error!("cpal output stream error: {err}");
            on_error.mark_finished();
        },
        None,
    )?;

    Ok(stream)
}

// ---------------------------------------------------------------------------
// RecordingSink (test double)
// ---------------------------------------------------------------------------

/// Records every buffer it is asked to play; optionally fails instead.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    pub played: std::sync::Mutex<Vec<DecodedAudioBuffer>>,
    pub handles: std::sync::Mutex<Vec<PlaybackHandle>>,
    pub fail: bool,
}

#[cfg(test)]
impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().unwrap().len()
    }
}

#[cfg(test)]
impl AudioSink for RecordingSink {
    fn play(&self, buffer: DecodedAudioBuffer) -> Result<PlaybackHandle, PlaybackError> {
        if self.fail {
            return Err(PlaybackError::NoDevice);
        }
        self.played.lock().unwrap().push(buffer);
        let handle = PlaybackHandle::new();
        self.handles.lock().unwrap().push(handle.clone());
        Ok(handle)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
