//! Raw PCM decoding.
//!
//! The narration service returns speech as base64-encoded, little-endian,
//! signed 16-bit PCM with no container header. [`decode_base64_pcm16`] turns
//! that payload into a [`DecodedAudioBuffer`] of normalised `f32` samples,
//! one vector per channel.
//!
//! ```rust
//! use base64::Engine as _;
//! use mestre_das_letras::audio::decode_base64_pcm16;
//!
//! // two mono frames: 0 and -32768
//! let payload = base64::engine::general_purpose::STANDARD.encode([0x00, 0x00, 0x00, 0x80]);
//! let buffer = decode_base64_pcm16(&payload, 24_000, 1).unwrap();
//! assert_eq!(buffer.frame_count(), 2);
//! assert_eq!(buffer.channel(0).unwrap(), &[0.0, -1.0]);
//! ```

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

/// Full-scale divisor for signed 16-bit samples.
const I16_SCALE: f32 = 32_768.0;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Reasons a PCM payload could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("channel count must be at least 1")]
    NoChannels,
}

// ---------------------------------------------------------------------------
// DecodedAudioBuffer
// ---------------------------------------------------------------------------

/// De-interleaved `f32` samples in `[-1.0, 1.0)` plus their sample rate.
///
/// All channel vectors have the same length (`frame_count`).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl DecodedAudioBuffer {
    /// Wrap per-channel sample vectors.
    ///
    /// # Panics
    ///
    /// Panics if the channel vectors differ in length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        if let Some(first) = channels.first() {
            assert!(
                channels.iter().all(|c| c.len() == first.len()),
                "DecodedAudioBuffer channels must have equal length"
            );
        }
        Self {
            channels,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Playback length at the buffer's sample rate.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Base64-decode `payload` and de-interleave it as 16-bit LE PCM.
pub fn decode_base64_pcm16(
    payload: &str,
    sample_rate: u32,
    channels: u16,
) -> Result<DecodedAudioBuffer, DecodeError> {
    let bytes = STANDARD.decode(payload.trim())?;
    pcm16_to_buffer(&bytes, sample_rate, channels)
}

/// De-interleave raw 16-bit LE PCM bytes.
///
/// A trailing partial frame is dropped rather than treated as an error.
pub fn pcm16_to_buffer(
    bytes: &[u8],
    sample_rate: u32,
    channels: u16,
) -> Result<DecodedAudioBuffer, DecodeError> {
    if channels == 0 {
        return Err(DecodeError::NoChannels);
    }

    let n = channels as usize;
    let frame_bytes = 2 * n;
    let usable = bytes.len() - bytes.len() % frame_bytes;
    if usable < bytes.len() {
        log::debug!(
            "pcm: dropping {} trailing byte(s) of a partial frame",
            bytes.len() - usable
        );
    }

    let frame_count = usable / frame_bytes;
    let mut out: Vec<Vec<f32>> = (0..n).map(|_| Vec::with_capacity(frame_count)).collect();

    for frame in bytes[..usable].chunks_exact(frame_bytes) {
        for (channel, sample) in out.iter_mut().zip(frame.chunks_exact(2)) {
            let raw = i16::from_le_bytes([sample[0], sample[1]]);
            channel.push(raw as f32 / I16_SCALE);
        }
    }

    Ok(DecodedAudioBuffer::new(out, sample_rate))
}

/// Sample rate advertised by a PCM MIME type such as
/// `audio/L16;codec=pcm;rate=24000`.
pub fn pcm_rate_from_mime(mime_type: &str) -> Option<u32> {
    mime_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("rate") {
            value.trim().parse().ok().filter(|&rate: &u32| rate > 0)
        } else {
            None
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
