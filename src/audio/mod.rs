//! Audio pipeline: base64 PCM → decoded buffer → resample → speaker.
//!
//! # Pipeline
//!
//! ```text
//! base64 payload → decode_base64_pcm16 → DecodedAudioBuffer
//!               → resample (device rate) → interleave (device channels)
//!               → cpal output stream
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mestre_das_letras::audio::{decode_base64_pcm16, AudioSink, CpalOutput};
//!
//! let buffer = decode_base64_pcm16("AAAAAA==", 24_000, 1).unwrap();
//! let handle = CpalOutput::new().play(buffer).unwrap();
//! // `handle.stop()` silences it early; dropping it lets it finish.
//! ```

pub mod pcm;
pub mod playback;
pub mod resample;

pub use pcm::{decode_base64_pcm16, pcm16_to_buffer, pcm_rate_from_mime, DecodeError, DecodedAudioBuffer};
pub use playback::{AudioSink, CpalOutput, PlaybackError, PlaybackHandle};
pub use resample::{interleave, resample, ResampleError};

#[cfg(test)]
pub use playback::RecordingSink;
