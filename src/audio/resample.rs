//! Sample-rate conversion and channel mixing for playback.
//!
//! Narration arrives as 24 kHz mono, but output devices commonly only accept
//! their native rate (44.1 / 48 kHz) and two or more channels. This module
//! provides the two conversion steps applied before a buffer is handed to
//! cpal:
//!
//! 1. [`resample`]: FFT resampling via `rubato` to the device rate.
//! 2. [`interleave`]: mix to the device channel count and interleave.

use rubato::{FftFixedIn, Resampler};
use thiserror::Error;

use super::pcm::DecodedAudioBuffer;

/// Input frames fed to the resampler per call.
const CHUNK_FRAMES: usize = 1024;

#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("sample rate must be non-zero")]
    ZeroRate,

    #[error("failed to construct resampler: {0}")]
    Construction(#[from] rubato::ResamplerConstructionError),

    #[error("resampling failed: {0}")]
    Process(#[from] rubato::ResampleError),
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Convert `buffer` to `target_rate`, keeping its channel layout.
///
/// Returns a copy when the rates already match. The output has
/// `ceil(frames * target_rate / source_rate)` frames; the resampler's
/// filter delay is trimmed from the front.
pub fn resample(
    buffer: &DecodedAudioBuffer,
    target_rate: u32,
) -> Result<DecodedAudioBuffer, ResampleError> {
    let source_rate = buffer.sample_rate();
    if source_rate == 0 || target_rate == 0 {
        return Err(ResampleError::ZeroRate);
    }
    if source_rate == target_rate {
        return Ok(buffer.clone());
    }
    if buffer.is_empty() || buffer.channel_count() == 0 {
        return Ok(DecodedAudioBuffer::new(
            vec![Vec::new(); buffer.channel_count() as usize],
            target_rate,
        ));
    }

    let channels = buffer.channel_count() as usize;
    let frames = buffer.frame_count();
    let expected =
        (frames as u64 * target_rate as u64).div_ceil(source_rate as u64) as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_FRAMES,
        2,
        channels,
    )?;
    let delay = resampler.output_delay();
    let input = buffer.channels();
    let mut output: Vec<Vec<f32>> = (0..channels)
        .map(|_| Vec::with_capacity(expected + delay))
        .collect();

    let mut pos = 0;
    loop {
        let needed = resampler.input_frames_next();
        if pos + needed > frames {
            break;
        }
        let chunk: Vec<&[f32]> = input.iter().map(|c| &c[pos..pos + needed]).collect();
        append(&mut output, resampler.process(chunk.as_slice(), None)?);
        pos += needed;
    }

    if pos < frames {
        let chunk: Vec<&[f32]> = input.iter().map(|c| &c[pos..]).collect();
        append(
            &mut output,
            resampler.process_partial(Some(chunk.as_slice()), None)?,
        );
    }

    // Flush the filter tail.
    while output[0].len() < delay + expected {
        let before = output[0].len();
        append(
            &mut output,
            resampler.process_partial(None::<&[&[f32]]>, None)?,
        );
        if output[0].len() == before {
            break;
        }
    }

    for channel in &mut output {
        channel.drain(..delay.min(channel.len()));
        channel.truncate(expected);
    }

    Ok(DecodedAudioBuffer::new(output, target_rate))
}

fn append(output: &mut [Vec<f32>], processed: Vec<Vec<f32>>) {
    for (out, chunk) in output.iter_mut().zip(processed) {
        out.extend_from_slice(&chunk);
    }
}

// ---------------------------------------------------------------------------
// interleave
// ---------------------------------------------------------------------------

/// Interleave `buffer` into `out_channels` channels.
///
/// * mono input is copied to every output channel;
/// * mono output averages all input channels;
/// * otherwise output channel `c` takes input channel `c % inputs`.
///
/// Output length is `frame_count * out_channels`; `out_channels == 0`
/// yields an empty vector.
pub fn interleave(buffer: &DecodedAudioBuffer, out_channels: u16) -> Vec<f32> {
    let inputs = buffer.channels();
    let out_n = out_channels as usize;
    if out_n == 0 || inputs.is_empty() {
        return Vec::new();
    }

    let frames = buffer.frame_count();
    let mut out = Vec::with_capacity(frames * out_n);

    for i in 0..frames {
        if out_n == 1 && inputs.len() > 1 {
            let sum: f32 = inputs.iter().map(|c| c[i]).sum();
            out.push(sum / inputs.len() as f32);
            continue;
        }
        for c in 0..out_n {
            out.push(inputs[c % inputs.len()][i]);
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
