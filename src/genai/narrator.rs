//! Fire-and-forget spoken narration.
//!
//! ```text
//! play_audio(text)
//!   └─▶ tokio::spawn
//!         ├─ speech model (AUDIO modality, prebuilt voice)
//!         ├─ no inline data ──► done, silently
//!         ├─ decode_base64_pcm16 (rate from MIME type when present)
//!         └─ spawn_blocking(AudioSink::play) ──► PlaybackHandle
//! ```
//!
//! Every failure is logged at `error` and swallowed: narration is a side
//! channel and must never take the session down. The returned
//! [`NarrationHandle`] may be dropped; it only exists so callers can cancel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};

use crate::audio::{
    decode_base64_pcm16, pcm_rate_from_mime, AudioSink, DecodeError, PlaybackError,
    PlaybackHandle,
};
use crate::config::{GenAiConfig, NarrationConfig};
use crate::genai::client::{GenAiError, GenerativeService};
use crate::genai::prompt;
use crate::genai::wire::{GenerateContentRequest, GenerationConfig};

// ---------------------------------------------------------------------------
// NarrationError
// ---------------------------------------------------------------------------

/// Anything that can go wrong between the text and the speaker.
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error(transparent)]
    GenAi(#[from] GenAiError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("playback task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

// ---------------------------------------------------------------------------
// PlaybackSlot
// ---------------------------------------------------------------------------

/// Links a narration request to the playback it eventually starts, so a
/// cancel that races the start still silences it.
#[derive(Debug, Default)]
struct PlaybackSlot {
    cancelled: AtomicBool,
    playback: Mutex<Option<PlaybackHandle>>,
}

impl PlaybackSlot {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Ok(slot) = self.playback.lock() {
            if let Some(playback) = slot.as_ref() {
                playback.stop();
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn attach(&self, playback: PlaybackHandle) {
        match self.playback.lock() {
            Ok(mut slot) => {
                if self.is_cancelled() {
                    playback.stop();
                }
                *slot = Some(playback);
            }
            Err(_) => playback.stop(),
        }
    }

    fn playback_finished(&self) -> bool {
        self.playback
            .lock()
            .map(|slot| slot.as_ref().map_or(true, PlaybackHandle::is_finished))
            .unwrap_or(true)
    }
}

// ---------------------------------------------------------------------------
// NarrationHandle
// ---------------------------------------------------------------------------

/// Handle to one narration. Dropping it lets the narration play out.
#[derive(Debug)]
pub struct NarrationHandle {
    task: JoinHandle<()>,
    slot: Arc<PlaybackSlot>,
}

impl NarrationHandle {
    /// Abort the request if still in flight and stop playback if started.
    pub fn cancel(&self) {
        self.task.abort();
        self.slot.cancel();
    }

    /// `true` once the request is done and any playback has drained.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished() && self.slot.playback_finished()
    }

    /// Wait until the request completed and playback, if any, has started.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                log::error!("narration task failed: {e}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Narrator
// ---------------------------------------------------------------------------

/// Turns text into speech through a [`GenerativeService`] and an
/// [`AudioSink`].
pub struct Narrator {
    service: Arc<dyn GenerativeService>,
    sink: Arc<dyn AudioSink>,
    genai: GenAiConfig,
    config: NarrationConfig,
    current: Mutex<Option<(AbortHandle, Arc<PlaybackSlot>)>>,
}

impl Narrator {
    pub fn new(
        service: Arc<dyn GenerativeService>,
        sink: Arc<dyn AudioSink>,
        genai: GenAiConfig,
        config: NarrationConfig,
    ) -> Self {
        Self {
            service,
            sink,
            genai,
            config,
            current: Mutex::new(None),
        }
    }

    /// Speak `text` in the background.
    ///
    /// Never fails. Must be called inside a tokio runtime context. With
    /// `interrupt_previous` unset, overlapping calls play concurrently.
    pub fn play_audio(self: &Arc<Self>, text: impl Into<String>) -> NarrationHandle {
        let text = text.into();
        let slot = Arc::new(PlaybackSlot::default());

        if !self.config.enabled || text.trim().is_empty() {
            return NarrationHandle {
                task: tokio::spawn(async {}),
                slot,
            };
        }

        let this = Arc::clone(self);
        let task_slot = Arc::clone(&slot);
        let task = tokio::spawn(async move {
            if let Err(e) = this.narrate(&text, &task_slot).await {
                log::error!("narration failed: {e}");
            }
        });

        if self.config.interrupt_previous {
            self.supersede(task.abort_handle(), Arc::clone(&slot));
        }

        NarrationHandle { task, slot }
    }

    /// Stop whatever narration was started last. Only tracked when
    /// `interrupt_previous` is set; otherwise a no-op.
    pub fn stop_current(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some((abort, slot)) = current.take() {
                abort.abort();
                slot.cancel();
            }
        }
    }

    fn supersede(&self, abort: AbortHandle, slot: Arc<PlaybackSlot>) {
        if let Ok(mut current) = self.current.lock() {
            if let Some((prev_abort, prev_slot)) = current.replace((abort, slot)) {
                log::debug!("narration: superseding previous narration");
                prev_abort.abort();
                prev_slot.cancel();
            }
        }
    }

    async fn narrate(&self, text: &str, slot: &PlaybackSlot) -> Result<(), NarrationError> {
        let request = GenerateContentRequest::from_text(prompt::narration(text))
            .with_config(GenerationConfig::speech(self.genai.voice_name.clone()));

        let response = self
            .service
            .generate_content(&self.genai.speech_model, &request)
            .await?;

        let Some(inline) = response.first_inline_data() else {
            log::debug!("narration: response carried no audio");
            return Ok(());
        };

        let rate = pcm_rate_from_mime(&inline.mime_type).unwrap_or(self.config.sample_rate);
        let buffer = decode_base64_pcm16(&inline.data, rate, self.config.channels)?;
        log::debug!(
            "narration: {} frames @ {} Hz ({:.2}s)",
            buffer.frame_count(),
            rate,
            buffer.duration().as_secs_f32()
        );

        if slot.is_cancelled() {
            return Ok(());
        }

        let sink = Arc::clone(&self.sink);
        let playback = tokio::task::spawn_blocking(move || sink.play(buffer)).await??;
        slot.attach(playback);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
