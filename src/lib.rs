//! Mestre das Letras: phonetic letter-pair lessons for young readers.
//!
//! The crate is split leaf-first:
//!
//! * [`lessons`]: static lesson content keyed by [`lessons::PhoneticPair`].
//! * [`audio`]: PCM decoding, resampling and cpal playback.
//! * [`genai`]: generative service client: exercises, images, stories,
//!   narration.
//! * [`session`]: the landing → lesson → exercise → final state machine and
//!   its controller.
//! * [`app`]: egui views.
//! * [`config`]: TOML settings.

pub mod app;
pub mod audio;
pub mod config;
pub mod genai;
pub mod lessons;
pub mod session;
