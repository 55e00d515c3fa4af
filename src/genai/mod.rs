//! Generative service client: exercises, illustrations, stories, narration.
//!
//! This module provides:
//! * [`GenerativeService`]: async trait over one `generateContent` call.
//! * [`GeminiClient`]: REST implementation (reqwest, `x-goog-api-key`).
//! * [`ExerciseGenerator`]: validated exercises with concurrent images,
//!   single illustrations and short stories.
//! * [`Narrator`]: fire-and-forget speech through an
//!   [`AudioSink`](crate::audio::AudioSink).
//! * [`gather_with_fallback`]: ordered fan-out with per-item fallback.
//!
//! | Operation              | Model (default)                 | Failure behaviour            |
//! |------------------------|---------------------------------|------------------------------|
//! | `generate_exercises`   | `text_model` + `image_model`    | `GenerationError` propagates |
//! | `generate_image`       | `image_model`                   | placeholder URL              |
//! | `generate_fun_story`   | `text_model`                    | error propagates; empty → default |
//! | `play_audio`           | `speech_model`                  | logged and swallowed         |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mestre_das_letras::audio::CpalOutput;
//! use mestre_das_letras::config::AppConfig;
//! use mestre_das_letras::genai::{ExerciseGenerator, GeminiClient, Narrator};
//! use mestre_das_letras::lessons::PhoneticPair;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let service = Arc::new(GeminiClient::from_config(&config.genai));
//!
//!     let generator = ExerciseGenerator::new(service.clone(), config.genai.clone(), config.lesson.clone());
//!     let exercises = generator.generate_exercises(PhoneticPair::PB).await.unwrap();
//!
//!     let narrator = Arc::new(Narrator::new(
//!         service,
//!         Arc::new(CpalOutput::new()),
//!         config.genai.clone(),
//!         config.narration.clone(),
//!     ));
//!     narrator.play_audio(format!("Complete: {}", exercises[0].word));
//! }
//! ```

pub mod client;
pub mod exercises;
pub mod gather;
pub mod images;
pub mod narrator;
pub mod prompt;
pub mod story;
pub mod wire;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{GeminiClient, GenAiError, GenerativeService};
pub use exercises::{Exercise, ExerciseGenerator, GenerationError};
pub use gather::gather_with_fallback;
pub use images::{placeholder_image_url, ImageFetchError, ImageSource};
pub use narrator::{NarrationError, NarrationHandle, Narrator};
pub use story::DEFAULT_STORY;
pub use wire::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};

#[cfg(test)]
pub use client::ScriptedService;
