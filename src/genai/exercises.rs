//! Structured exercise generation with per-item illustrations.
//!
//! ```text
//! generate_exercises(pair)
//!   │
//!   ├─ text model, JSON schema ──► [{word, options, correctOption, fullWord}]
//!   │                                 │ parse + validate (fails as a whole)
//!   │                                 ▼
//!   └─ image model × N (concurrent) ──► ImageSource per item
//!                                       (placeholder URL on any failure)
//! ```

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::config::{GenAiConfig, LessonConfig};
use crate::genai::client::{GenAiError, GenerativeService};
use crate::genai::gather::gather_with_fallback;
use crate::genai::images::{image_from_response, ImageFetchError, ImageSource};
use crate::genai::prompt;
use crate::genai::wire::{GenerateContentRequest, GenerationConfig};
use crate::lessons::PhoneticPair;

// ---------------------------------------------------------------------------
// Exercise
// ---------------------------------------------------------------------------

/// One fill-in-the-blank item.
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    /// `ex-<pair label>-<index>`.
    pub id: String,
    /// Word with the blank, e.g. `JA_ELA`.
    pub word: String,
    /// Candidate letters; exactly one equals `correct_option`.
    pub options: Vec<String>,
    pub correct_option: String,
    pub full_word: String,
    pub image: Option<ImageSource>,
}

impl Exercise {
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_option == option
    }
}

// ---------------------------------------------------------------------------
// GenerationError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Service(#[from] GenAiError),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("model returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("exercise {index} is invalid: {reason}")]
    Invalid { index: usize, reason: String },

    #[error("model returned no exercises")]
    NoExercises,
}

// ---------------------------------------------------------------------------
// Draft parsing
// ---------------------------------------------------------------------------

/// Exercise as the model returns it, before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseDraft {
    word: String,
    options: Vec<String>,
    correct_option: String,
    full_word: String,
}

/// Parse the model's JSON array and validate every item.
///
/// Options are trimmed and de-duplicated (first occurrence wins) so exactly
/// one equals the answer.
pub(crate) fn parse_exercises(
    pair: PhoneticPair,
    text: &str,
) -> Result<Vec<Exercise>, GenerationError> {
    let drafts: Vec<ExerciseDraft> = serde_json::from_str(text.trim())?;
    if drafts.is_empty() {
        return Err(GenerationError::NoExercises);
    }

    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| validate(pair, index, draft))
        .collect()
}

fn validate(
    pair: PhoneticPair,
    index: usize,
    draft: ExerciseDraft,
) -> Result<Exercise, GenerationError> {
    let invalid = |reason: &str| GenerationError::Invalid {
        index,
        reason: reason.to_string(),
    };

    let word = draft.word.trim().to_string();
    let full_word = draft.full_word.trim().to_string();
    let correct_option = draft.correct_option.trim().to_string();

    if word.is_empty() {
        return Err(invalid("empty word"));
    }
    if full_word.is_empty() {
        return Err(invalid("empty fullWord"));
    }
    if correct_option.is_empty() {
        return Err(invalid("empty correctOption"));
    }

    let mut options: Vec<String> = Vec::with_capacity(draft.options.len());
    for option in draft.options.iter().map(|o| o.trim()) {
        if !option.is_empty() && !options.iter().any(|o| o == option) {
            options.push(option.to_string());
        }
    }
    if options.is_empty() {
        return Err(invalid("no options"));
    }
    if !options.contains(&correct_option) {
        return Err(invalid("correctOption is not among the options"));
    }

    Ok(Exercise {
        id: format!("ex-{}-{}", pair.label(), index),
        word,
        options,
        correct_option,
        full_word,
        image: None,
    })
}

// ---------------------------------------------------------------------------
// ExerciseGenerator
// ---------------------------------------------------------------------------

/// Produces exercises, illustrations and stories through a
/// [`GenerativeService`].
pub struct ExerciseGenerator {
    pub(crate) service: Arc<dyn GenerativeService>,
    pub(crate) genai: GenAiConfig,
    pub(crate) lesson: LessonConfig,
}

impl ExerciseGenerator {
    pub fn new(
        service: Arc<dyn GenerativeService>,
        genai: GenAiConfig,
        lesson: LessonConfig,
    ) -> Self {
        Self {
            service,
            genai,
            lesson,
        }
    }

    /// Request, validate and illustrate a set of exercises for `pair`.
    ///
    /// Fails as a whole if the structured request fails or any item is
    /// invalid. Image failures never fail the call.
    pub async fn generate_exercises(
        &self,
        pair: PhoneticPair,
    ) -> Result<Vec<Exercise>, GenerationError> {
        let wanted = self.lesson.exercise_count;
        let request = GenerateContentRequest::from_text(prompt::exercises(pair, wanted))
            .with_config(GenerationConfig::json(prompt::exercise_schema()));

        let response = self
            .service
            .generate_content(&self.genai.text_model, &request)
            .await?;
        let text = response.text().ok_or(GenerationError::EmptyResponse)?;
        let mut exercises = parse_exercises(pair, &text)?;

        if exercises.len() != wanted {
            log::warn!(
                "genai: asked for {wanted} exercises for {pair}, got {}",
                exercises.len()
            );
        }
        log::info!("genai: {} exercises for {pair}, fetching images", exercises.len());

        let ops: Vec<_> = exercises
            .iter()
            .map(|ex| self.try_generate_image(&ex.full_word))
            .collect();
        let images = gather_with_fallback(ops, |i, err| {
            let word = &exercises[i].full_word;
            log::warn!("genai: image for {word:?} failed ({err}); using placeholder");
            self.placeholder(word)
        })
        .await;

        for (exercise, image) in exercises.iter_mut().zip(images) {
            exercise.image = Some(image);
        }
        Ok(exercises)
    }

    /// Illustration of `word`; a placeholder URL when generation fails.
    pub async fn generate_image(&self, word: &str) -> ImageSource {
        match self.try_generate_image(word).await {
            Ok(image) => image,
            Err(err) => {
                log::warn!("genai: image for {word:?} failed ({err}); using placeholder");
                self.placeholder(word)
            }
        }
    }

    async fn try_generate_image(&self, word: &str) -> Result<ImageSource, ImageFetchError> {
        let request = GenerateContentRequest::from_text(prompt::illustration(word));
        let response = self
            .service
            .generate_content(&self.genai.image_model, &request)
            .await?;
        image_from_response(&response)
    }

    fn placeholder(&self, word: &str) -> ImageSource {
        ImageSource::placeholder(
            word,
            self.lesson.placeholder_width,
            self.lesson.placeholder_height,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
