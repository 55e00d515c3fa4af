//! Short themed story shown under the exercises.

use crate::genai::exercises::{ExerciseGenerator, GenerationError};
use crate::genai::prompt;
use crate::genai::wire::GenerateContentRequest;
use crate::lessons::PhoneticPair;

/// Used when the model answers with no text.
pub const DEFAULT_STORY: &str = "Vamos brincar com as letras!";

impl ExerciseGenerator {
    /// A story of at most four sentences full of words with the pair's
    /// letters. Transport errors propagate; an empty answer becomes
    /// [`DEFAULT_STORY`].
    pub async fn generate_fun_story(&self, pair: PhoneticPair) -> Result<String, GenerationError> {
        let request = GenerateContentRequest::from_text(prompt::fun_story(pair));
        let response = self
            .service
            .generate_content(&self.genai.text_model, &request)
            .await?;

        Ok(response
            .text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_STORY.to_string()))
    }
}
