//! Prompt text and response schemas for every generation request.
//!
//! All prompts are Brazilian Portuguese and aimed at 7–8 year olds. The
//! letter pair is always spelled out as `"F e V"` so the model sees the two
//! letters rather than the `F-V` label.

use serde_json::{json, Value};

use crate::lessons::PhoneticPair;

// ---------------------------------------------------------------------------
// Narration
// ---------------------------------------------------------------------------

/// Wraps `text` in the reading instruction sent to the speech model.
pub fn narration(text: &str) -> String {
    format!("Leia de forma clara e carinhosa para uma criança: {text}")
}

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

/// Fill-in-the-blank request for `count` words contrasting the pair.
pub fn exercises(pair: PhoneticPair, count: usize) -> String {
    format!(
        "Gere {count} exercícios de completar palavras em PORTUGUÊS DO BRASIL para crianças \
         de 7 a 8 anos, focando na distinção entre as letras {letters}.\n\
         IMPORTANTE: Todas as palavras devem ser substantivos concretos fáceis de desenhar \
         (animais, objetos).\n\
         Retorne um array JSON com: word (ex: 'JA_ELA'), options (ex: ['N', 'M']), \
         correctOption, fullWord.",
        letters = pair.spoken_letters(),
    )
}

/// Schema the exercise response must follow: an array of
/// `{word, options, correctOption, fullWord}`, every field required.
pub fn exercise_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "word": { "type": "STRING" },
                "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                "correctOption": { "type": "STRING" },
                "fullWord": { "type": "STRING" }
            },
            "required": ["word", "options", "correctOption", "fullWord"]
        }
    })
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

pub fn illustration(word: &str) -> String {
    format!(
        "Uma ilustração infantil colorida, fofa e didática de: {word}. \
         Fundo branco, estilo desenho animado alegre, sem textos."
    )
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

pub fn fun_story(pair: PhoneticPair) -> String {
    format!(
        "Escreva uma história curtíssima (máximo 4 frases) em PORTUGUÊS DO BRASIL para \
         crianças. Use muitas palavras com {}.",
        pair.spoken_letters()
    )
}
