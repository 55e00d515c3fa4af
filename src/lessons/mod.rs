//! Lesson content store.
//!
//! * [`PhoneticPair`]: the six letter-pair contrasts.
//! * [`lesson`]: static explanation, tips and example words for a pair.
//! * Fixed narration phrases used by the exercise and final views.

pub mod content;
pub mod pair;

pub use content::{
    lesson, success_phrase, LessonContent, LessonExample, INSTRUCTION_PHRASE, RETRY_PHRASE,
    SUCCESS_PREFIX, VICTORY_PHRASE,
};
pub use pair::{PhoneticPair, UnknownPair};
