//! Exercise illustrations: generated bytes or a seeded placeholder URL.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use crate::genai::client::GenAiError;
use crate::genai::wire::GenerateContentResponse;

/// Where an exercise image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Decoded image bytes returned by the image model. `digest` identifies
    /// the payload so caches keyed on it never serve a stale picture.
    Generated {
        mime_type: String,
        bytes: Arc<[u8]>,
        digest: u64,
    },
    /// Remote placeholder loaded over HTTP by the UI.
    Placeholder { url: String },
}

impl ImageSource {
    pub fn placeholder(word: &str, width: u32, height: u32) -> Self {
        ImageSource::Placeholder {
            url: placeholder_image_url(word, width, height),
        }
    }

    pub fn generated(mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        ImageSource::Generated {
            mime_type: mime_type.into(),
            digest: payload_digest(&bytes),
            bytes,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ImageSource::Placeholder { .. })
    }
}

/// `https://picsum.photos/seed/<word>/<w>/<h>`; the seed keeps the same word
/// mapped to the same picture.
pub fn placeholder_image_url(word: &str, width: u32, height: u32) -> String {
    let seed: String = word
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' { '-' } else { c })
        .collect();
    format!("https://picsum.photos/seed/{seed}/{width}/{height}")
}

fn payload_digest(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// Why an illustration could not be produced.
#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error(transparent)]
    Service(#[from] GenAiError),

    #[error("response contained no inline image")]
    NoImage,

    #[error("invalid base64 image payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Pull the first inline image out of an image-model response.
pub fn image_from_response(
    response: &GenerateContentResponse,
) -> Result<ImageSource, ImageFetchError> {
    let inline = response
        .first_inline_data()
        .ok_or(ImageFetchError::NoImage)?;
    let bytes = STANDARD.decode(inline.data.trim())?;
    let mime_type = if inline.mime_type.is_empty() {
        "image/png".to_string()
    } else {
        inline.mime_type.clone()
    };
    Ok(ImageSource::generated(mime_type, bytes))
}
