//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]` so a partial `settings.toml` only
//! overrides the keys it names.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variables consulted, in order, when `genai.api_key` is unset.
const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

// ---------------------------------------------------------------------------
// GenAiConfig
// ---------------------------------------------------------------------------

/// Connection settings for the generative service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenAiConfig {
    /// Base URL of the REST endpoint, without the `/v1beta/...` suffix.
    pub base_url: String,
    /// API key. `None` means read it from the environment at startup.
    pub api_key: Option<String>,
    /// Model used for structured exercises and stories.
    pub text_model: String,
    /// Model used for narration (audio modality).
    pub speech_model: String,
    /// Model used for exercise illustrations.
    pub image_model: String,
    /// Prebuilt voice used for narration.
    pub voice_name: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            text_model: "gemini-3-flash-preview".into(),
            speech_model: "gemini-2.5-flash-preview-tts".into(),
            image_model: "gemini-2.5-flash-image".into(),
            voice_name: "Kore".into(),
            timeout_secs: 60,
        }
    }
}

impl GenAiConfig {
    /// The configured key if non-empty, else the first non-empty value among
    /// `GEMINI_API_KEY` and `API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Some(key.trim().to_string());
        }
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// NarrationConfig
// ---------------------------------------------------------------------------

/// Settings for spoken feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Master switch; when `false` every narration request is a no-op.
    pub enabled: bool,
    /// Sample rate of the PCM payload when its MIME type does not say.
    pub sample_rate: u32,
    /// Interleaved channel count of the PCM payload.
    pub channels: u16,
    /// Stop the previous narration when a new one starts.
    pub interrupt_previous: bool,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 24_000,
            channels: 1,
            interrupt_previous: false,
        }
    }
}

// ---------------------------------------------------------------------------
// LessonConfig
// ---------------------------------------------------------------------------

/// Exercise-session tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonConfig {
    /// Number of exercises requested per lesson.
    pub exercise_count: usize,
    /// How long the correct/incorrect overlay stays up before advancing.
    pub feedback_dwell_ms: u64,
    /// Placeholder image width in pixels.
    pub placeholder_width: u32,
    /// Placeholder image height in pixels.
    pub placeholder_height: u32,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            exercise_count: 8,
            feedback_dwell_ms: 2_500,
            placeholder_width: 400,
            placeholder_height: 300,
        }
    }
}

impl LessonConfig {
    pub fn feedback_dwell(&self) -> Duration {
        Duration::from_millis(self.feedback_dwell_ms)
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial inner window size `(width, height)` in points.
    pub window_size: (f32, f32),
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (960.0, 800.0),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use mestre_das_letras::config::AppConfig;
///
/// // Load (returns Default when the file is missing)
/// let config = AppConfig::load().unwrap();
/// assert_eq!(config.narration.sample_rate, 24_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub genai: GenAiConfig,
    pub narration: NarrationConfig,
    pub lesson: LessonConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.genai.text_model, GenAiConfig::default().text_model);
        assert_eq!(config.lesson.exercise_count, 8);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.genai.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(cfg.genai.speech_model, "gemini-2.5-flash-preview-tts");
        assert_eq!(cfg.genai.image_model, "gemini-2.5-flash-image");
        assert_eq!(cfg.genai.voice_name, "Kore");
        assert!(cfg.genai.api_key.is_none());
        assert_eq!(cfg.narration.sample_rate, 24_000);
        assert_eq!(cfg.narration.channels, 1);
        assert!(!cfg.narration.interrupt_previous);
        assert_eq!(cfg.lesson.feedback_dwell(), Duration::from_millis(2_500));
        assert_eq!(cfg.lesson.placeholder_width, 400);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.toml");

        let mut cfg = AppConfig::default();
        cfg.genai.api_key = Some("test-key".into());
        cfg.genai.voice_name = "Puck".into();
        cfg.narration.interrupt_previous = true;
        cfg.lesson.exercise_count = 4;
        cfg.ui.window_size = (800.0, 600.0);

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.genai.api_key.as_deref(), Some("test-key"));
        assert_eq!(loaded.genai.voice_name, "Puck");
        assert!(loaded.narration.interrupt_previous);
        assert_eq!(loaded.lesson.exercise_count, 4);
        assert_eq!(loaded.ui.window_size, (800.0, 600.0));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[lesson]\nfeedback_dwell_ms = 1000\n").expect("write");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.lesson.feedback_dwell_ms, 1_000);
        assert_eq!(loaded.lesson.exercise_count, 8);
        assert_eq!(loaded.genai.voice_name, "Kore");
    }

    #[test]
    fn api_key_prefers_config_value() {
        let cfg = GenAiConfig {
            api_key: Some("from-config".into()),
            ..GenAiConfig::default()
        };
        let key = cfg.resolve_api_key_with(|_| Some("from-env".into()));
        assert_eq!(key.as_deref(), Some("from-config"));
    }

    #[test]
    fn api_key_falls_back_to_env_in_order() {
        let cfg = GenAiConfig {
            api_key: Some("   ".into()),
            ..GenAiConfig::default()
        };
        let key = cfg.resolve_api_key_with(|name| match name {
            "GEMINI_API_KEY" => Some(String::new()),
            "API_KEY" => Some("legacy".into()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("legacy"));
    }

    #[test]
    fn api_key_absent_everywhere() {
        let cfg = GenAiConfig::default();
        assert!(cfg.resolve_api_key_with(|_| None).is_none());
    }
}
