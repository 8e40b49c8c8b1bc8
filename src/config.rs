/// Application configuration
///
/// Built once at startup from the process environment (plus an optional
/// `.env` file) and then shared read-only with the translation backends
/// and the capture pipeline.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GOOGLE_KEY_VAR: &str = "GOOGLE_API_KEY";

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GOOGLE_URL: &str = "https://translation.googleapis.com/language/translate/v2";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OCR_LANG: &str = "fra";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Language the text is translated into
///
/// The chat backend wants a human-readable name ("English"), the REST
/// backend an ISO code ("en"), so both are carried together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLanguage {
    pub name: String,
    pub code: String,
}

impl Default for TargetLanguage {
    fn default() -> Self {
        Self {
            name: "English".to_string(),
            code: "en".to_string(),
        }
    }
}

/// Everything the app needs to know that isn't hard-coded
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Credential for the chat-completion backend
    pub openai_api_key: Option<String>,
    /// Credential for the REST translation backend
    pub google_api_key: Option<String>,
    pub openai_model: String,
    /// Base URL; `/chat/completions` is appended
    pub openai_base_url: String,
    /// Full endpoint URL for the REST backend
    pub google_endpoint: String,
    /// Upper bound on any single translation request
    pub request_timeout: Duration,
    /// Tesseract language model used for recognition
    pub ocr_language: String,
    pub target_language: TargetLanguage,
    /// Where per-cycle temporary images are written
    pub work_dir: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            google_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_URL.to_string(),
            google_endpoint: DEFAULT_GOOGLE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ocr_language: DEFAULT_OCR_LANG.to_string(),
            target_language: TargetLanguage::default(),
            work_dir: std::env::temp_dir(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal; credentials may come from the shell
        let _ = dotenv::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let request_timeout = match var("SCREEN_TRANSLATE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("SCREEN_TRANSLATE_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        let target_language = TargetLanguage {
            name: var("SCREEN_TRANSLATE_TARGET_LANG").unwrap_or(defaults.target_language.name),
            code: var("SCREEN_TRANSLATE_TARGET_CODE").unwrap_or(defaults.target_language.code),
        };

        Ok(Self {
            openai_api_key: var(OPENAI_KEY_VAR),
            google_api_key: var(GOOGLE_KEY_VAR),
            openai_model: var("SCREEN_TRANSLATE_OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: var("SCREEN_TRANSLATE_OPENAI_URL").unwrap_or(defaults.openai_base_url),
            google_endpoint: var("SCREEN_TRANSLATE_GOOGLE_URL").unwrap_or(defaults.google_endpoint),
            request_timeout,
            ocr_language: var("SCREEN_TRANSLATE_OCR_LANG").unwrap_or(defaults.ocr_language),
            target_language,
            work_dir: defaults.work_dir,
            log_level: var("SCREEN_TRANSLATE_LOG").unwrap_or(defaults.log_level),
        })
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        }),
    }
}
