/// Translation backends
///
/// Two closed variants sit behind one `translate` operation:
/// - `Llm`: a chat-completion model asked to keep the tone of comic dialogue
/// - `Rest`: a plain REST translation endpoint
///
/// Whatever happens on the wire, `Translator::translate` always returns a
/// `TranslationResult`. On failure the source text comes back unchanged
/// with `succeeded = false`, so the caller can still show something.

pub mod llm;
pub mod rest;

#[cfg(test)]
pub(crate) mod mock_server;

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{AppConfig, TargetLanguage};
use crate::error::ConfigError;

pub use llm::LlmTranslator;
pub use rest::RestTranslator;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// User-facing choice of backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderKind {
    #[default]
    Llm,
    Rest,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Llm, ProviderKind::Rest];

    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Llm => "OpenAI GPT",
            ProviderKind::Rest => "Google Translate",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One translation attempt; built fresh for every (re)translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub source_text: String,
    pub target: TargetLanguage,
}

impl TranslationRequest {
    pub fn new(source_text: impl Into<String>, target: TargetLanguage) -> Self {
        Self {
            source_text: source_text.into(),
            target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub translated_text: String,
    pub succeeded: bool,
}

impl TranslationResult {
    pub fn translated(text: impl Into<String>) -> Self {
        Self {
            translated_text: text.into(),
            succeeded: true,
        }
    }

    /// Fallback: show the source text as-is
    pub fn degraded(request: &TranslationRequest) -> Self {
        Self {
            translated_text: request.source_text.clone(),
            succeeded: false,
        }
    }

    /// Nothing to translate
    pub fn empty() -> Self {
        Self {
            translated_text: String::new(),
            succeeded: true,
        }
    }
}

/// A configured backend, ready to translate
#[derive(Debug, Clone)]
pub enum Translator {
    Llm(LlmTranslator),
    Rest(RestTranslator),
}

impl Translator {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Translator::Llm(_) => ProviderKind::Llm,
            Translator::Rest(_) => ProviderKind::Rest,
        }
    }

    /// Translate, degrading to the source text on any backend failure
    ///
    /// Blank input returns an empty result without touching the network.
    pub async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        if request.source_text.trim().is_empty() {
            debug!(provider = %self.kind(), "Skipping translation of blank text");
            return TranslationResult::empty();
        }

        let attempt = match self {
            Translator::Llm(backend) => backend.translate(request).await,
            Translator::Rest(backend) => backend.translate(request).await,
        };

        match attempt {
            Ok(text) => {
                debug!(provider = %self.kind(), chars = text.chars().count(), "Translation succeeded");
                TranslationResult::translated(text)
            }
            Err(error) => {
                warn!(provider = %self.kind(), %error, "❌ Translation failed, showing source text");
                TranslationResult::degraded(request)
            }
        }
    }
}

/// Both backends, built once at startup from the config
#[derive(Debug, Clone)]
pub struct Translators {
    llm: LlmTranslator,
    rest: RestTranslator,
}

impl Translators {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout))
            .build()?;

        Ok(Self {
            llm: LlmTranslator::new(client.clone(), config),
            rest: RestTranslator::new(client, config),
        })
    }

    /// Pick the backend for a request
    pub fn select(&self, kind: ProviderKind) -> Translator {
        match kind {
            ProviderKind::Llm => Translator::Llm(self.llm.clone()),
            ProviderKind::Rest => Translator::Rest(self.rest.clone()),
        }
    }
}
