/// Chat-completion translation backend
///
/// Sends a two-message conversation (fixed system role + an instruction
/// embedding the text) to an OpenAI-compatible `/chat/completions` endpoint.
/// The instruction asks the model to keep the tone of comic dialogue, and
/// the low temperature keeps repeated translations of the same text stable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TranslationRequest;
use crate::config::{AppConfig, OPENAI_KEY_VAR};
use crate::error::TranslateError;

const SYSTEM_PROMPT: &str = "You are a helpful translator.";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.3;

#[derive(Clone)]
pub struct LlmTranslator {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// The user message for one translation
pub fn build_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following comic-style text to {target_language}. \
         Preserve any tone, humor, or emotion.\n\n\
         Text:\n{text}\n\n\
         Translation:"
    )
}

impl LlmTranslator {
    pub fn new(client: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            client,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
        }
    }

    /// One request/response round trip; errors are handled by `Translator`
    pub(crate) async fn translate(&self, request: &TranslationRequest) -> Result<String, TranslateError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(TranslateError::MissingCredential(OPENAI_KEY_VAR))?;

        let prompt = build_prompt(&request.source_text, &request.target.name);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        debug!(model = %self.model, "Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(TranslateError::Status { status, body: text });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| TranslateError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| TranslateError::MalformedResponse("no completion in response".into()))
    }
}

impl std::fmt::Debug for LlmTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmTranslator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}
