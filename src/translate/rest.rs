/// REST translation backend (Google Cloud Translation v2 wire format)
///
/// Form-encoded POST of `{q, target, key}`; a 200 response carries
/// `{"data": {"translations": [{"translatedText": "..."}]}}`. The service
/// returns HTML-escaped text, so entities are decoded before returning.

use serde::Deserialize;
use tracing::debug;

use super::TranslationRequest;
use crate::config::{AppConfig, GOOGLE_KEY_VAR};
use crate::error::TranslateError;

#[derive(Clone)]
pub struct RestTranslator {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

#[derive(Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl RestTranslator {
    pub fn new(client: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            client,
            api_key: config.google_api_key.clone(),
            endpoint: config.google_endpoint.clone(),
        }
    }

    pub(crate) async fn translate(&self, request: &TranslationRequest) -> Result<String, TranslateError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(TranslateError::MissingCredential(GOOGLE_KEY_VAR))?;

        debug!(target_code = %request.target.code, "Sending REST translation request");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("q", request.source_text.as_str()),
                ("target", request.target.code.as_str()),
                ("key", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != reqwest::StatusCode::OK {
            return Err(TranslateError::Status { status, body });
        }

        decode_response(&body)
    }
}

/// Pull the first translation out of a 200 body and unescape it
fn decode_response(body: &str) -> Result<String, TranslateError> {
    let parsed: TranslateResponse =
        serde_json::from_str(body).map_err(|e| TranslateError::MalformedResponse(e.to_string()))?;

    let escaped = parsed
        .data
        .translations
        .into_iter()
        .next()
        .map(|t| t.translated_text)
        .ok_or_else(|| TranslateError::MalformedResponse("empty translations list".into()))?;

    Ok(html_escape::decode_html_entities(&escaped).into_owned())
}

impl std::fmt::Debug for RestTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTranslator")
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}
