/// A displayed capture result and its retranslation loop
///
/// Sessions are only touched from the UI thread. Background work never
/// mutates a session; it returns a `TranslationResult` that the UI hands to
/// `complete_retranslation`.

use super::machine::{Event, SessionState};
use crate::config::TargetLanguage;
use crate::translate::{ProviderKind, TranslationRequest, TranslationResult};

/// Identifies a session across UI messages and result windows
pub type SessionId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: SessionId,
    /// Editable by the user
    original_text: String,
    /// Read-only in the UI; replaced only by completed translations
    translated_text: String,
    /// Whether `translated_text` is a real translation or the fallback
    succeeded: bool,
    /// Backend behind `translated_text`
    produced_by: ProviderKind,
    /// Backend for the next retranslation
    provider: ProviderKind,
    /// Backend of the retranslation in flight
    pending: Option<ProviderKind>,
    state: SessionState,
}

impl Session {
    /// Create a session from the first translation of a capture cycle
    pub fn open(
        id: SessionId,
        original_text: impl Into<String>,
        result: TranslationResult,
        provider: ProviderKind,
    ) -> Self {
        Self {
            id,
            original_text: original_text.into(),
            translated_text: result.translated_text,
            succeeded: result.succeeded,
            produced_by: provider,
            provider,
            pending: None,
            state: SessionState::Displaying,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn translated_text(&self) -> &str {
        &self.translated_text
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn produced_by(&self) -> ProviderKind {
        self.produced_by
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The retranslate control is enabled only while nothing is in flight
    pub fn can_retranslate(&self) -> bool {
        self.state == SessionState::Displaying
    }

    /// Mirror the user's edits; the in-flight request (if any) is unaffected
    pub fn set_original_text(&mut self, text: impl Into<String>) {
        if self.state != SessionState::Closed {
            self.original_text = text.into();
        }
    }

    /// Backend for the next retranslation
    pub fn set_provider(&mut self, provider: ProviderKind) {
        if self.state != SessionState::Closed {
            self.provider = provider;
        }
    }

    /// Start a retranslation of the edited text
    ///
    /// Returns `None` (and changes nothing) if the text is blank or a
    /// retranslation is already in flight.
    pub fn request_retranslation(&mut self, target: &TargetLanguage) -> Option<TranslationRequest> {
        let edited = self.original_text.trim();
        if edited.is_empty() {
            return None;
        }

        let next = self.state.on(Event::RetranslateRequested)?;
        let request = TranslationRequest::new(edited, target.clone());
        self.state = next;
        self.pending = Some(self.provider);
        Some(request)
    }

    /// Apply the result of the in-flight retranslation
    ///
    /// Returns `false` if there was nothing in flight (e.g. the session was
    /// closed meanwhile), in which case the result is dropped.
    pub fn complete_retranslation(&mut self, result: TranslationResult) -> bool {
        let Some(next) = self.state.on(Event::RetranslationFinished) else {
            return false;
        };

        self.translated_text = result.translated_text;
        self.succeeded = result.succeeded;
        if let Some(provider) = self.pending.take() {
            self.produced_by = provider;
        }
        self.state = next;
        true
    }

    pub fn close(&mut self) {
        if let Some(next) = self.state.on(Event::CloseRequested) {
            self.state = next;
        }
    }
}
