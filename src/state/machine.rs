/// Capture/translate state machine
///
/// One capture cycle walks `Idle -> Capturing -> Extracting -> Translating ->
/// Displaying`, then loops `Displaying <-> Retranslating` until the result
/// window is closed. `Closed` is final: a new capture always starts a new
/// session.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
    Extracting,
    Translating,
    Displaying,
    Retranslating,
    Closed,
}

/// Things that move a cycle forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CaptureRequested,
    /// Tool failed, was cancelled, or wrote nothing
    CaptureFailed,
    ImageAcquired,
    /// OCR produced only whitespace; the cycle ends without translating
    NoTextFound,
    /// Decode or OCR engine failure
    ExtractionFailed,
    TextExtracted,
    TranslationFinished,
    /// Guarded by the caller: edited text must be non-blank
    RetranslateRequested,
    RetranslationFinished,
    CloseRequested,
}

impl SessionState {
    /// The state after `event`, or `None` if the event doesn't apply here
    ///
    /// `None` means the event is ignored; callers treat it as a no-op.
    pub fn on(self, event: Event) -> Option<SessionState> {
        use Event::*;
        use SessionState::*;

        match (self, event) {
            (Idle, CaptureRequested) => Some(Capturing),
            (Capturing, CaptureFailed) => Some(Idle),
            (Capturing, ImageAcquired) => Some(Extracting),
            (Extracting, NoTextFound) => Some(Idle),
            (Extracting, ExtractionFailed) => Some(Idle),
            (Extracting, TextExtracted) => Some(Translating),
            (Translating, TranslationFinished) => Some(Displaying),
            (Displaying, RetranslateRequested) => Some(Retranslating),
            (Retranslating, RetranslationFinished) => Some(Displaying),
            (Displaying | Retranslating, CloseRequested) => Some(Closed),
            _ => None,
        }
    }

    /// Still waiting on background work that will produce the first result
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            SessionState::Capturing | SessionState::Extracting | SessionState::Translating
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Idle => "Idle",
            SessionState::Capturing => "📸 Select a region with your mouse...",
            SessionState::Extracting => "🔍 Extracting text...",
            SessionState::Translating => "⏳ Translating...",
            SessionState::Displaying => "Displaying",
            SessionState::Retranslating => "Translating...",
            SessionState::Closed => "Closed",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [SessionState; 7] = [
        SessionState::Idle,
        SessionState::Capturing,
        SessionState::Extracting,
        SessionState::Translating,
        SessionState::Displaying,
        SessionState::Retranslating,
        SessionState::Closed,
    ];

    const ALL_EVENTS: [Event; 10] = [
        Event::CaptureRequested,
        Event::CaptureFailed,
        Event::ImageAcquired,
        Event::NoTextFound,
        Event::ExtractionFailed,
        Event::TextExtracted,
        Event::TranslationFinished,
        Event::RetranslateRequested,
        Event::RetranslationFinished,
        Event::CloseRequested,
    ];

    #[test]
    fn test_happy_path() {
        let state = SessionState::Idle
            .on(Event::CaptureRequested)
            .and_then(|s| s.on(Event::ImageAcquired))
            .and_then(|s| s.on(Event::TextExtracted))
            .and_then(|s| s.on(Event::TranslationFinished))
            .and_then(|s| s.on(Event::RetranslateRequested))
            .and_then(|s| s.on(Event::RetranslationFinished))
            .and_then(|s| s.on(Event::CloseRequested));

        assert_eq!(state, Some(SessionState::Closed));
    }

    #[test]
    fn test_capture_failure_returns_to_idle() {
        assert_eq!(
            SessionState::Capturing.on(Event::CaptureFailed),
            Some(SessionState::Idle)
        );
    }

    #[test]
    fn test_no_text_never_reaches_translating() {
        let after = SessionState::Extracting.on(Event::NoTextFound);
        assert_eq!(after, Some(SessionState::Idle));
        assert_eq!(after.and_then(|s| s.on(Event::TranslationFinished)), None);
    }

    #[test]
    fn test_retranslate_only_from_displaying() {
        assert_eq!(SessionState::Retranslating.on(Event::RetranslateRequested), None);
        assert_eq!(SessionState::Translating.on(Event::RetranslateRequested), None);
    }

    #[test]
    fn test_closed_is_final() {
        for event in ALL_EVENTS {
            assert_eq!(SessionState::Closed.on(event), None);
        }
    }

    #[test]
    fn test_only_translating_leads_to_displaying_first() {
        for state in ALL_STATES {
            for event in ALL_EVENTS {
                if state.on(event) == Some(SessionState::Displaying) {
                    assert!(matches!(
                        (state, event),
                        (SessionState::Translating, Event::TranslationFinished)
                            | (SessionState::Retranslating, Event::RetranslationFinished)
                    ));
                }
            }
        }
    }
}
