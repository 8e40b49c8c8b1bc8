/// One capture cycle: capture -> preprocess -> extract -> translate
///
/// The steps depend strictly on each other, so a whole cycle runs as a
/// single sequential background task. Every failure is turned into a
/// `CycleOutcome` here; the UI only ever receives finished results.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::capture::ScreenCapture;
use crate::config::AppConfig;
use crate::ocr::extract::{extract, TextRecognizer};
use crate::ocr::preprocess::preprocess_capture;
use crate::state::machine::{Event, SessionState};
use crate::translate::{ProviderKind, TranslationRequest, TranslationResult, Translator};

/// Identifies a capture cycle (and the session it turns into)
pub type CycleId = u64;

/// How a capture cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The user cancelled the selection or the capture tool failed
    CaptureFailed(String),
    /// The captured image couldn't be decoded or the processed one written
    DecodeFailed(String),
    /// The OCR engine couldn't be run
    OcrFailed(String),
    /// OCR found nothing; translation was not attempted
    NoText,
    /// Ready to display (the translation itself may have degraded)
    Translated {
        original: String,
        result: TranslationResult,
        provider: ProviderKind,
    },
}

/// Temporary files for one cycle; unique per id so cycles never collide
fn cycle_paths(work_dir: &Path, id: CycleId) -> (PathBuf, PathBuf) {
    let pid = std::process::id();
    (
        work_dir.join(format!("screen-translate-{pid}-{id}-capture.png")),
        work_dir.join(format!("screen-translate-{pid}-{id}-processed.png")),
    )
}

/// Run a complete cycle, reporting each state change through `progress`
pub async fn run_cycle<C, R, F>(
    id: CycleId,
    capture: &C,
    recognizer: &R,
    translator: &Translator,
    config: &AppConfig,
    mut progress: F,
) -> CycleOutcome
where
    C: ScreenCapture + ?Sized,
    R: TextRecognizer + ?Sized,
    F: FnMut(SessionState) + Send,
{
    let (capture_path, processed_path) = cycle_paths(&config.work_dir, id);
    let mut state = SessionState::Idle;

    advance(&mut state, Event::CaptureRequested, &mut progress);
    let captured = match capture.capture(&capture_path).await {
        Ok(captured) => captured,
        Err(error) => {
            warn!(cycle = id, %error, "❌ Screenshot failed");
            advance(&mut state, Event::CaptureFailed, &mut progress);
            discard(&capture_path).await;
            return CycleOutcome::CaptureFailed(error.to_string());
        }
    };

    advance(&mut state, Event::ImageAcquired, &mut progress);
    let processed = preprocess_capture(&captured, processed_path.clone()).await;
    discard(captured.path()).await;
    let processed = match processed {
        Ok(processed) => processed,
        Err(error) => {
            warn!(cycle = id, %error, "❌ Could not read captured image");
            advance(&mut state, Event::ExtractionFailed, &mut progress);
            discard(&processed_path).await;
            return CycleOutcome::DecodeFailed(error.to_string());
        }
    };

    let (width, height) = processed.dimensions();
    debug!(cycle = id, width, height, "Running OCR on processed image");
    let extracted = extract(recognizer, processed, &config.ocr_language).await;
    discard(&processed_path).await;
    let extracted = match extracted {
        Ok(text) => text,
        Err(error) => {
            warn!(cycle = id, %error, "❌ OCR failed");
            advance(&mut state, Event::ExtractionFailed, &mut progress);
            return CycleOutcome::OcrFailed(error.to_string());
        }
    };

    if extracted.is_blank() {
        info!(cycle = id, "❗ No text found");
        advance(&mut state, Event::NoTextFound, &mut progress);
        return CycleOutcome::NoText;
    }

    let original = extracted.as_str().trim().to_string();
    let provider = translator.kind();

    advance(&mut state, Event::TextExtracted, &mut progress);
    info!(cycle = id, %provider, chars = original.chars().count(), "⏳ Translating");
    let request = TranslationRequest::new(original.clone(), config.target_language.clone());
    let result = translator.translate(&request).await;
    advance(&mut state, Event::TranslationFinished, &mut progress);
    debug!(cycle = id, %state, "Cycle finished");

    CycleOutcome::Translated {
        original,
        result,
        provider,
    }
}

/// Apply `event`; only states the launcher waits on are reported
fn advance<F: FnMut(SessionState)>(state: &mut SessionState, event: Event, progress: &mut F) {
    if let Some(next) = state.on(event) {
        *state = next;
        if next.is_pending() {
            progress(next);
        }
    }
}

/// Remove a temporary image; a missing file is fine
async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed temporary image"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!(path = %path.display(), error = %e, "Could not remove temporary image"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use image::{DynamicImage, Rgb, RgbImage};

    use crate::capture::{ensure_written, CapturedImage};
    use crate::error::{CaptureError, OcrError};
    use crate::ocr::preprocess::ProcessedImage;
    use crate::translate::mock_server::MockServer;
    use crate::translate::Translators;

    /// Writes a fixed image, or behaves like a cancelled selection
    enum FakeCapture {
        Image(DynamicImage),
        Bytes(&'static [u8]),
        Cancelled,
    }

    #[async_trait]
    impl ScreenCapture for FakeCapture {
        async fn capture(&self, output: &Path) -> Result<CapturedImage, CaptureError> {
            match self {
                FakeCapture::Image(image) => image.save(output).unwrap(),
                FakeCapture::Bytes(bytes) => std::fs::write(output, bytes).unwrap(),
                FakeCapture::Cancelled => {}
            }
            ensure_written(output).await
        }
    }

    struct FakeRecognizer {
        text: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl FakeRecognizer {
        fn new(text: &'static str) -> Self {
            Self {
                text,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl TextRecognizer for FakeRecognizer {
        async fn recognize(&self, image: &ProcessedImage, language: &str) -> Result<String, OcrError> {
            assert!(image.path().exists());
            assert_eq!(language, "fra");
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.to_string())
        }
    }

    fn screenshot() -> FakeCapture {
        FakeCapture::Image(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            16,
            8,
            Rgb([220, 220, 220]),
        )))
    }

    struct Harness {
        _dir: tempfile::TempDir,
        config: AppConfig,
        server: MockServer,
    }

    impl Harness {
        async fn new(status: u16, body: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let server = MockServer::start(status, body).await;
            let config = AppConfig {
                openai_api_key: Some("sk-test".into()),
                google_api_key: Some("g-test".into()),
                openai_base_url: server.url(),
                google_endpoint: server.url(),
                request_timeout: Duration::from_secs(5),
                work_dir: dir.path().to_path_buf(),
                ..AppConfig::default()
            };
            Self {
                _dir: dir,
                config,
                server,
            }
        }

        fn translator(&self, kind: ProviderKind) -> Translator {
            Translators::from_config(&self.config).unwrap().select(kind)
        }

        async fn run(&self, capture: &FakeCapture, recognizer: &FakeRecognizer) -> (CycleOutcome, Vec<SessionState>) {
            let mut states = Vec::new();
            let outcome = run_cycle(
                7,
                capture,
                recognizer,
                &self.translator(ProviderKind::Llm),
                &self.config,
                |state| states.push(state),
            )
            .await;
            (outcome, states)
        }

        fn leftover_files(&self) -> usize {
            std::fs::read_dir(&self.config.work_dir).unwrap().count()
        }
    }

    const CHAT_REPLY: &str = r#"{"choices":[{"message":{"role":"assistant","content":"Hello everyone"}}]}"#;

    #[tokio::test]
    async fn test_llm_success_cycle() {
        let harness = Harness::new(200, CHAT_REPLY).await;
        let recognizer = FakeRecognizer::new("Bonjour tout le monde\n\x0c");

        let (outcome, states) = harness.run(&screenshot(), &recognizer).await;

        assert_eq!(
            outcome,
            CycleOutcome::Translated {
                original: "Bonjour tout le monde".into(),
                result: TranslationResult::translated("Hello everyone"),
                provider: ProviderKind::Llm,
            }
        );
        assert_eq!(
            states,
            [
                SessionState::Capturing,
                SessionState::Extracting,
                SessionState::Translating
            ]
        );
        assert_eq!(harness.leftover_files(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_capture_stops_before_anything_else() {
        let harness = Harness::new(200, CHAT_REPLY).await;
        let recognizer = FakeRecognizer::new("Bonjour");

        let (outcome, states) = harness.run(&FakeCapture::Cancelled, &recognizer).await;

        assert!(matches!(outcome, CycleOutcome::CaptureFailed(_)));
        assert_eq!(states, [SessionState::Capturing]);
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.server.hits(), 0);
    }

    #[tokio::test]
    async fn test_blank_ocr_output_skips_translation() {
        let harness = Harness::new(200, CHAT_REPLY).await;
        let recognizer = FakeRecognizer::new(" \n\x0c");

        let (outcome, states) = harness.run(&screenshot(), &recognizer).await;

        assert_eq!(outcome, CycleOutcome::NoText);
        assert!(!states.contains(&SessionState::Translating));
        assert_eq!(harness.server.hits(), 0);
        assert_eq!(harness.leftover_files(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_capture_is_a_decode_failure() {
        let harness = Harness::new(200, CHAT_REPLY).await;
        let recognizer = FakeRecognizer::new("Bonjour");

        let (outcome, _) = harness.run(&FakeCapture::Bytes(b"garbage"), &recognizer).await;

        assert!(matches!(outcome, CycleOutcome::DecodeFailed(_)));
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.leftover_files(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_still_displays_source() {
        let harness = Harness::new(429, r#"{"error":{"message":"rate limited"}}"#).await;
        let recognizer = FakeRecognizer::new("Bonjour");

        let (outcome, states) = harness.run(&screenshot(), &recognizer).await;

        assert_eq!(
            outcome,
            CycleOutcome::Translated {
                original: "Bonjour".into(),
                result: TranslationResult {
                    translated_text: "Bonjour".into(),
                    succeeded: false,
                },
                provider: ProviderKind::Llm,
            }
        );
        assert_eq!(states.last(), Some(&SessionState::Translating));
    }

    #[test]
    fn test_cycle_paths_are_unique_per_cycle() {
        let dir = Path::new("/tmp");
        assert_ne!(cycle_paths(dir, 1), cycle_paths(dir, 2));
    }
}
