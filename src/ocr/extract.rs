/// Text extraction through the OCR engine
///
/// The engine itself is an external collaborator: we hand it a processed
/// image path, a language model and a page segmentation mode, and get back
/// UTF-8 text. Nothing is trimmed here; deciding what counts as "no text"
/// is up to the caller via `ExtractedText::is_blank`.

use async_trait::async_trait;
use tracing::debug;

use super::preprocess::ProcessedImage;
use crate::error::OcrError;

/// Tesseract page segmentation mode 6: a single uniform block of text
pub const PAGE_SEGMENTATION_MODE: u8 = 6;

const TESSERACT: &str = "tesseract";

/// Raw recognizer output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Empty or whitespace-only output means "no text found"
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Anything that can read text out of a processed image
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &ProcessedImage, language: &str) -> Result<String, OcrError>;
}

/// Consume a processed image and return whatever the engine read
pub async fn extract<R>(
    recognizer: &R,
    image: ProcessedImage,
    language: &str,
) -> Result<ExtractedText, OcrError>
where
    R: TextRecognizer + ?Sized,
{
    let text = recognizer.recognize(&image, language).await?;
    debug!(chars = text.chars().count(), language, "OCR finished");
    Ok(ExtractedText::new(text))
}

/// The `tesseract` command line tool
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            program: TESSERACT.to_string(),
        }
    }
}

impl TesseractCli {
    /// Use a specific binary instead of the one on PATH
    #[cfg(test)]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for `tesseract <image> stdout -l <lang> --psm 6`
    fn args(image: &ProcessedImage, language: &str) -> Vec<String> {
        vec![
            image.path().to_string_lossy().into_owned(),
            "stdout".to_string(),
            "-l".to_string(),
            language.to_string(),
            "--psm".to_string(),
            PAGE_SEGMENTATION_MODE.to_string(),
        ]
    }
}

#[async_trait]
impl TextRecognizer for TesseractCli {
    async fn recognize(&self, image: &ProcessedImage, language: &str) -> Result<String, OcrError> {
        let output = tokio::process::Command::new(&self.program)
            .args(Self::args(image, language))
            .output()
            .await
            .map_err(|source| OcrError::Launch {
                tool: TESSERACT,
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                tool: TESSERACT,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
