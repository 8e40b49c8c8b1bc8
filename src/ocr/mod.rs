/// Text recognition module
///
/// This module handles:
/// - Cleaning up captured images for recognition (preprocess.rs)
/// - Running the OCR engine on the cleaned image (extract.rs)

pub mod extract;
pub mod preprocess;
