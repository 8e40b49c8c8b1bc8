/// Window views
///
/// - Launcher: provider choice + capture button (launcher.rs)
/// - One result window per session (result.rs)
///
/// Both windows are sized by the integer monitor scale.

pub mod launcher;
pub mod result;

/// Body text size at scale 1
const BASE_FONT_SIZE: f32 = 16.0;

/// Multiply a base dimension by the monitor scale
pub fn scaled(base: f32, scale: u32) -> f32 {
    base * scale.max(1) as f32
}

pub fn font_size(scale: u32) -> f32 {
    scaled(BASE_FONT_SIZE, scale)
}
