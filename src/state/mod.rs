/// State management module
///
/// This module handles per-capture state, including:
/// - The capture/translate state machine (machine.rs)
/// - Result sessions with editable original text (session.rs)

pub mod machine;
pub mod session;
