/// Result window for one session
///
/// The original text is editable and can be retranslated; the translated
/// text is read-only and only changes when a translation completes.

use iced::widget::{button, column, container, pick_list, row, scrollable, text, text_editor};
use iced::{window, Element, Length, Size};

use super::{font_size, scaled};
use crate::state::session::Session;
use crate::translate::ProviderKind;
use crate::Message;

const BASE_WIDTH: f32 = 700.0;
const BASE_HEIGHT: f32 = 500.0;

pub const TITLE: &str = "OCR + Translation Result";

pub fn window_settings(scale: u32) -> window::Settings {
    window::Settings {
        size: Size::new(scaled(BASE_WIDTH, scale), scaled(BASE_HEIGHT, scale)),
        level: window::Level::AlwaysOnTop,
        ..window::Settings::default()
    }
}

/// Label for the retranslate button; it doubles as the in-flight indicator
pub fn retranslate_label(session: &Session) -> &'static str {
    if session.can_retranslate() {
        "🔄 Retranslate"
    } else {
        "Translating..."
    }
}

/// Names the backend behind the text shown, not the one picked for next time
pub fn translated_heading(session: &Session) -> String {
    format!("Translated Text ({}):", session.produced_by())
}

pub fn view<'a>(
    session: &'a Session,
    editor: &'a text_editor::Content,
    scale: u32,
) -> Element<'a, Message> {
    let id = session.id();
    let size = font_size(scale);
    let pad = scaled(10.0, scale);

    let original = text_editor(editor)
        .on_action(move |action| Message::OriginalEdited(id, action))
        .size(size)
        .height(Length::Fill);

    let retranslate = button(text(retranslate_label(session)).size(size * 0.85))
        .on_press_maybe(
            session
                .can_retranslate()
                .then_some(Message::RetranslateRequested(id)),
        )
        .padding(scaled(6.0, scale));

    let provider = pick_list(ProviderKind::ALL, Some(session.provider()), move |kind| {
        Message::SessionProviderSelected(id, kind)
    })
    .text_size(size * 0.85);

    let mut translated = column![
        text(translated_heading(session)).size(size),
        scrollable(text(session.translated_text()).size(size)).height(Length::Fill),
    ]
    .spacing(pad / 2.0)
    .height(Length::FillPortion(1));

    if !session.succeeded() {
        translated = translated.push(
            text("Translation failed, showing the original text.").size(size * 0.8),
        );
    }

    let content = column![
        column![
            text("Original Text (editable):").size(size),
            original,
            row![retranslate, provider].spacing(pad),
        ]
        .spacing(pad / 2.0)
        .height(Length::FillPortion(1)),
        translated,
    ]
    .spacing(pad)
    .padding(pad);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
