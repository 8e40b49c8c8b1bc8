/// Launcher window: pick a backend and start a capture

use iced::widget::{button, column, container, pick_list, text};
use iced::{window, Alignment, Element, Length, Size};

use super::{font_size, scaled};
use crate::translate::ProviderKind;
use crate::Message;

const BASE_WIDTH: f32 = 350.0;
const BASE_HEIGHT: f32 = 150.0;

pub const TITLE: &str = "Screen Translate";

pub fn window_settings(scale: u32) -> window::Settings {
    window::Settings {
        size: Size::new(scaled(BASE_WIDTH, scale), scaled(BASE_HEIGHT, scale)),
        level: window::Level::AlwaysOnTop,
        ..window::Settings::default()
    }
}

pub fn view<'a>(selected: ProviderKind, status: String, scale: u32) -> Element<'a, Message> {
    let size = font_size(scale);

    let content = column![
        text("Select Translator:").size(size),
        pick_list(ProviderKind::ALL, Some(selected), Message::ProviderSelected).text_size(size),
        button(text("Capture & Translate").size(size))
            .on_press(Message::CaptureRequested)
            .padding(scaled(6.0, scale)),
        text(status).size(size * 0.8),
    ]
    .spacing(scaled(4.0, scale))
    .align_x(Alignment::Center);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
