use std::collections::BTreeMap;
use std::sync::Arc;

use iced::futures::channel::mpsc;
use iced::futures::SinkExt;
use iced::widget::text_editor;
use iced::{window, Element, Subscription, Task, Theme};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod capture;
mod config;
mod display;
mod error;
mod ocr;
mod pipeline;
mod state;
mod translate;
mod ui;

use capture::GnomeScreenshot;
use config::AppConfig;
use ocr::extract::TesseractCli;
use pipeline::{CycleId, CycleOutcome};
use state::machine::SessionState;
use state::session::{Session, SessionId};
use translate::{ProviderKind, TranslationResult, Translators};

/// What a window is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Launcher,
    Result(SessionId),
}

/// A displayed session and the editor buffer backing its original text
struct OpenSession {
    session: Session,
    editor: text_editor::Content,
}

/// Main application state
struct ScreenTranslate {
    config: Arc<AppConfig>,
    translators: Translators,
    capture: Arc<GnomeScreenshot>,
    recognizer: Arc<TesseractCli>,
    /// Integer monitor scale applied to window and font sizes
    scale: u32,
    /// Backend used for new captures
    selected_provider: ProviderKind,
    windows: BTreeMap<window::Id, Surface>,
    /// Capture cycles still running in the background
    cycles: BTreeMap<CycleId, SessionState>,
    sessions: BTreeMap<SessionId, OpenSession>,
    next_cycle: CycleId,
    /// Outcome of the last finished cycle
    status: String,
}

/// Progress of a background capture cycle
#[derive(Debug, Clone)]
enum CycleEvent {
    Progress(SessionState),
    Finished(CycleOutcome),
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User picked a backend in the launcher
    ProviderSelected(ProviderKind),
    /// User clicked "Capture & Translate"
    CaptureRequested,
    Cycle(CycleId, CycleEvent),
    WindowOpened(window::Id),
    WindowClosed(window::Id),
    OriginalEdited(SessionId, text_editor::Action),
    SessionProviderSelected(SessionId, ProviderKind),
    RetranslateRequested(SessionId),
    /// Background retranslation completed
    Retranslated(SessionId, TranslationResult),
}

impl ScreenTranslate {
    /// Create the app and open the launcher window
    fn new(config: AppConfig, translators: Translators, scale: u32) -> (Self, Task<Message>) {
        let (launcher, open) = window::open(ui::launcher::window_settings(scale));

        let mut windows = BTreeMap::new();
        windows.insert(launcher, Surface::Launcher);

        let app = ScreenTranslate {
            config: Arc::new(config),
            translators,
            capture: Arc::new(GnomeScreenshot::default()),
            recognizer: Arc::new(TesseractCli::default()),
            scale,
            selected_provider: ProviderKind::default(),
            windows,
            cycles: BTreeMap::new(),
            sessions: BTreeMap::new(),
            next_cycle: 1,
            status: "Ready.".to_string(),
        };

        (app, open.map(Message::WindowOpened))
    }

    fn title(&self, window: window::Id) -> String {
        match self.windows.get(&window) {
            Some(Surface::Result(_)) => ui::result::TITLE.to_string(),
            _ => ui::launcher::TITLE.to_string(),
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ProviderSelected(kind) => {
                self.selected_provider = kind;
                Task::none()
            }
            Message::CaptureRequested => self.start_cycle(),
            Message::Cycle(id, CycleEvent::Progress(state)) => {
                if let Some(current) = self.cycles.get_mut(&id) {
                    *current = state;
                }
                Task::none()
            }
            Message::Cycle(id, CycleEvent::Finished(outcome)) => self.finish_cycle(id, outcome),
            Message::WindowOpened(window) => {
                debug!(?window, "Window opened");
                Task::none()
            }
            Message::WindowClosed(window) => match self.windows.remove(&window) {
                Some(Surface::Launcher) => {
                    info!("👋 Launcher closed, exiting");
                    iced::exit()
                }
                Some(Surface::Result(id)) => {
                    if let Some(mut open) = self.sessions.remove(&id) {
                        let was = open.session.state();
                        open.session.close();
                        info!(session = id, ?was, "Session closed");
                    }
                    Task::none()
                }
                None => Task::none(),
            },
            Message::OriginalEdited(id, action) => {
                if let Some(open) = self.sessions.get_mut(&id) {
                    let is_edit = action.is_edit();
                    open.editor.perform(action);
                    if is_edit {
                        open.session.set_original_text(open.editor.text());
                    }
                }
                Task::none()
            }
            Message::SessionProviderSelected(id, kind) => {
                if let Some(open) = self.sessions.get_mut(&id) {
                    open.session.set_provider(kind);
                }
                Task::none()
            }
            Message::RetranslateRequested(id) => {
                let Some(open) = self.sessions.get_mut(&id) else {
                    return Task::none();
                };
                // No-op for blank text or while a retranslation is in flight
                let Some(request) = open
                    .session
                    .request_retranslation(&self.config.target_language)
                else {
                    return Task::none();
                };

                let translator = self.translators.select(open.session.provider());
                info!(session = id, provider = %translator.kind(), "🔄 Retranslating");

                Task::perform(
                    async move { translator.translate(&request).await },
                    move |result| Message::Retranslated(id, result),
                )
            }
            Message::Retranslated(id, result) => {
                // The window may have been closed while the request was in flight
                if let Some(open) = self.sessions.get_mut(&id) {
                    open.session.complete_retranslation(result);
                }
                Task::none()
            }
        }
    }

    /// Launch a capture cycle as one background task
    fn start_cycle(&mut self) -> Task<Message> {
        let id = self.next_cycle;
        self.next_cycle += 1;
        self.cycles.insert(id, SessionState::Capturing);

        let capture = self.capture.clone();
        let recognizer = self.recognizer.clone();
        let translator = self.translators.select(self.selected_provider);
        let config = self.config.clone();

        info!(cycle = id, provider = %self.selected_provider, "📸 Starting capture");

        let events = iced::stream::channel(8, move |mut output: mpsc::Sender<CycleEvent>| async move {
            let mut progress = output.clone();
            let outcome = pipeline::run_cycle(
                id,
                capture.as_ref(),
                recognizer.as_ref(),
                &translator,
                &config,
                move |state| {
                    // Progress is informational; dropping an update is harmless
                    let _ = progress.try_send(CycleEvent::Progress(state));
                },
            )
            .await;

            let _ = output.send(CycleEvent::Finished(outcome)).await;
        });

        Task::run(events, move |event| Message::Cycle(id, event))
    }

    /// Turn a finished cycle into a status line or a new result window
    fn finish_cycle(&mut self, id: CycleId, outcome: CycleOutcome) -> Task<Message> {
        if self.cycles.remove(&id).is_none() {
            return Task::none();
        }

        match outcome {
            CycleOutcome::CaptureFailed(_) => {
                self.status = "Capture cancelled or failed.".to_string();
                Task::none()
            }
            CycleOutcome::DecodeFailed(reason) => {
                self.status = format!("Could not read the captured image: {reason}");
                Task::none()
            }
            CycleOutcome::OcrFailed(reason) => {
                error!(cycle = id, %reason, "Text recognition failed");
                self.status = format!("Text recognition failed: {reason}");
                Task::none()
            }
            CycleOutcome::NoText => {
                self.status = "No text found.".to_string();
                Task::none()
            }
            CycleOutcome::Translated {
                original,
                result,
                provider,
            } => {
                self.status = if result.succeeded {
                    format!("Translated with {provider}.")
                } else {
                    format!("{provider} failed; showing the original text.")
                };

                let session = Session::open(id, original, result, provider);
                let editor = text_editor::Content::with_text(session.original_text());

                let (window, open) = window::open(ui::result::window_settings(self.scale));
                self.windows.insert(window, Surface::Result(id));
                self.sessions.insert(id, OpenSession { session, editor });

                open.map(Message::WindowOpened)
            }
        }
    }

    /// Status line for the launcher; running cycles win over the last outcome
    fn launcher_status(&self) -> String {
        match self.cycles.values().filter(|s| s.is_pending()).next_back() {
            Some(state) if self.cycles.len() > 1 => {
                format!("{state} ({} captures running)", self.cycles.len())
            }
            Some(state) => state.to_string(),
            None => self.status.clone(),
        }
    }

    /// Build the user interface for one window
    fn view(&self, window: window::Id) -> Element<'_, Message> {
        match self.windows.get(&window) {
            Some(Surface::Result(id)) => match self.sessions.get(id) {
                Some(open) => ui::result::view(&open.session, &open.editor, self.scale),
                None => iced::widget::horizontal_space().into(),
            },
            _ => ui::launcher::view(self.selected_provider, self.launcher_status(), self.scale),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        window::close_events().map(Message::WindowClosed)
    }

    /// Set the application theme
    fn theme(&self, _window: window::Id) -> Theme {
        Theme::Dark
    }
}

/// Console logging; `RUST_LOG` overrides the configured level
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("screen_translate={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> iced::Result {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info");
            error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    init_tracing(&config.log_level);

    let translators = match Translators::from_config(&config) {
        Ok(translators) => translators,
        Err(e) => {
            error!("Failed to set up translation backends: {e}");
            std::process::exit(2);
        }
    };

    let scale = display::detect_scale().value();
    info!(
        scale,
        ocr_language = %config.ocr_language,
        target = %config.target_language.name,
        "🎨 Screen Translate starting"
    );

    iced::daemon(ScreenTranslate::title, ScreenTranslate::update, ScreenTranslate::view)
        .subscription(ScreenTranslate::subscription)
        .theme(ScreenTranslate::theme)
        .run_with(move || ScreenTranslate::new(config, translators, scale))
}
