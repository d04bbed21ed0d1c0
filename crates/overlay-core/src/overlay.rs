//! The overlay orchestrator
//!
//! [`Overlay`] owns the chat state, the render model and the two visual
//! states. Everything here runs on the UI thread: key handlers, the
//! positioning tick, and [`Overlay::apply`], the single entry point for
//! updates coming back from a query worker.

use crate::event::{StatusKind, UiUpdate, UpdateSink};
use crate::input::ChatInput;
use crate::render::Transcript;
use crate::state::{Appended, ChatMessage, MessageList, ToolStatus, DEFAULT_MAX_MESSAGES};
use crate::window::{Geometry, OverlayState, WindowHost, WindowRect};
use crate::worker::{QueryService, WorkerHandle};

pub const WINDOW_TITLE: &str = "AI game assistant";
pub const PANEL_TITLE: &str = "🐱 Cat-shaped game assistant";
pub const INPUT_PLACEHOLDER: &str = "Type a command...";
pub const GREETING_TEXT: &str =
    "👋 Hi! I'm your cat-shaped game assistant. Tell me what you need help with.";

#[derive(Debug, Clone, Copy)]
pub struct OverlayConfig {
    pub max_messages: usize,
    pub geometry: Geometry,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            geometry: Geometry::default(),
        }
    }
}

/// Last thing the positioning tick saw for the tracked window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observed {
    Rect(WindowRect),
    Unreadable,
}

pub struct Overlay<H> {
    host: H,
    service: Box<dyn QueryService>,
    updates: UpdateSink,
    geometry: Geometry,

    state: OverlayState,
    messages: MessageList,
    transcript: Transcript,
    input: ChatInput,
    worker: Option<WorkerHandle>,

    greeted: bool,
    last_observed: Option<Observed>,
    input_focus_requested: bool,
}

impl<H: WindowHost> Overlay<H> {
    /// Start collapsed and click-through, docked to the tracked window if
    /// there is one.
    pub fn new(
        host: H,
        service: Box<dyn QueryService>,
        updates: UpdateSink,
        config: OverlayConfig,
    ) -> Self {
        let mut overlay = Self {
            host,
            service,
            updates,
            geometry: config.geometry,
            state: OverlayState::Collapsed,
            messages: MessageList::new(config.max_messages),
            transcript: Transcript::new(),
            input: ChatInput::new(),
            worker: None,
            greeted: false,
            last_observed: None,
            input_focus_requested: false,
        };

        if let Err(e) = overlay.host.set_click_through(true) {
            tracing::warn!("could not make overlay click-through: {e}");
        }
        overlay.host.resize(overlay.geometry.size_for(OverlayState::Collapsed));
        overlay.position_window();
        overlay
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_expanded(&self) -> bool {
        self.state == OverlayState::Expanded
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn messages(&self) -> &MessageList {
        &self.messages
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn input(&self) -> &ChatInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut ChatInput {
        &mut self.input
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// A query is outstanding
    pub fn is_busy(&self) -> bool {
        self.worker.is_some()
    }

    pub fn overlay_has_focus(&self) -> bool {
        self.host.foreground_window() == Some(self.host.overlay_window())
    }

    pub fn game_has_focus(&self) -> bool {
        match self.host.tracked_window() {
            Some(game) => self.host.foreground_window() == Some(game),
            None => false,
        }
    }

    /// Returns true once after an expansion asked for the input field to be
    /// focused
    pub fn take_input_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.input_focus_requested)
    }

    pub fn expand(&mut self) {
        if self.state == OverlayState::Expanded {
            return;
        }
        tracing::info!("expanding chat panel");
        self.state = OverlayState::Expanded;
        self.host.resize(self.geometry.size_for(OverlayState::Expanded));
        self.position_window();
        self.acquire_focus();
        self.input_focus_requested = true;

        if !self.greeted {
            self.greeted = true;
            self.push_message(ChatMessage::ai(GREETING_TEXT));
        }
    }

    pub fn collapse(&mut self) {
        if self.state == OverlayState::Collapsed {
            return;
        }
        tracing::info!("collapsing chat panel");
        self.state = OverlayState::Collapsed;
        self.host.resize(self.geometry.size_for(OverlayState::Collapsed));
        self.position_window();
        self.give_back_focus();
    }

    /// Click on the collapsed indicator
    pub fn activate_indicator(&mut self) {
        self.expand();
    }

    /// Expand key; only honoured while the game has input focus. A panel
    /// already open behind the game gets focus back.
    pub fn on_expand_key(&mut self) -> bool {
        if !self.game_has_focus() {
            return false;
        }
        tracing::info!("expand key pressed");
        if self.is_expanded() {
            self.acquire_focus();
            self.input_focus_requested = true;
        } else {
            self.expand();
        }
        true
    }

    /// Collapse key; only honoured while the overlay has input focus
    pub fn on_collapse_key(&mut self) -> bool {
        if !self.overlay_has_focus() || !self.is_expanded() {
            return false;
        }
        tracing::info!("collapse key pressed");
        self.collapse();
        true
    }

    /// Make the overlay accept input and bring it to the front
    pub fn acquire_focus(&mut self) {
        if let Err(e) = self.host.set_click_through(false) {
            tracing::warn!("could not clear click-through: {e}");
        }
        if let Err(e) = self.host.activate_overlay() {
            tracing::warn!("could not activate overlay: {e}");
        }
    }

    /// Let input fall through again and hand the foreground back to the game
    pub fn give_back_focus(&mut self) {
        if let Err(e) = self.host.set_click_through(true) {
            tracing::warn!("could not restore click-through: {e}");
        }
        if let Some(game) = self.host.tracked_window() {
            if let Err(e) = self.host.set_foreground(game) {
                tracing::warn!("could not return focus to game window: {e}");
            }
        }
    }

    pub fn position_window(&mut self) {
        let tracked = match self.host.tracked_window() {
            Some(handle) => match self.host.window_rect(handle) {
                Ok(rect) => Some(rect),
                Err(e) => {
                    tracing::error!("failed to position window: {e}");
                    None
                }
            },
            None => None,
        };
        self.place(tracked);
    }

    fn place(&mut self, tracked: Option<WindowRect>) {
        let origin = self.geometry.anchor(self.state, tracked);
        self.host.move_to(origin);
    }

    /// Periodic positioning check. Moves the overlay only when the tracked
    /// window's rectangle differs from the last one seen.
    pub fn tick(&mut self) {
        if !self.host.is_visible() {
            return;
        }
        let Some(handle) = self.host.tracked_window() else {
            return;
        };

        let observed = match self.host.window_rect(handle) {
            Ok(rect) => Observed::Rect(rect),
            Err(e) => {
                if self.last_observed != Some(Observed::Unreadable) {
                    tracing::error!("failed to read tracked window geometry: {e}");
                }
                Observed::Unreadable
            }
        };

        if self.last_observed == Some(observed) {
            return;
        }
        tracing::debug!(?observed, "tracked window moved");
        match observed {
            Observed::Rect(rect) => self.place(Some(rect)),
            Observed::Unreadable => self.place(None),
        }
        self.last_observed = Some(observed);
    }

    /// Submit the input field. Ignored when the text is blank or a query is
    /// still running.
    pub fn send(&mut self) -> bool {
        let text = self.input.text().trim();
        if text.is_empty() || self.worker.is_some() {
            return false;
        }
        let text = text.to_string();

        self.push_message(ChatMessage::user(text.clone()));
        self.input.clear();
        self.push_message(ChatMessage::processing_placeholder());

        tracing::info!("sending request to assistant");
        self.worker = Some(self.service.start(text, self.updates.clone()));
        true
    }

    /// Apply one worker update. Every branch checks its precondition and
    /// silently does nothing when it doesn't hold.
    pub fn apply(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::RemoveProcessing => {
                if self.messages.pop_placeholder().is_some() {
                    self.rebuild();
                }
            }
            UiUpdate::HandleError(detail) => {
                if self.messages.pop_placeholder().is_some() {
                    self.rebuild();
                }
                self.settle_streaming(true);
                self.push_message(ChatMessage::error(format!(
                    "Sorry, something went wrong while handling your request: {detail}"
                )));
            }
            UiUpdate::QueryFinished => {
                if self.worker.take().is_some() {
                    tracing::debug!("query worker released");
                }
            }
            UiUpdate::AddAiMessage => {
                self.settle_streaming(false);
                self.push_message(ChatMessage::streaming());
            }
            UiUpdate::UpdateAiMessage(text) => {
                if let Some(last) = self.messages.last_ai_mut().filter(|m| m.is_processing) {
                    last.content.push_str(&text);
                    self.transcript.refresh_last(last);
                }
            }
            UiUpdate::FinalizeAiMessage => {
                if let Some(last) = self.messages.last_ai_mut() {
                    last.finalize();
                    self.transcript.refresh_last(last);
                }
            }
            UiUpdate::Status { kind, detail } => {
                if !self.messages.last().is_some_and(|m| m.is_ai()) {
                    return;
                }
                match kind {
                    StatusKind::ToolStart => self.give_back_focus(),
                    StatusKind::ToolEnd => self.acquire_focus(),
                    StatusKind::Other(_) => {}
                }
                if let Some(last) = self.messages.last_ai_mut() {
                    last.status = Some(ToolStatus { kind, detail });
                    self.transcript.refresh_last(last);
                }
            }
        }
    }

    /// Apply a raw `(operation, parameter)` pair; unknown operations are ignored
    pub fn apply_wire(&mut self, operation: &str, parameter: &str) {
        if let Some(update) = UiUpdate::from_wire(operation, parameter) {
            self.apply(update);
        }
    }

    fn push_message(&mut self, message: ChatMessage) {
        match self.messages.push(message) {
            Appended::Tail => {
                if let Some(last) = self.messages.last() {
                    self.transcript.append_row(last);
                }
            }
            Appended::Truncated => self.rebuild(),
        }
    }

    fn rebuild(&mut self) {
        self.transcript.rebuild_all(self.messages.iter());
    }

    /// Close out a message that is still streaming so only one ever is.
    /// A blank one is dropped instead when `drop_blank` is set.
    fn settle_streaming(&mut self, drop_blank: bool) {
        let Some(last) = self.messages.last_mut().filter(|m| m.is_processing) else {
            return;
        };
        if drop_blank && last.content.trim().is_empty() {
            self.messages.pop();
            self.rebuild();
        } else {
            last.finalize();
            self.transcript.refresh_last(last);
        }
    }
}
