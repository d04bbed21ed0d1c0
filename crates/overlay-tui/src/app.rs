use overlay_core::{
    Backend, Config, Geometry, Overlay, OverlayConfig, Point, Provider, QueryWorker, Size,
    UpdateSink,
};

use crate::host::TerminalHost;

/// Overlay sizes in terminal cells
pub fn terminal_geometry() -> Geometry {
    Geometry {
        expanded: Size {
            width: 52,
            height: 20,
        },
        collapsed: Size {
            width: 9,
            height: 3,
        },
        margin: 1,
        default_position: Point { x: 2, y: 1 },
    }
}

pub struct App {
    pub should_quit: bool,
    pub overlay: Overlay<TerminalHost>,

    // Shown in the status bar
    pub provider: Provider,
    pub model: String,

    // Chat scroll state
    pub chat_scroll: u16,
    pub follow_bottom: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: &Config, updates: UpdateSink, width: u16, height: u16) -> Self {
        let backend = Backend::from_config(config);
        let provider = backend.provider();
        let model = backend.model().to_string();

        let overlay = Overlay::new(
            TerminalHost::new(width, height),
            Box::new(QueryWorker::new(backend)),
            updates,
            OverlayConfig {
                max_messages: config.max_messages,
                geometry: terminal_geometry(),
            },
        );

        Self {
            should_quit: false,
            overlay,
            provider,
            model,
            chat_scroll: 0,
            follow_bottom: true,
            animation_frame: 0,
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.overlay.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// The renderer clamps the offset and re-enables following when the
    /// bottom is reached.
    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::OverlayState;

    fn app() -> App {
        let (updates, _rx) = UpdateSink::channel();
        App::new(&Config::new(), updates, 120, 40)
    }

    #[test]
    fn test_new_app_is_collapsed_in_top_right_of_game() {
        let app = app();
        assert_eq!(app.overlay.state(), OverlayState::Collapsed);
        assert_eq!(app.provider, Provider::Ollama);

        let rect = app.overlay.host().overlay_rect();
        assert_eq!((rect.width(), rect.height()), (9, 3));
        assert_eq!((rect.left, rect.top), (120 - 9 - 1, 1));
    }

    #[test]
    fn test_animation_only_runs_while_busy() {
        let mut app = app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }

    #[test]
    fn test_scrolling_up_stops_following() {
        let mut app = app();
        app.chat_scroll = 5;
        app.scroll_chat_up(3);
        assert_eq!(app.chat_scroll, 2);
        assert!(!app.follow_bottom);
        app.scroll_chat_up(10);
        assert_eq!(app.chat_scroll, 0);
    }
}
