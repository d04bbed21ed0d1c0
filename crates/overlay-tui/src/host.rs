//! Terminal stand-in for the desktop window system
//!
//! The terminal is the screen. A bordered "game" pane plays the tracked game
//! window and can be moved or hidden from the keyboard; the overlay is a
//! floating box whose rectangle is whatever the orchestrator last asked for.
//! Keyboard focus belongs to exactly one of them at a time, like OS focus.

use overlay_core::{HostError, Point, Size, WindowHandle, WindowHost, WindowRect};

pub const GAME_WINDOW: WindowHandle = WindowHandle(1);
pub const OVERLAY_WINDOW: WindowHandle = WindowHandle(2);

/// Rows reserved at the bottom of the terminal for the status bar
const FOOTER_ROWS: i32 = 1;

pub struct TerminalHost {
    screen: WindowRect,
    game: WindowRect,
    game_running: bool,
    foreground: Option<WindowHandle>,
    click_through: bool,
    origin: Point,
    size: Size,
}

impl TerminalHost {
    pub fn new(width: u16, height: u16) -> Self {
        let screen = WindowRect::new(0, 0, width as i32, height as i32);
        Self {
            screen,
            game: Self::game_area(screen),
            game_running: true,
            foreground: Some(GAME_WINDOW),
            click_through: false,
            origin: Point { x: 0, y: 0 },
            size: Size {
                width: 0,
                height: 0,
            },
        }
    }

    fn game_area(screen: WindowRect) -> WindowRect {
        WindowRect::new(
            screen.left,
            screen.top,
            screen.width(),
            (screen.height() - FOOTER_ROWS).max(1),
        )
    }

    /// The terminal was resized; the game window follows it
    pub fn resize_screen(&mut self, width: u16, height: u16) {
        let (dx, dy) = (self.game.left, self.game.top);
        self.screen = WindowRect::new(0, 0, width as i32, height as i32);
        self.game = Self::game_area(self.screen).offset(dx, dy);
    }

    /// Drag the game window. It may hang off the screen but never entirely.
    pub fn move_game(&mut self, dx: i32, dy: i32) {
        if !self.game_running {
            return;
        }
        let moved = self.game.offset(dx, dy);
        let max_dx = self.screen.width() / 2;
        let max_dy = self.screen.height() / 2;
        if moved.left.abs() <= max_dx && moved.top.abs() <= max_dy {
            self.game = moved;
        }
    }

    /// Simulate the game being launched or closed
    pub fn toggle_game(&mut self) {
        self.game_running = !self.game_running;
        if self.game_running {
            tracing::info!("game window detected");
            self.foreground = Some(GAME_WINDOW);
        } else {
            tracing::info!("game window lost");
            if self.foreground == Some(GAME_WINDOW) {
                self.foreground = None;
            }
        }
    }

    /// A click landed on the game pane
    pub fn focus_game(&mut self) {
        if self.game_running {
            self.foreground = Some(GAME_WINDOW);
        }
    }

    pub fn game_rect(&self) -> Option<WindowRect> {
        self.game_running.then_some(self.game)
    }

    pub fn overlay_rect(&self) -> WindowRect {
        WindowRect::new(self.origin.x, self.origin.y, self.size.width, self.size.height)
    }

    pub fn click_through(&self) -> bool {
        self.click_through
    }
}

impl WindowHost for TerminalHost {
    fn tracked_window(&self) -> Option<WindowHandle> {
        self.game_running.then_some(GAME_WINDOW)
    }

    fn window_rect(&self, handle: WindowHandle) -> Result<WindowRect, HostError> {
        match handle {
            GAME_WINDOW if self.game_running => Ok(self.game),
            OVERLAY_WINDOW => Ok(self.overlay_rect()),
            other => Err(HostError::WindowGone(other)),
        }
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        self.foreground
    }

    fn overlay_window(&self) -> WindowHandle {
        OVERLAY_WINDOW
    }

    fn set_click_through(&mut self, enabled: bool) -> Result<(), HostError> {
        self.click_through = enabled;
        Ok(())
    }

    fn activate_overlay(&mut self) -> Result<(), HostError> {
        self.foreground = Some(OVERLAY_WINDOW);
        Ok(())
    }

    fn set_foreground(&mut self, handle: WindowHandle) -> Result<(), HostError> {
        match handle {
            GAME_WINDOW if !self.game_running => Err(HostError::WindowGone(handle)),
            GAME_WINDOW | OVERLAY_WINDOW => {
                self.foreground = Some(handle);
                Ok(())
            }
            other => Err(HostError::Foreground(format!("unknown window {:?}", other))),
        }
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
    }

    fn move_to(&mut self, origin: Point) {
        self.origin = origin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_fills_screen_above_footer() {
        let host = TerminalHost::new(100, 40);
        assert_eq!(host.game_rect(), Some(WindowRect::new(0, 0, 100, 39)));
        assert_eq!(host.foreground_window(), Some(GAME_WINDOW));
    }

    #[test]
    fn test_move_game_is_bounded() {
        let mut host = TerminalHost::new(100, 40);
        host.move_game(10, 5);
        assert_eq!(host.game_rect().map(|r| (r.left, r.top)), Some((10, 5)));

        host.move_game(1000, 0);
        assert_eq!(host.game_rect().map(|r| r.left), Some(10));
    }

    #[test]
    fn test_resize_keeps_game_offset() {
        let mut host = TerminalHost::new(100, 40);
        host.move_game(3, 2);
        host.resize_screen(80, 30);
        assert_eq!(host.game_rect(), Some(WindowRect::new(3, 2, 80, 29)));
    }

    #[test]
    fn test_hidden_game_is_not_tracked() {
        let mut host = TerminalHost::new(100, 40);
        host.toggle_game();
        assert_eq!(host.tracked_window(), None);
        assert_eq!(host.foreground_window(), None);
        assert!(host.window_rect(GAME_WINDOW).is_err());
        assert!(host.set_foreground(GAME_WINDOW).is_err());

        host.toggle_game();
        assert_eq!(host.tracked_window(), Some(GAME_WINDOW));
    }

    #[test]
    fn test_activate_takes_focus() {
        let mut host = TerminalHost::new(100, 40);
        host.activate_overlay().unwrap();
        assert_eq!(host.foreground_window(), Some(OVERLAY_WINDOW));
    }
}
