//! Window host abstraction and overlay placement
//!
//! The overlay never talks to a windowing system directly. A [`WindowHost`]
//! exposes the tracked game window (looked up, never owned) and the handful
//! of operations the overlay performs on its own window.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

/// Screen rectangle in host units (pixels on a desktop, cells in a terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl WindowRect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Collapsed,
    Expanded,
}

/// Sizes and anchor offsets for both overlay states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub expanded: Size,
    pub collapsed: Size,
    /// Gap kept between the overlay and the tracked window's edges
    pub margin: i32,
    /// Used when there is no tracked window or its rectangle can't be read
    pub default_position: Point,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            expanded: Size {
                width: 520,
                height: 620,
            },
            collapsed: Size {
                width: 80,
                height: 60,
            },
            margin: 10,
            default_position: Point { x: 100, y: 100 },
        }
    }
}

impl Geometry {
    pub fn size_for(&self, state: OverlayState) -> Size {
        match state {
            OverlayState::Expanded => self.expanded,
            OverlayState::Collapsed => self.collapsed,
        }
    }

    /// Where the overlay goes for `state` given the tracked window's rectangle.
    ///
    /// Expanded docks at the bottom-left corner, collapsed at the top-right.
    pub fn anchor(&self, state: OverlayState, tracked: Option<WindowRect>) -> Point {
        let Some(rect) = tracked else {
            return self.default_position;
        };
        match state {
            OverlayState::Expanded => Point {
                x: rect.left + self.margin,
                y: rect.bottom - self.expanded.height - self.margin,
            },
            OverlayState::Collapsed => Point {
                x: rect.right - self.collapsed.width - self.margin,
                y: rect.top + self.margin,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("window {0:?} no longer exists")]
    WindowGone(WindowHandle),
    #[error("failed to read window geometry: {0}")]
    Geometry(String),
    #[error("failed to update window style: {0}")]
    Style(String),
    #[error("failed to change the foreground window: {0}")]
    Foreground(String),
}

/// Operations the overlay needs from the windowing system.
///
/// All calls happen on the UI thread.
pub trait WindowHost {
    /// The tracked game window, if one has been detected
    fn tracked_window(&self) -> Option<WindowHandle>;

    fn window_rect(&self, handle: WindowHandle) -> Result<WindowRect, HostError>;

    /// Window that currently owns keyboard input
    fn foreground_window(&self) -> Option<WindowHandle>;

    fn overlay_window(&self) -> WindowHandle;

    /// Click-through windows let mouse input fall to the window beneath
    fn set_click_through(&mut self, enabled: bool) -> Result<(), HostError>;

    /// Force the overlay to the foreground. Implementations minimize and then
    /// re-activate so the window manager can't refuse the request.
    fn activate_overlay(&mut self) -> Result<(), HostError>;

    fn set_foreground(&mut self, handle: WindowHandle) -> Result<(), HostError>;

    fn resize(&mut self, size: Size);

    fn move_to(&mut self, origin: Point);

    fn is_visible(&self) -> bool {
        true
    }
}
