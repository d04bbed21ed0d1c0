use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::tui::AppEvent;
use crate::ui;

/// Lines moved per scroll step
const SCROLL_STEP: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(width, height) => {
            app.overlay.host_mut().resize_screen(width, height);
            app.overlay.tick();
        }
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reposition => app.overlay.tick(),
        AppEvent::Update(update) => app.overlay.apply(update),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.overlay.overlay_has_focus() {
        if app.overlay.is_expanded() {
            handle_panel_key(app, key);
        } else {
            handle_indicator_key(app, key);
        }
    } else {
        handle_game_key(app, key);
    }
}

/// Keys typed into the expanded chat panel
fn handle_panel_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.overlay.on_collapse_key();
        }
        KeyCode::Tab => app.overlay.give_back_focus(),
        KeyCode::Enter => {
            if app.overlay.send() {
                app.follow_bottom = true;
            }
        }

        // Scrolling
        KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::PageUp => app.scroll_chat_up(SCROLL_STEP * 3),
        KeyCode::PageDown => app.scroll_chat_down(SCROLL_STEP * 3),

        // Editing
        KeyCode::Char(c) => app.overlay.input_mut().insert(c),
        KeyCode::Backspace => app.overlay.input_mut().backspace(),
        KeyCode::Delete => app.overlay.input_mut().delete(),
        KeyCode::Left => app.overlay.input_mut().move_left(),
        KeyCode::Right => app.overlay.input_mut().move_right(),
        KeyCode::Home => app.overlay.input_mut().move_home(),
        KeyCode::End => app.overlay.input_mut().move_end(),
        _ => {}
    }
}

/// The collapsed indicator holds focus only when no game window is left to
/// return it to
fn handle_indicator_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Enter | KeyCode::Char(' ') => app.overlay.activate_indicator(),
        KeyCode::Char('g') => {
            app.overlay.host_mut().toggle_game();
            app.overlay.tick();
        }
        _ => {}
    }
}

fn handle_game_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('/') => {
            app.overlay.on_expand_key();
        }
        KeyCode::Char('g') => {
            app.overlay.host_mut().toggle_game();
            app.overlay.tick();
        }

        // Drag the game window around
        KeyCode::Left => app.overlay.host_mut().move_game(-2, 0),
        KeyCode::Right => app.overlay.host_mut().move_game(2, 0),
        KeyCode::Up => app.overlay.host_mut().move_game(0, -1),
        KeyCode::Down => app.overlay.host_mut().move_game(0, 1),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column as i32;
    let y = mouse.row as i32;

    let host = app.overlay.host();
    let panel = host.overlay_rect();
    // A click-through overlay never sees the pointer
    let on_overlay = panel.contains(x, y) && !host.click_through();
    let on_game = host.game_rect().is_some_and(|r| r.contains(x, y));

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if on_overlay {
                if !app.overlay.is_expanded() {
                    app.overlay.activate_indicator();
                } else if ui::close_button(panel).contains(x, y) {
                    app.overlay.collapse();
                } else {
                    app.overlay.acquire_focus();
                }
            } else if on_game {
                app.overlay.host_mut().focus_game();
            }
        }
        MouseEventKind::ScrollUp if on_overlay && app.overlay.is_expanded() => {
            if ui::chat_area(panel).contains(x, y) {
                app.scroll_chat_up(SCROLL_STEP);
            }
        }
        MouseEventKind::ScrollDown if on_overlay && app.overlay.is_expanded() => {
            if ui::chat_area(panel).contains(x, y) {
                app.scroll_chat_down(SCROLL_STEP);
            }
        }
        _ => {}
    }
}
