use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;
use overlay_core::overlay::{INPUT_PLACEHOLDER, PANEL_TITLE, WINDOW_TITLE};
use overlay_core::{ChatRole, Row, WindowRect};

use crate::app::App;

const CLOSE_LABEL: &str = " [x] ";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' || chars.peek() != Some(&'*') {
            current_text.push(c);
            continue;
        }
        // Consume the second *
        chars.next();

        if !current_text.is_empty() {
            spans.push(Span::raw(std::mem::take(&mut current_text)));
        }

        // Find closing **
        let mut bold_text = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if c == '*' && chars.peek() == Some(&'*') {
                chars.next();
                found_close = true;
                break;
            }
            bold_text.push(c);
        }

        if found_close && !bold_text.is_empty() {
            spans.push(Span::styled(
                bold_text,
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            // No closing **, treat as literal
            current_text.push_str("**");
            current_text.push_str(&bold_text);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Intersect a host rectangle with a drawable area. Windows may hang off the
/// terminal edges.
pub fn clip(rect: WindowRect, bounds: Rect) -> Option<Rect> {
    let left = rect.left.max(bounds.x as i32);
    let top = rect.top.max(bounds.y as i32);
    let right = rect.right.min(bounds.right() as i32);
    let bottom = rect.bottom.min(bounds.bottom() as i32);

    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

/// Hit area of the close control drawn on the panel's top border
pub fn close_button(panel: WindowRect) -> WindowRect {
    let width = CLOSE_LABEL.len() as i32;
    WindowRect::new(panel.right - 1 - width, panel.top, width, 1)
}

/// Chat history area inside an expanded panel: everything but the borders
/// and the three-row input box
pub fn chat_area(panel: WindowRect) -> WindowRect {
    WindowRect::new(
        panel.left + 1,
        panel.top + 1,
        panel.width() - 2,
        panel.height() - 2 - 3,
    )
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [body_area, footer_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_game(app, frame, body_area);

    let overlay_rect = app.overlay.host().overlay_rect();
    if let Some(overlay_area) = clip(overlay_rect, body_area) {
        if app.overlay.is_expanded() {
            render_panel(app, frame, overlay_rect, overlay_area);
        } else {
            render_indicator(app, frame, overlay_area);
        }
    }

    render_footer(app, frame, footer_area);
}

fn render_game(app: &App, frame: &mut Frame, area: Rect) {
    let Some(game_area) = app.overlay.host().game_rect().and_then(|r| clip(r, area)) else {
        let hint = Paragraph::new(Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                "No game window. Press g to launch one.",
                Style::default().fg(Color::DarkGray),
            )),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(hint, area);
        return;
    };

    let focused = app.overlay.game_has_focus();
    let border_color = if focused { Color::Green } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Game ");

    let body = Text::from(vec![
        Line::default(),
        Line::from(Span::styled(
            "Press / to ask the assistant",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Arrow keys move this window",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    frame.render_widget(Paragraph::new(body).alignment(Alignment::Center).block(block), game_area);
}

fn render_indicator(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.overlay.overlay_has_focus() {
        Color::Yellow
    } else {
        Color::Magenta
    };

    let indicator = Paragraph::new(Span::styled("🐱 AI", Style::default().fg(Color::Yellow).bold()))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border_color)),
        );

    frame.render_widget(Clear, area);
    frame.render_widget(indicator, area);
}

fn render_panel(app: &mut App, frame: &mut Frame, panel: WindowRect, area: Rect) {
    let focused = app.overlay.overlay_has_focus();
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .title_top(Line::from(format!(" {} ", PANEL_TITLE)).left_aligned())
        .title_top(Line::from(Span::styled(CLOSE_LABEL, Style::default().fg(Color::Red))).right_aligned());

    // The panel may be partly off screen; lay out against its full size and
    // clip each piece.
    let chat_rect = chat_area(panel);
    let input_rect = WindowRect::new(chat_rect.left, chat_rect.bottom, chat_rect.width(), 3);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    if let Some(chat) = clip(chat_rect, area) {
        render_chat(app, frame, chat, chat_rect);
    }
    if let Some(input) = clip(input_rect, area) {
        render_input(app, frame, input, focused);
    }
}

fn role_header(role: ChatRole) -> Line<'static> {
    let (label, color) = match role {
        ChatRole::User => ("You:", Color::Cyan),
        ChatRole::Ai => ("AI:", Color::Yellow),
        ChatRole::Error => ("Error:", Color::Red),
    };
    Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn row_lines(row: &Row, animation_frame: u8, lines: &mut Vec<Line<'static>>) {
    lines.push(role_header(row.role));

    if row.placeholder || (row.streaming && row.text.is_empty()) {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        let text = if row.placeholder {
            row.text.trim_end_matches('.').to_string()
        } else {
            "Thinking".to_string()
        };
        lines.push(Line::from(Span::styled(
            format!("{}{}", text, dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    } else {
        let style = match row.role {
            ChatRole::Error => Style::default().fg(Color::Red),
            _ => Style::default(),
        };
        for line in row.text.lines() {
            lines.push(parse_markdown_line(line).patch_style(style));
        }
    }

    if let Some(status) = &row.status {
        lines.push(Line::from(Span::styled(
            format!("[{}]", status),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::default());
}

/// Rows a line occupies once wrapped to `width` columns
fn wrapped_height(line: &Line, width: usize) -> usize {
    let line_width = line.width();
    if line_width == 0 || width == 0 {
        1
    } else {
        line_width.div_ceil(width)
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, full: WindowRect) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for row in app.overlay.transcript().rows() {
        row_lines(row, app.animation_frame, &mut lines);
    }
    // Drop the blank line after the last message
    if lines.last().is_some_and(|l| l.width() == 0) {
        lines.pop();
    }

    let width = full.width().max(0) as usize;
    let visible = full.height().max(0) as usize;
    let total: usize = lines.iter().map(|l| wrapped_height(l, width)).sum();

    // Bottom-align short conversations
    if total < visible {
        let mut padded = vec![Line::default(); visible - total];
        padded.append(&mut lines);
        lines = padded;
    }

    let max_scroll = total.saturating_sub(visible).min(u16::MAX as usize) as u16;
    if app.overlay.transcript_mut().take_scroll_request() {
        app.follow_bottom = true;
    }
    if app.follow_bottom || app.chat_scroll >= max_scroll {
        app.chat_scroll = max_scroll;
        app.follow_bottom = true;
    }

    // Lines above the terminal edge are clipped by scrolling further
    let hidden_top = (area.y as i32 - full.top).max(0) as u16;

    let chat = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll.saturating_add(hidden_top), 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect, focused: bool) {
    if focused && app.overlay.take_input_focus_request() {
        app.overlay.input_mut().move_end();
    }

    let input_border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color));

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let input = app.overlay.input();
    let (visible_text, cursor_x) = visible_input(input.text(), input.cursor(), inner_width);

    let paragraph = if input.is_empty() {
        Paragraph::new(Span::styled(
            INPUT_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(paragraph.block(input_block), area);

    if focused && inner_width > 0 {
        frame.set_cursor_position((area.x + cursor_x as u16 + 1, area.y + 1));
    }
}

/// Slice of the input that fits in `width` columns with the cursor (a char
/// index) in view, and the cursor's column within it. Columns are display
/// cells, so wide CJK and emoji characters count twice.
fn visible_input(text: &str, cursor: usize, width: usize) -> (String, usize) {
    if width == 0 {
        return (String::new(), 0);
    }
    let widths: Vec<usize> = text.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    // Drop characters from the left until the cursor cell fits
    let mut start = 0;
    let mut before: usize = widths[..cursor].iter().sum();
    while start < cursor && before + 1 > width {
        before -= widths[start];
        start += 1;
    }

    let mut used = 0;
    let visible = text
        .chars()
        .zip(&widths)
        .skip(start)
        .take_while(|(_, w)| {
            used += **w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();

    (visible, before)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let overlay = &app.overlay;

    let (focus_text, focus_style) = if overlay.overlay_has_focus() {
        (" OVERLAY ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else if overlay.game_has_focus() {
        (" GAME ", Style::default().bg(Color::Green).fg(Color::Black))
    } else {
        (" NO FOCUS ", Style::default().bg(Color::DarkGray).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(focus_text, focus_style), Span::raw(" ")];

    let hints: &[(&str, &str)] = if overlay.overlay_has_focus() && overlay.is_expanded() {
        &[(" Enter ", " send "), (" Esc ", " close "), (" Tab ", " game "), (" PgUp/PgDn ", " scroll ")]
    } else if overlay.overlay_has_focus() {
        &[(" Enter ", " open "), (" q ", " quit ")]
    } else {
        &[(" / ", " assistant "), (" g ", " game on/off "), (" arrows ", " move "), (" q ", " quit ")]
    };
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    spans.push(Span::raw(" "));
    if overlay.is_busy() {
        spans.push(Span::styled("working ", Style::default().fg(Color::Yellow)));
    }
    if overlay.host().click_through() {
        spans.push(Span::styled("click-through ", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::styled(
        format!("{} · {}: {} ", WINDOW_TITLE, app.provider.display_name(), app.model),
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::{Config, UpdateSink};
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_parse_markdown_bold() {
        let line = parse_markdown_line("use the **iron** pickaxe");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "iron");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_parse_markdown_unclosed_is_literal() {
        let line = parse_markdown_line("a **b");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "a **b");
    }

    #[test]
    fn test_clip_off_screen() {
        let bounds = Rect::new(0, 0, 80, 24);
        assert_eq!(clip(WindowRect::new(-5, -2, 10, 4), bounds), Some(Rect::new(0, 0, 5, 2)));
        assert_eq!(clip(WindowRect::new(90, 0, 10, 4), bounds), None);
    }

    #[test]
    fn test_close_button_sits_on_top_border() {
        let panel = WindowRect::new(10, 5, 52, 20);
        let close = close_button(panel);
        assert_eq!(close.top, 5);
        assert_eq!(close.right, 61);
        assert!(close.contains(58, 5));
        assert!(!close.contains(58, 6));
    }

    #[test]
    fn test_visible_input_ascii_scrolls_with_cursor() {
        assert_eq!(visible_input("hello", 5, 10), ("hello".to_string(), 5));
        assert_eq!(visible_input("abcdefgh", 8, 5), ("efgh".to_string(), 4));
        assert_eq!(visible_input("abcdefgh", 0, 5), ("abcde".to_string(), 0));
    }

    #[test]
    fn test_visible_input_counts_wide_chars_as_two_columns() {
        // Each of these takes two cells
        let text = "攻略在哪";
        assert_eq!(visible_input(text, 2, 20), (text.to_string(), 4));

        let (visible, column) = visible_input(text, 4, 5);
        assert_eq!(visible, "在哪");
        assert_eq!(column, 4);

        let (visible, column) = visible_input("a🐱b", 2, 10);
        assert_eq!(visible, "a🐱b");
        assert_eq!(column, 3);
    }

    #[test]
    fn test_wrapped_height() {
        assert_eq!(wrapped_height(&Line::default(), 10), 1);
        assert_eq!(wrapped_height(&Line::from("abcdefghij"), 10), 1);
        assert_eq!(wrapped_height(&Line::from("abcdefghijk"), 10), 2);
    }

    #[test]
    fn test_render_collapsed_and_expanded() {
        let (updates, _rx) = UpdateSink::channel();
        let mut app = App::new(&Config::new(), updates, 100, 30);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

        terminal.draw(|f| render(&mut app, f)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Game"));
        assert!(text.contains("AI"));
        assert!(!text.contains("Type a command"));

        app.overlay.expand();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("[x]"));
        assert!(text.contains("Type a command..."));
        assert!(text.contains("OVERLAY"));
        assert!(app.follow_bottom);
    }
}
