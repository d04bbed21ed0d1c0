//! Render model for the message list
//!
//! The overlay keeps one [`Row`] per message. Front ends draw rows; they never
//! look at the message list directly. Rows change through three operations:
//! `append_row` for new messages, `refresh_last` while a message streams, and
//! `rebuild_all` after anything is removed.

use crate::state::{ChatMessage, ChatRole};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub role: ChatRole,
    pub text: String,
    pub status: Option<String>,
    pub streaming: bool,
    pub placeholder: bool,
}

impl From<&ChatMessage> for Row {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            text: message.content.clone(),
            status: message.status.as_ref().map(|s| s.label()),
            streaming: message.is_processing,
            placeholder: message.is_placeholder,
        }
    }
}

#[derive(Debug, Default)]
pub struct Transcript {
    rows: Vec<Row>,
    scroll_to_bottom: bool,
    rebuilds: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn append_row(&mut self, message: &ChatMessage) {
        self.rows.push(Row::from(message));
        self.scroll_to_bottom = true;
    }

    /// Re-render the last row in place
    pub fn refresh_last(&mut self, message: &ChatMessage) {
        match self.rows.last_mut() {
            Some(row) => *row = Row::from(message),
            None => self.rows.push(Row::from(message)),
        }
        self.scroll_to_bottom = true;
    }

    pub fn rebuild_all<'a>(&mut self, messages: impl IntoIterator<Item = &'a ChatMessage>) {
        self.rows.clear();
        self.rows.extend(messages.into_iter().map(Row::from));
        self.rebuilds += 1;
        self.scroll_to_bottom = true;
    }

    /// Consume the pending scroll-to-bottom request. Front ends call this
    /// after layout so the scroll lands on the final content height.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_bottom)
    }

    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }
}
