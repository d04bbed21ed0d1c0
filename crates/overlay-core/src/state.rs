//! UI-agnostic chat state
//!
//! The message model and the bounded list the overlay keeps. Nothing in here
//! depends on a UI framework, so the terminal front end and tests share it.

use serde::{Deserialize, Serialize};

use crate::event::StatusKind;

/// Text of the temporary AI message shown while a query is in flight
pub const PROCESSING_TEXT: &str = "Processing your request...";

/// Shown instead of a blank bubble when the AI finishes without any text
pub const EMPTY_RESPONSE_TEXT: &str = "The AI returned an empty response.";

pub const DEFAULT_MAX_MESSAGES: usize = 100;

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
    Error,
}

/// Last tool status reported for an AI message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub kind: StatusKind,
    pub detail: String,
}

impl ToolStatus {
    pub fn label(&self) -> String {
        if self.detail.is_empty() {
            self.kind.label().to_string()
        } else {
            format!("{}: {}", self.kind.label(), self.detail)
        }
    }
}

/// A chat entry in the overlay conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Still receiving streamed text
    #[serde(default)]
    pub is_processing: bool,
    #[serde(default)]
    pub is_placeholder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolStatus>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            is_processing: false,
            is_placeholder: false,
            status: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Ai, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Error, content)
    }

    /// The "processing" bubble appended right after a send
    pub fn processing_placeholder() -> Self {
        Self {
            is_placeholder: true,
            ..Self::ai(PROCESSING_TEXT)
        }
    }

    /// Empty AI message that streamed tokens get appended to
    pub fn streaming() -> Self {
        Self {
            is_processing: true,
            ..Self::ai(String::new())
        }
    }

    pub fn is_ai(&self) -> bool {
        self.role == ChatRole::Ai
    }

    /// Mark the message as complete. Blank content is replaced so the UI
    /// never shows an empty bubble.
    pub fn finalize(&mut self) {
        self.is_processing = false;
        if self.content.trim().is_empty() {
            self.content = EMPTY_RESPONSE_TEXT.to_string();
        }
    }
}

/// Result of appending to a [`MessageList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    /// Only the new message was added
    Tail,
    /// Older messages were dropped first; rendered rows must be rebuilt
    Truncated,
}

/// Ordered chat history with a hard cap.
///
/// When an append would reach the cap the list keeps only its most recent
/// half, rounded up for odd caps. Dropped messages are gone for good.
#[derive(Debug, Clone)]
pub struct MessageList {
    messages: Vec<ChatMessage>,
    max_messages: usize,
}

impl MessageList {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            // A cap below 2 would truncate to nothing on every append
            max_messages: max_messages.max(2),
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut ChatMessage> {
        self.messages.last_mut()
    }

    /// Last message, only if it is an AI message
    pub fn last_ai_mut(&mut self) -> Option<&mut ChatMessage> {
        self.messages.last_mut().filter(|m| m.is_ai())
    }

    pub fn push(&mut self, message: ChatMessage) -> Appended {
        let appended = if self.messages.len() >= self.max_messages {
            let keep = self.max_messages.div_ceil(2);
            let drop = self.messages.len() - keep;
            self.messages.drain(..drop);
            Appended::Truncated
        } else {
            Appended::Tail
        };
        self.messages.push(message);
        appended
    }

    pub fn pop(&mut self) -> Option<ChatMessage> {
        self.messages.pop()
    }

    /// Pop the trailing processing placeholder, if that is what is last
    pub fn pop_placeholder(&mut self) -> Option<ChatMessage> {
        if self.messages.last().is_some_and(|m| m.is_placeholder) {
            self.messages.pop()
        } else {
            None
        }
    }

    pub fn processing_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_processing).count()
    }
}

impl Default for MessageList {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_under_cap_keeps_everything() {
        let mut list = MessageList::new(4);
        for i in 0..4 {
            assert_eq!(list.push(ChatMessage::user(i.to_string())), Appended::Tail);
        }
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_push_at_cap_keeps_newest_half() {
        let mut list = MessageList::new(10);
        for i in 0..10 {
            list.push(ChatMessage::user(i.to_string()));
        }

        assert_eq!(list.push(ChatMessage::user("10")), Appended::Truncated);

        let contents: Vec<&str> = list.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["5", "6", "7", "8", "9", "10"]);
    }

    #[test]
    fn test_odd_cap_keeps_larger_half() {
        let mut list = MessageList::new(5);
        for i in 0..5 {
            list.push(ChatMessage::user(i.to_string()));
        }

        assert_eq!(list.push(ChatMessage::user("5")), Appended::Truncated);

        let contents: Vec<&str> = list.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["2", "3", "4", "5"]);
    }

    #[test]
    fn test_length_never_exceeds_cap() {
        let mut list = MessageList::new(7);
        for i in 0..100 {
            list.push(ChatMessage::user(i.to_string()));
            assert!(list.len() <= list.max_messages());
        }
    }

    #[test]
    fn test_tiny_cap_is_raised() {
        let mut list = MessageList::new(0);
        list.push(ChatMessage::user("a"));
        list.push(ChatMessage::user("b"));
        list.push(ChatMessage::user("c"));
        assert!(list.len() <= 2);
        assert_eq!(list.last().map(|m| m.content.as_str()), Some("c"));
    }

    #[test]
    fn test_finalize_blank_content_uses_placeholder() {
        let mut message = ChatMessage::streaming();
        message.content = "  \n\t".to_string();
        message.finalize();
        assert!(!message.is_processing);
        assert_eq!(message.content, EMPTY_RESPONSE_TEXT);
    }

    #[test]
    fn test_finalize_keeps_real_content() {
        let mut message = ChatMessage::streaming();
        message.content = "hello".to_string();
        message.finalize();
        assert_eq!(message.content, "hello");
    }

    #[test]
    fn test_pop_placeholder_only_pops_placeholder() {
        let mut list = MessageList::default();
        list.push(ChatMessage::ai(PROCESSING_TEXT));
        assert!(list.pop_placeholder().is_none());

        list.push(ChatMessage::processing_placeholder());
        assert!(list.pop_placeholder().is_some());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::error("boom")).unwrap();
        assert!(json.contains("\"role\":\"error\""));
        assert!(!json.contains("status"));
    }
}
