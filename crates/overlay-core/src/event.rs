//! Update events sent from the query worker to the UI thread
//!
//! Every change a worker wants to make to the chat goes through [`UiUpdate`]
//! and an [`UpdateSink`]. The UI side drains the matching receiver on its own
//! event loop, so the message list is only ever touched from one place.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Kind of a tool status notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    ToolStart,
    ToolEnd,
    Other(String),
}

impl StatusKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "on_tool_start" => StatusKind::ToolStart,
            "on_tool_end" => StatusKind::ToolEnd,
            other => StatusKind::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            StatusKind::ToolStart => "on_tool_start",
            StatusKind::ToolEnd => "on_tool_end",
            StatusKind::Other(tag) => tag,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StatusKind::ToolStart => "using tool",
            StatusKind::ToolEnd => "tool finished",
            StatusKind::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    RemoveProcessing,
    HandleError(String),
    QueryFinished,
    AddAiMessage,
    UpdateAiMessage(String),
    FinalizeAiMessage,
    Status { kind: StatusKind, detail: String },
}

impl UiUpdate {
    /// Decode an `(operation, parameter)` pair.
    ///
    /// Returns `None` for operations nobody handles; callers drop those.
    pub fn from_wire(operation: &str, parameter: &str) -> Option<Self> {
        let update = match operation {
            "remove_processing" => UiUpdate::RemoveProcessing,
            "handle_error" => UiUpdate::HandleError(parameter.to_string()),
            "query_finished" => UiUpdate::QueryFinished,
            "add_ai_message" => UiUpdate::AddAiMessage,
            "update_ai_message" => UiUpdate::UpdateAiMessage(parameter.to_string()),
            "finalize_ai_message" => UiUpdate::FinalizeAiMessage,
            op => {
                let tag = op.strip_prefix("status_")?;
                UiUpdate::Status {
                    kind: StatusKind::from_tag(tag),
                    detail: parameter.to_string(),
                }
            }
        };
        Some(update)
    }

    /// Ends the query's message stream (success or failure)
    pub fn is_terminal(&self) -> bool {
        matches!(self, UiUpdate::FinalizeAiMessage | UiUpdate::HandleError(_))
    }
}

/// Sending half of the update queue. Cheap to clone, safe to move into a
/// worker task.
#[derive(Debug, Clone)]
pub struct UpdateSink {
    tx: mpsc::UnboundedSender<UiUpdate>,
}

impl UpdateSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, update: UiUpdate) {
        if self.tx.send(update).is_err() {
            tracing::debug!("update dropped, UI loop is gone");
        }
    }

    /// Send a raw `(operation, parameter)` pair; unknown operations are dropped.
    pub fn send_wire(&self, operation: &str, parameter: &str) {
        match UiUpdate::from_wire(operation, parameter) {
            Some(update) => self.send(update),
            None => tracing::debug!(operation, "ignoring unknown update operation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_known_operations() {
        assert_eq!(
            UiUpdate::from_wire("update_ai_message", "tok"),
            Some(UiUpdate::UpdateAiMessage("tok".to_string()))
        );
        assert_eq!(
            UiUpdate::from_wire("query_finished", "ignored"),
            Some(UiUpdate::QueryFinished)
        );
        assert_eq!(
            UiUpdate::from_wire("handle_error", "timeout"),
            Some(UiUpdate::HandleError("timeout".to_string()))
        );
    }

    #[test]
    fn test_from_wire_status_prefix() {
        assert_eq!(
            UiUpdate::from_wire("status_on_tool_start", "search"),
            Some(UiUpdate::Status {
                kind: StatusKind::ToolStart,
                detail: "search".to_string(),
            })
        );
        assert_eq!(
            UiUpdate::from_wire("status_thinking", ""),
            Some(UiUpdate::Status {
                kind: StatusKind::Other("thinking".to_string()),
                detail: String::new(),
            })
        );
    }

    #[test]
    fn test_from_wire_unknown_is_none() {
        assert_eq!(UiUpdate::from_wire("add_log_message", "x"), None);
        assert_eq!(UiUpdate::from_wire("", ""), None);
    }

    #[test]
    fn test_status_tag_round_trip() {
        for tag in ["on_tool_start", "on_tool_end", "on_llm_new_token"] {
            assert_eq!(StatusKind::from_tag(tag).as_tag(), tag);
        }
    }

    #[test]
    fn test_sink_preserves_order() {
        let (sink, mut rx) = UpdateSink::channel();
        sink.send(UiUpdate::AddAiMessage);
        sink.send_wire("update_ai_message", "a");
        sink.send_wire("bogus", "");
        sink.send(UiUpdate::FinalizeAiMessage);

        assert_eq!(rx.try_recv().ok(), Some(UiUpdate::AddAiMessage));
        assert_eq!(
            rx.try_recv().ok(),
            Some(UiUpdate::UpdateAiMessage("a".to_string()))
        );
        assert_eq!(rx.try_recv().ok(), Some(UiUpdate::FinalizeAiMessage));
        assert!(rx.try_recv().is_err());
    }
}
