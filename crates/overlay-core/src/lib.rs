pub mod ai;
pub mod config;
pub mod event;
pub mod input;
pub mod overlay;
pub mod provider;
pub mod render;
pub mod state;
pub mod window;
pub mod worker;

// Re-export main types for convenience
pub use ai::{Backend, ClaudeClient, OllamaClient, OpenAIClient};
pub use config::Config;
pub use event::{StatusKind, UiUpdate, UpdateSink};
pub use input::ChatInput;
pub use overlay::{Overlay, OverlayConfig};
pub use provider::Provider;
pub use render::{Row, Transcript};
pub use state::{ChatMessage, ChatRole, MessageList};
pub use window::{Geometry, HostError, OverlayState, Point, Size, WindowHandle, WindowHost, WindowRect};
pub use worker::{QueryBackend, QueryService, QueryWorker, StreamSink, WorkerHandle};
