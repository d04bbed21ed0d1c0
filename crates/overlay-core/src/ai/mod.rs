pub mod claude;
pub mod ollama;
pub mod openai;

pub use claude::ClaudeClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use anyhow::{Result, anyhow};

use crate::config::Config;
use crate::provider::Provider;
use crate::worker::{QueryBackend, StreamSink};

pub const SYSTEM_PROMPT: &str = "You are a friendly cat-shaped assistant living in an overlay on top of a \
video game. Answer the player's questions about the game briefly and concretely. Prefer short \
step-by-step instructions over long explanations.";

/// The provider a query goes to, with the model to ask for
#[derive(Clone)]
pub enum Backend {
    Ollama {
        client: OllamaClient,
        model: String,
    },
    Claude {
        client: Option<ClaudeClient>,
        model: String,
    },
    OpenAI {
        client: Option<OpenAIClient>,
        model: String,
    },
}

impl Backend {
    pub fn from_config(config: &Config) -> Self {
        let provider = config
            .provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::Ollama);
        let model = config
            .default_model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string());

        match provider {
            Provider::Ollama => Backend::Ollama {
                client: OllamaClient::new(config.ollama_url()),
                model,
            },
            Provider::Claude => Backend::Claude {
                client: config.claude_key().as_deref().map(ClaudeClient::new),
                model,
            },
            Provider::OpenAI => Backend::OpenAI {
                client: config.openai_key().as_deref().map(OpenAIClient::new),
                model,
            },
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Backend::Ollama { .. } => Provider::Ollama,
            Backend::Claude { .. } => Provider::Claude,
            Backend::OpenAI { .. } => Provider::OpenAI,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Backend::Ollama { model, .. }
            | Backend::Claude { model, .. }
            | Backend::OpenAI { model, .. } => model,
        }
    }
}

impl QueryBackend for Backend {
    async fn stream(&self, request: &str, sink: &mut StreamSink) -> Result<()> {
        match self {
            Backend::Ollama { client, model } => {
                let prompt = build_prompt(request);
                client.stream(model, &prompt, sink).await
            }
            Backend::Claude { client: Some(client), model } => {
                client.stream(model, SYSTEM_PROMPT, request, sink).await
            }
            Backend::OpenAI { client: Some(client), model } => {
                client.stream(model, SYSTEM_PROMPT, request, sink).await
            }
            Backend::Claude { client: None, .. } => Err(anyhow!(
                "Claude API key not configured. Set ANTHROPIC_API_KEY or add it to the config file."
            )),
            Backend::OpenAI { client: None, .. } => Err(anyhow!(
                "OpenAI API key not configured. Set OPENAI_API_KEY or add it to the config file."
            )),
        }
    }
}

/// Ollama's generate endpoint takes a single prompt, so the system text is
/// folded in.
fn build_prompt(request: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n\nPlayer: ");
    prompt.push_str(request);
    prompt.push_str("\nAssistant:");
    prompt
}
