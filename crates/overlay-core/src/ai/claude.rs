use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};

use crate::worker::StreamSink;

const CLAUDE_API_URL: &str = "https://api.anthropic.com";
const MAX_TOKENS: u32 = 2048;

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, CLAUDE_API_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn query(&self, model: &str, system: &str, prompt: &str) -> Result<String> {
        let request = ClaudeRequest {
            model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![ClaudeMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self.client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Claude API error {}: {}", status, text));
        }

        let claude_response: ClaudeResponse = response.json().await?;
        Ok(claude_response.content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    /// The messages endpoint is used unstreamed; the whole answer arrives as
    /// one chunk.
    pub async fn stream(&self, model: &str, system: &str, prompt: &str, sink: &mut StreamSink) -> Result<()> {
        let text = self.query(model, system, prompt).await?;
        sink.chunk(&text);
        Ok(())
    }
}
