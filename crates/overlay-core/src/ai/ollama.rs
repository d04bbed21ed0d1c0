use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use futures_util::StreamExt;

use crate::worker::StreamSink;

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// One line of the NDJSON stream from `/api/generate`
#[derive(Deserialize)]
struct OllamaStreamChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Stream a completion into `sink`, one chunk per NDJSON line
    pub async fn stream(&self, model: &str, prompt: &str, sink: &mut StreamSink) -> Result<()> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model,
            prompt,
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ollama request failed with status: {}. Make sure Ollama is running with: ollama serve",
                response.status()
            ));
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);

            while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                if Self::handle_line(&line, sink)? {
                    return Ok(());
                }
            }
        }

        // Server closed without a trailing newline
        Self::handle_line(&buffer, sink)?;
        Ok(())
    }

    /// Returns true once the server marks the stream done
    fn handle_line(line: &[u8], sink: &mut StreamSink) -> Result<bool> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(false);
        }

        let chunk: OllamaStreamChunk = serde_json::from_slice(line)?;
        if let Some(error) = chunk.error {
            return Err(anyhow!("Ollama error: {}", error));
        }

        sink.chunk(&chunk.response);
        Ok(chunk.done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{UiUpdate, UpdateSink};
    use tokio::sync::mpsc::UnboundedReceiver;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn drain(rx: &mut UnboundedReceiver<UiUpdate>) -> Vec<UiUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    async fn server_with(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_stream_emits_each_chunk() {
        let body = concat!(
            "{\"response\":\"Hel\",\"done\":false}\n",
            "{\"response\":\"lo\",\"done\":false}\n",
            "{\"response\":\"\",\"done\":true}\n",
        );
        let server = server_with(200, body).await;
        let (updates, mut rx) = UpdateSink::channel();
        let mut sink = StreamSink::new(updates);

        OllamaClient::new(&server.uri())
            .stream("gemma3:latest", "hi", &mut sink)
            .await
            .unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![
                UiUpdate::RemoveProcessing,
                UiUpdate::AddAiMessage,
                UiUpdate::UpdateAiMessage("Hel".to_string()),
                UiUpdate::UpdateAiMessage("lo".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let server = server_with(200, "{\"response\":\"ok\",\"done\":true}").await;
        let (updates, mut rx) = UpdateSink::channel();
        let mut sink = StreamSink::new(updates);

        OllamaClient::new(&server.uri())
            .stream("m", "p", &mut sink)
            .await
            .unwrap();

        assert!(drain(&mut rx).contains(&UiUpdate::UpdateAiMessage("ok".to_string())));
    }

    #[tokio::test]
    async fn test_error_line_fails_the_stream() {
        let server = server_with(200, "{\"error\":\"model 'x' not found\"}\n").await;
        let (updates, _rx) = UpdateSink::channel();
        let mut sink = StreamSink::new(updates);

        let err = OllamaClient::new(&server.uri())
            .stream("x", "p", &mut sink)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(!sink.has_started());
    }

    #[tokio::test]
    async fn test_http_failure_is_reported() {
        let server = server_with(500, "").await;
        let (updates, _rx) = UpdateSink::channel();
        let mut sink = StreamSink::new(updates);

        let err = OllamaClient::new(&server.uri())
            .stream("m", "p", &mut sink)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
