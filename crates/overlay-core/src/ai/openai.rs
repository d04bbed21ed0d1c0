use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};

use crate::worker::StreamSink;

const OPENAI_API_URL: &str = "https://api.openai.com";

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, OPENAI_API_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn query(&self, model: &str, system: &str, prompt: &str) -> Result<String> {
        let request = OpenAIRequest {
            model,
            messages: vec![
                OpenAIMessage {
                    role: "system",
                    content: system,
                },
                OpenAIMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self.client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error {}: {}", status, text));
        }

        let openai_response: OpenAIResponse = response.json().await?;
        Ok(openai_response.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    pub async fn stream(&self, model: &str, system: &str, prompt: &str, sink: &mut StreamSink) -> Result<()> {
        let text = self.query(model, system, prompt).await?;
        sink.chunk(&text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_query_takes_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"choices":[{"message":{"role":"assistant","content":"Jump twice."}}]}"#,
            ))
            .mount(&server)
            .await;

        let client = OpenAIClient::with_base_url("sk-test", &server.uri());
        assert_eq!(client.query("gpt-4o-mini", "sys", "how?").await.unwrap(), "Jump twice.");
    }

    #[tokio::test]
    async fn test_null_content_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
            ))
            .mount(&server)
            .await;

        let client = OpenAIClient::with_base_url("k", &server.uri());
        assert_eq!(client.query("m", "s", "p").await.unwrap(), "");
    }
}
