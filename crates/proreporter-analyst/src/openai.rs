//! [`OpenAiClient`]: a [`CompletionService`] over an OpenAI-compatible Chat
//! Completions endpoint using `response_format: json_schema`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  completion::{CompletionRequest, CompletionService},
  error::CompletionError,
};

/// Connection settings, usually the `[completion]` section of the server
/// configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
  #[serde(default = "default_base_url")]
  pub base_url:     String,
  pub api_key:      String,
  #[serde(default = "default_model")]
  pub model:        String,
  /// Whole-request timeout. The dispatcher never cancels a call itself.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_base_url() -> String { "https://api.openai.com/v1".to_string() }

fn default_model() -> String { "gpt-4o".to_string() }

fn default_timeout_secs() -> u64 { 120 }

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiClient {
  client: Client,
  config: OpenAiConfig,
}

impl OpenAiClient {
  pub fn new(config: OpenAiConfig) -> Result<Self, CompletionError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:           &'a str,
  messages:        [WireMessage<'a>; 2],
  response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
  #[serde(rename = "type")]
  kind:        &'static str,
  json_schema: JsonSchema<'a>,
}

#[derive(Serialize)]
struct JsonSchema<'a> {
  name:   &'a str,
  schema: &'a Value,
  // Optional fields in the schema are not expressible under strict mode.
  strict: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
  content: Option<String>,
}

// ─── CompletionService impl ──────────────────────────────────────────────────

impl CompletionService for OpenAiClient {
  async fn complete(&self, request: &CompletionRequest) -> Result<Value, CompletionError> {
    let body = ChatRequest {
      model:           &self.config.model,
      messages:        [
        WireMessage { role: "system", content: &request.system },
        WireMessage { role: "user", content: &request.prompt },
      ],
      response_format: ResponseFormat {
        kind:        "json_schema",
        json_schema: JsonSchema {
          name:   &request.schema_name,
          schema: &request.schema,
          strict: false,
        },
      },
    };

    tracing::debug!(
      model = %self.config.model,
      prompt_len = request.prompt.len(),
      "sending completion request"
    );

    let response = self
      .client
      .post(self.url())
      .bearer_auth(&self.config.api_key)
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(CompletionError::Status { status: status.as_u16(), body });
    }

    let parsed: ChatResponse = response.json().await?;
    let content = parsed
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .ok_or(CompletionError::MissingContent)?;

    Ok(serde_json::from_str(&content)?)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{bearer_token, body_partial_json, method, path},
  };

  use super::*;
  use crate::completion::analysis_schema;

  fn client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(OpenAiConfig {
      base_url:     format!("{}/v1/", server.uri()),
      api_key:      "sk-test".into(),
      model:        "gpt-4o".into(),
      timeout_secs: 5,
    })
    .unwrap()
  }

  fn request() -> CompletionRequest {
    CompletionRequest {
      system:      "You are an analyst.".into(),
      prompt:      "Analyze this data".into(),
      schema_name: "analysis".into(),
      schema:      analysis_schema(),
    }
  }

  fn completion_body(content: &str) -> Value {
    json!({
      "id": "chatcmpl-1",
      "object": "chat.completion",
      "choices": [{
        "index": 0,
        "message": { "role": "assistant", "content": content },
        "finish_reason": "stop"
      }]
    })
  }

  #[tokio::test]
  async fn returns_parsed_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .and(bearer_token("sk-test"))
      .and(body_partial_json(json!({
        "model": "gpt-4o",
        "response_format": { "type": "json_schema", "json_schema": { "name": "analysis" } }
      })))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(completion_body(r#"{"text":"hi","insights":{}}"#)),
      )
      .expect(1)
      .mount(&server)
      .await;

    let value = client(&server).complete(&request()).await.unwrap();
    assert_eq!(value, json!({ "text": "hi", "insights": {} }));
  }

  #[tokio::test]
  async fn error_status_is_reported_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
      .mount(&server)
      .await;

    let err = client(&server).complete(&request()).await.unwrap_err();
    assert!(
      matches!(&err, CompletionError::Status { status: 429, body } if body == "slow down"),
      "{err:?}"
    );
  }

  #[tokio::test]
  async fn empty_choices_is_missing_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
      .mount(&server)
      .await;

    let err = client(&server).complete(&request()).await.unwrap_err();
    assert!(matches!(err, CompletionError::MissingContent));
  }

  #[tokio::test]
  async fn non_json_content_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("not json")))
      .mount(&server)
      .await;

    let err = client(&server).complete(&request()).await.unwrap_err();
    assert!(matches!(err, CompletionError::Json(_)));
  }

  #[tokio::test]
  async fn unreachable_service_is_a_transport_error() {
    let c = OpenAiClient::new(OpenAiConfig {
      base_url:     "http://127.0.0.1:1/v1".into(),
      api_key:      "sk-test".into(),
      model:        "gpt-4o".into(),
      timeout_secs: 5,
    })
    .unwrap();

    let err = c.complete(&request()).await.unwrap_err();
    assert!(matches!(err, CompletionError::Transport(_)));
  }
}
