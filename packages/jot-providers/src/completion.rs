use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{BoxFuture, CompletionProvider, Error, Result};
use jot_config::LlmProviderConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
	pub role: String,
	pub content: String,
}
impl ChatMessage {
	pub fn system(content: impl Into<String>) -> Self {
		Self { role: "system".to_string(), content: content.into() }
	}

	pub fn user(content: impl Into<String>) -> Self {
		Self { role: "user".to_string(), content: content.into() }
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
	pub messages: Vec<ChatMessage>,
	/// Overrides the configured temperature for this call.
	pub temperature: Option<f32>,
}

/// Chat-completions over HTTP. The client is built once so connections are pooled.
pub struct HttpCompletion {
	client: Client,
}
impl HttpCompletion {
	pub fn new(cfg: &LlmProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { client })
	}
}
impl CompletionProvider for HttpCompletion {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(complete(&self.client, cfg, request))
	}
}

pub async fn complete(
	client: &Client,
	cfg: &LlmProviderConfig,
	request: &CompletionRequest,
) -> Result<String> {
	let url = format!("{}{}", cfg.api_base.trim_end_matches('/'), cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": request.temperature.unwrap_or(cfg.temperature),
		"top_p": 1.0,
		"messages": request.messages,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_content(&json)
}

fn parse_completion_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::Transient {
			message: "Completion response is missing message content.".to_string(),
		})
}
