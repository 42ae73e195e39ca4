use std::{sync::Arc, time::Duration};

use crate::{
	ChatMessage, CompletionProvider, CompletionRequest, Error, HttpCompletion, Result, parse,
};
use jot_config::{LlmProviderConfig, Translation};

const TRANSLATE_TEMPERATURE: f32 = 0.0;
const GENERATE_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub initial_backoff: Duration,
}
impl RetryPolicy {
	pub fn from_config(cfg: &Translation) -> Self {
		Self {
			max_attempts: cfg.max_attempts,
			initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
		}
	}

	/// Delay after the given failed attempt (1-based): initial, then doubling.
	pub fn backoff_after(&self, attempt: u32) -> Duration {
		let factor = 1_u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);

		self.initial_backoff.saturating_mul(factor)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self { max_attempts: 3, initial_backoff: Duration::from_millis(1_000) }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedText {
	pub title: String,
	pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNote {
	pub title: Option<String>,
	pub content: String,
	pub tags: Vec<String>,
	/// Unparsed timestamp exactly as the model produced it.
	pub scheduled_at: Option<String>,
}

pub struct LlmAdapter {
	cfg: LlmProviderConfig,
	provider: Arc<dyn CompletionProvider>,
	retry: RetryPolicy,
}
impl LlmAdapter {
	/// Fails with [`Error::MissingCredential`] when no api key is configured.
	pub fn new(cfg: LlmProviderConfig, retry: RetryPolicy) -> Result<Self> {
		let provider = HttpCompletion::new(&cfg)?;

		Self::with_provider(cfg, Arc::new(provider), retry)
	}

	pub fn with_provider(
		cfg: LlmProviderConfig,
		provider: Arc<dyn CompletionProvider>,
		retry: RetryPolicy,
	) -> Result<Self> {
		if cfg.api_key.trim().is_empty() {
			return Err(Error::MissingCredential);
		}
		if retry.max_attempts == 0 {
			return Err(Error::InvalidConfig {
				message: "Retry policy needs at least one attempt.".to_string(),
			});
		}

		Ok(Self { cfg, provider, retry })
	}

	pub async fn translate_text(
		&self,
		title: &str,
		content: &str,
		target_language: &str,
	) -> Result<TranslatedText> {
		let request = CompletionRequest {
			messages: vec![
				ChatMessage::system("You are a helpful assistant that translates text."),
				ChatMessage::user(format!(
					"Translate the following note title and content into {target_language}."
				)),
				ChatMessage::user(format!("Title: {title}\n\nContent: {content}")),
				ChatMessage::user("Respond in JSON with keys \"title\" and \"content\" only."),
			],
			temperature: Some(TRANSLATE_TEMPERATURE),
		};
		let raw = self.complete_with_retry("translate_text", &request).await?;

		Ok(parse_translated_text(&raw))
	}

	pub async fn generate_note(&self, prompt: &str, target_language: &str) -> Result<GeneratedNote> {
		let request = CompletionRequest {
			messages: vec![
				ChatMessage::system(
					"You are an assistant that creates short notes. Given a user's natural language \
					 input, produce a JSON object with keys: 'title' (string), 'content' (string), \
					 'tags' (array of up to 3 short tag strings), and 'scheduled_at' (ISO 8601 \
					 datetime string if a time is mentioned in the input, otherwise null). Respond \
					 with JSON only.",
				),
				ChatMessage::user(format!(
					"User input: {prompt}\nTarget language: {target_language}\nRespond only with a JSON object."
				)),
			],
			temperature: Some(GENERATE_TEMPERATURE),
		};
		let raw = self.complete_with_retry("generate_note", &request).await?;

		Ok(parse_generated_note(&raw))
	}

	/// An empty tag list is returned as-is without calling the model.
	pub async fn translate_tags(&self, tags: &[String], target_language: &str) -> Result<Vec<String>> {
		if tags.is_empty() {
			return Ok(Vec::new());
		}

		let listed = serde_json::to_string(tags).map_err(|err| Error::InvalidConfig {
			message: format!("Failed to encode tags: {err}."),
		})?;
		let request = CompletionRequest {
			messages: vec![
				ChatMessage::system(
					"You are a helpful translator. Given a short list of tags, translate each tag \
					 into the target language and return a JSON array of strings.",
				),
				ChatMessage::user(format!("Translate these tags into {target_language}: {listed}")),
				ChatMessage::user("Respond with a JSON array only, e.g. [\"tag1\", \"tag2\"]"),
			],
			temperature: Some(TRANSLATE_TEMPERATURE),
		};
		let raw = self.complete_with_retry("translate_tags", &request).await?;

		Ok(parse_tag_list(&raw))
	}

	async fn complete_with_retry(
		&self,
		operation: &'static str,
		request: &CompletionRequest,
	) -> Result<String> {
		let max_attempts = self.retry.max_attempts;
		let mut last_error = String::new();

		for attempt in 1..=max_attempts {
			match self.provider.complete(&self.cfg, request).await {
				Ok(raw) => return Ok(raw),
				Err(err) if err.is_transient() => {
					tracing::warn!(operation, attempt, max_attempts, error = %err, "LLM call failed.");

					last_error = err.to_string();

					if attempt < max_attempts {
						tokio::time::sleep(self.retry.backoff_after(attempt)).await;
					}
				},
				Err(err) => {
					tracing::error!(operation, attempt, error = %err, "LLM call was rejected.");

					return Err(err);
				},
			}
		}

		Err(Error::Exhausted { operation, attempts: max_attempts, last_error })
	}
}

fn parse_translated_text(raw: &str) -> TranslatedText {
	if let Some(map) = parse::json_object(raw) {
		let title = parse::string_field(&map, "title");
		let content = parse::string_field(&map, "content");

		if title.is_some() || content.is_some() {
			return TranslatedText {
				title: title.unwrap_or_default(),
				content: content.unwrap_or_default(),
			};
		}
	}

	TranslatedText { title: String::new(), content: raw.to_string() }
}

fn parse_generated_note(raw: &str) -> GeneratedNote {
	let Some(map) = parse::json_object(raw) else {
		return GeneratedNote {
			title: None,
			content: raw.to_string(),
			tags: Vec::new(),
			scheduled_at: None,
		};
	};
	let tags = match map.get("tags") {
		Some(serde_json::Value::Array(items)) => parse::string_items(items),
		_ => Vec::new(),
	};

	GeneratedNote {
		title: parse::string_field(&map, "title").filter(|title| !title.trim().is_empty()),
		content: parse::string_field(&map, "content").unwrap_or_default(),
		tags,
		scheduled_at: parse::string_field(&map, "scheduled_at")
			.filter(|value| !value.trim().is_empty()),
	}
}

fn parse_tag_list(raw: &str) -> Vec<String> {
	if let Some(items) = parse::json_array(raw) {
		return parse::string_items(&items);
	}

	raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()).map(str::to_string).collect()
}
