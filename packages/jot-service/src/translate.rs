use serde::{Deserialize, Serialize};

use crate::{NoteService, ServiceResult, TagsInput};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TranslateRequest {
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub content: String,
	#[serde(default)]
	pub tags: Option<TagsInput>,
	#[serde(default)]
	pub language: Option<String>,
}

/// `tags` is `None` when tag translation failed while the text translation succeeded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateResponse {
	pub title: String,
	pub content: String,
	pub tags: Option<Vec<String>>,
}

impl NoteService {
	pub async fn translate(&self, req: TranslateRequest) -> ServiceResult<TranslateResponse> {
		let adapter = self.adapter()?;
		let language = self.target_language(req.language.as_deref(), None);
		let translated = adapter.translate_text(&req.title, &req.content, &language).await?;
		let tags = req.tags.as_ref().map(TagsInput::normalize).unwrap_or_default();
		let tags = match adapter.translate_tags(&tags, &language).await {
			Ok(tags) => Some(tags),
			Err(err) => {
				tracing::warn!(error = %err, "Tag translation failed.");

				None
			},
		};

		Ok(TranslateResponse { title: translated.title, content: translated.content, tags })
	}
}
