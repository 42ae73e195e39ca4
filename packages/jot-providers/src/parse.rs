//! Lenient extraction of structured data from free-form model output.

use serde_json::{Map, Value};

/// Whole text as a JSON object, else the outermost `{...}` span.
pub fn json_object(raw: &str) -> Option<Map<String, Value>> {
	outermost(raw, '{', '}', |value| match value {
		Value::Object(map) => Some(map),
		_ => None,
	})
}

/// Whole text as a JSON array, else the outermost `[...]` span.
pub fn json_array(raw: &str) -> Option<Vec<Value>> {
	outermost(raw, '[', ']', |value| match value {
		Value::Array(items) => Some(items),
		_ => None,
	})
}

pub fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
	map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// String items only, trimmed, empties dropped.
pub fn string_items(items: &[Value]) -> Vec<String> {
	items
		.iter()
		.filter_map(Value::as_str)
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(str::to_string)
		.collect()
}

/// Valid JSON of another kind still falls through to the span search.
fn outermost<T>(raw: &str, open: char, close: char, pick: impl Fn(Value) -> Option<T>) -> Option<T> {
	let trimmed = raw.trim();

	if let Some(found) = serde_json::from_str::<Value>(trimmed).ok().and_then(&pick) {
		return Some(found);
	}

	let start = trimmed.find(open)?;
	let end = trimmed.rfind(close)?;

	if end <= start {
		return None;
	}

	serde_json::from_str::<Value>(&trimmed[start..=end]).ok().and_then(pick)
}
