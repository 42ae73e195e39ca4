//! Tags are stored comma-joined and served as a list.

const SEPARATOR: char = ',';

/// Trims every entry, drops empties and later duplicates, keeps first-seen order.
pub fn normalize<I, S>(raw: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut out: Vec<String> = Vec::new();

	for tag in raw {
		// A comma inside a list entry would split on the next read, so split it here.
		for part in tag.as_ref().split(SEPARATOR) {
			let trimmed = part.trim();

			if trimmed.is_empty() || out.iter().any(|existing| existing == trimmed) {
				continue;
			}

			out.push(trimmed.to_string());
		}
	}

	out
}

pub fn parse(joined: &str) -> Vec<String> {
	normalize([joined])
}

/// `None` when nothing survives normalization, so the column stays NULL.
pub fn join(tags: &[String]) -> Option<String> {
	let normalized = normalize(tags);

	if normalized.is_empty() {
		return None;
	}

	Some(normalized.join(","))
}

pub fn split_stored(stored: Option<&str>) -> Vec<String> {
	stored.map(parse).unwrap_or_default()
}
