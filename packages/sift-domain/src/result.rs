use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result shape produced from relational records by the fallback normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalResult {
	pub title: String,
	pub description: String,
	pub url: String,
	pub img_url: String,
	pub source_type: String,
}

/// One entry of a response's `results`.
///
/// Index documents are kept exactly as stored, unknown fields and nulls included. Relational
/// records are normalized into [`CanonicalResult`] first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchHit {
	Document(Value),
	Normalized(CanonicalResult),
}
impl SearchHit {
	/// String value of a top-level field, if present.
	pub fn field(&self, key: &str) -> Option<&str> {
		match self {
			Self::Document(document) => document.get(key).and_then(Value::as_str),
			Self::Normalized(result) => match key {
				"title" => Some(result.title.as_str()),
				"description" => Some(result.description.as_str()),
				"url" => Some(result.url.as_str()),
				"img_url" => Some(result.img_url.as_str()),
				"source_type" => Some(result.source_type.as_str()),
				_ => None,
			},
		}
	}
}
impl From<CanonicalResult> for SearchHit {
	fn from(result: CanonicalResult) -> Self {
		Self::Normalized(result)
	}
}

/// A row from the relational fallback store, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackRecord {
	pub id: i64,
	pub title: String,
	pub description: String,
	pub url: String,
	pub img_url: Option<String>,
	pub source_type: String,
	/// Profile the record is restricted to; `None` means public.
	pub visible_to: Option<i64>,
}
