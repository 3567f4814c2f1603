use crate::{CanonicalResult, FallbackRecord};

const LEGACY_SOURCE_TYPE: &str = "token";
const SOURCE_TYPE: &str = "kudos";

/// Shapes a fallback record for display. Primary-index documents never pass through here.
pub fn normalize(record: FallbackRecord, placeholder_image: &str) -> CanonicalResult {
	let img_url = match record.img_url {
		Some(url) if !url.is_empty() => url,
		_ => placeholder_image.to_string(),
	};

	CanonicalResult {
		title: record.title,
		description: record.description,
		url: record.url,
		img_url,
		source_type: display_source_type(&record.source_type),
	}
}

pub fn display_source_type(raw: &str) -> String {
	title_case(&raw.replace(LEGACY_SOURCE_TYPE, SOURCE_TYPE))
}

/// Upper-cases every cased character that follows an uncased one and lower-cases the rest.
pub fn title_case(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut previous_cased = false;

	for ch in text.chars() {
		let cased = ch.is_lowercase() || ch.is_uppercase();

		if previous_cased {
			out.extend(ch.to_lowercase());
		} else {
			out.extend(ch.to_uppercase());
		}

		previous_cased = cased;
	}

	out
}
