//! Best-effort search history, recorded after the response has been computed.

use serde_json::Value;
use time::OffsetDateTime;
use tokio::time::Instant;

use crate::{SiftService, search::SearchRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
	/// Answered by the primary index.
	SiteSearch,
	/// Answered by the relational fallback.
	SearchBar,
}
impl SearchType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::SiteSearch => "sitesearch",
			Self::SearchBar => "searchbar",
		}
	}

	pub fn payload(&self, keyword: &str) -> Value {
		match self {
			Self::SiteSearch => serde_json::json!({ "keyword": keyword }),
			Self::SearchBar => serde_json::json!({ "query": keyword }),
		}
	}
}

/// A search that should be remembered for an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEvent {
	pub search_type: SearchType,
	pub user_id: i64,
	pub keyword: String,
	pub source_ip: String,
}
impl HistoryEvent {
	/// `None` for anonymous requesters; their searches are not recorded.
	pub fn for_request(search_type: SearchType, req: &SearchRequest) -> Option<Self> {
		let user_id = req.requester.user_id()?;

		Some(Self {
			search_type,
			user_id,
			keyword: req.keyword.clone(),
			source_ip: req.source_ip.clone(),
		})
	}
}

/// Row written to the history store, keyed by `(search_type, user_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
	pub search_type: SearchType,
	pub user_id: i64,
	pub data: Value,
	pub ip_address: String,
	pub at: OffsetDateTime,
}
impl HistoryEntry {
	pub fn from_event(event: &HistoryEvent, at: OffsetDateTime) -> Self {
		Self {
			search_type: event.search_type,
			user_id: event.user_id,
			data: event.search_type.payload(&event.keyword),
			ip_address: event.source_ip.clone(),
			at,
		}
	}
}

impl SiftService {
	/// Writes every event within one `search.timeout_ms` window. Failures are logged and never
	/// reach the caller.
	pub async fn record_history(&self, events: &[HistoryEvent]) {
		let deadline = Instant::now() + self.source_timeout();

		for event in events {
			let entry = HistoryEntry::from_event(event, OffsetDateTime::now_utc());
			let result =
				tokio::time::timeout_at(deadline, self.sources.history.upsert(&entry)).await;

			match result {
				Ok(Ok(())) => {},
				Ok(Err(err)) => {
					tracing::warn!(
						error = %err,
						search_type = event.search_type.as_str(),
						user_id = event.user_id,
						"Failed to record search history."
					);
				},
				Err(_) => {
					tracing::warn!(
						search_type = event.search_type.as_str(),
						user_id = event.user_id,
						"Timed out recording search history."
					);
				},
			}
		}
	}
}
