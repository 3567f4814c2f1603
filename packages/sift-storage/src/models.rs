use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchResultRow {
	pub id: i64,
	pub title: String,
	pub description: String,
	pub url: String,
	pub img_url: Option<String>,
	pub source_type: String,
	pub visible_to: Option<i64>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSearchResult {
	pub title: String,
	pub description: String,
	pub url: String,
	pub img_url: Option<String>,
	pub source_type: String,
	pub visible_to: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchHistoryRow {
	pub history_id: i64,
	pub search_type: String,
	pub user_id: i64,
	pub data: Value,
	pub ip_address: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct SearchHistoryUpsert {
	pub search_type: String,
	pub user_id: i64,
	pub data: Value,
	pub ip_address: String,
	pub at: OffsetDateTime,
}
