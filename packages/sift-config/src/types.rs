use serde::Deserialize;
use serde_json::{Map, Value};

pub const PRIMARY_PAGINATION_LEGACY: &str = "legacy";
pub const PRIMARY_PAGINATION_REPORTED: &str = "reported";

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub index: Index,
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Connection settings for the Elasticsearch-compatible primary index.
#[derive(Debug, Deserialize)]
pub struct Index {
	pub url: String,
	pub index: String,
	/// Document fields the keyword is matched against.
	pub fields: Vec<String>,
	/// Keyword field holding the numeric category id that totals are bucketed by.
	pub category_field: String,
	pub timeout_ms: u64,
	pub api_key: Option<String>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_page_size")]
	pub page_size: u32,
	/// When set, an answered primary query is returned even without usable totals.
	#[serde(default)]
	pub strict_mode: bool,
	/// Upper bound applied to every source call made for one request.
	pub timeout_ms: u64,
	#[serde(default = "default_placeholder_image")]
	pub placeholder_image: String,
	/// One of "legacy" or "reported".
	#[serde(default = "default_primary_pagination")]
	pub primary_pagination: String,
	pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
	pub id: i64,
	pub label: String,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_page_size() -> u32 {
	100
}

fn default_placeholder_image() -> String {
	"/static/v2/images/helmet.svg".to_string()
}

fn default_primary_pagination() -> String {
	PRIMARY_PAGINATION_REPORTED.to_string()
}
