//! Client for the Elasticsearch-compatible primary search index.

mod error;

pub use error::{Error, Result};

use std::time::Duration as StdDuration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

use sift_domain::Bucket;

/// Name of the terms aggregation that carries per-category counts.
pub const TOTALS_AGGREGATION: &str = "search-totals";

const MAX_CATEGORY_BUCKETS: u32 = 64;

/// What the index answered for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexResponse {
	/// `_source` documents of the hits, in index order.
	pub documents: Vec<Value>,
	/// Total matching documents as reported by the index.
	pub total: u64,
	/// `None` when the response carried no totals aggregation at all.
	pub buckets: Option<Vec<Bucket>>,
}

pub struct IndexClient {
	client: Client,
	search_url: String,
	fields: Vec<String>,
	category_field: String,
}
impl IndexClient {
	pub fn new(cfg: &sift_config::Index) -> Result<Self> {
		let headers = auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?;
		let client = Client::builder()
			.timeout(StdDuration::from_millis(cfg.timeout_ms))
			.default_headers(headers)
			.build()?;

		Ok(Self {
			client,
			search_url: format!("{}/{}/_search", cfg.url, cfg.index),
			fields: cfg.fields.clone(),
			category_field: cfg.category_field.clone(),
		})
	}

	pub async fn query(&self, keyword: &str, page: u32, page_size: u32) -> Result<IndexResponse> {
		let body = build_query_body(keyword, page, page_size, &self.fields, &self.category_field);
		let res = self.client.post(&self.search_url).json(&body).send().await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_response(json)
	}
}

pub fn auth_headers(
	api_key: Option<&str>,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(api_key) = api_key {
		headers.insert(AUTHORIZATION, format!("ApiKey {api_key}").parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub fn build_query_body(
	keyword: &str,
	page: u32,
	page_size: u32,
	fields: &[String],
	category_field: &str,
) -> Value {
	let keyword = keyword.trim();
	let query = if keyword.is_empty() {
		serde_json::json!({ "match_all": {} })
	} else {
		serde_json::json!({
			"multi_match": {
				"query": keyword,
				"fields": fields,
				"type": "best_fields",
			}
		})
	};
	let from = u64::from(page) * u64::from(page_size);

	serde_json::json!({
		"from": from,
		"size": page_size,
		"track_total_hits": true,
		"query": query,
		"aggs": {
			TOTALS_AGGREGATION: {
				"terms": { "field": category_field, "size": MAX_CATEGORY_BUCKETS }
			}
		}
	})
}

pub fn parse_response(json: Value) -> Result<IndexResponse> {
	let hits = json.get("hits").ok_or_else(|| Error::InvalidResponse {
		message: "Index response is missing hits.".to_string(),
	})?;
	let documents = hits
		.get("hits")
		.and_then(Value::as_array)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Index response is missing the hits array.".to_string(),
		})?
		.iter()
		.map(|hit| {
			hit.get("_source").cloned().ok_or_else(|| Error::InvalidResponse {
				message: "Index hit is missing _source.".to_string(),
			})
		})
		.collect::<Result<Vec<_>>>()?;
	// Newer servers report `{ "value": n, "relation": "eq" }`, older ones a bare number.
	let total = match hits.get("total") {
		Some(Value::Number(number)) => number.as_u64().unwrap_or(0),
		Some(Value::Object(object)) => object.get("value").and_then(Value::as_u64).unwrap_or(0),
		_ => 0,
	};
	let buckets = json
		.get("aggregations")
		.and_then(|aggregations| aggregations.get(TOTALS_AGGREGATION))
		.and_then(|totals| totals.get("buckets"))
		.and_then(Value::as_array)
		.map(|buckets| buckets.iter().filter_map(parse_bucket).collect());

	Ok(IndexResponse { documents, total, buckets })
}

fn parse_bucket(bucket: &Value) -> Option<Bucket> {
	let key = match bucket.get("key")? {
		Value::Number(number) => number.as_i64()?,
		Value::String(raw) => raw.trim().parse().ok()?,
		_ => return None,
	};
	let doc_count = bucket.get("doc_count").and_then(Value::as_u64)?;

	Some(Bucket { key, doc_count })
}
