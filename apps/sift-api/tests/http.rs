use std::sync::{Arc, Mutex};

use axum::{
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Map, Value, json};
use tower::util::ServiceExt;

use sift_api::{routes, state::AppState};
use sift_config::{Category, Config, Index, Postgres, Search, Service, Storage};
use sift_domain::{Bucket, FallbackRecord, Requester, visibility};
use sift_index::IndexResponse;
use sift_service::{
	BoxFuture, Error, HistoryEntry, HistoryStore, RecordStore, Result, SearchIndex, SiftService,
	Sources,
};

struct StubIndex {
	response: Option<IndexResponse>,
}
impl SearchIndex for StubIndex {
	fn query<'a>(
		&'a self,
		_keyword: &'a str,
		_page: u32,
		_page_size: u32,
	) -> BoxFuture<'a, Result<IndexResponse>> {
		Box::pin(async move {
			self.response
				.clone()
				.ok_or_else(|| Error::SourceUnavailable { message: "index down".to_string() })
		})
	}
}

struct StubRecords {
	records: Option<Vec<FallbackRecord>>,
}
impl StubRecords {
	fn visible(&self, viewer_profile: Option<i64>) -> Result<Vec<FallbackRecord>> {
		let Some(records) = &self.records else {
			return Err(Error::FallbackQuery { message: "database down".to_string() });
		};
		let requester = match viewer_profile {
			Some(profile_id) => Requester::Authenticated { user_id: 0, profile_id },
			None => Requester::Anonymous,
		};

		Ok(records
			.iter()
			.filter(|record| visibility::is_visible(record.visible_to, &requester))
			.cloned()
			.collect())
	}
}
impl RecordStore for StubRecords {
	fn count<'a>(
		&'a self,
		_keyword: &'a str,
		viewer_profile: Option<i64>,
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(self.visible(viewer_profile)?.len() as u64) })
	}

	fn page<'a>(
		&'a self,
		_keyword: &'a str,
		viewer_profile: Option<i64>,
		offset: i64,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<FallbackRecord>>> {
		Box::pin(async move {
			Ok(self
				.visible(viewer_profile)?
				.into_iter()
				.skip(offset as usize)
				.take(limit as usize)
				.collect())
		})
	}
}

#[derive(Default)]
struct StubHistory {
	entries: Mutex<Vec<HistoryEntry>>,
}
impl HistoryStore for StubHistory {
	fn upsert<'a>(&'a self, entry: &'a HistoryEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.entries.lock().unwrap_or_else(|err| err.into_inner()).push(entry.clone());

			Ok(())
		})
	}
}

fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres {
				dsn: "postgres://127.0.0.1:1/sift".to_string(),
				pool_max_conns: 1,
			},
		},
		index: Index {
			url: "http://127.0.0.1:1".to_string(),
			index: "search".to_string(),
			fields: vec!["title".to_string()],
			category_field: "content_type".to_string(),
			timeout_ms: 500,
			api_key: None,
			default_headers: Map::new(),
		},
		search: Search {
			page_size: 100,
			strict_mode: false,
			timeout_ms: 1_000,
			placeholder_image: "/static/v2/images/helmet.svg".to_string(),
			primary_pagination: "reported".to_string(),
			categories: vec![
				Category { id: 82, label: "Grant".to_string() },
				Category { id: 16, label: "Bounty".to_string() },
			],
		},
	}
}

fn record(id: i64, visible_to: Option<i64>) -> FallbackRecord {
	FallbackRecord {
		id,
		title: format!("Grant {id}"),
		description: String::new(),
		url: format!("https://example.com/{id}"),
		img_url: None,
		source_type: "token".to_string(),
		visible_to,
	}
}

fn app(
	index: Option<IndexResponse>,
	records: Option<Vec<FallbackRecord>>,
	history: Arc<StubHistory>,
) -> axum::Router {
	let sources = Sources::new(
		Arc::new(StubIndex { response: index }),
		Arc::new(StubRecords { records }),
		history,
	);

	routes::router(AppState::from_service(SiftService::with_sources(test_config(), sources)))
}

async fn get(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.oneshot(request).await.expect("Failed to call router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).expect("Failed to parse response.")
	};

	(status, json)
}

fn search_request(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request.")
}

#[tokio::test]
async fn health_ok() {
	let app = app(None, Some(Vec::new()), Arc::new(StubHistory::default()));
	let (status, _) = get(app, search_request("/health")).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn fallback_response_has_compatible_shape() {
	let records = vec![record(1, None), record(2, Some(5))];
	let app = app(None, Some(records), Arc::new(StubHistory::default()));
	let (status, json) = get(app, search_request("/search?term=grant")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["totals"], 1);
	assert_eq!(json["page"], false);
	assert_eq!(json["perPage"], 100);
	assert_eq!(
		json["results"],
		json!([{
			"title": "Grant 1",
			"description": "",
			"url": "https://example.com/1",
			"img_url": "/static/v2/images/helmet.svg",
			"source_type": "Kudos"
		}])
	);
}

#[tokio::test]
async fn primary_response_carries_category_totals() {
	let index = IndexResponse {
		documents: vec![json!({ "title": "Indexed", "url": "https://example.com/i" })],
		total: 150,
		buckets: Some(vec![Bucket { key: 82, doc_count: 140 }, Bucket { key: 16, doc_count: 10 }]),
	};
	let app = app(Some(index), Some(Vec::new()), Arc::new(StubHistory::default()));
	let (status, json) = get(app, search_request("/search?term=grant&page=0")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["totals"], json!({ "Grant": 140, "Bounty": 10 }));
	assert_eq!(json["page"], 1);
	assert_eq!(json["results"], json!([{ "title": "Indexed", "url": "https://example.com/i" }]));
}

#[tokio::test]
async fn authenticated_headers_unlock_restricted_records_and_record_history() {
	let history = Arc::new(StubHistory::default());
	let app = app(None, Some(vec![record(1, None), record(2, Some(5))]), history.clone());
	let request = Request::builder()
		.uri("/search?term=grant")
		.header(routes::HEADER_USER_ID, "9")
		.header(routes::HEADER_PROFILE_ID, "5")
		.header("X-Forwarded-For", "198.51.100.7, 10.0.0.1")
		.body(Body::empty())
		.expect("Failed to build request.");
	let (status, json) = get(app, request).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["totals"], 2);

	let entries = history.entries.lock().unwrap_or_else(|err| err.into_inner()).clone();

	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].user_id, 9);
	assert_eq!(entries[0].ip_address, "198.51.100.7");
	assert_eq!(entries[0].data, json!({ "query": "grant" }));
}

#[tokio::test]
async fn rejects_non_numeric_page() {
	let app = app(None, Some(Vec::new()), Arc::new(StubHistory::default()));
	let (status, json) = get(app, search_request("/search?term=grant&page=two")).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
	assert_eq!(json["fields"][0], "$.page");
}

#[tokio::test]
async fn rejects_partial_identity() {
	let app = app(None, Some(Vec::new()), Arc::new(StubHistory::default()));
	let request = Request::builder()
		.uri("/search?term=grant")
		.header(routes::HEADER_USER_ID, "9")
		.body(Body::empty())
		.expect("Failed to build request.");
	let (status, json) = get(app, request).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn fallback_failure_is_service_unavailable() {
	let app = app(None, None, Arc::new(StubHistory::default()));
	let (status, json) = get(app, search_request("/search?term=grant")).await;

	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(json["error_code"], "SEARCH_UNAVAILABLE");
}

#[tokio::test]
async fn missing_term_searches_everything() {
	let records = vec![record(1, None), record(2, None)];
	let app = app(None, Some(records), Arc::new(StubHistory::default()));
	let (status, json) = get(app, search_request("/search")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["totals"], 2);
}
