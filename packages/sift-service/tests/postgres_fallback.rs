use serde_json::{Map, json};

use sift_config::{Category, Config, Index, Postgres, Search, Service, Storage};
use sift_domain::Requester;
use sift_index::IndexClient;
use sift_service::{NextPage, SearchRequest, SiftService, Totals};
use sift_storage::{db::Db, models::NewSearchResult, queries};
use sift_testkit::TestDatabase;

fn test_config(dsn: String) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage { postgres: Postgres { dsn, pool_max_conns: 2 } },
		index: Index {
			// Nothing listens here, so every primary query fails fast.
			url: "http://127.0.0.1:1".to_string(),
			index: "search".to_string(),
			fields: vec!["title".to_string(), "description".to_string()],
			category_field: "content_type".to_string(),
			timeout_ms: 500,
			api_key: None,
			default_headers: Map::new(),
		},
		search: Search {
			page_size: 100,
			strict_mode: false,
			timeout_ms: 5_000,
			placeholder_image: "/static/v2/images/helmet.svg".to_string(),
			primary_pagination: "reported".to_string(),
			categories: vec![Category { id: 82, label: "Grant".to_string() }],
		},
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn unreachable_index_falls_back_to_postgres_and_records_history() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping fallback tests; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = test_config(test_db.dsn().to_string());
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	for (title, visible_to) in
		[("Grants public", None), ("Grants mine", Some(70)), ("Grants hidden", Some(71))]
	{
		queries::insert_search_result(&db.pool, &NewSearchResult {
			title: title.to_string(),
			description: String::new(),
			url: "https://example.com".to_string(),
			img_url: None,
			source_type: "token".to_string(),
			visible_to,
		})
		.await
		.expect("Failed to insert record.");
	}

	let index = IndexClient::new(&cfg.index).expect("Failed to build index client.");
	let check = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect.");
	let service = SiftService::new(cfg, db, index);
	let response = service
		.search(SearchRequest {
			keyword: "grants".to_string(),
			page: 0,
			page_size: None,
			requester: Requester::Authenticated { user_id: 7, profile_id: 70 },
			source_ip: "203.0.113.5".to_string(),
		})
		.await
		.expect("search failed");

	assert_eq!(response.totals, Totals::Count(2));
	assert_eq!(response.next_page, NextPage::End);
	assert!(response.results.iter().all(|result| result.field("source_type") == Some("Kudos")));

	let history =
		queries::get_search_history(&check.pool, 7).await.expect("Failed to load history.");

	assert_eq!(history.len(), 1);
	assert_eq!(history[0].search_type, "searchbar");
	assert_eq!(history[0].data, json!({ "query": "grants" }));

	check.pool.close().await;

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
