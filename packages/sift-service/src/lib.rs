pub mod history;
pub mod search;

mod error;

pub use error::{Error, Result};
pub use history::{HistoryEntry, HistoryEvent, SearchType};
pub use search::{NextPage, SearchRequest, SearchResponse, Totals};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use sift_config::Config;
use sift_domain::{CategoryTable, FallbackRecord};
use sift_index::{IndexClient, IndexResponse};
use sift_storage::{
	db::Db,
	models::{SearchHistoryUpsert, SearchResultRow},
	queries,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The full-text index queried first.
pub trait SearchIndex
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		keyword: &'a str,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<IndexResponse>>;
}

/// The relational store scanned when the index cannot answer.
///
/// `viewer_profile` is `None` for anonymous requesters, which limits the scan to public records.
pub trait RecordStore
where
	Self: Send + Sync,
{
	fn count<'a>(
		&'a self,
		keyword: &'a str,
		viewer_profile: Option<i64>,
	) -> BoxFuture<'a, Result<u64>>;

	fn page<'a>(
		&'a self,
		keyword: &'a str,
		viewer_profile: Option<i64>,
		offset: i64,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<FallbackRecord>>>;
}

pub trait HistoryStore
where
	Self: Send + Sync,
{
	fn upsert<'a>(&'a self, entry: &'a HistoryEntry) -> BoxFuture<'a, Result<()>>;
}

#[derive(Clone)]
pub struct Sources {
	pub index: Arc<dyn SearchIndex>,
	pub records: Arc<dyn RecordStore>,
	pub history: Arc<dyn HistoryStore>,
}
impl Sources {
	pub fn new(
		index: Arc<dyn SearchIndex>,
		records: Arc<dyn RecordStore>,
		history: Arc<dyn HistoryStore>,
	) -> Self {
		Self { index, records, history }
	}
}

/// Index client and Postgres pool behind the source traits.
pub struct DefaultSources {
	pub index: IndexClient,
	pub db: Db,
}
impl DefaultSources {
	pub fn into_sources(self) -> Sources {
		let sources = Arc::new(self);

		Sources { index: sources.clone(), records: sources.clone(), history: sources }
	}
}

impl SearchIndex for DefaultSources {
	fn query<'a>(
		&'a self,
		keyword: &'a str,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<IndexResponse>> {
		Box::pin(async move { Ok(self.index.query(keyword, page, page_size).await?) })
	}
}

impl RecordStore for DefaultSources {
	fn count<'a>(
		&'a self,
		keyword: &'a str,
		viewer_profile: Option<i64>,
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let total = queries::count_search_results(&self.db.pool, keyword, viewer_profile)
				.await
				.map_err(|err| Error::FallbackQuery { message: err.to_string() })?;

			Ok(u64::try_from(total).unwrap_or(0))
		})
	}

	fn page<'a>(
		&'a self,
		keyword: &'a str,
		viewer_profile: Option<i64>,
		offset: i64,
		limit: i64,
	) -> BoxFuture<'a, Result<Vec<FallbackRecord>>> {
		Box::pin(async move {
			let rows =
				queries::search_results(&self.db.pool, keyword, viewer_profile, offset, limit)
					.await
					.map_err(|err| Error::FallbackQuery { message: err.to_string() })?;

			Ok(rows.into_iter().map(fallback_record).collect())
		})
	}
}

impl HistoryStore for DefaultSources {
	fn upsert<'a>(&'a self, entry: &'a HistoryEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let upsert = SearchHistoryUpsert {
				search_type: entry.search_type.as_str().to_string(),
				user_id: entry.user_id,
				data: entry.data.clone(),
				ip_address: entry.ip_address.clone(),
				at: entry.at,
			};

			queries::upsert_search_history(&self.db.pool, &upsert)
				.await
				.map_err(|err| Error::HistoryWrite { message: err.to_string() })
		})
	}
}

pub struct SiftService {
	pub cfg: Config,
	pub categories: CategoryTable,
	pub sources: Sources,
}
impl SiftService {
	pub fn new(cfg: Config, db: Db, index: IndexClient) -> Self {
		Self::with_sources(cfg, DefaultSources { index, db }.into_sources())
	}

	pub fn with_sources(cfg: Config, sources: Sources) -> Self {
		let categories = CategoryTable::new(&cfg.search.categories);

		Self { cfg, categories, sources }
	}

	/// Budget shared by every source call of one request.
	pub(crate) fn source_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.search.timeout_ms)
	}
}

fn fallback_record(row: SearchResultRow) -> FallbackRecord {
	FallbackRecord {
		id: row.id,
		title: row.title,
		description: row.description,
		url: row.url,
		img_url: row.img_url,
		source_type: row.source_type,
		visible_to: row.visible_to,
	}
}
