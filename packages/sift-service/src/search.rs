use serde::{Serialize, Serializer};
use sift_domain::{CategoryTotals, FallbackRecord, Requester, SearchHit, normalize, visibility};
use sift_index::IndexResponse;
use tokio::time::Instant;

use crate::{
	Error, Result, SiftService,
	history::{HistoryEvent, SearchType},
};

#[derive(Debug, Clone)]
pub struct SearchRequest {
	pub keyword: String,
	pub page: u32,
	/// Falls back to `search.page_size` when unset.
	pub page_size: Option<u32>,
	pub requester: Requester,
	pub source_ip: String,
}

/// Totals as they go over the wire: a category map, a plain count, or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Totals {
	Categories(CategoryTotals),
	Count(u64),
	None,
}

/// Either the next page number or `false` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
	Page(u32),
	End,
}
impl NextPage {
	/// `page + 1` only when more than `(page + 1) * page_size` results exist.
	pub fn after(page: u32, page_size: u32, total: u64) -> Self {
		let seen = (u64::from(page) + 1) * u64::from(page_size);

		if total > seen {
			page.checked_add(1).map(Self::Page).unwrap_or(Self::End)
		} else {
			Self::End
		}
	}
}
impl Serialize for NextPage {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Self::Page(page) => serializer.serialize_u32(*page),
			Self::End => serializer.serialize_bool(false),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
	pub results: Vec<SearchHit>,
	pub totals: Totals,
	pub next_page: NextPage,
	pub page_size: u32,
}

/// A response plus the history it should leave behind.
#[derive(Debug)]
pub(crate) struct SearchOutcome {
	pub(crate) response: SearchResponse,
	pub(crate) history: Vec<HistoryEvent>,
}

impl SiftService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let outcome = self.orchestrate(&req).await?;

		self.record_history(&outcome.history).await;

		Ok(outcome.response)
	}

	pub(crate) async fn orchestrate(&self, req: &SearchRequest) -> Result<SearchOutcome> {
		let page_size = req.page_size.unwrap_or(self.cfg.search.page_size);

		if page_size == 0 {
			return Err(Error::InvalidRequest {
				message: "page_size must be greater than zero.".to_string(),
			});
		}

		let deadline = Instant::now() + self.source_timeout();
		let mut history = Vec::new();

		match self.search_primary(req, page_size, deadline).await {
			Ok(response) => {
				history.extend(HistoryEvent::for_request(SearchType::SiteSearch, req));

				let usable =
					matches!(&response.totals, Totals::Categories(totals) if !totals.is_empty());

				if usable || self.cfg.search.strict_mode {
					return Ok(SearchOutcome { response, history });
				}

				tracing::debug!(
					keyword = req.keyword.as_str(),
					"Primary index returned no usable totals. Falling back."
				);
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					keyword = req.keyword.as_str(),
					"Primary index query failed. Falling back."
				);
			},
		}

		let response = self.search_fallback(req, page_size, deadline).await?;

		history.extend(HistoryEvent::for_request(SearchType::SearchBar, req));

		Ok(SearchOutcome { response, history })
	}

	async fn search_primary(
		&self,
		req: &SearchRequest,
		page_size: u32,
		deadline: Instant,
	) -> Result<SearchResponse> {
		let index_response = bounded(
			deadline,
			self.sources.index.query(&req.keyword, req.page, page_size),
			|| Error::SourceUnavailable { message: "Primary index query timed out.".to_string() },
		)
		.await?;
		let IndexResponse { documents, total, buckets } = index_response;
		let totals = match buckets {
			Some(buckets) => Totals::Categories(self.categories.aggregate(&buckets)),
			None => Totals::None,
		};
		let reference_total =
			if self.cfg.search.primary_pagination == sift_config::PRIMARY_PAGINATION_LEGACY {
				0
			} else {
				total
			};

		Ok(SearchResponse {
			results: documents.into_iter().map(SearchHit::Document).collect(),
			totals,
			next_page: NextPage::after(req.page, page_size, reference_total),
			page_size,
		})
	}

	async fn search_fallback(
		&self,
		req: &SearchRequest,
		page_size: u32,
		deadline: Instant,
	) -> Result<SearchResponse> {
		let viewer_profile = visibility::viewer_profile(&req.requester);
		let offset = i64::try_from(u64::from(req.page) * u64::from(page_size)).map_err(|_| {
			Error::InvalidRequest { message: "page is out of range.".to_string() }
		})?;
		let results_total = bounded(
			deadline,
			self.sources.records.count(&req.keyword, viewer_profile),
			|| Error::FallbackQuery { message: "Fallback count timed out.".to_string() },
		)
		.await?;
		let mut records = bounded(
			deadline,
			self.sources.records.page(&req.keyword, viewer_profile, offset, i64::from(page_size)),
			|| Error::FallbackQuery { message: "Fallback query timed out.".to_string() },
		)
		.await?;
		let hidden = visibility::retain_visible(&mut records, &req.requester);

		if hidden > 0 {
			tracing::error!(
				hidden,
				reported_total = results_total,
				"Record store returned records outside the requester's visibility."
			);
		}

		let results_total = results_total.saturating_sub(hidden as u64);

		records.truncate(page_size as usize);

		Ok(SearchResponse {
			results: fallback_results(records, &self.cfg.search.placeholder_image),
			totals: Totals::Count(results_total),
			next_page: NextPage::after(req.page, page_size, results_total),
			page_size,
		})
	}
}

fn fallback_results(records: Vec<FallbackRecord>, placeholder_image: &str) -> Vec<SearchHit> {
	records
		.into_iter()
		.map(|record| SearchHit::from(normalize::normalize(record, placeholder_image)))
		.collect()
}

/// Runs `fut` until the request deadline shared by every source call of one search.
async fn bounded<T, F>(deadline: Instant, fut: F, on_timeout: impl FnOnce() -> Error) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	match tokio::time::timeout_at(deadline, fut).await {
		Ok(result) => result,
		Err(_) => Err(on_timeout()),
	}
}
