use std::net::SocketAddr;

use axum::{
	Json, Router,
	extract::{ConnectInfo, Query, State},
	http::{Extensions, HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::get,
};
use serde::{Deserialize, Serialize};

use sift_domain::{Requester, SearchHit};
use sift_service::{Error as ServiceError, NextPage, SearchRequest, Totals};

use crate::state::AppState;

pub const HEADER_USER_ID: &str = "X-Sift-User-Id";
pub const HEADER_PROFILE_ID: &str = "X-Sift-Profile-Id";
const HEADER_FORWARDED_FOR: &str = "X-Forwarded-For";
const UNKNOWN_IP: &str = "unknown";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/search", get(search))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
	#[serde(default)]
	pub term: String,
	#[serde(default = "default_page")]
	pub page: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
	pub results: Vec<SearchHit>,
	pub totals: Totals,
	pub page: NextPage,
	pub per_page: u32,
}

async fn search(
	State(state): State<AppState>,
	headers: HeaderMap,
	extensions: Extensions,
	Query(params): Query<SearchParams>,
) -> Result<Json<SearchBody>, ApiError> {
	let page = params.page.trim().parse::<u32>().map_err(|_| {
		json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			"page must be a non-negative integer.",
			Some(vec!["$.page".to_string()]),
		)
	})?;
	let requester = requester_from_headers(&headers)?;
	let source_ip = source_ip(&headers, &extensions);
	let response = state
		.service
		.search(SearchRequest {
			keyword: params.term,
			page,
			page_size: None,
			requester,
			source_ip,
		})
		.await?;

	Ok(Json(SearchBody {
		results: response.results,
		totals: response.totals,
		page: response.next_page,
		per_page: response.page_size,
	}))
}

/// Identity arrives from the authenticating proxy. Both ids or neither.
fn requester_from_headers(headers: &HeaderMap) -> Result<Requester, ApiError> {
	let user_id = header_id(headers, HEADER_USER_ID)?;
	let profile_id = header_id(headers, HEADER_PROFILE_ID)?;

	match (user_id, profile_id) {
		(Some(user_id), Some(profile_id)) => Ok(Requester::Authenticated { user_id, profile_id }),
		(None, None) => Ok(Requester::Anonymous),
		_ => Err(json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			format!("{HEADER_USER_ID} and {HEADER_PROFILE_ID} must be sent together."),
			None,
		)),
	}
}

fn header_id(headers: &HeaderMap, name: &str) -> Result<Option<i64>, ApiError> {
	let Some(value) = headers.get(name) else {
		return Ok(None);
	};

	value.to_str().ok().and_then(|raw| raw.trim().parse::<i64>().ok()).map(Some).ok_or_else(|| {
		json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			format!("{name} must be an integer."),
			Some(vec![name.to_string()]),
		)
	})
}

fn source_ip(headers: &HeaderMap, extensions: &Extensions) -> String {
	let forwarded = headers
		.get(HEADER_FORWARDED_FOR)
		.and_then(|value| value.to_str().ok())
		.and_then(|raw| raw.split(',').next())
		.map(str::trim)
		.filter(|ip| !ip.is_empty());

	if let Some(ip) = forwarded {
		return ip.to_string();
	}

	extensions
		.get::<ConnectInfo<SocketAddr>>()
		.map(|ConnectInfo(addr)| addr.ip().to_string())
		.unwrap_or_else(|| UNKNOWN_IP.to_string())
}

fn default_page() -> String {
	"0".to_string()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError { status, error_code: code.to_string(), message: message.into(), fields }
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			err @ (ServiceError::FallbackQuery { .. }
			| ServiceError::SourceUnavailable { .. }
			| ServiceError::HistoryWrite { .. }) => {
				tracing::error!(error = %err, "Search failed.");

				json_error(
					StatusCode::SERVICE_UNAVAILABLE,
					"SEARCH_UNAVAILABLE",
					"Search is temporarily unavailable.",
					None,
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			fields: self.fields,
		};

		(self.status, Json(body)).into_response()
	}
}
