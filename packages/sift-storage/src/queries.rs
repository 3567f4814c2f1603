use sqlx::{PgExecutor, Postgres, QueryBuilder};

use crate::{
	Error, Result,
	models::{NewSearchResult, SearchHistoryRow, SearchHistoryUpsert, SearchResultRow},
};

/// Turns a keyword into an `ILIKE` pattern that matches it as a literal substring.
pub fn contains_pattern(keyword: &str) -> String {
	let mut pattern = String::with_capacity(keyword.len() + 2);

	pattern.push('%');

	for ch in keyword.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			pattern.push('\\');
		}

		pattern.push(ch);
	}

	pattern.push('%');

	pattern
}

/// Pushes the keyword match and the visibility restriction for `viewer_profile`.
///
/// `None` restricts the scan to public records.
fn push_match_filter(
	builder: &mut QueryBuilder<'_, Postgres>,
	keyword: &str,
	viewer_profile: Option<i64>,
) {
	let pattern = contains_pattern(keyword);

	builder.push(" WHERE (title ILIKE ");
	builder.push_bind(pattern.clone());
	builder.push(" OR description ILIKE ");
	builder.push_bind(pattern);
	builder.push(")");

	match viewer_profile {
		Some(profile_id) => {
			builder.push(" AND (visible_to IS NULL OR visible_to = ");
			builder.push_bind(profile_id);
			builder.push(")");
		},
		None => {
			builder.push(" AND visible_to IS NULL");
		},
	}
}

pub async fn count_search_results<'e, E>(
	executor: E,
	keyword: &str,
	viewer_profile: Option<i64>,
) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM search_results");

	push_match_filter(&mut builder, keyword, viewer_profile);

	let total: i64 = builder.build_query_scalar().fetch_one(executor).await?;

	Ok(total)
}

pub async fn search_results<'e, E>(
	executor: E,
	keyword: &str,
	viewer_profile: Option<i64>,
	offset: i64,
	limit: i64,
) -> Result<Vec<SearchResultRow>>
where
	E: PgExecutor<'e>,
{
	if offset < 0 || limit < 0 {
		return Err(Error::InvalidArgument("offset and limit must be non-negative.".to_string()));
	}

	let mut builder = QueryBuilder::new(
		"SELECT id, title, description, url, img_url, source_type, visible_to, created_at \
		 FROM search_results",
	);

	push_match_filter(&mut builder, keyword, viewer_profile);

	builder.push(" ORDER BY id ASC OFFSET ");
	builder.push_bind(offset);
	builder.push(" LIMIT ");
	builder.push_bind(limit);

	let rows = builder.build_query_as().fetch_all(executor).await?;

	Ok(rows)
}

pub async fn insert_search_result<'e, E>(executor: E, record: &NewSearchResult) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let id: i64 = sqlx::query_scalar(
		"\
INSERT INTO search_results (title, description, url, img_url, source_type, visible_to)
VALUES ($1, $2, $3, $4, $5, $6)
RETURNING id",
	)
	.bind(record.title.as_str())
	.bind(record.description.as_str())
	.bind(record.url.as_str())
	.bind(record.img_url.as_deref())
	.bind(record.source_type.as_str())
	.bind(record.visible_to)
	.fetch_one(executor)
	.await?;

	Ok(id)
}

/// At most one row exists per `(search_type, user_id)`; a repeat search replaces the payload.
pub async fn upsert_search_history<'e, E>(executor: E, entry: &SearchHistoryUpsert) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO search_history (search_type, user_id, data, ip_address, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $5)
ON CONFLICT (search_type, user_id)
DO UPDATE
SET
	data = EXCLUDED.data,
	ip_address = EXCLUDED.ip_address,
	updated_at = EXCLUDED.updated_at",
	)
	.bind(entry.search_type.as_str())
	.bind(entry.user_id)
	.bind(entry.data.clone())
	.bind(entry.ip_address.as_str())
	.bind(entry.at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_search_history<'e, E>(executor: E, user_id: i64) -> Result<Vec<SearchHistoryRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as(
		"\
SELECT history_id, search_type, user_id, data, ip_address, created_at, updated_at
FROM search_history
WHERE user_id = $1
ORDER BY search_type ASC",
	)
	.bind(user_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
