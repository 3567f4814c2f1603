pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	/// The primary index failed or timed out. Recovered by the fallback path.
	#[error("Primary index unavailable: {message}")]
	SourceUnavailable { message: String },
	/// The relational fallback failed. There is nothing left to fall back to.
	#[error("Fallback query failed: {message}")]
	FallbackQuery { message: String },
	#[error("Search history write failed: {message}")]
	HistoryWrite { message: String },
}
impl From<sift_index::Error> for Error {
	fn from(err: sift_index::Error) -> Self {
		Self::SourceUnavailable { message: err.to_string() }
	}
}
