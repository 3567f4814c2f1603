//! Record visibility rules.
//!
//! A record with no restriction is public. A restricted record is visible only to the profile it
//! names. The same rule is pushed into the relational query and re-checked in memory.

use crate::{FallbackRecord, Requester};

/// Profile a restricted record must name to be visible, or `None` for public-only access.
pub fn viewer_profile(requester: &Requester) -> Option<i64> {
	requester.profile_id()
}

pub fn is_visible(visible_to: Option<i64>, requester: &Requester) -> bool {
	match visible_to {
		None => true,
		Some(profile_id) => viewer_profile(requester) == Some(profile_id),
	}
}

/// Keeps only the records `requester` may see and returns how many were removed.
pub fn retain_visible(records: &mut Vec<FallbackRecord>, requester: &Requester) -> usize {
	let before = records.len();

	records.retain(|record| is_visible(record.visible_to, requester));

	before - records.len()
}
