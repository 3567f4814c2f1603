/// Who is asking. Authentication happens upstream; this only carries its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
	Anonymous,
	Authenticated { user_id: i64, profile_id: i64 },
}
impl Requester {
	pub fn is_authenticated(&self) -> bool {
		matches!(self, Self::Authenticated { .. })
	}

	pub fn user_id(&self) -> Option<i64> {
		match self {
			Self::Anonymous => None,
			Self::Authenticated { user_id, .. } => Some(*user_id),
		}
	}

	pub fn profile_id(&self) -> Option<i64> {
		match self {
			Self::Anonymous => None,
			Self::Authenticated { profile_id, .. } => Some(*profile_id),
		}
	}
}
