use std::collections::{BTreeMap, HashMap};

use sift_config::Category;

/// Label to document count, as reported on the primary path.
pub type CategoryTotals = BTreeMap<String, u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
	pub key: i64,
	pub doc_count: u64,
}

/// Immutable category id to label table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
	labels: HashMap<i64, String>,
}
impl CategoryTable {
	pub fn new(categories: &[Category]) -> Self {
		let labels =
			categories.iter().map(|category| (category.id, category.label.clone())).collect();

		Self { labels }
	}

	pub fn label(&self, id: i64) -> Option<&str> {
		self.labels.get(&id).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.labels.len()
	}

	pub fn is_empty(&self) -> bool {
		self.labels.is_empty()
	}

	pub fn contains_label(&self, label: &str) -> bool {
		self.labels.values().any(|value| value == label)
	}

	/// Buckets keyed zero ("uncategorized") or by an unknown id are dropped.
	pub fn aggregate(&self, buckets: &[Bucket]) -> CategoryTotals {
		let mut totals = CategoryTotals::new();

		for bucket in buckets {
			if bucket.key == 0 {
				continue;
			}

			let Some(label) = self.label(bucket.key) else {
				continue;
			};

			totals.insert(label.to_string(), bucket.doc_count);
		}

		totals
	}
}
