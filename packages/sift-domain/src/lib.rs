pub mod category;
pub mod normalize;
pub mod requester;
pub mod result;
pub mod visibility;

pub use category::{Bucket, CategoryTable, CategoryTotals};
pub use requester::Requester;
pub use result::{CanonicalResult, FallbackRecord, SearchHit};
