use std::sync::Arc;

use sift_index::IndexClient;
use sift_service::SiftService;
use sift_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SiftService>,
}
impl AppState {
	pub async fn new(config: sift_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let index = IndexClient::new(&config.index)?;
		let service = SiftService::new(config, db, index);

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: SiftService) -> Self {
		Self { service: Arc::new(service) }
	}
}
