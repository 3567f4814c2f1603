mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Category, Config, Index, PRIMARY_PAGINATION_LEGACY, PRIMARY_PAGINATION_REPORTED, Postgres,
	Search, Service, Storage,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("index.url", &cfg.index.url),
		("index.index", &cfg.index.index),
		("index.category_field", &cfg.index.category_field),
		("search.placeholder_image", &cfg.search.placeholder_image),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.index.fields.is_empty() || cfg.index.fields.iter().any(|field| field.trim().is_empty())
	{
		return Err(Error::Validation {
			message: "index.fields must list at least one non-empty field.".to_string(),
		});
	}
	if cfg.index.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "index.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.page_size == 0 {
		return Err(Error::Validation {
			message: "search.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.search.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.index.timeout_ms >= cfg.search.timeout_ms {
		return Err(Error::Validation {
			message: "index.timeout_ms must be less than search.timeout_ms.".to_string(),
		});
	}
	if !matches!(
		cfg.search.primary_pagination.as_str(),
		PRIMARY_PAGINATION_LEGACY | PRIMARY_PAGINATION_REPORTED
	) {
		return Err(Error::Validation {
			message: "search.primary_pagination must be one of legacy or reported.".to_string(),
		});
	}

	let mut ids = HashSet::with_capacity(cfg.search.categories.len());
	let mut labels = HashSet::with_capacity(cfg.search.categories.len());

	for category in &cfg.search.categories {
		// Zero is the "uncategorized" bucket key and can never carry a label.
		if category.id == 0 {
			return Err(Error::Validation {
				message: "search.categories.id must be non-zero.".to_string(),
			});
		}
		if category.label.trim().is_empty() {
			return Err(Error::Validation {
				message: "search.categories.label must be non-empty.".to_string(),
			});
		}
		if !ids.insert(category.id) {
			return Err(Error::Validation {
				message: format!(
					"search.categories.id {} is declared more than once.",
					category.id
				),
			});
		}
		if !labels.insert(category.label.as_str()) {
			return Err(Error::Validation {
				message: format!(
					"search.categories.label {:?} is declared more than once.",
					category.label
				),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.index.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.index.api_key = None;
	}

	cfg.index.url = cfg.index.url.trim_end_matches('/').to_string();

	for category in &mut cfg.search.categories {
		category.label = category.label.trim().to_string();
	}
}
