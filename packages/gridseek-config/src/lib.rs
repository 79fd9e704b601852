mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	ChunkFailurePolicy, Config, DEFAULT_CORS_ALLOWED_ORIGINS, LlmProviderConfig, Providers, Search,
	Service, default_cors_allowed_origins,
};

use std::{env, fs, path::Path};

pub const API_KEY_ENV: &str = "GRIDSEEK_LLM_API_KEY";

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
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.upload_dir.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "service.upload_dir must be non-empty.".to_string(),
		});
	}
	if cfg.service.max_upload_bytes == 0 {
		return Err(Error::Validation {
			message: "service.max_upload_bytes must be greater than zero.".to_string(),
		});
	}

	for origin in &cfg.service.cors_allowed_origins {
		if origin.is_empty() || !origin.bytes().all(|byte| byte.is_ascii_graphic()) {
			return Err(Error::Validation {
				message: format!(
					"service.cors_allowed_origins entry {origin:?} must be a non-empty origin without spaces."
				),
			});
		}
		if origin == "*" {
			return Err(Error::Validation {
				message: "service.cors_allowed_origins must list origins explicitly; \"*\" is not allowed."
					.to_string(),
			});
		}
	}

	let llm = &cfg.providers.llm;

	for (label, value) in [
		("providers.llm.provider_id", &llm.provider_id),
		("providers.llm.api_base", &llm.api_base),
		("providers.llm.api_key", &llm.api_key),
		("providers.llm.model", &llm.model),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if llm.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.llm.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !llm.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&llm.temperature) {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if llm.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "providers.llm.default_headers values must be strings.".to_string(),
		});
	}

	let search = &cfg.search;

	if search.chunk_lines == 0 {
		return Err(Error::Validation {
			message: "search.chunk_lines must be greater than zero.".to_string(),
		});
	}
	if search.max_attempts == 0 {
		return Err(Error::Validation {
			message: "search.max_attempts must be greater than zero.".to_string(),
		});
	}
	if search.max_backoff_ms < search.retry_backoff_ms {
		return Err(Error::Validation {
			message: "search.max_backoff_ms must be greater than or equal to search.retry_backoff_ms."
				.to_string(),
		});
	}
	if search.failure_policy().is_none() {
		return Err(Error::Validation {
			message: "search.chunk_failure_policy must be one of skip or abort.".to_string(),
		});
	}
	if search.csv_sheet_name.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.csv_sheet_name must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.providers.llm.api_key.trim().is_empty()
		&& let Ok(key) = env::var(API_KEY_ENV)
	{
		cfg.providers.llm.api_key = key;
	}
	if cfg.service.log_dir.as_deref().map(|dir| dir.as_os_str().is_empty()).unwrap_or(false) {
		cfg.service.log_dir = None;
	}

	cfg.search.chunk_failure_policy = cfg.search.chunk_failure_policy.trim().to_ascii_lowercase();
}
