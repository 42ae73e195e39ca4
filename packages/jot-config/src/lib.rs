mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, LlmProviderConfig, Providers, Service, Storage, Translation};

use std::{env, fs, path::Path};

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
	if cfg.storage.dsn.trim().is_empty() {
		return Err(Error::Validation { message: "storage.dsn must be non-empty.".to_string() });
	}
	if cfg.storage.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let llm = &cfg.providers.llm;

	for (label, value) in [
		("providers.llm.api_base", &llm.api_base),
		("providers.llm.path", &llm.path),
		("providers.llm.model", &llm.model),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
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
	if llm.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.llm.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if llm.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "providers.llm.default_headers values must be strings.".to_string(),
		});
	}
	if cfg.translation.max_attempts == 0 {
		return Err(Error::Validation {
			message: "translation.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.translation.default_target_language.trim().is_empty() {
		return Err(Error::Validation {
			message: "translation.default_target_language must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let llm = &mut cfg.providers.llm;

	if llm.api_key_env.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false) {
		llm.api_key_env = None;
	}
	if llm.api_key.trim().is_empty() {
		llm.api_key = llm
			.api_key_env
			.as_deref()
			.and_then(|name| env::var(name).ok())
			.map(|key| key.trim().to_string())
			.unwrap_or_default();
	}

	cfg.translation.default_target_language =
		cfg.translation.default_target_language.trim().to_string();
}
