// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, GithubConfigLayer, LoggingConfigLayer, NotifyConfigLayer, ScanConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/surveil/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: SURVEIL_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl EnvSource {
	/// Build a layer from an arbitrary variable lookup. Empty values count as unset.
	pub fn load_from<F>(lookup: F) -> Result<ServerConfigLayer, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
		let var_u64 = |name: &str| -> Result<Option<u64>, ConfigError> {
			match var(name) {
				Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
					key: name.to_string(),
					message: format!("invalid u64 value '{v}'"),
				}),
				None => Ok(None),
			}
		};
		let var_bool = |name: &str| var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1");

		Ok(ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: var("SURVEIL_SERVER_DATABASE_URL"),
			}),
			logging: Some(LoggingConfigLayer {
				level: var("SURVEIL_SERVER_LOG_LEVEL"),
				json: var_bool("SURVEIL_SERVER_LOG_JSON"),
			}),
			github: Some(GithubConfigLayer {
				api_base_url: var("SURVEIL_SERVER_GITHUB_API_URL"),
				request_timeout_secs: var_u64("SURVEIL_SERVER_GITHUB_TIMEOUT_SECS")?,
			}),
			scan: Some(ScanConfigLayer {
				default_cron: var("SURVEIL_SERVER_DEFAULT_CRON"),
				default_theme: var("SURVEIL_SERVER_DEFAULT_THEME"),
				timezone: var("SURVEIL_SERVER_TIMEZONE"),
			}),
			notify: Some(NotifyConfigLayer {
				request_timeout_secs: var_u64("SURVEIL_SERVER_WEBHOOK_TIMEOUT_SECS")?,
			}),
		})
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Self::load_from(|name| std::env::var(name).ok())
	}
}
