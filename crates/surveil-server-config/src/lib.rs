// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the surveil server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`SURVEIL_SERVER_*`)

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub github: GithubConfig,
	pub scan: ScanConfig,
	pub notify: NotifyConfig,
}

impl ServerConfig {
	/// Parsed scan timezone. Always valid once the config has been finalized.
	pub fn timezone(&self) -> chrono_tz::Tz {
		self.scan.timezone.parse().unwrap_or(chrono_tz::UTC)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`SURVEIL_SERVER_*`)
/// 2. Config file (`/etc/surveil/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		database: layer.database.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		github: layer.github.unwrap_or_default().finalize(),
		scan: layer.scan.unwrap_or_default().finalize(),
		notify: layer.notify.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		database = %config.database.url,
		github_api = %config.github.api_base_url,
		timezone = %config.scan.timezone,
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	config.database.validate()?;
	if config.scan.timezone.parse::<chrono_tz::Tz>().is_err() {
		return Err(ConfigError::Validation(format!(
			"unknown timezone '{}'; expected an IANA name such as 'UTC' or 'Europe/Berlin'",
			config.scan.timezone
		)));
	}
	if config.github.request_timeout_secs == 0 {
		return Err(ConfigError::Validation(
			"github.request_timeout_secs must be greater than zero".to_string(),
		));
	}
	if config.notify.request_timeout_secs == 0 {
		return Err(ConfigError::Validation(
			"notify.request_timeout_secs must be greater than zero".to_string(),
		));
	}

	Ok(())
}
