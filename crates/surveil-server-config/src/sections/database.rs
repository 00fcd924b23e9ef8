// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite location for repositories, scan settings and webhook settings.

use serde::Deserialize;

use crate::error::ConfigError;

/// Relative to the working directory of the server process.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./surveil.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
	pub url: String,
}

impl DatabaseConfig {
	/// The store is SQLite only; any other scheme is rejected before a pool is opened.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.url.starts_with("sqlite:") {
			return Ok(());
		}
		Err(ConfigError::InvalidValue {
			key: "database.url".to_string(),
			message: format!("'{}' is not a sqlite: URL", self.url),
		})
	}
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		DatabaseConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if let Some(url) = other.url {
			self.url = Some(url);
		}
	}

	/// A blank URL counts as unset.
	pub fn finalize(self) -> DatabaseConfig {
		let url = self
			.url
			.map(|url| url.trim().to_string())
			.filter(|url| !url.is_empty())
			.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
		DatabaseConfig { url }
	}
}
