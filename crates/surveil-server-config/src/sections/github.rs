// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Release source (GitHub REST API) configuration.

use serde::Deserialize;

const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GithubConfigLayer {
	pub api_base_url: Option<String>,
	pub request_timeout_secs: Option<u64>,
}

impl GithubConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.api_base_url.is_some() {
			self.api_base_url = other.api_base_url;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn finalize(self) -> GithubConfig {
		GithubConfig {
			api_base_url: self
				.api_base_url
				.map(|url| url.trim_end_matches('/').to_string())
				.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
			request_timeout_secs: self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct GithubConfig {
	pub api_base_url: String,
	pub request_timeout_secs: u64,
}

impl Default for GithubConfig {
	fn default() -> Self {
		GithubConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = GithubConfig::default();
		assert_eq!(config.api_base_url, "https://api.github.com");
		assert_eq!(config.request_timeout_secs, 10);
	}

	#[test]
	fn test_trailing_slash_is_trimmed() {
		let layer = GithubConfigLayer {
			api_base_url: Some("https://ghe.example.com/api/v3/".to_string()),
			..Default::default()
		};
		assert_eq!(
			layer.finalize().api_base_url,
			"https://ghe.example.com/api/v3"
		);
	}
}
