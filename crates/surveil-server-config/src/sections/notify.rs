// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Webhook delivery configuration.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NotifyConfigLayer {
	pub request_timeout_secs: Option<u64>,
}

impl NotifyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn finalize(self) -> NotifyConfig {
		NotifyConfig {
			request_timeout_secs: self.request_timeout_secs.unwrap_or(10),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotifyConfig {
	pub request_timeout_secs: u64,
}

impl Default for NotifyConfig {
	fn default() -> Self {
		NotifyConfigLayer::default().finalize()
	}
}
