// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scan scheduling configuration section.
//!
//! `default_cron` and `default_theme` only seed the settings row the first
//! time the server starts; afterwards the stored values win.

use serde::Deserialize;

const DEFAULT_CRON: &str = "0 */12 * * *";
const DEFAULT_THEME: &str = "tokyoNight";
const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ScanConfigLayer {
	pub default_cron: Option<String>,
	pub default_theme: Option<String>,
	pub timezone: Option<String>,
}

impl ScanConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.default_cron.is_some() {
			self.default_cron = other.default_cron;
		}
		if other.default_theme.is_some() {
			self.default_theme = other.default_theme;
		}
		if other.timezone.is_some() {
			self.timezone = other.timezone;
		}
	}

	pub fn finalize(self) -> ScanConfig {
		ScanConfig {
			default_cron: self
				.default_cron
				.unwrap_or_else(|| DEFAULT_CRON.to_string()),
			default_theme: self
				.default_theme
				.unwrap_or_else(|| DEFAULT_THEME.to_string()),
			timezone: self
				.timezone
				.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
	pub default_cron: String,
	pub default_theme: String,
	/// IANA timezone used for cron evaluation and display times.
	pub timezone: String,
}

impl Default for ScanConfig {
	fn default() -> Self {
		ScanConfigLayer::default().finalize()
	}
}
