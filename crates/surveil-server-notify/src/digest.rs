// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use serde::{Deserialize, Serialize};

/// What started a scan; shown in the webhook footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanKind {
	Scheduled,
	Manual,
	Test,
}

impl ScanKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ScanKind::Scheduled => "scheduled",
			ScanKind::Manual => "manual",
			ScanKind::Test => "test",
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			ScanKind::Scheduled => "Scheduled Scan",
			ScanKind::Manual => "Manual Scan",
			ScanKind::Test => "Test Scan",
		}
	}
}

impl fmt::Display for ScanKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One repository whose observed release moved past the last notified one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestEntry {
	pub name: String,
	pub url: String,
	pub previous: String,
	pub current: String,
}

impl DigestEntry {
	/// Markdown line used in the embed description.
	pub fn markdown_line(&self) -> String {
		format!(
			"- [{}]({}): {} → {}",
			self.name, self.url, self.previous, self.current
		)
	}
}

impl fmt::Display for DigestEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {} -> {}", self.name, self.previous, self.current)
	}
}

/// Embed description: one markdown line per entry.
pub fn render_description(digest: &[DigestEntry]) -> String {
	let mut out = String::new();
	for entry in digest {
		out.push_str(&entry.markdown_line());
		out.push('\n');
	}
	out
}

/// Expand `{count}` and `{scan_type}` in the user's message template.
pub fn render_template(template: &str, count: usize, kind: ScanKind) -> String {
	template
		.replace("{count}", &count.to_string())
		.replace("{scan_type}", kind.as_str())
}

/// The synthetic entry sent by test notifications.
pub fn sample_entry() -> DigestEntry {
	DigestEntry {
		name: "facebook/react".to_string(),
		url: "https://github.com/facebook/react".to_string(),
		previous: "2.5.1".to_string(),
		current: "v19.0.0".to_string(),
	}
}
