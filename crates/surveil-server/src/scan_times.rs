// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Human readable last/next scan times.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

pub const NO_SCAN_YET: &str = "No scan performed yet";
pub const NOT_SCHEDULED: &str = "Not scheduled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanTimes {
	pub last: String,
	pub next: String,
}

/// `Today at 3:04 PM`, `Tomorrow at ...`, `Yesterday at ...` or `Jan 02 at 3:04 PM`,
/// with days counted in `tz`.
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>, tz: Tz) -> String {
	let local = at.with_timezone(&tz);
	let today = now.with_timezone(&tz).date_naive();
	let time = local.format("%-I:%M %p");

	match (local.date_naive() - today).num_days() {
		0 => format!("Today at {time}"),
		1 => format!("Tomorrow at {time}"),
		-1 => format!("Yesterday at {time}"),
		_ => format!("{} at {time}", local.format("%b %d")),
	}
}

pub fn scan_times(
	last: Option<DateTime<Utc>>,
	next: Option<DateTime<Utc>>,
	now: DateTime<Utc>,
	tz: Tz,
) -> ScanTimes {
	ScanTimes {
		last: last
			.map(|at| format_relative(at, now, tz))
			.unwrap_or_else(|| NO_SCAN_YET.to_string()),
		next: next
			.map(|at| format_relative(at, now, tz))
			.unwrap_or_else(|| NOT_SCHEDULED.to_string()),
	}
}
