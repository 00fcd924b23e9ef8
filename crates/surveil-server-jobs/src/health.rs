// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

use crate::context::TriggerSource;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
	Healthy,
	Degraded,
	Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastRunInfo {
	pub run_id: String,
	pub triggered_by: TriggerSource,
	pub started_at: DateTime<Utc>,
	pub duration_ms: i64,
	pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobHealthStatus {
	pub job_id: String,
	pub name: String,
	pub status: HealthState,
	pub last_run: Option<LastRunInfo>,
	pub consecutive_failures: u32,
}

/// Process-local run history for the scheduled job.
#[derive(Default)]
pub(crate) struct HealthTracker {
	inner: Mutex<TrackerState>,
}

#[derive(Default)]
struct TrackerState {
	last_run: Option<LastRunInfo>,
	consecutive_failures: u32,
}

impl HealthTracker {
	pub(crate) fn record(&self, run: LastRunInfo) {
		let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
		if run.error.is_some() {
			state.consecutive_failures += 1;
		} else {
			state.consecutive_failures = 0;
		}
		state.last_run = Some(run);
	}

	pub(crate) fn snapshot(&self) -> (Option<LastRunInfo>, u32) {
		let state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
		(state.last_run.clone(), state.consecutive_failures)
	}
}

pub(crate) fn determine_health_state(
	last_run: &Option<LastRunInfo>,
	consecutive_failures: u32,
) -> HealthState {
	if consecutive_failures >= 3 {
		return HealthState::Unhealthy;
	}
	match last_run {
		Some(run) if run.error.is_some() => HealthState::Degraded,
		_ => HealthState::Healthy,
	}
}
