// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scheduled scan of every tracked repository.

use async_trait::async_trait;
use surveil_server_jobs::{Job, JobContext, JobError, JobOutput, TriggerSource};
use surveil_server_notify::ScanKind;
use surveil_server_scan::Scanner;
use tracing::instrument;
use uuid::Uuid;

pub struct RepositoryScanJob {
	scanner: Scanner,
}

impl RepositoryScanJob {
	pub fn new(scanner: Scanner) -> Self {
		Self { scanner }
	}
}

#[async_trait]
impl Job for RepositoryScanJob {
	fn id(&self) -> &str {
		"repository-scan"
	}

	fn name(&self) -> &str {
		"Repository Scan"
	}

	fn description(&self) -> &str {
		"Check every tracked repository for a new release and post a digest of changes"
	}

	#[instrument(skip(self, ctx), fields(job_id = "repository-scan", run_id = %ctx.run_id))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		let kind = match ctx.triggered_by {
			TriggerSource::Schedule => ScanKind::Scheduled,
			TriggerSource::Manual => ScanKind::Manual,
		};
		let run_id = Uuid::parse_str(&ctx.run_id).unwrap_or_else(|_| Uuid::new_v4());

		let summary = self
			.scanner
			.run_as(run_id, kind)
			.await
			.map_err(|e| JobError::Failed {
				message: format!("Repository scan failed: {e}"),
			})?;

		Ok(JobOutput {
			message: format!(
				"Scanned {} repositories, {} new release(s), {} skipped",
				summary.scanned,
				summary.digest.len(),
				summary.skipped
			),
			metadata: serde_json::to_value(&summary).ok(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use surveil_server_db::testing::create_surveil_test_pool;
	use surveil_server_db::{RepoRepository, SettingsDefaults, SettingsRepository};
	use surveil_server_notify::{DeliveryOutcome, DigestEntry, Notifier};
	use surveil_server_releases::{ReleaseInfo, ReleaseSource};
	use surveil_server_vault::AccessToken;

	struct NoReleases;

	#[async_trait]
	impl ReleaseSource for NoReleases {
		async fn latest_release(&self, _repo: &str, _token: Option<&AccessToken>) -> Option<ReleaseInfo> {
			None
		}

		async fn validate_token(&self, _token: &str) -> surveil_server_releases::Result<()> {
			Ok(())
		}
	}

	struct SilentNotifier;

	#[async_trait]
	impl Notifier for SilentNotifier {
		async fn notify(
			&self,
			_digest: &[DigestEntry],
			_kind: ScanKind,
		) -> surveil_server_notify::Result<DeliveryOutcome> {
			Ok(DeliveryOutcome::Delivered)
		}

		async fn send_test(&self) -> surveil_server_notify::Result<DeliveryOutcome> {
			Ok(DeliveryOutcome::Skipped)
		}
	}

	async fn job() -> RepositoryScanJob {
		let pool = create_surveil_test_pool().await;
		let settings = SettingsRepository::new(pool.clone());
		settings
			.ensure_settings(&SettingsDefaults {
				encryption_key: surveil_server_vault::generate_key(),
				cron_schedule: "0 */12 * * *".to_string(),
				theme: "tokyoNight".to_string(),
			})
			.await
			.unwrap();

		RepositoryScanJob::new(Scanner::new(
			Arc::new(RepoRepository::new(pool)),
			Arc::new(settings),
			Arc::new(NoReleases),
			Arc::new(SilentNotifier),
		))
	}

	#[tokio::test]
	async fn manual_trigger_reports_summary_under_context_run_id() {
		let job = job().await;
		let run_id = Uuid::new_v4();
		let ctx = JobContext {
			run_id: run_id.to_string(),
			triggered_by: TriggerSource::Manual,
			generation: None,
		};

		let output = job.run(&ctx).await.unwrap();
		assert_eq!(output.message, "Scanned 0 repositories, 0 new release(s), 0 skipped");

		let metadata = output.metadata.unwrap();
		assert_eq!(metadata["run_id"], run_id.to_string());
		assert_eq!(metadata["kind"], "manual");
	}

	#[tokio::test]
	async fn scheduled_trigger_uses_scheduled_kind() {
		let job = job().await;
		let ctx = JobContext {
			run_id: "not-a-uuid".to_string(),
			triggered_by: TriggerSource::Schedule,
			generation: Some(3),
		};

		let output = job.run(&ctx).await.unwrap();
		assert_eq!(output.metadata.unwrap()["kind"], "scheduled");
	}
}
