// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Transport-agnostic operations exposed by the surveil server.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use surveil_server_db::{
	NewRepository, NotificationSettings, NotificationStore, NotificationUpdate, RepoStore,
	ScanSettings, SettingsDefaults, SettingsStore, SettingsUpdate, TrackedRepository,
};
use surveil_server_jobs::{next_fire_time, validate_expression, CronScheduler, TriggerSource};
use surveil_server_notify::{DeliveryOutcome, Notifier, ScanKind};
use surveil_server_releases::ReleaseSource;
use surveil_server_scan::{ScanSummary, Scanner};
use surveil_server_vault::{open_token, seal_token, AccessToken};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::jobs::RepositoryScanJob;
use crate::scan_times::{scan_times, ScanTimes};

/// Collaborators the service is assembled from.
pub struct ServiceParts {
	pub repos: Arc<dyn RepoStore>,
	pub settings: Arc<dyn SettingsStore>,
	pub notifications: Arc<dyn NotificationStore>,
	pub releases: Arc<dyn ReleaseSource>,
	pub notifier: Arc<dyn Notifier>,
	pub timezone: Tz,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddRepository {
	/// `owner/repo`.
	pub name: String,
	pub url: String,
	/// Acknowledged version. Empty or `latest` means the fetched release.
	#[serde(default)]
	pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryChangelog {
	pub id: i64,
	pub name: String,
	pub version: String,
	pub changelog: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
	/// Wait for the scan and return its summary.
	Blocking,
	/// Start the scan in the background and return its run id.
	Background,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanReport {
	Completed(ScanSummary),
	Started { run_id: Uuid },
}

/// Settings as shown to callers. The token itself never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsView {
	pub theme: String,
	pub cron_expression: String,
	pub token_configured: bool,
	pub last_scan: Option<DateTime<Utc>>,
}

impl From<&ScanSettings> for SettingsView {
	fn from(settings: &ScanSettings) -> Self {
		Self {
			theme: settings.theme.clone(),
			cron_expression: settings.cron_schedule.clone(),
			token_configured: settings.encrypted_token.is_some(),
			last_scan: settings.last_scan,
		}
	}
}

/// Absent fields are left unchanged. Present but empty `theme`,
/// `cron_expression` or `api_token` values are rejected; clear the token with
/// `reset_token`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
	pub theme: Option<String>,
	pub cron_expression: Option<String>,
	pub api_token: Option<String>,
	#[serde(default)]
	pub reset_token: bool,
}

pub type NotificationPatch = NotificationUpdate;

pub struct SurveilService {
	repos: Arc<dyn RepoStore>,
	settings_store: Arc<dyn SettingsStore>,
	notifications: Arc<dyn NotificationStore>,
	releases: Arc<dyn ReleaseSource>,
	notifier: Arc<dyn Notifier>,
	scanner: Scanner,
	scheduler: Arc<CronScheduler>,
	settings: RwLock<Arc<ScanSettings>>,
	/// Serializes settings writers so the stored cadence and the scheduler's
	/// active cadence are always updated in the same order.
	settings_writer: Mutex<()>,
	timezone: Tz,
}

impl SurveilService {
	/// Create the settings rows if missing and wire the scanner and scheduler.
	/// The scheduler is not started.
	pub async fn bootstrap(parts: ServiceParts, defaults: SettingsDefaults) -> Result<Self> {
		let settings = parts.settings.ensure_settings(&defaults).await?;
		parts.notifications.ensure_notification_settings().await?;

		let scanner = Scanner::new(
			Arc::clone(&parts.repos),
			Arc::clone(&parts.settings),
			Arc::clone(&parts.releases),
			Arc::clone(&parts.notifier),
		);
		let job = Arc::new(RepositoryScanJob::new(scanner.clone()));
		let scheduler = Arc::new(CronScheduler::new(
			job,
			parts.timezone,
			Arc::clone(&parts.settings),
		));

		Ok(Self {
			repos: parts.repos,
			settings_store: parts.settings,
			notifications: parts.notifications,
			releases: parts.releases,
			notifier: parts.notifier,
			scanner,
			scheduler,
			settings: RwLock::new(Arc::new(settings)),
			settings_writer: Mutex::new(()),
			timezone: parts.timezone,
		})
	}

	/// Start the recurring scan on the stored cadence.
	pub async fn start_scheduler(&self) -> Result<()> {
		let expression = self.current_settings().await.cron_schedule.clone();
		self
			.scheduler
			.start(&expression)
			.await
			.map_err(|e| ServiceError::Schedule(e.to_string()))
	}

	pub async fn shutdown(&self) {
		self.scheduler.shutdown().await;
	}

	pub fn scheduler(&self) -> &Arc<CronScheduler> {
		&self.scheduler
	}

	async fn current_settings(&self) -> Arc<ScanSettings> {
		Arc::clone(&*self.settings.read().await)
	}

	async fn replace_settings(&self, settings: ScanSettings) -> Arc<ScanSettings> {
		let settings = Arc::new(settings);
		*self.settings.write().await = Arc::clone(&settings);
		settings
	}

	async fn current_token(&self) -> Option<AccessToken> {
		let settings = self.current_settings().await;
		open_token(
			settings.encrypted_token.as_deref(),
			&settings.encryption_key,
		)
	}

	// =========================================================================
	// Repositories
	// =========================================================================

	#[instrument(skip(self, request), fields(repo = %request.name))]
	pub async fn add_repository(&self, request: AddRepository) -> Result<TrackedRepository> {
		let name = request.name.trim();
		let url = request.url.trim();
		if !is_owner_repo(name) {
			return Err(ServiceError::Validation(format!(
				"repository name '{name}' must be in owner/repo form"
			)));
		}
		if url.is_empty() {
			return Err(ServiceError::Validation(
				"repository url is required".to_string(),
			));
		}

		let token = self.current_token().await;
		let release = self
			.releases
			.latest_release(name, token.as_ref())
			.await
			.ok_or_else(|| ServiceError::ReleaseUnavailable(name.to_string()))?;

		let current_version = match request.version.as_deref().map(str::trim) {
			Some(version) if !version.is_empty() && version != "latest" => version.to_string(),
			_ => release.version.clone(),
		};

		let created = self
			.repos
			.create_repository(&NewRepository {
				name: name.to_string(),
				url: url.to_string(),
				current_version,
				latest_release: release.version.clone(),
				notified_version: release.version,
				last_updated: release.published,
				changelog: release.changelog,
			})
			.await?;

		info!(
			id = created.id,
			current_version = %created.current_version,
			latest_release = %created.latest_release,
			"repository tracked"
		);
		Ok(created)
	}

	pub async fn list_repositories(&self) -> Result<Vec<TrackedRepository>> {
		Ok(self.repos.list_repositories().await?)
	}

	pub async fn changelog(&self, id: i64) -> Result<RepositoryChangelog> {
		let repo = self
			.repos
			.get_repository(id)
			.await?
			.ok_or_else(|| ServiceError::NotFound(format!("repository {id}")))?;

		Ok(RepositoryChangelog {
			id: repo.id,
			name: repo.name,
			version: repo.latest_release,
			changelog: repo.changelog,
		})
	}

	/// Mark the latest observed release as acknowledged.
	#[instrument(skip(self))]
	pub async fn acknowledge_update(&self, id: i64) -> Result<TrackedRepository> {
		Ok(self.repos.acknowledge_latest(id).await?)
	}

	/// Set the acknowledged version. Empty or `latest` acknowledges the latest release.
	#[instrument(skip(self))]
	pub async fn pin_version(&self, id: i64, version: &str) -> Result<TrackedRepository> {
		let version = version.trim();
		if version.is_empty() || version == "latest" {
			return self.acknowledge_update(id).await;
		}
		Ok(self.repos.update_current_version(id, version).await?)
	}

	#[instrument(skip(self))]
	pub async fn delete_repository(&self, id: i64) -> Result<()> {
		if !self.repos.delete_repository(id).await? {
			return Err(ServiceError::NotFound(format!("repository {id}")));
		}
		info!(id, "repository removed");
		Ok(())
	}

	// =========================================================================
	// Scans
	// =========================================================================

	#[instrument(skip(self))]
	pub async fn trigger_scan(&self, mode: ScanMode) -> Result<ScanReport> {
		match mode {
			ScanMode::Blocking => {
				let summary = self.scanner.run(ScanKind::Manual).await?;
				Ok(ScanReport::Completed(summary))
			}
			ScanMode::Background => {
				let run_id = Uuid::new_v4();
				let scheduler = Arc::clone(&self.scheduler);
				tokio::spawn(async move {
					let _ = scheduler
						.trigger_as(run_id.to_string(), TriggerSource::Manual)
						.await;
				});
				info!(%run_id, "background scan started");
				Ok(ScanReport::Started { run_id })
			}
		}
	}

	pub async fn scan_times(&self) -> Result<ScanTimes> {
		let last = self.settings_store.get_last_scan().await?;

		let mut expression = self.scheduler.current_expression();
		if expression.is_empty() {
			expression = self.current_settings().await.cron_schedule.clone();
		}
		let now = Utc::now();
		let next = next_fire_time(&expression, self.timezone, now).ok();

		Ok(scan_times(last, next, now, self.timezone))
	}

	// =========================================================================
	// Settings
	// =========================================================================

	pub async fn settings(&self) -> Result<SettingsView> {
		let _writer = self.settings_writer.lock().await;
		let settings = self.settings_store.get_settings().await?;
		let settings = self.replace_settings(settings).await;
		Ok(SettingsView::from(settings.as_ref()))
	}

	#[instrument(skip(self, patch), fields(
		theme = patch.theme.is_some(),
		cron = patch.cron_expression.is_some(),
		token = patch.api_token.is_some(),
		reset_token = patch.reset_token
	))]
	pub async fn update_settings(&self, patch: SettingsPatch) -> Result<SettingsView> {
		if patch.reset_token && patch.api_token.is_some() {
			return Err(ServiceError::Validation(
				"reset_token and api_token cannot be combined".to_string(),
			));
		}

		let theme = match patch.theme.as_deref().map(str::trim) {
			Some("") => {
				return Err(ServiceError::Validation(
					"theme must not be empty".to_string(),
				))
			}
			other => other.map(str::to_string),
		};

		let cron_schedule = match patch.cron_expression.as_deref().map(str::trim) {
			Some("") => {
				return Err(ServiceError::Validation(
					"cron_expression must not be empty".to_string(),
				))
			}
			Some(expression) => {
				validate_expression(expression)?;
				Some(expression.to_string())
			}
			None => None,
		};

		let _writer = self.settings_writer.lock().await;
		let current = self.current_settings().await;
		let encrypted_token = if patch.reset_token {
			Some(None)
		} else if let Some(raw) = patch.api_token.as_deref() {
			let token = AccessToken::new(raw).ok_or_else(|| {
				ServiceError::Validation("api_token must not be empty; use reset_token to clear it".to_string())
			})?;
			self.releases.validate_token(token.expose()).await?;
			Some(Some(seal_token(&token, &current.encryption_key)?))
		} else {
			None
		};

		let update = SettingsUpdate {
			theme,
			cron_schedule: cron_schedule.clone(),
			encrypted_token,
		};
		let updated = if update.is_empty() {
			self.settings_store.get_settings().await?
		} else {
			self.settings_store.update_settings(&update).await?
		};

		if let Some(expression) = cron_schedule {
			if expression != self.scheduler.current_expression() {
				self
					.scheduler
					.update(&expression)
					.await
					.map_err(|e| ServiceError::Schedule(e.to_string()))?;
			}
		}

		let updated = self.replace_settings(updated).await;
		info!("settings updated");
		Ok(SettingsView::from(updated.as_ref()))
	}

	pub async fn validate_token(&self, token: &str) -> Result<()> {
		self.releases.validate_token(token).await?;
		Ok(())
	}

	// =========================================================================
	// Notifications
	// =========================================================================

	pub async fn notification_config(&self) -> Result<NotificationSettings> {
		Ok(self.notifications.get_notification_settings().await?)
	}

	#[instrument(skip(self, patch))]
	pub async fn update_notification_config(
		&self,
		patch: NotificationPatch,
	) -> Result<NotificationSettings> {
		if let Some(url) = patch.webhook_url.as_deref().map(str::trim) {
			if !url.is_empty() && !(url.starts_with("https://") || url.starts_with("http://")) {
				return Err(ServiceError::Validation(format!(
					"webhook url '{url}' must start with http:// or https://"
				)));
			}
		}
		if patch
			.display_name
			.as_deref()
			.is_some_and(|name| name.trim().is_empty())
		{
			return Err(ServiceError::Validation(
				"display_name must not be empty".to_string(),
			));
		}

		Ok(
			self
				.notifications
				.update_notification_settings(&patch)
				.await?,
		)
	}

	#[instrument(skip(self))]
	pub async fn send_test_notification(&self) -> Result<DeliveryOutcome> {
		Ok(self.notifier.send_test().await?)
	}
}

fn is_owner_repo(name: &str) -> bool {
	let mut parts = name.split('/');
	matches!(
		(parts.next(), parts.next(), parts.next()),
		(Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty()
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;
	use surveil_server_db::testing::create_surveil_test_pool;
	use surveil_server_db::{NotificationRepository, RepoRepository, SettingsRepository};
	use surveil_server_notify::WebhookNotifier;
	use surveil_server_releases::GithubReleaseClient;
	use surveil_server_scan::NotificationOutcome;
	use surveil_server_vault::generate_key;
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	async fn service_with(server: &MockServer) -> SurveilService {
		let pool = create_surveil_test_pool().await;
		let notifications: Arc<dyn NotificationStore> =
			Arc::new(NotificationRepository::new(pool.clone()));
		let parts = ServiceParts {
			repos: Arc::new(RepoRepository::new(pool.clone())),
			settings: Arc::new(SettingsRepository::new(pool.clone())),
			notifications: Arc::clone(&notifications),
			releases: Arc::new(GithubReleaseClient::new(server.uri(), Duration::from_secs(2)).unwrap()),
			notifier: Arc::new(
				WebhookNotifier::new(notifications, Duration::from_secs(2), chrono_tz::UTC).unwrap(),
			),
			timezone: chrono_tz::UTC,
		};
		SurveilService::bootstrap(
			parts,
			SettingsDefaults {
				encryption_key: generate_key(),
				cron_schedule: "0 */12 * * *".to_string(),
				theme: "tokyoNight".to_string(),
			},
		)
		.await
		.unwrap()
	}

	async fn mock_release(server: &MockServer, repo: &str, tag: &str) {
		Mock::given(method("GET"))
			.and(path(format!("/repos/{repo}/releases/latest")))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"tag_name": tag,
				"published_at": "2025-01-02T15:04:05Z",
				"body": format!("notes for {tag}")
			})))
			.mount(server)
			.await;
	}

	fn add(name: &str, version: Option<&str>) -> AddRepository {
		AddRepository {
			name: name.to_string(),
			url: format!("https://github.com/{name}"),
			version: version.map(str::to_string),
		}
	}

	#[test]
	fn owner_repo_form_is_required() {
		assert!(is_owner_repo("tokio-rs/tokio"));
		assert!(!is_owner_repo("tokio"));
		assert!(!is_owner_repo("/tokio"));
		assert!(!is_owner_repo("tokio-rs/"));
		assert!(!is_owner_repo("a/b/c"));
	}

	#[tokio::test]
	async fn add_repository_seeds_from_latest_release() {
		let server = MockServer::start().await;
		mock_release(&server, "tokio-rs/tokio", "v1.40.0").await;
		let service = service_with(&server).await;

		let repo = service
			.add_repository(add("tokio-rs/tokio", None))
			.await
			.unwrap();
		assert_eq!(repo.current_version, "v1.40.0");
		assert_eq!(repo.latest_release, "v1.40.0");
		assert_eq!(repo.notified_version, "v1.40.0");
		assert_eq!(repo.last_updated, "Jan 02 2025");
		assert_eq!(repo.changelog, "notes for v1.40.0");
		assert!(!repo.has_update());

		let latest = service
			.add_repository(add("serde-rs/serde", Some("latest")))
			.await;
		assert!(matches!(latest, Err(ServiceError::ReleaseUnavailable(_))));
	}

	#[tokio::test]
	async fn add_repository_keeps_explicit_version() {
		let server = MockServer::start().await;
		mock_release(&server, "a/b", "v2.0.0").await;
		let service = service_with(&server).await;

		let repo = service
			.add_repository(add("a/b", Some(" v1.0.0 ")))
			.await
			.unwrap();
		assert_eq!(repo.current_version, "v1.0.0");
		assert_eq!(repo.latest_release, "v2.0.0");
		assert!(repo.has_update());
	}

	#[tokio::test]
	async fn add_repository_rejects_bad_input_and_duplicates() {
		let server = MockServer::start().await;
		mock_release(&server, "a/b", "v1").await;
		let service = service_with(&server).await;

		let err = service.add_repository(add("nope", None)).await.unwrap_err();
		assert!(matches!(err, ServiceError::Validation(_)));

		let mut missing_url = add("a/b", None);
		missing_url.url = "  ".to_string();
		let err = service.add_repository(missing_url).await.unwrap_err();
		assert!(matches!(err, ServiceError::Validation(_)));

		service.add_repository(add("a/b", None)).await.unwrap();
		let err = service.add_repository(add("a/b", None)).await.unwrap_err();
		assert!(matches!(err, ServiceError::Validation(_)));
		assert_eq!(service.list_repositories().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn pin_acknowledge_and_delete() {
		let server = MockServer::start().await;
		mock_release(&server, "a/b", "v3").await;
		let service = service_with(&server).await;
		let repo = service.add_repository(add("a/b", Some("v1"))).await.unwrap();

		let pinned = service.pin_version(repo.id, "v2").await.unwrap();
		assert_eq!(pinned.current_version, "v2");

		let acknowledged = service.pin_version(repo.id, "latest").await.unwrap();
		assert_eq!(acknowledged.current_version, "v3");
		assert!(!acknowledged.has_update());

		service.pin_version(repo.id, "v1").await.unwrap();
		let acknowledged = service.acknowledge_update(repo.id).await.unwrap();
		assert_eq!(acknowledged.current_version, "v3");

		let changelog = service.changelog(repo.id).await.unwrap();
		assert_eq!(changelog.version, "v3");
		assert_eq!(changelog.changelog, "notes for v3");

		service.delete_repository(repo.id).await.unwrap();
		assert!(matches!(
			service.delete_repository(repo.id).await,
			Err(ServiceError::NotFound(_))
		));
		assert!(matches!(
			service.changelog(repo.id).await,
			Err(ServiceError::NotFound(_))
		));
		assert!(matches!(
			service.pin_version(repo.id, "v1").await,
			Err(ServiceError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn settings_patch_validation() {
		let server = MockServer::start().await;
		let service = service_with(&server).await;

		let both = SettingsPatch {
			api_token: Some("ghp_x".to_string()),
			reset_token: true,
			..Default::default()
		};
		assert!(matches!(
			service.update_settings(both).await,
			Err(ServiceError::Validation(_))
		));

		let empty_theme = SettingsPatch {
			theme: Some(" ".to_string()),
			..Default::default()
		};
		assert!(matches!(
			service.update_settings(empty_theme).await,
			Err(ServiceError::Validation(_))
		));

		let bad_cron = SettingsPatch {
			theme: Some("dracula".to_string()),
			cron_expression: Some("every tuesday".to_string()),
			..Default::default()
		};
		assert!(matches!(
			service.update_settings(bad_cron).await,
			Err(ServiceError::Validation(_))
		));

		let view = service.settings().await.unwrap();
		assert_eq!(view.theme, "tokyoNight");
		assert_eq!(view.cron_expression, "0 */12 * * *");
		assert!(!view.token_configured);
		assert_eq!(view.last_scan, None);
	}

	#[tokio::test]
	async fn cron_update_replaces_running_schedule() {
		let server = MockServer::start().await;
		let service = service_with(&server).await;
		service.start_scheduler().await.unwrap();
		assert_eq!(service.scheduler().current_expression(), "0 */12 * * *");

		let view = service
			.update_settings(SettingsPatch {
				cron_expression: Some("*/5 * * * *".to_string()),
				..Default::default()
			})
			.await
			.unwrap();
		assert_eq!(view.cron_expression, "*/5 * * * *");
		assert_eq!(service.scheduler().current_expression(), "*/5 * * * *");
		assert_eq!(service.scheduler().current_handle().generation, 2);

		let times = service.scan_times().await.unwrap();
		assert_eq!(times.last, crate::scan_times::NO_SCAN_YET);
		assert_ne!(times.next, crate::scan_times::NOT_SCHEDULED);

		service.shutdown().await;
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn concurrent_cron_patches_keep_store_and_scheduler_in_step() {
		let server = MockServer::start().await;
		let service = Arc::new(service_with(&server).await);
		service.start_scheduler().await.unwrap();

		for round in 0..50 {
			let patch = |hour: u32| SettingsPatch {
				cron_expression: Some(format!("{round} {hour} * * *")),
				..Default::default()
			};
			let first = tokio::spawn({
				let service = Arc::clone(&service);
				let patch = patch(1);
				async move { service.update_settings(patch).await }
			});
			let second = tokio::spawn({
				let service = Arc::clone(&service);
				let patch = patch(2);
				async move { service.update_settings(patch).await }
			});
			first.await.unwrap().unwrap();
			second.await.unwrap().unwrap();

			let stored = service.settings().await.unwrap().cron_expression;
			assert_eq!(
				stored,
				service.scheduler().current_expression(),
				"round {round}"
			);
		}

		service.shutdown().await;
	}

	#[tokio::test]
	async fn empty_patch_returns_current_settings() {
		let server = MockServer::start().await;
		let service = service_with(&server).await;
		let before = service.settings().await.unwrap();
		let after = service
			.update_settings(SettingsPatch::default())
			.await
			.unwrap();
		assert_eq!(before, after);
	}

	#[tokio::test]
	async fn token_is_validated_stored_and_used() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/user"))
			.and(header("Authorization", "Bearer ghp_good"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"login": "octocat"})))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/user"))
			.respond_with(ResponseTemplate::new(401))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/repos/a/b/releases/latest"))
			.and(header("Authorization", "Bearer ghp_good"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"tag_name": "v9"})))
			.mount(&server)
			.await;
		let service = service_with(&server).await;

		let rejected = SettingsPatch {
			api_token: Some("ghp_bad".to_string()),
			..Default::default()
		};
		assert!(matches!(
			service.update_settings(rejected).await,
			Err(ServiceError::Validation(_))
		));
		assert!(!service.settings().await.unwrap().token_configured);

		let view = service
			.update_settings(SettingsPatch {
				api_token: Some("ghp_good".to_string()),
				..Default::default()
			})
			.await
			.unwrap();
		assert!(view.token_configured);

		// The release mock only answers authenticated requests.
		let repo = service.add_repository(add("a/b", None)).await.unwrap();
		assert_eq!(repo.latest_release, "v9");

		let view = service
			.update_settings(SettingsPatch {
				reset_token: true,
				..Default::default()
			})
			.await
			.unwrap();
		assert!(!view.token_configured);
	}

	#[tokio::test]
	async fn blocking_scan_notifies_new_release_once() {
		let server = MockServer::start().await;
		mock_release(&server, "a/b", "v1").await;
		let service = service_with(&server).await;
		service.add_repository(add("a/b", None)).await.unwrap();

		server.reset().await;
		mock_release(&server, "a/b", "v2").await;
		Mock::given(method("POST"))
			.and(path("/hook"))
			.respond_with(ResponseTemplate::new(204))
			.expect(1)
			.mount(&server)
			.await;
		service
			.update_notification_config(NotificationPatch {
				webhook_url: Some(format!("{}/hook", server.uri())),
				..Default::default()
			})
			.await
			.unwrap();

		let ScanReport::Completed(summary) = service.trigger_scan(ScanMode::Blocking).await.unwrap()
		else {
			panic!("blocking scan should complete");
		};
		assert_eq!(summary.kind, ScanKind::Manual);
		assert_eq!(summary.updated, 1);
		assert_eq!(summary.digest.len(), 1);
		assert_eq!(summary.notification, NotificationOutcome::Delivered);

		let ScanReport::Completed(again) = service.trigger_scan(ScanMode::Blocking).await.unwrap()
		else {
			panic!("blocking scan should complete");
		};
		assert!(again.digest.is_empty());
		assert_eq!(again.notification, NotificationOutcome::Skipped);

		let repo = &service.list_repositories().await.unwrap()[0];
		assert_eq!(repo.current_version, "v1");
		assert_eq!(repo.latest_release, "v2");
		assert!(service.scan_times().await.unwrap().last.starts_with("Today at"));
	}

	#[tokio::test]
	async fn background_scan_returns_run_id_and_completes() {
		let server = MockServer::start().await;
		let service = service_with(&server).await;

		let report = service.trigger_scan(ScanMode::Background).await.unwrap();
		assert!(matches!(report, ScanReport::Started { .. }));

		let mut last_scan = None;
		for _ in 0..100 {
			last_scan = service.settings().await.unwrap().last_scan;
			if last_scan.is_some() {
				break;
			}
			tokio::time::sleep(Duration::from_millis(20)).await;
		}
		assert!(last_scan.is_some());
	}

	#[tokio::test]
	async fn notification_config_validation_and_test_delivery() {
		let server = MockServer::start().await;
		let service = service_with(&server).await;

		let defaults = service.notification_config().await.unwrap();
		assert!(!defaults.is_enabled());
		assert_eq!(
			service.send_test_notification().await.unwrap(),
			DeliveryOutcome::Skipped
		);

		let bad_url = NotificationPatch {
			webhook_url: Some("ftp://example.com/hook".to_string()),
			..Default::default()
		};
		assert!(matches!(
			service.update_notification_config(bad_url).await,
			Err(ServiceError::Validation(_))
		));

		let blank_name = NotificationPatch {
			display_name: Some("".to_string()),
			..Default::default()
		};
		assert!(matches!(
			service.update_notification_config(blank_name).await,
			Err(ServiceError::Validation(_))
		));

		Mock::given(method("POST"))
			.and(path("/hook"))
			.respond_with(ResponseTemplate::new(500))
			.mount(&server)
			.await;
		service
			.update_notification_config(NotificationPatch {
				webhook_url: Some(format!("{}/hook", server.uri())),
				..Default::default()
			})
			.await
			.unwrap();
		assert!(matches!(
			service.send_test_notification().await,
			Err(ServiceError::Delivery(_))
		));
	}
}
