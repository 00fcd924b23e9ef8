// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Release surveillance server.
//!
//! Tracks GitHub repositories, detects new releases on a cron cadence and
//! posts a digest of newly observed releases to a Discord-compatible webhook.
//! [`SurveilService`] is the single entry point for every operation.

pub mod error;
pub mod jobs;
pub mod scan_times;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use surveil_server_config::ServerConfig;
use surveil_server_db::{
	NotificationRepository, NotificationStore, RepoRepository, SettingsDefaults,
	SettingsRepository,
};
use surveil_server_notify::WebhookNotifier;
use surveil_server_releases::GithubReleaseClient;

pub use error::{ServerError, ServiceError};
pub use scan_times::ScanTimes;
pub use service::{
	AddRepository, NotificationPatch, RepositoryChangelog, ScanMode, ScanReport, ServiceParts,
	SettingsPatch, SettingsView, SurveilService,
};

/// Wire the production collaborators over `pool`. Migrations must already have run.
pub async fn build_service(
	config: &ServerConfig,
	pool: SqlitePool,
) -> Result<SurveilService, ServerError> {
	let timezone = config.timezone();
	let notifications: Arc<dyn NotificationStore> =
		Arc::new(NotificationRepository::new(pool.clone()));

	let releases = GithubReleaseClient::new(
		config.github.api_base_url.clone(),
		Duration::from_secs(config.github.request_timeout_secs),
	)?;
	let notifier = WebhookNotifier::new(
		Arc::clone(&notifications),
		Duration::from_secs(config.notify.request_timeout_secs),
		timezone,
	)?;

	let parts = ServiceParts {
		repos: Arc::new(RepoRepository::new(pool.clone())),
		settings: Arc::new(SettingsRepository::new(pool)),
		notifications,
		releases: Arc::new(releases),
		notifier: Arc::new(notifier),
		timezone,
	};

	// The key is only used when the settings row is created for the first time.
	let defaults = SettingsDefaults {
		encryption_key: surveil_server_vault::generate_key(),
		cron_schedule: config.scan.default_cron.clone(),
		theme: config.scan.default_theme.clone(),
	};

	Ok(SurveilService::bootstrap(parts, defaults).await?)
}
