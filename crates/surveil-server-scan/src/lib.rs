// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The scan cycle.
//!
//! For every tracked repository, in order:
//!
//! 1. Fetch the latest release. A failed fetch skips the repository.
//! 2. A version different from `latest_release` refreshes `latest_release`,
//!    `last_updated` and `changelog`.
//! 3. A version different from `notified_version` adds one digest entry and
//!    moves `notified_version` forward.
//!
//! Mutated rows are written in one transaction, the digest is handed to the
//! notifier, and `last_scan` is stamped. `current_version` is never touched.

pub mod error;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use surveil_server_db::{RepoStore, SettingsStore, TrackedRepository};
use surveil_server_notify::{DeliveryOutcome, DigestEntry, Notifier, ScanKind};
use surveil_server_releases::ReleaseSource;
use surveil_server_vault::{open_token, AccessToken};
use uuid::Uuid;

pub use error::{Result, ScanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
	Delivered,
	Skipped,
	Failed,
}

impl From<DeliveryOutcome> for NotificationOutcome {
	fn from(outcome: DeliveryOutcome) -> Self {
		match outcome {
			DeliveryOutcome::Delivered => NotificationOutcome::Delivered,
			DeliveryOutcome::Skipped => NotificationOutcome::Skipped,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
	pub run_id: Uuid,
	pub kind: ScanKind,
	pub scanned: usize,
	/// Repositories whose fetch failed.
	pub skipped: usize,
	/// Rows written back to the store.
	pub updated: usize,
	pub digest: Vec<DigestEntry>,
	pub notification: NotificationOutcome,
	pub started_at: DateTime<Utc>,
	pub finished_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Scanner {
	repos: Arc<dyn RepoStore>,
	settings: Arc<dyn SettingsStore>,
	releases: Arc<dyn ReleaseSource>,
	notifier: Arc<dyn Notifier>,
}

impl Scanner {
	pub fn new(
		repos: Arc<dyn RepoStore>,
		settings: Arc<dyn SettingsStore>,
		releases: Arc<dyn ReleaseSource>,
		notifier: Arc<dyn Notifier>,
	) -> Self {
		Self {
			repos,
			settings,
			releases,
			notifier,
		}
	}

	/// Load the stored token and scan. An undecryptable token means an anonymous scan.
	pub async fn run(&self, kind: ScanKind) -> Result<ScanSummary> {
		self.run_as(Uuid::new_v4(), kind).await
	}

	/// [`Scanner::run`] under a caller-chosen run id.
	pub async fn run_as(&self, run_id: Uuid, kind: ScanKind) -> Result<ScanSummary> {
		let settings = self.settings.get_settings().await?;
		let token = open_token(
			settings.encrypted_token.as_deref(),
			&settings.encryption_key,
		);
		self.scan_as(run_id, token.as_ref(), kind).await
	}

	pub async fn scan(&self, token: Option<&AccessToken>, kind: ScanKind) -> Result<ScanSummary> {
		self.scan_as(Uuid::new_v4(), token, kind).await
	}

	#[tracing::instrument(skip(self, token), fields(scan_kind = %kind, authenticated = token.is_some()))]
	pub async fn scan_as(
		&self,
		run_id: Uuid,
		token: Option<&AccessToken>,
		kind: ScanKind,
	) -> Result<ScanSummary> {
		let started_at = Utc::now();
		tracing::info!("scan started");

		let repositories = self.repos.list_repositories().await?;
		let scanned = repositories.len();
		let mut skipped = 0;
		let mut changed = Vec::new();
		let mut digest = Vec::new();

		for mut repo in repositories {
			let Some(release) = self.releases.latest_release(&repo.name, token).await else {
				skipped += 1;
				continue;
			};

			let diff = apply_release(&mut repo, &release.version, &release.published, &release.changelog);
			if let Some(entry) = diff.entry {
				tracing::info!(repo = %repo.name, %entry, "new release detected");
				digest.push(entry);
			}
			if diff.mutated {
				changed.push(repo);
			}
		}

		let updated = self.repos.save_scan_results(&changed).await? as usize;

		let notification = if digest.is_empty() {
			NotificationOutcome::Skipped
		} else {
			match self.notifier.notify(&digest, kind).await {
				Ok(outcome) => outcome.into(),
				Err(e) => {
					tracing::warn!(%run_id, error = %e, "digest delivery failed");
					NotificationOutcome::Failed
				}
			}
		};

		let finished_at = Utc::now();
		self.settings.record_scan(finished_at).await?;

		tracing::info!(
			%run_id,
			scanned,
			skipped,
			updated,
			entries = digest.len(),
			"scan completed"
		);

		Ok(ScanSummary {
			run_id,
			kind,
			scanned,
			skipped,
			updated,
			digest,
			notification,
			started_at,
			finished_at,
		})
	}
}

/// Result of folding one fetched release into a repository row.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReleaseDiff {
	/// The row needs to be written back.
	pub mutated: bool,
	pub entry: Option<DigestEntry>,
}

/// Fold a fetched release into `repo`.
///
/// The release fields and the notification marker are compared independently,
/// so a row whose `latest_release` was already current can still owe a
/// notification.
pub fn apply_release(
	repo: &mut TrackedRepository,
	version: &str,
	published: &str,
	changelog: &str,
) -> ReleaseDiff {
	// A release already recorded but never announced is reported from the
	// last announced version.
	let previous = if version == repo.latest_release {
		repo.notified_version.clone()
	} else {
		repo.latest_release.clone()
	};
	let mut diff = ReleaseDiff::default();

	if version != repo.latest_release {
		repo.latest_release = version.to_string();
		repo.last_updated = published.to_string();
		repo.changelog = changelog.to_string();
		diff.mutated = true;
	}

	if version != repo.notified_version {
		repo.notified_version = version.to_string();
		diff.mutated = true;
		diff.entry = Some(DigestEntry {
			name: repo.name.clone(),
			url: repo.url.clone(),
			previous,
			current: version.to_string(),
		});
	}

	diff
}
