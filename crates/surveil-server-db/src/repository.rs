// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracked repositories and their observed release state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{parse_timestamp, DbError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedRepository {
	pub id: i64,
	/// `owner/repo`, also used as the release lookup key.
	pub name: String,
	pub url: String,
	/// Version the user has acknowledged. Scans never touch it.
	pub current_version: String,
	pub latest_release: String,
	/// Last version a digest entry was composed for.
	pub notified_version: String,
	/// Release publish date, already formatted for display.
	pub last_updated: String,
	pub changelog: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl TrackedRepository {
	/// A newer release has been observed than the acknowledged one.
	pub fn has_update(&self) -> bool {
		!self.latest_release.is_empty() && self.latest_release != self.current_version
	}
}

#[derive(Debug, Clone)]
pub struct NewRepository {
	pub name: String,
	pub url: String,
	pub current_version: String,
	pub latest_release: String,
	pub notified_version: String,
	pub last_updated: String,
	pub changelog: String,
}

type RepositoryRow = (
	i64,
	String,
	String,
	String,
	String,
	String,
	String,
	String,
	String,
	String,
);

const SELECT_COLUMNS: &str = "SELECT id, name, url, current_version, latest_release, notified_version, last_updated, changelog, created_at, updated_at FROM repositories";

fn from_row(row: RepositoryRow) -> Result<TrackedRepository> {
	let (
		id,
		name,
		url,
		current_version,
		latest_release,
		notified_version,
		last_updated,
		changelog,
		created_at,
		updated_at,
	) = row;

	Ok(TrackedRepository {
		id,
		name,
		url,
		current_version,
		latest_release,
		notified_version,
		last_updated,
		changelog,
		created_at: parse_timestamp("created_at", &created_at)?,
		updated_at: parse_timestamp("updated_at", &updated_at)?,
	})
}

#[derive(Clone)]
pub struct RepoRepository {
	pool: SqlitePool,
}

impl RepoRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, repo), fields(name = %repo.name))]
	pub async fn create_repository(&self, repo: &NewRepository) -> Result<TrackedRepository> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			INSERT INTO repositories (name, url, current_version, latest_release, notified_version, last_updated, changelog, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(&repo.name)
		.bind(&repo.url)
		.bind(&repo.current_version)
		.bind(&repo.latest_release)
		.bind(&repo.notified_version)
		.bind(&repo.last_updated)
		.bind(&repo.changelog)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict(format!("repository {} is already tracked", repo.url))
			}
			_ => DbError::Sqlx(e),
		})?;

		let id = result.last_insert_rowid();
		self
			.get_repository(id)
			.await?
			.ok_or_else(|| DbError::Internal(format!("repository {id} vanished after insert")))
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_repository(&self, id: i64) -> Result<Option<TrackedRepository>> {
		let row = sqlx::query_as::<_, RepositoryRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		row.map(from_row).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_repositories(&self) -> Result<Vec<TrackedRepository>> {
		let rows = sqlx::query_as::<_, RepositoryRow>(&format!("{SELECT_COLUMNS} ORDER BY id"))
			.fetch_all(&self.pool)
			.await?;

		rows.into_iter().map(from_row).collect()
	}

	#[tracing::instrument(skip(self))]
	pub async fn update_current_version(
		&self,
		id: i64,
		version: &str,
	) -> Result<TrackedRepository> {
		let result =
			sqlx::query("UPDATE repositories SET current_version = ?, updated_at = ? WHERE id = ?")
				.bind(version)
				.bind(Utc::now().to_rfc3339())
				.bind(id)
				.execute(&self.pool)
				.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("repository {id}")));
		}

		self
			.get_repository(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("repository {id}")))
	}

	/// Sets `current_version` to the stored `latest_release` in one statement.
	#[tracing::instrument(skip(self))]
	pub async fn acknowledge_latest(&self, id: i64) -> Result<TrackedRepository> {
		let result = sqlx::query(
			"UPDATE repositories SET current_version = latest_release, updated_at = ? WHERE id = ?",
		)
		.bind(Utc::now().to_rfc3339())
		.bind(id)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("repository {id}")));
		}

		self
			.get_repository(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("repository {id}")))
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete_repository(&self, id: i64) -> Result<bool> {
		let result = sqlx::query("DELETE FROM repositories WHERE id = ?")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Persist the release fields of every given row in a single transaction.
	///
	/// Only `latest_release`, `notified_version`, `last_updated` and `changelog`
	/// are written. Rows deleted since they were read are ignored.
	#[tracing::instrument(skip(self, repos), fields(count = repos.len()))]
	pub async fn save_scan_results(&self, repos: &[TrackedRepository]) -> Result<u64> {
		if repos.is_empty() {
			return Ok(0);
		}

		let now = Utc::now().to_rfc3339();
		let mut tx = self.pool.begin().await?;
		let mut written = 0;

		for repo in repos {
			let result = sqlx::query(
				r#"
				UPDATE repositories
				SET latest_release = ?, notified_version = ?, last_updated = ?, changelog = ?, updated_at = ?
				WHERE id = ?
				"#,
			)
			.bind(&repo.latest_release)
			.bind(&repo.notified_version)
			.bind(&repo.last_updated)
			.bind(&repo.changelog)
			.bind(&now)
			.bind(repo.id)
			.execute(&mut *tx)
			.await?;
			written += result.rows_affected();
		}

		tx.commit().await?;
		tracing::debug!(written, "scan results saved");
		Ok(written)
	}
}

#[async_trait]
pub trait RepoStore: Send + Sync {
	async fn create_repository(&self, repo: &NewRepository) -> Result<TrackedRepository>;
	async fn get_repository(&self, id: i64) -> Result<Option<TrackedRepository>>;
	async fn list_repositories(&self) -> Result<Vec<TrackedRepository>>;
	async fn update_current_version(&self, id: i64, version: &str) -> Result<TrackedRepository>;
	async fn acknowledge_latest(&self, id: i64) -> Result<TrackedRepository>;
	async fn delete_repository(&self, id: i64) -> Result<bool>;
	async fn save_scan_results(&self, repos: &[TrackedRepository]) -> Result<u64>;
}

#[async_trait]
impl RepoStore for RepoRepository {
	async fn create_repository(&self, repo: &NewRepository) -> Result<TrackedRepository> {
		self.create_repository(repo).await
	}

	async fn get_repository(&self, id: i64) -> Result<Option<TrackedRepository>> {
		self.get_repository(id).await
	}

	async fn list_repositories(&self) -> Result<Vec<TrackedRepository>> {
		self.list_repositories().await
	}

	async fn update_current_version(&self, id: i64, version: &str) -> Result<TrackedRepository> {
		self.update_current_version(id, version).await
	}

	async fn acknowledge_latest(&self, id: i64) -> Result<TrackedRepository> {
		self.acknowledge_latest(id).await
	}

	async fn delete_repository(&self, id: i64) -> Result<bool> {
		self.delete_repository(id).await
	}

	async fn save_scan_results(&self, repos: &[TrackedRepository]) -> Result<u64> {
		self.save_scan_results(repos).await
	}
}
