// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Singleton scan settings row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{parse_timestamp, DbError, Result};

#[derive(Clone, PartialEq, Eq)]
pub struct ScanSettings {
	/// Base64-encoded 32-byte key protecting `encrypted_token`.
	pub encryption_key: String,
	pub encrypted_token: Option<String>,
	pub cron_schedule: String,
	pub theme: String,
	pub last_scan: Option<DateTime<Utc>>,
	pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for ScanSettings {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ScanSettings")
			.field("encryption_key", &"[REDACTED]")
			.field("token_configured", &self.encrypted_token.is_some())
			.field("cron_schedule", &self.cron_schedule)
			.field("theme", &self.theme)
			.field("last_scan", &self.last_scan)
			.field("updated_at", &self.updated_at)
			.finish()
	}
}

/// Values used only when the settings row does not exist yet.
#[derive(Clone)]
pub struct SettingsDefaults {
	pub encryption_key: String,
	pub cron_schedule: String,
	pub theme: String,
}

/// Partial update. `None` leaves a field unchanged; `encrypted_token: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
	pub theme: Option<String>,
	pub cron_schedule: Option<String>,
	pub encrypted_token: Option<Option<String>>,
}

impl SettingsUpdate {
	pub fn is_empty(&self) -> bool {
		self.theme.is_none() && self.cron_schedule.is_none() && self.encrypted_token.is_none()
	}
}

type SettingsRow = (String, Option<String>, String, String, Option<String>, String);

#[derive(Clone)]
pub struct SettingsRepository {
	pool: SqlitePool,
}

impl SettingsRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert the settings row if missing, then return the stored row.
	#[tracing::instrument(skip(self, defaults))]
	pub async fn ensure_settings(&self, defaults: &SettingsDefaults) -> Result<ScanSettings> {
		let result = sqlx::query(
			r#"
			INSERT OR IGNORE INTO settings (id, encryption_key, github_token, cron_schedule, theme, last_scan, updated_at)
			VALUES (1, ?, NULL, ?, ?, NULL, ?)
			"#,
		)
		.bind(&defaults.encryption_key)
		.bind(&defaults.cron_schedule)
		.bind(&defaults.theme)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() > 0 {
			tracing::info!("created default scan settings");
		}

		self.get_settings().await
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_settings(&self) -> Result<ScanSettings> {
		let row = sqlx::query_as::<_, SettingsRow>(
			"SELECT encryption_key, github_token, cron_schedule, theme, last_scan, updated_at FROM settings WHERE id = 1",
		)
		.fetch_optional(&self.pool)
		.await?
		.ok_or_else(|| DbError::NotFound("settings".to_string()))?;

		let (encryption_key, encrypted_token, cron_schedule, theme, last_scan, updated_at) = row;
		Ok(ScanSettings {
			encryption_key,
			encrypted_token,
			cron_schedule,
			theme,
			last_scan: last_scan
				.as_deref()
				.map(|v| parse_timestamp("last_scan", v))
				.transpose()?,
			updated_at: parse_timestamp("updated_at", &updated_at)?,
		})
	}

	#[tracing::instrument(skip(self, update))]
	pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<ScanSettings> {
		let mut tx = self.pool.begin().await?;
		let now = Utc::now().to_rfc3339();

		if let Some(theme) = &update.theme {
			sqlx::query("UPDATE settings SET theme = ?, updated_at = ? WHERE id = 1")
				.bind(theme)
				.bind(&now)
				.execute(&mut *tx)
				.await?;
		}
		if let Some(cron) = &update.cron_schedule {
			sqlx::query("UPDATE settings SET cron_schedule = ?, updated_at = ? WHERE id = 1")
				.bind(cron)
				.bind(&now)
				.execute(&mut *tx)
				.await?;
		}
		if let Some(token) = &update.encrypted_token {
			sqlx::query("UPDATE settings SET github_token = ?, updated_at = ? WHERE id = 1")
				.bind(token)
				.bind(&now)
				.execute(&mut *tx)
				.await?;
		}

		tx.commit().await?;
		self.get_settings().await
	}

	#[tracing::instrument(skip(self))]
	pub async fn record_scan(&self, at: DateTime<Utc>) -> Result<()> {
		let result = sqlx::query("UPDATE settings SET last_scan = ? WHERE id = 1")
			.bind(at.to_rfc3339())
			.execute(&self.pool)
			.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound("settings".to_string()));
		}
		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_last_scan(&self) -> Result<Option<DateTime<Utc>>> {
		let row: Option<(Option<String>,)> =
			sqlx::query_as("SELECT last_scan FROM settings WHERE id = 1")
				.fetch_optional(&self.pool)
				.await?;

		match row.and_then(|(v,)| v) {
			Some(v) => parse_timestamp("last_scan", &v).map(Some),
			None => Ok(None),
		}
	}
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
	async fn ensure_settings(&self, defaults: &SettingsDefaults) -> Result<ScanSettings>;
	async fn get_settings(&self) -> Result<ScanSettings>;
	async fn update_settings(&self, update: &SettingsUpdate) -> Result<ScanSettings>;
	async fn record_scan(&self, at: DateTime<Utc>) -> Result<()>;
	async fn get_last_scan(&self) -> Result<Option<DateTime<Utc>>>;
}

#[async_trait]
impl SettingsStore for SettingsRepository {
	async fn ensure_settings(&self, defaults: &SettingsDefaults) -> Result<ScanSettings> {
		self.ensure_settings(defaults).await
	}

	async fn get_settings(&self) -> Result<ScanSettings> {
		self.get_settings().await
	}

	async fn update_settings(&self, update: &SettingsUpdate) -> Result<ScanSettings> {
		self.update_settings(update).await
	}

	async fn record_scan(&self, at: DateTime<Utc>) -> Result<()> {
		self.record_scan(at).await
	}

	async fn get_last_scan(&self) -> Result<Option<DateTime<Utc>>> {
		self.get_last_scan().await
	}
}
