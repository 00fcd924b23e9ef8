// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Singleton webhook notification settings row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{parse_timestamp, DbError, Result};

pub const DEFAULT_DISPLAY_NAME: &str = "Surveillance Bot";
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "{count} repository update(s) found by {scan_type} scan";

/// Deserializes through [`FromStr`](std::str::FromStr), so `@here` style
/// values and an empty string are accepted as well as the canonical names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum PingMode {
	#[default]
	None,
	Everyone,
	Here,
}

impl PingMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			PingMode::None => "none",
			PingMode::Everyone => "everyone",
			PingMode::Here => "here",
		}
	}

	/// Text placed in front of the message content.
	pub fn prefix(&self) -> &'static str {
		match self {
			PingMode::None => "",
			PingMode::Everyone => "@everyone ",
			PingMode::Here => "@here ",
		}
	}
}

impl std::str::FromStr for PingMode {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"none" | "" => Ok(PingMode::None),
			"everyone" | "@everyone" => Ok(PingMode::Everyone),
			"here" | "@here" => Ok(PingMode::Here),
			_ => Err(format!("unknown ping mode: {s}")),
		}
	}
}

impl TryFrom<String> for PingMode {
	type Error = String;

	fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
		value.trim().parse()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationSettings {
	/// Empty disables delivery.
	pub webhook_url: String,
	pub display_name: String,
	pub avatar_url: String,
	pub message_template: String,
	pub ping_mode: PingMode,
	pub updated_at: DateTime<Utc>,
}

impl NotificationSettings {
	pub fn is_enabled(&self) -> bool {
		!self.webhook_url.trim().is_empty()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationUpdate {
	pub webhook_url: Option<String>,
	pub display_name: Option<String>,
	pub avatar_url: Option<String>,
	pub message_template: Option<String>,
	pub ping_mode: Option<PingMode>,
}

type NotificationRow = (String, String, String, String, String, String);

#[derive(Clone)]
pub struct NotificationRepository {
	pool: SqlitePool,
}

impl NotificationRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self))]
	pub async fn ensure_notification_settings(&self) -> Result<NotificationSettings> {
		let result = sqlx::query(
			r#"
			INSERT OR IGNORE INTO notification_settings (id, webhook_url, display_name, avatar_url, message_template, ping_mode, updated_at)
			VALUES (1, '', ?, '', ?, 'none', ?)
			"#,
		)
		.bind(DEFAULT_DISPLAY_NAME)
		.bind(DEFAULT_MESSAGE_TEMPLATE)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() > 0 {
			tracing::info!("created default notification settings");
		}

		self.get_notification_settings().await
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_notification_settings(&self) -> Result<NotificationSettings> {
		let (webhook_url, display_name, avatar_url, message_template, ping_mode, updated_at) =
			sqlx::query_as::<_, NotificationRow>(
				"SELECT webhook_url, display_name, avatar_url, message_template, ping_mode, updated_at FROM notification_settings WHERE id = 1",
			)
			.fetch_optional(&self.pool)
			.await?
			.ok_or_else(|| DbError::NotFound("notification settings".to_string()))?;

		Ok(NotificationSettings {
			webhook_url,
			display_name,
			avatar_url,
			message_template,
			ping_mode: ping_mode.parse().map_err(DbError::Internal)?,
			updated_at: parse_timestamp("updated_at", &updated_at)?,
		})
	}

	#[tracing::instrument(skip(self, update))]
	pub async fn update_notification_settings(
		&self,
		update: &NotificationUpdate,
	) -> Result<NotificationSettings> {
		let current = self.get_notification_settings().await?;

		sqlx::query(
			r#"
			UPDATE notification_settings
			SET webhook_url = ?, display_name = ?, avatar_url = ?, message_template = ?, ping_mode = ?, updated_at = ?
			WHERE id = 1
			"#,
		)
		.bind(update.webhook_url.as_ref().unwrap_or(&current.webhook_url))
		.bind(update.display_name.as_ref().unwrap_or(&current.display_name))
		.bind(update.avatar_url.as_ref().unwrap_or(&current.avatar_url))
		.bind(
			update
				.message_template
				.as_ref()
				.unwrap_or(&current.message_template),
		)
		.bind(update.ping_mode.unwrap_or(current.ping_mode).as_str())
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		self.get_notification_settings().await
	}
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
	async fn ensure_notification_settings(&self) -> Result<NotificationSettings>;
	async fn get_notification_settings(&self) -> Result<NotificationSettings>;
	async fn update_notification_settings(
		&self,
		update: &NotificationUpdate,
	) -> Result<NotificationSettings>;
}

#[async_trait]
impl NotificationStore for NotificationRepository {
	async fn ensure_notification_settings(&self) -> Result<NotificationSettings> {
		self.ensure_notification_settings().await
	}

	async fn get_notification_settings(&self) -> Result<NotificationSettings> {
		self.get_notification_settings().await
	}

	async fn update_notification_settings(
		&self,
		update: &NotificationUpdate,
	) -> Result<NotificationSettings> {
		self.update_notification_settings(update).await
	}
}
