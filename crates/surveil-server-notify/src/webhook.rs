// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Discord-compatible webhook delivery.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Serialize;
use surveil_server_db::{NotificationSettings, NotificationStore};

use crate::digest::{render_description, render_template, sample_entry, DigestEntry, ScanKind};
use crate::error::{DeliveryError, Result};
use crate::{DeliveryOutcome, Notifier};

pub const EMBED_TITLE: &str = "Repository Updates Available";
pub const EMBED_COLOR: u32 = 3447003;
pub const EMBED_AUTHOR: &str = "Surveillance";

#[derive(Debug, Serialize)]
pub struct WebhookPayload {
	pub username: String,
	#[serde(skip_serializing_if = "String::is_empty")]
	pub avatar_url: String,
	pub content: String,
	pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
	pub title: String,
	pub color: u32,
	pub description: String,
	pub footer: EmbedFooter,
	pub author: EmbedAuthor,
}

#[derive(Debug, Serialize)]
pub struct EmbedFooter {
	pub text: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedAuthor {
	pub name: String,
	#[serde(skip_serializing_if = "String::is_empty")]
	pub icon_url: String,
}

/// Footer clock, e.g. `Today at 3:04 PM`, in the configured timezone.
pub fn footer_time(now: DateTime<Utc>, tz: Tz) -> String {
	now.with_timezone(&tz).format("Today at %-I:%M %p").to_string()
}

/// Build the payload for `digest` from the stored settings.
pub fn build_payload(
	settings: &NotificationSettings,
	digest: &[DigestEntry],
	kind: ScanKind,
	time: &str,
) -> WebhookPayload {
	let message = render_template(&settings.message_template, digest.len(), kind);
	WebhookPayload {
		username: settings.display_name.clone(),
		avatar_url: settings.avatar_url.clone(),
		content: format!("{}{}", settings.ping_mode.prefix(), message),
		embeds: vec![Embed {
			title: EMBED_TITLE.to_string(),
			color: EMBED_COLOR,
			description: render_description(digest),
			footer: EmbedFooter {
				text: format!("{} • {}", kind.label(), time),
			},
			author: EmbedAuthor {
				name: EMBED_AUTHOR.to_string(),
				icon_url: settings.avatar_url.clone(),
			},
		}],
	}
}

pub struct WebhookNotifier {
	store: Arc<dyn NotificationStore>,
	http_client: Client,
	timezone: Tz,
}

impl WebhookNotifier {
	pub fn new(
		store: Arc<dyn NotificationStore>,
		timeout: Duration,
		timezone: Tz,
	) -> Result<Self> {
		Ok(Self {
			store,
			http_client: surveil_common_http::client_with_timeout(timeout)?,
			timezone,
		})
	}

	async fn deliver(&self, digest: &[DigestEntry], kind: ScanKind) -> Result<DeliveryOutcome> {
		let settings = self.store.get_notification_settings().await?;
		if !settings.is_enabled() {
			tracing::info!("no webhook URL configured; skipping notification");
			return Ok(DeliveryOutcome::Skipped);
		}

		let payload = build_payload(
			&settings,
			digest,
			kind,
			&footer_time(Utc::now(), self.timezone),
		);

		let response = self
			.http_client
			.post(settings.webhook_url.trim())
			.json(&payload)
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(DeliveryError::Status {
				status: status.as_u16(),
			});
		}

		tracing::info!(entries = digest.len(), scan_kind = %kind, "webhook notification delivered");
		Ok(DeliveryOutcome::Delivered)
	}
}

#[async_trait]
impl Notifier for WebhookNotifier {
	#[tracing::instrument(skip(self, digest), fields(entries = digest.len()))]
	async fn notify(&self, digest: &[DigestEntry], kind: ScanKind) -> Result<DeliveryOutcome> {
		if digest.is_empty() {
			return Ok(DeliveryOutcome::Skipped);
		}
		self.deliver(digest, kind).await
	}

	#[tracing::instrument(skip(self))]
	async fn send_test(&self) -> Result<DeliveryOutcome> {
		self.deliver(&[sample_entry()], ScanKind::Test).await
	}
}
