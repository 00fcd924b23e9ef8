// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Release digests delivered to a Discord-compatible webhook.

pub mod digest;
pub mod error;
pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;

pub use digest::{render_template, sample_entry, DigestEntry, ScanKind};
pub use error::{DeliveryError, Result};
pub use webhook::{build_payload, footer_time, WebhookNotifier, WebhookPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
	Delivered,
	/// No webhook configured, or nothing to send.
	Skipped,
}

#[async_trait]
pub trait Notifier: Send + Sync {
	/// Deliver a digest. An empty digest is skipped without touching the network.
	async fn notify(&self, digest: &[DigestEntry], kind: ScanKind) -> Result<DeliveryOutcome>;

	/// Deliver a synthetic one-line digest labelled as a test.
	async fn send_test(&self) -> Result<DeliveryOutcome>;
}
