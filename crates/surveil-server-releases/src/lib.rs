// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Release lookups for tracked repositories.
//!
//! [`ReleaseSource::latest_release`] never fails: transport errors, bad
//! statuses, undecodable bodies and untagged releases are logged and
//! reported as `None` so a scan can skip the repository and move on.

pub mod error;
pub mod github;

use async_trait::async_trait;
use serde::Serialize;
use surveil_server_vault::AccessToken;

pub use error::{ReleaseError, Result};
pub use github::{format_published, GithubReleaseClient, DEFAULT_API_BASE};

/// Normalized latest release of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseInfo {
	/// Release tag, e.g. `v1.2.3`.
	pub version: String,
	/// Publish date formatted for display.
	pub published: String,
	pub changelog: String,
}

#[async_trait]
pub trait ReleaseSource: Send + Sync {
	/// Latest release of `repo` (`owner/name`), or `None` on any failure.
	async fn latest_release(&self, repo: &str, token: Option<&AccessToken>) -> Option<ReleaseInfo>;

	/// An empty token is valid (unauthenticated mode).
	async fn validate_token(&self, token: &str) -> Result<()>;
}
