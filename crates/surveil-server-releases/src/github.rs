// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub REST client for `releases/latest` and token validation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use surveil_server_vault::AccessToken;

use crate::error::{ReleaseError, Result};
use crate::{ReleaseInfo, ReleaseSource};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Display format for release publish dates, e.g. `Jan 02 2006`.
pub const PUBLISHED_FORMAT: &str = "%b %d %Y";

#[derive(Debug, Deserialize)]
struct GithubRelease {
	#[serde(default)]
	tag_name: String,
	#[serde(default)]
	published_at: Option<String>,
	#[serde(default)]
	body: Option<String>,
}

#[derive(Clone)]
pub struct GithubReleaseClient {
	api_base: String,
	http_client: Client,
}

impl GithubReleaseClient {
	pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self> {
		let api_base = api_base.into().trim_end_matches('/').to_string();
		let http_client = surveil_common_http::client_with_timeout(timeout)?;
		Ok(Self {
			api_base,
			http_client,
		})
	}

	fn get(&self, path: &str, token: Option<&AccessToken>) -> RequestBuilder {
		let request = self
			.http_client
			.get(format!("{}{path}", self.api_base))
			.header("Accept", "application/vnd.github+json")
			.header("X-GitHub-Api-Version", "2022-11-28");

		match token {
			Some(token) => request.header("Authorization", format!("Bearer {}", token.expose())),
			None => request,
		}
	}

	async fn fetch_latest(&self, repo: &str, token: Option<&AccessToken>) -> Result<GithubRelease> {
		let response = self
			.get(&format!("/repos/{repo}/releases/latest"), token)
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(ReleaseError::Status {
				status: status.as_u16(),
			});
		}

		Ok(response.json().await?)
	}
}

/// Render an RFC 3339 timestamp as `Jan 02 2006`, keeping the raw text if it does not parse.
pub fn format_published(raw: &str) -> String {
	match DateTime::parse_from_rfc3339(raw) {
		Ok(dt) => dt.format(PUBLISHED_FORMAT).to_string(),
		Err(_) => raw.to_string(),
	}
}

#[async_trait]
impl ReleaseSource for GithubReleaseClient {
	#[tracing::instrument(skip(self, token), fields(authenticated = token.is_some()))]
	async fn latest_release(&self, repo: &str, token: Option<&AccessToken>) -> Option<ReleaseInfo> {
		let release = match self.fetch_latest(repo, token).await {
			Ok(release) => release,
			Err(e) => {
				tracing::warn!(repo, error = %e, "failed to fetch latest release");
				return None;
			}
		};

		if release.tag_name.trim().is_empty() {
			tracing::warn!(repo, "latest release has no tag name");
			return None;
		}

		Some(ReleaseInfo {
			version: release.tag_name,
			published: release
				.published_at
				.as_deref()
				.map(format_published)
				.unwrap_or_default(),
			changelog: release.body.unwrap_or_default(),
		})
	}

	#[tracing::instrument(skip(self, token))]
	async fn validate_token(&self, token: &str) -> Result<()> {
		let Some(token) = AccessToken::new(token) else {
			return Ok(());
		};

		let response = self.get("/user", Some(&token)).send().await?;
		let status = response.status();
		if !status.is_success() {
			tracing::debug!(status = status.as_u16(), "token rejected by GitHub");
			return Err(ReleaseError::Status {
				status: status.as_u16(),
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{header, header_exists, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client(server: &MockServer) -> GithubReleaseClient {
		GithubReleaseClient::new(server.uri(), Duration::from_secs(2)).unwrap()
	}

	#[test]
	fn published_dates_are_formatted() {
		assert_eq!(format_published("2006-01-02T15:04:05Z"), "Jan 02 2006");
		assert_eq!(format_published("yesterday"), "yesterday");
	}

	#[tokio::test]
	async fn latest_release_is_normalized() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/repos/tokio-rs/tokio/releases/latest"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"tag_name": "tokio-1.40.0",
				"published_at": "2024-08-30T12:00:00Z",
				"body": "## Fixed\n- things"
			})))
			.mount(&server)
			.await;

		let release = client(&server)
			.latest_release("tokio-rs/tokio", None)
			.await
			.unwrap();
		assert_eq!(release.version, "tokio-1.40.0");
		assert_eq!(release.published, "Aug 30 2024");
		assert_eq!(release.changelog, "## Fixed\n- things");
	}

	#[tokio::test]
	async fn token_is_sent_as_bearer() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/repos/a/b/releases/latest"))
			.and(header("Authorization", "Bearer ghp_secret"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"tag_name": "v1.0.0"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let token = AccessToken::new("ghp_secret").unwrap();
		let release = client(&server).latest_release("a/b", Some(&token)).await;
		assert_eq!(release.unwrap().version, "v1.0.0");
	}

	#[tokio::test]
	async fn anonymous_requests_carry_no_authorization() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(header_exists("Authorization"))
			.respond_with(ResponseTemplate::new(401))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/repos/a/b/releases/latest"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"tag_name": "v2"
			})))
			.mount(&server)
			.await;

		let release = client(&server).latest_release("a/b", None).await;
		assert_eq!(release.unwrap().version, "v2");
	}

	#[tokio::test]
	async fn soft_failures_return_none() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/repos/missing/repo/releases/latest"))
			.respond_with(ResponseTemplate::new(404))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/repos/garbled/repo/releases/latest"))
			.respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/repos/untagged/repo/releases/latest"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"tag_name": ""
			})))
			.mount(&server)
			.await;

		let client = client(&server);
		assert!(client.latest_release("missing/repo", None).await.is_none());
		assert!(client.latest_release("garbled/repo", None).await.is_none());
		assert!(client.latest_release("untagged/repo", None).await.is_none());
	}

	#[tokio::test]
	async fn timeout_returns_none() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(serde_json::json!({ "tag_name": "v1" }))
					.set_delay(Duration::from_secs(5)),
			)
			.mount(&server)
			.await;

		let client = GithubReleaseClient::new(server.uri(), Duration::from_millis(200)).unwrap();
		assert!(client.latest_release("slow/repo", None).await.is_none());
	}

	#[tokio::test]
	async fn validate_token_checks_user_endpoint() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/user"))
			.and(header("Authorization", "Bearer good"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"login": "octocat"
			})))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/user"))
			.and(header("Authorization", "Bearer bad"))
			.respond_with(ResponseTemplate::new(401))
			.mount(&server)
			.await;

		let client = client(&server);
		assert!(client.validate_token("good").await.is_ok());
		assert!(matches!(
			client.validate_token("bad").await,
			Err(ReleaseError::Status { status: 401 })
		));
	}

	#[tokio::test]
	async fn empty_token_is_valid_without_request() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(500))
			.expect(0)
			.mount(&server)
			.await;

		assert!(client(&server).validate_token("").await.is_ok());
	}
}
