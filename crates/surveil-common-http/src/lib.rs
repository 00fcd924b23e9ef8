// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client construction for surveil.
//!
//! Every outbound call (release source, token validation, webhook delivery)
//! goes through a client built here so the User-Agent and the per-request
//! timeout are applied consistently.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Default upper bound for a single outbound request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates a new HTTP client builder with the standard surveil User-Agent.
///
/// GitHub rejects API requests without a User-Agent, so callers that need
/// extra customisation should start from this builder rather than
/// `reqwest::Client::builder()`.
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Builds a client with the given per-request timeout.
pub fn client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	builder().timeout(timeout).build()
}

/// Returns the standard surveil User-Agent string.
///
/// Format: `surveil/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"surveil/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
