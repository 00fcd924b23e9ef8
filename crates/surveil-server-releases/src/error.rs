// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReleaseError {
	/// The HTTP request failed (network error, timeout, etc.).
	#[error("HTTP request failed: {0}")]
	HttpRequest(#[from] reqwest::Error),

	/// GitHub answered with a non-success status.
	#[error("GitHub API returned status {status}")]
	Status { status: u16 },
}

pub type Result<T> = std::result::Result<T, ReleaseError>;
