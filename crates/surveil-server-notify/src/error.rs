// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use surveil_server_db::DbError;
use thiserror::Error;

/// Webhook delivery failure. Callers log it; it never fails a scan.
#[derive(Debug, Error)]
pub enum DeliveryError {
	#[error("webhook request failed: {0}")]
	HttpRequest(#[from] reqwest::Error),

	#[error("webhook returned status {status}")]
	Status { status: u16 },

	#[error("could not load notification settings: {0}")]
	Settings(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
