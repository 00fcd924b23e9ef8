// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use surveil_server_db::DbError;
use thiserror::Error;

/// Only storage failures abort a scan; fetch and delivery problems are absorbed.
#[derive(Debug, Error)]
pub enum ScanError {
	#[error("storage failure during scan: {0}")]
	Store(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, ScanError>;
