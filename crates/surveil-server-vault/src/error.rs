// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
	#[error("invalid encryption key: {0}")]
	InvalidKey(String),

	#[error("{0} must not be empty")]
	EmptyInput(&'static str),

	#[error("crypto failure: {0}")]
	Crypto(String),
}

impl VaultError {
	/// Errors caused by bad caller input rather than a failed cipher operation.
	pub fn is_validation(&self) -> bool {
		matches!(self, VaultError::InvalidKey(_) | VaultError::EmptyInput(_))
	}
}

pub type VaultResult<T> = std::result::Result<T, VaultError>;
