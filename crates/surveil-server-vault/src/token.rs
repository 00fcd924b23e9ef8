// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for the plaintext access token.

use std::fmt;
use zeroize::Zeroize;

pub const REDACTED: &str = "[REDACTED]";

/// Plaintext GitHub token. Debug and Display never show the value and the
/// memory is zeroed on drop. Use [`AccessToken::expose`] at the one place the
/// header is built.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct AccessToken {
	inner: String,
}

impl AccessToken {
	/// Returns `None` for an empty or whitespace-only token.
	pub fn new(token: impl Into<String>) -> Option<Self> {
		let inner = token.into();
		if inner.trim().is_empty() {
			return None;
		}
		Some(Self { inner })
	}

	pub fn expose(&self) -> &str {
		&self.inner
	}
}

impl fmt::Debug for AccessToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("AccessToken").field(&REDACTED).finish()
	}
}

impl fmt::Display for AccessToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl PartialEq for AccessToken {
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl Eq for AccessToken {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_token_is_none() {
		assert!(AccessToken::new("").is_none());
		assert!(AccessToken::new("   ").is_none());
	}

	#[test]
	fn formatting_is_redacted() {
		let token = AccessToken::new("ghp_abc123").unwrap();
		assert_eq!(format!("{token}"), REDACTED);
		assert_eq!(format!("{token:?}"), "AccessToken(\"[REDACTED]\")");
		assert_eq!(token.expose(), "ghp_abc123");
	}
}
