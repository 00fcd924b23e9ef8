// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential vault for the GitHub access token.
//!
//! The token is stored sealed with AES-256-GCM under a per-installation key
//! kept alongside the settings. Callers only ever see the plaintext wrapped in
//! an [`AccessToken`].

pub mod cipher;
pub mod error;
pub mod token;

pub use cipher::{decrypt, encrypt, generate_key, KEY_SIZE, NONCE_SIZE};
pub use error::{VaultError, VaultResult};
pub use token::AccessToken;

/// Open the stored token, if any.
///
/// A token that cannot be decrypted is logged and treated as absent so
/// callers fall back to unauthenticated requests.
pub fn open_token(encrypted: Option<&str>, key: &str) -> Option<AccessToken> {
	let sealed = encrypted.filter(|s| !s.is_empty())?;
	match decrypt(sealed, key) {
		Ok(plaintext) => AccessToken::new(plaintext.as_str()),
		Err(e) => {
			tracing::warn!(error = %e, "stored access token could not be decrypted; continuing without it");
			None
		}
	}
}

/// Seal a plaintext token for storage.
pub fn seal_token(token: &AccessToken, key: &str) -> VaultResult<String> {
	encrypt(token.expose(), key)
}
