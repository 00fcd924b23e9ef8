// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! AES-256-GCM sealing of short secrets.
//!
//! Sealed values are `base64(nonce || ciphertext || tag)` with a fresh random
//! 96-bit nonce per call. Keys travel as base64 of 32 raw bytes.

use aes_gcm::{
	aead::{Aead, KeyInit, OsRng},
	Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{VaultError, VaultResult};

/// Size of encryption keys in bytes (256 bits for AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag appended to the ciphertext.
pub const TAG_SIZE: usize = 16;

/// Generate a random key, base64 encoded for storage.
pub fn generate_key() -> String {
	let mut key = Zeroizing::new([0u8; KEY_SIZE]);
	OsRng.fill_bytes(key.as_mut());
	STANDARD.encode(key.as_slice())
}

fn decode_key(key: &str) -> VaultResult<Zeroizing<Vec<u8>>> {
	if key.is_empty() {
		return Err(VaultError::EmptyInput("encryption key"));
	}
	let bytes = Zeroizing::new(
		STANDARD
			.decode(key)
			.map_err(|e| VaultError::InvalidKey(format!("not base64: {e}")))?,
	);
	if bytes.len() != KEY_SIZE {
		return Err(VaultError::InvalidKey(format!(
			"expected {KEY_SIZE} bytes, got {}",
			bytes.len()
		)));
	}
	Ok(bytes)
}

/// Encrypt `plaintext` under the base64 `key`.
pub fn encrypt(plaintext: &str, key: &str) -> VaultResult<String> {
	let key_bytes = decode_key(key)?;
	let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

	let mut nonce_bytes = [0u8; NONCE_SIZE];
	OsRng.fill_bytes(&mut nonce_bytes);
	let nonce = Nonce::from_slice(&nonce_bytes);

	let ciphertext = cipher
		.encrypt(nonce, plaintext.as_bytes())
		.map_err(|e| VaultError::Crypto(format!("encryption failed: {e}")))?;

	let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
	sealed.extend_from_slice(&nonce_bytes);
	sealed.extend_from_slice(&ciphertext);
	Ok(STANDARD.encode(sealed))
}

/// Decrypt a value produced by [`encrypt`].
///
/// Any tampering, truncation, wrong key or non-UTF-8 plaintext is a
/// [`VaultError::Crypto`]; no partial plaintext is ever returned.
pub fn decrypt(encoded: &str, key: &str) -> VaultResult<Zeroizing<String>> {
	if encoded.is_empty() {
		return Err(VaultError::EmptyInput("ciphertext"));
	}
	let key_bytes = decode_key(key)?;

	let sealed = STANDARD
		.decode(encoded)
		.map_err(|e| VaultError::Crypto(format!("ciphertext is not base64: {e}")))?;
	if sealed.len() < NONCE_SIZE + TAG_SIZE {
		return Err(VaultError::Crypto(format!(
			"ciphertext too short: {} bytes",
			sealed.len()
		)));
	}

	let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
	let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
	let plaintext = Zeroizing::new(
		cipher
			.decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
			.map_err(|e| VaultError::Crypto(format!("decryption failed: {e}")))?,
	);

	let text = std::str::from_utf8(&plaintext)
		.map_err(|e| VaultError::Crypto(format!("plaintext is not UTF-8: {e}")))?;
	Ok(Zeroizing::new(text.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn generated_keys_are_unique_and_sized() {
		let a = generate_key();
		let b = generate_key();
		assert_ne!(a, b);
		assert_eq!(STANDARD.decode(&a).unwrap().len(), KEY_SIZE);
	}

	#[test]
	fn same_plaintext_encrypts_differently() {
		let key = generate_key();
		assert_ne!(
			encrypt("ghp_token", &key).unwrap(),
			encrypt("ghp_token", &key).unwrap()
		);
	}

	#[test]
	fn wrong_key_is_crypto_error() {
		let sealed = encrypt("ghp_token", &generate_key()).unwrap();
		let err = decrypt(&sealed, &generate_key()).unwrap_err();
		assert!(matches!(err, VaultError::Crypto(_)));
	}

	#[test]
	fn short_key_is_rejected() {
		let key = STANDARD.encode([7u8; 16]);
		let err = encrypt("x", &key).unwrap_err();
		assert!(matches!(err, VaultError::InvalidKey(_)));
		assert!(err.is_validation());
	}

	#[test]
	fn empty_inputs_are_rejected() {
		let key = generate_key();
		assert!(matches!(
			decrypt("", &key),
			Err(VaultError::EmptyInput(_))
		));
		assert!(matches!(
			encrypt("x", ""),
			Err(VaultError::EmptyInput(_))
		));
	}

	#[test]
	fn non_base64_is_crypto_error() {
		let err = decrypt("not base64 at all!!", &generate_key()).unwrap_err();
		assert!(matches!(err, VaultError::Crypto(_)));
	}

	#[test]
	fn truncated_is_crypto_error() {
		let key = generate_key();
		let sealed = STANDARD.decode(encrypt("ghp_token", &key).unwrap()).unwrap();
		let truncated = STANDARD.encode(&sealed[..NONCE_SIZE + 4]);
		assert!(matches!(
			decrypt(&truncated, &key),
			Err(VaultError::Crypto(_))
		));
	}

	#[test]
	fn flipped_bit_fails_authentication() {
		let key = generate_key();
		let mut sealed = STANDARD.decode(encrypt("ghp_token", &key).unwrap()).unwrap();
		let last = sealed.len() - 1;
		sealed[last] ^= 0x01;
		assert!(matches!(
			decrypt(&STANDARD.encode(sealed), &key),
			Err(VaultError::Crypto(_))
		));
	}

	proptest! {
		#[test]
		fn roundtrip(plaintext in "\\PC{0,64}") {
			let key = generate_key();
			let sealed = encrypt(&plaintext, &key).unwrap();
			let opened = decrypt(&sealed, &key).unwrap();
			prop_assert_eq!(opened.as_str(), plaintext.as_str());
		}

		#[test]
		fn arbitrary_input_never_panics(garbage in ".{0,128}") {
			let _ = decrypt(&garbage, &generate_key());
		}
	}
}
