//! AES-256-GCM helpers for encrypting stored activation data at rest.
//!
//! Ciphertext layout: `[nonce (12 bytes)] || [ciphertext + tag]`, optionally
//! wrapped in standard base64 for text storage.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use rand::rngs::OsRng;
use rand::TryRngCore;

use ring::digest::{digest, SHA256};

use crate::errors::{LicenseError, LicenseResult};

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// GCM nonce size in bytes (96-bit).
pub const NONCE_SIZE: usize = 12;

/// Derive a 256-bit key as `SHA-256("{context}:{seed}")`.
///
/// `context` separates keys derived from the same seed for different uses.
pub fn derive_key(context: &str, seed: &str) -> [u8; KEY_SIZE] {
    let salted = format!("{context}:{seed}");
    let hash = digest(&SHA256, salted.as_bytes());

    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(hash.as_ref());
    key
}

fn random_nonce() -> LicenseResult<[u8; NONCE_SIZE]> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| LicenseError::EncryptionError(format!("nonce generation failed: {e}")))?;
    Ok(nonce)
}

fn cipher_for(key: &[u8; KEY_SIZE]) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
}

pub fn encrypt_bytes(plaintext: &[u8], key: &[u8; KEY_SIZE]) -> LicenseResult<Vec<u8>> {
    let nonce_bytes = random_nonce()?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let mut ciphertext = cipher_for(key)
        .encrypt(nonce, plaintext)
        .map_err(|e| LicenseError::EncryptionError(format!("encryption failed: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.append(&mut ciphertext);
    Ok(output)
}

/// Decrypt bytes produced by [`encrypt_bytes`]. Fails on a wrong key or
/// any modification of the data (authentication tag mismatch).
pub fn decrypt_bytes(ciphertext: &[u8], key: &[u8; KEY_SIZE]) -> LicenseResult<Vec<u8>> {
    if ciphertext.len() <= NONCE_SIZE {
        return Err(LicenseError::DecryptionError(
            "ciphertext too short".to_string(),
        ));
    }

    let (nonce_bytes, ct) = ciphertext.split_at(NONCE_SIZE);

    cipher_for(key)
        .decrypt(Nonce::from_slice(nonce_bytes), ct)
        .map_err(|e| LicenseError::DecryptionError(format!("decryption failed: {e}")))
}

pub fn encrypt_to_base64(plaintext: &[u8], key: &[u8; KEY_SIZE]) -> LicenseResult<String> {
    Ok(B64.encode(encrypt_bytes(plaintext, key)?))
}

pub fn decrypt_from_base64(ciphertext_b64: &str, key: &[u8; KEY_SIZE]) -> LicenseResult<Vec<u8>> {
    let decoded = B64
        .decode(ciphertext_b64)
        .map_err(|e| LicenseError::DecryptionError(format!("base64 decode failed: {e}")))?;
    decrypt_bytes(&decoded, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_keys_depend_on_context_and_seed() {
        let a = derive_key("ctx", "seed");
        assert_eq!(a, derive_key("ctx", "seed"));
        assert_ne!(a, derive_key("other", "seed"));
        assert_ne!(a, derive_key("ctx", "other"));
    }

    #[test]
    fn base64_round_trip() {
        let key = derive_key("test", "machine-1");
        let encoded = encrypt_to_base64(b"activation payload", &key).expect("encrypt");
        let decoded = decrypt_from_base64(&encoded, &key).expect("decrypt");
        assert_eq!(decoded, b"activation payload");
    }

    #[test]
    fn nonces_differ_between_encryptions() {
        let key = derive_key("test", "machine-1");
        let first = encrypt_bytes(b"same", &key).unwrap();
        let second = encrypt_bytes(b"same", &key).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn wrong_key_fails() {
        let encrypted = encrypt_bytes(b"secret", &derive_key("test", "a")).unwrap();
        let result = decrypt_bytes(&encrypted, &derive_key("test", "b"));
        assert!(matches!(result, Err(LicenseError::DecryptionError(_))));
    }

    #[test]
    fn short_ciphertext_fails() {
        let key = derive_key("test", "a");
        assert!(decrypt_bytes(&[0u8; NONCE_SIZE], &key).is_err());
    }
}
