//! Reversible text encodings applied to activation data before it is stored.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::encryption::{decrypt_from_base64, derive_key, encrypt_to_base64, KEY_SIZE};
use crate::errors::{LicenseError, LicenseResult};

/// Key derivation context for stored activations.
const STORE_KEY_CONTEXT: &str = "activation_store_v1";

/// A reversible text transform: `decode(encode(s)) == s`.
pub trait Codec {
    fn encode(&self, text: &str) -> LicenseResult<String>;

    /// Reverse [`Codec::encode`]. Malformed input is an error, never a panic.
    fn decode(&self, text: &str) -> LicenseResult<String>;
}

impl<T: Codec + ?Sized> Codec for &T {
    fn encode(&self, text: &str) -> LicenseResult<String> {
        (**self).encode(text)
    }

    fn decode(&self, text: &str) -> LicenseResult<String> {
        (**self).decode(text)
    }
}

/// Standard base64 over UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl Codec for Base64Codec {
    fn encode(&self, text: &str) -> LicenseResult<String> {
        Ok(B64.encode(text.as_bytes()))
    }

    fn decode(&self, text: &str) -> LicenseResult<String> {
        let bytes = B64
            .decode(text.trim())
            .map_err(|e| LicenseError::EncodingError(format!("base64 decode failed: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| LicenseError::EncodingError(format!("decoded data is not UTF-8: {e}")))
    }
}

/// AES-256-GCM encryption, base64 wrapped.
///
/// Modified or foreign data fails to decode (authentication tag mismatch).
#[derive(Clone)]
pub struct EncryptedCodec {
    key: [u8; KEY_SIZE],
}

impl EncryptedCodec {
    /// Derive the key from a machine- or installation-specific seed.
    pub fn from_seed(seed: &str) -> Self {
        Self {
            key: derive_key(STORE_KEY_CONTEXT, seed),
        }
    }
}

impl std::fmt::Debug for EncryptedCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedCodec").finish_non_exhaustive()
    }
}

impl Codec for EncryptedCodec {
    fn encode(&self, text: &str) -> LicenseResult<String> {
        encrypt_to_base64(text.as_bytes(), &self.key)
    }

    fn decode(&self, text: &str) -> LicenseResult<String> {
        let bytes = decrypt_from_base64(text.trim(), &self.key)?;
        String::from_utf8(bytes)
            .map_err(|e| LicenseError::DecryptionError(format!("decrypted data is not UTF-8: {e}")))
    }
}

/// Either codec, chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum StoreCodec {
    Plain(Base64Codec),
    Encrypted(EncryptedCodec),
}

impl StoreCodec {
    pub fn from_config(encrypted: bool, seed: &str) -> Self {
        if encrypted {
            StoreCodec::Encrypted(EncryptedCodec::from_seed(seed))
        } else {
            StoreCodec::Plain(Base64Codec)
        }
    }
}

impl Codec for StoreCodec {
    fn encode(&self, text: &str) -> LicenseResult<String> {
        match self {
            StoreCodec::Plain(c) => c.encode(text),
            StoreCodec::Encrypted(c) => c.encode(text),
        }
    }

    fn decode(&self, text: &str) -> LicenseResult<String> {
        match self {
            StoreCodec::Plain(c) => c.decode(text),
            StoreCodec::Encrypted(c) => c.decode(text),
        }
    }
}
