//! Error types for the activation client.
//!
//! There are two layers:
//!
//! - [`LicenseErrorKind`] is the closed set of reasons an activation can be
//!   unavailable. It is the only failure type the activation workflow ever
//!   returns.
//! - [`LicenseError`] describes faults raised *inside* a collaborator
//!   (storage, codec, parser, network). Collaborator faults are converted
//!   into a [`LicenseErrorKind`] at the call site and never cross the
//!   workflow boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why an activation could not be produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseErrorKind {
    /// No license key is available to reactivate with
    NoLicenseKey,
    /// No activation has been stored on this machine
    NoActivation,
    /// Activation data could not be parsed
    ParseFailed,
    /// Stored activation data could not be decoded
    DecodeFailed,
    /// The license server could not be reached or rejected the request
    NoServerConnection,
    /// The activation timestamp lies outside the accepted window
    InvalidActivationTime,
    /// Uninitialized or unrecognized reason (forward compatibility)
    #[default]
    #[serde(other)]
    Unknown,
}

impl LicenseErrorKind {
    /// Returns a default human-readable message for this reason.
    pub fn default_message(&self) -> &'static str {
        match self {
            LicenseErrorKind::NoLicenseKey => "No license key available",
            LicenseErrorKind::NoActivation => "No stored activation found",
            LicenseErrorKind::ParseFailed => "Activation data could not be parsed",
            LicenseErrorKind::DecodeFailed => "Stored activation could not be decoded",
            LicenseErrorKind::NoServerConnection => "License server could not be reached",
            LicenseErrorKind::InvalidActivationTime => {
                "Activation time is outside the accepted window"
            }
            LicenseErrorKind::Unknown => "Unknown license error",
        }
    }

    /// Returns true if only a successful online activation can clear this reason.
    pub fn requires_online(&self) -> bool {
        matches!(
            self,
            LicenseErrorKind::NoActivation
                | LicenseErrorKind::DecodeFailed
                | LicenseErrorKind::ParseFailed
                | LicenseErrorKind::InvalidActivationTime
        )
    }
}

impl fmt::Display for LicenseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.default_message())
    }
}

/// Faults raised by collaborators and the configuration layer.
#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("storage error: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("keyring error: {0}")]
    KeyringError(#[from] keyring::Error),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("encryption error: {0}")]
    EncryptionError(String),

    #[error("decryption error: {0}")]
    DecryptionError(String),

    #[error("parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("server error: {0}")]
    ServerError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for LicenseError {
    fn from(e: config::ConfigError) -> Self {
        LicenseError::ConfigError(e.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for LicenseError {
    fn from(e: reqwest::Error) -> Self {
        LicenseError::NetworkError(e.to_string())
    }
}

/// Result type for collaborator and configuration operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
