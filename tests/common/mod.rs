//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use activation::client::codec::{Base64Codec, Codec};
use activation::client::format::{ActivationFormat, JsonActivationFormat, ServerActivationResponse};
use activation::client::server::LicenseServer;
use activation::client::storage::{MemoryStore, PersistedStore};
use activation::errors::{LicenseError, LicenseResult};
use activation::Activation;
use chrono::{DateTime, Duration, TimeZone, Utc};

pub const LICENSE_KEY: &str = "LIC-A2B3-C4D5-E6F7-G8H9";

/// Fixed "now" used by every scenario.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 10, 0, 0).unwrap()
}

/// An activation valid for another week, issued just now.
pub fn fresh_activation() -> Activation {
    Activation {
        key: LICENSE_KEY.to_string(),
        licensee: "Example Corp".to_string(),
        activated_until: now() + Duration::days(7),
        license_expires: now() + Duration::days(365),
        activation_timestamp: now(),
        valid: true,
    }
}

/// An activation whose offline period ended yesterday.
pub fn expired_activation() -> Activation {
    Activation {
        activated_until: now() - Duration::days(1),
        activation_timestamp: now() - Duration::days(8),
        ..fresh_activation()
    }
}

/// Activation as it sits in storage: JSON, base64 encoded.
pub fn stored_text(activation: &Activation) -> String {
    let json = JsonActivationFormat
        .render_activation(activation)
        .expect("render activation");
    Base64Codec.encode(&json).expect("encode activation")
}

/// Successful server response carrying `activation`.
pub fn server_body(activation: &Activation) -> String {
    serde_json::to_string(&ServerActivationResponse {
        success: true,
        activation: Some(activation.clone()),
        message: None,
    })
    .expect("serialize response")
}

/// A [`MemoryStore`] that counts writes and can be told to reject them.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    writes: RefCell<Vec<(String, String)>>,
    reject_writes: Cell<bool>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, name: &str, value: &str) -> Self {
        Self {
            inner: self.inner.with_entry(name, value),
            ..self
        }
    }

    pub fn rejecting_writes(self) -> Self {
        self.reject_writes.set(true);
        self
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.borrow().clone()
    }
}

impl PersistedStore for RecordingStore {
    fn read_persisted_string(&self, name: &str) -> Option<String> {
        self.inner.read_persisted_string(name)
    }

    fn write_persisted_string(&self, name: &str, value: &str) -> LicenseResult<()> {
        self.writes
            .borrow_mut()
            .push((name.to_string(), value.to_string()));
        if self.reject_writes.get() {
            return Err(LicenseError::StorageError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only store",
            )));
        }
        self.inner.write_persisted_string(name, value)
    }

    fn clear_persisted_string(&self, name: &str) -> LicenseResult<()> {
        self.inner.clear_persisted_string(name)
    }
}

/// A license server that replays one canned reply and records requests.
pub struct ScriptedServer {
    reply: Result<String, String>,
    keys: RefCell<Vec<String>>,
}

impl ScriptedServer {
    pub fn replying(body: impl Into<String>) -> Self {
        Self {
            reply: Ok(body.into()),
            keys: RefCell::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reply: Err("connection refused".to_string()),
            keys: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.keys.borrow().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.borrow().clone()
    }
}

impl LicenseServer for ScriptedServer {
    fn contact_server(&self, key: &str) -> LicenseResult<String> {
        self.keys.borrow_mut().push(key.to_string());
        self.reply.clone().map_err(LicenseError::NetworkError)
    }
}
