//! Activation resolution: stored activation first, online reactivation second.
//!
//! ```text
//! read stored string ─▶ decode ─▶ parse ─▶ still valid? ──yes──▶ stored activation
//!      NoActivation    DecodeFailed ParseFailed    │
//!                                                  no
//!                                                  ▼
//!                     license key (stored activation's, else stored key)
//!                                 NoLicenseKey
//!                                                  ▼
//!              contact server ─▶ parse ─▶ activation time accepted?
//!            NoServerConnection ParseFailed  InvalidActivationTime
//!                                                  │
//!                   success: persist, return new activation
//!                   failure: return the stored outcome
//! ```
//!
//! Every step yields a [`Fallible`]; collaborator faults are logged and
//! converted to the step's [`LicenseErrorKind`] where the collaborator is
//! called, so nothing else escapes [`ActivationResolver::get_activation`].

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::activation::{Activation, ActivationWindow};
use crate::client::codec::Codec;
use crate::client::format::ActivationFormat;
use crate::client::server::LicenseServer;
use crate::client::storage::{PersistedStore, StorageEntries};
use crate::config::ActivationConfig;
use crate::errors::{LicenseErrorKind, LicenseResult};
use crate::fallible::Fallible;
use crate::license_key::{validate_license_key_format, LicenseKeyConfig};

/// Outcome of resolving an activation.
pub type ActivationOutcome = Fallible<Activation, LicenseErrorKind>;

/// Convert a collaborator result into a pipeline value, logging the fault.
fn step<T>(
    name: &'static str,
    result: LicenseResult<T>,
    reason: LicenseErrorKind,
) -> Fallible<T, LicenseErrorKind> {
    Fallible::from_result(result).map_failure(|e| {
        debug!(step = name, error = %e, %reason, "activation step failed");
        reason
    })
}

fn non_empty(key: &str) -> Option<String> {
    let key = key.trim();
    (!key.is_empty()).then(|| key.to_string())
}

/// Resolves the current activation from local storage or the license server.
///
/// Holds no mutable state; all state lives in the collaborators.
pub struct ActivationResolver<S, C, F, N> {
    store: S,
    codec: C,
    format: F,
    server: N,
    entries: StorageEntries,
    window: ActivationWindow,
    key_format: Option<LicenseKeyConfig>,
}

impl<S, C, F, N> ActivationResolver<S, C, F, N>
where
    S: PersistedStore,
    C: Codec,
    F: ActivationFormat,
    N: LicenseServer,
{
    /// Default entry names, the default activation window and no key format check.
    pub fn new(store: S, codec: C, format: F, server: N) -> Self {
        Self {
            store,
            codec,
            format,
            server,
            entries: StorageEntries::default(),
            window: ActivationWindow::default(),
            key_format: None,
        }
    }

    pub fn with_entries(mut self, entries: StorageEntries) -> Self {
        self.entries = entries;
        self
    }

    pub fn with_window(mut self, window: ActivationWindow) -> Self {
        self.window = window;
        self
    }

    /// Treat license keys that do not match `config` as missing.
    pub fn with_key_format(mut self, config: LicenseKeyConfig) -> Self {
        self.key_format = Some(config);
        self
    }

    /// Apply entry names, window and key format from configuration.
    pub fn configure(self, config: &ActivationConfig) -> Self {
        let key_format = config
            .license
            .enforce_key_format
            .then(|| LicenseKeyConfig::from(&config.license));

        Self {
            entries: config.entries(),
            window: config.window(),
            key_format,
            ..self
        }
    }

    pub fn entries(&self) -> &StorageEntries {
        &self.entries
    }

    pub fn window(&self) -> ActivationWindow {
        self.window
    }

    /// Resolve the activation as of now.
    pub fn get_activation(&self) -> ActivationOutcome {
        self.get_activation_at(Utc::now())
    }

    /// Resolve the activation as of `now`.
    ///
    /// A stored activation that is still valid is returned without contacting
    /// the server. Otherwise the license is reactivated online; a successful
    /// reactivation is persisted and returned, a failed one leaves the stored
    /// outcome as the result. Without a license key there is nothing to
    /// reactivate with and the result is `NoLicenseKey`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn get_activation_at(&self, now: DateTime<Utc>) -> ActivationOutcome {
        let candidate = self.read_stored_activation();

        if candidate.exists(|activation| activation.is_still_valid(now)) {
            info!("using stored activation");
            return candidate;
        }

        candidate.match_success(|activation| {
            debug!(activated_until = %activation.activated_until, "stored activation is no longer valid");
        });
        candidate.match_failure(|reason| debug!(%reason, "no usable stored activation"));

        self.resolve_license_key(&candidate).flat_map(|key| {
            let online = self.activate_online(&key, now);

            online.match_success(|activation| {
                info!(licensee = %activation.licensee, "license activated online");
                self.persist_activation(activation);
            });

            online.value_or(|reason| {
                warn!(%reason, "online activation failed, keeping stored outcome");
                candidate
            })
        })
    }

    /// Read, decode and parse the stored activation.
    pub fn read_stored_activation(&self) -> ActivationOutcome {
        let stored = self.store.read_persisted_string(&self.entries.activation);

        Fallible::from_option(stored, LicenseErrorKind::NoActivation)
            .flat_map(|text| {
                step(
                    "decode stored activation",
                    self.codec.decode(&text),
                    LicenseErrorKind::DecodeFailed,
                )
            })
            .flat_map(|decoded| {
                step(
                    "parse stored activation",
                    self.format.parse_activation(&decoded),
                    LicenseErrorKind::ParseFailed,
                )
            })
    }

    /// The key to reactivate with: the stored activation's own key if it
    /// parsed, otherwise the separately stored license key.
    pub fn resolve_license_key(
        &self,
        candidate: &ActivationOutcome,
    ) -> Fallible<String, LicenseErrorKind> {
        candidate
            .as_ref()
            .match_with(
                |activation| {
                    Fallible::from_option(non_empty(&activation.key), LicenseErrorKind::NoLicenseKey)
                },
                |_| {
                    let stored = self
                        .store
                        .read_persisted_string(&self.entries.license_key)
                        .and_then(|key| non_empty(&key));
                    Fallible::from_option(stored, LicenseErrorKind::NoLicenseKey)
                },
            )
            .filter(
                |key| match &self.key_format {
                    Some(config) => validate_license_key_format(key, config),
                    None => true,
                },
                LicenseErrorKind::NoLicenseKey,
            )
    }

    /// Contact the server with `key`, parse its response and check the
    /// activation time against the window.
    pub fn activate_online(&self, key: &str, now: DateTime<Utc>) -> ActivationOutcome {
        step(
            "contact license server",
            self.server.contact_server(key),
            LicenseErrorKind::NoServerConnection,
        )
        .flat_map(|body| {
            step(
                "parse server response",
                self.format.parse_activation(&body),
                LicenseErrorKind::ParseFailed,
            )
        })
        .filter(
            |activation| self.window.accepts(activation, now),
            LicenseErrorKind::InvalidActivationTime,
        )
    }

    /// Render, encode and store `activation`.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn persist_activation(&self, activation: &Activation) {
        let written = self
            .format
            .render_activation(activation)
            .and_then(|text| self.codec.encode(&text))
            .and_then(|encoded| {
                self.store
                    .write_persisted_string(&self.entries.activation, &encoded)
            });

        match written {
            Ok(()) => debug!("stored activation"),
            Err(e) => warn!(error = %e, "failed to store activation"),
        }
    }

    /// Remove the stored activation (the license key is kept).
    pub fn clear_stored_activation(&self) -> LicenseResult<()> {
        self.store.clear_persisted_string(&self.entries.activation)
    }
}
