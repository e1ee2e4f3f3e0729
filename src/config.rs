//! Configuration for the activation client.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `activation.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `ACTIVATION_SERVER_URL` - License server base URL
//! - `ACTIVATION_SERVER_TIMEOUT_SECS` - Connection timeout in seconds
//! - `ACTIVATION_STORAGE_SERVICE` - Keyring service name
//! - `ACTIVATION_STORAGE_ENCRYPTED` - Encrypt stored activations (true/false)
//! - `ACTIVATION_ENCRYPTION_SEED` - Seed for the storage encryption key
//! - `ACTIVATION_MAX_AGE_SECS` - How old a fresh activation timestamp may be
//! - `ACTIVATION_MAX_LEAD_SECS` - How far ahead a fresh activation timestamp may be
//! - `ACTIVATION_LICENSE_KEY_PREFIX` - Expected license key prefix
//! - `ACTIVATION_LOGGING_ENABLED` - Enable logging output
//! - `ACTIVATION_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use chrono::Duration;
use config::Config;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;

use crate::activation::{ActivationWindow, DEFAULT_MAX_AGE_SECS, DEFAULT_MAX_LEAD_SECS};
use crate::client::storage::StorageEntries;
use crate::errors::{LicenseError, LicenseResult};

/// Global configuration singleton.
static CONFIG: OnceLock<ActivationConfig> = OnceLock::new();

/// Name of the optional configuration file (without extension).
pub const CONFIG_FILE: &str = "activation";

/// Upper bound for either activation window bound, in seconds (30 days).
pub const MAX_WINDOW_SECS: i64 = 30 * 24 * 60 * 60;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// License server configuration
    pub server: ServerConfig,
    /// Local storage configuration
    pub storage: StorageConfig,
    /// Activation time window
    pub activation: WindowConfig,
    /// License key format
    pub license: LicenseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// License server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the license server
    pub url: String,
    /// Path of the activation endpoint
    pub activate_path: String,
    /// Connection and request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080".to_string(),
            activate_path: "/api/v1/client/activate".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Keyring service name
    pub service: String,
    /// Directory name under the platform data directory for file fallback
    pub app_dir: String,
    /// Entry holding the encoded activation
    pub activation_entry: String,
    /// Entry holding the license key
    pub license_key_entry: String,
    /// Encrypt the stored activation instead of plain base64
    pub encrypted: bool,
    /// Seed for the storage encryption key (required when `encrypted`)
    pub encryption_seed: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            service: "option-activation".to_string(),
            app_dir: "option-activation".to_string(),
            activation_entry: "activation".to_string(),
            license_key_entry: "license_key".to_string(),
            encrypted: false,
            encryption_seed: String::new(),
        }
    }
}

/// Accepted skew for freshly retrieved activations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// How old an activation timestamp may be, in seconds (exclusive)
    pub max_age_secs: i64,
    /// How far ahead an activation timestamp may be, in seconds (inclusive)
    pub max_lead_secs: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            max_lead_secs: DEFAULT_MAX_LEAD_SECS,
        }
    }
}

/// License key format configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Prefix of license keys (e.g., "LIC" -> "LIC-XXXX-XXXX-XXXX-XXXX")
    pub key_prefix: String,
    /// Number of segments in the license key
    pub key_segments: u8,
    /// Characters per segment
    pub key_segment_length: u8,
    /// Treat malformed keys as missing
    pub enforce_key_format: bool,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            key_prefix: "LIC".to_string(),
            key_segments: 4,
            key_segment_length: 4,
            enforce_key_format: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl ActivationConfig {
    /// Load configuration from file and environment.
    ///
    /// Later sources override earlier ones: defaults, then `activation.toml`
    /// (optional), then environment variables.
    pub fn load() -> LicenseResult<Self> {
        Self::load_from(config::File::with_name(CONFIG_FILE).required(false))
    }

    /// Load with an explicit file source in place of `activation.toml`.
    pub fn load_from<S>(file: S) -> LicenseResult<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = ActivationConfig::default();

        let builder = Config::builder()
            .set_default("server.url", defaults.server.url)?
            .set_default("server.activate_path", defaults.server.activate_path)?
            .set_default("server.timeout_secs", defaults.server.timeout_secs as i64)?
            .set_default("storage.service", defaults.storage.service)?
            .set_default("storage.app_dir", defaults.storage.app_dir)?
            .set_default("storage.activation_entry", defaults.storage.activation_entry)?
            .set_default("storage.license_key_entry", defaults.storage.license_key_entry)?
            .set_default("storage.encrypted", defaults.storage.encrypted)?
            .set_default("storage.encryption_seed", defaults.storage.encryption_seed)?
            .set_default("activation.max_age_secs", defaults.activation.max_age_secs)?
            .set_default("activation.max_lead_secs", defaults.activation.max_lead_secs)?
            .set_default("license.key_prefix", defaults.license.key_prefix)?
            .set_default("license.key_segments", i64::from(defaults.license.key_segments))?
            .set_default(
                "license.key_segment_length",
                i64::from(defaults.license.key_segment_length),
            )?
            .set_default("license.enforce_key_format", defaults.license.enforce_key_format)?
            .set_default("logging.enabled", defaults.logging.enabled)?
            .set_default("logging.level", defaults.logging.level)?
            .add_source(file)
            .set_override_option("server.url", env::var("ACTIVATION_SERVER_URL").ok())?
            .set_override_option(
                "server.timeout_secs",
                env_parsed::<i64>("ACTIVATION_SERVER_TIMEOUT_SECS"),
            )?
            .set_override_option("storage.service", env::var("ACTIVATION_STORAGE_SERVICE").ok())?
            .set_override_option(
                "storage.encrypted",
                env_parsed::<bool>("ACTIVATION_STORAGE_ENCRYPTED"),
            )?
            .set_override_option(
                "storage.encryption_seed",
                env::var("ACTIVATION_ENCRYPTION_SEED").ok(),
            )?
            .set_override_option(
                "activation.max_age_secs",
                env_parsed::<i64>("ACTIVATION_MAX_AGE_SECS"),
            )?
            .set_override_option(
                "activation.max_lead_secs",
                env_parsed::<i64>("ACTIVATION_MAX_LEAD_SECS"),
            )?
            .set_override_option(
                "license.key_prefix",
                env::var("ACTIVATION_LICENSE_KEY_PREFIX").ok(),
            )?
            .set_override_option(
                "logging.enabled",
                env_parsed::<bool>("ACTIVATION_LOGGING_ENABLED"),
            )?
            .set_override_option("logging.level", env::var("ACTIVATION_LOG_LEVEL").ok())?;

        let settings = builder
            .build()
            .map_err(|e| LicenseError::ConfigError(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| LicenseError::ConfigError(format!("failed to deserialize config: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.server.url.trim().is_empty() {
            return Err(LicenseError::ConfigError(
                "server.url cannot be empty".to_string(),
            ));
        }
        if self.server.timeout_secs == 0 {
            return Err(LicenseError::ConfigError(
                "server.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.storage.activation_entry.is_empty() || self.storage.license_key_entry.is_empty()
        {
            return Err(LicenseError::ConfigError(
                "storage entry names cannot be empty".to_string(),
            ));
        }
        if self.storage.encrypted && self.storage.encryption_seed.is_empty() {
            return Err(LicenseError::ConfigError(
                "storage.encryption_seed is required when storage.encrypted is true".to_string(),
            ));
        }

        if self.activation.max_age_secs <= 0 || self.activation.max_lead_secs <= 0 {
            return Err(LicenseError::ConfigError(
                "activation window bounds must be greater than 0".to_string(),
            ));
        }
        if self.activation.max_age_secs > MAX_WINDOW_SECS
            || self.activation.max_lead_secs > MAX_WINDOW_SECS
        {
            return Err(LicenseError::ConfigError(format!(
                "activation window bounds cannot exceed {MAX_WINDOW_SECS} seconds"
            )));
        }

        if self.license.key_prefix.is_empty() {
            return Err(LicenseError::ConfigError(
                "license.key_prefix cannot be empty".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(LicenseError::ConfigError(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }

    /// The configured activation window.
    ///
    /// Bounds are clamped to `0..=MAX_WINDOW_SECS`; `validate` rejects
    /// values outside that range.
    pub fn window(&self) -> ActivationWindow {
        let bound = |secs: i64| Duration::seconds(secs.clamp(0, MAX_WINDOW_SECS));
        ActivationWindow::new(
            bound(self.activation.max_age_secs),
            bound(self.activation.max_lead_secs),
        )
    }

    /// The configured storage entry names.
    pub fn entries(&self) -> StorageEntries {
        StorageEntries {
            activation: self.storage.activation_entry.clone(),
            license_key: self.storage.license_key_entry.clone(),
        }
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> LicenseResult<&'static ActivationConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = ActivationConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is valid.
    Ok(CONFIG.get_or_init(|| config))
}

/// Initialize configuration explicitly.
///
/// Call this early in your application to catch configuration errors.
pub fn init_config() -> LicenseResult<&'static ActivationConfig> {
    get_config()
}
