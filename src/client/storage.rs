//! Persisted string storage for activation data and license keys.
//!
//! [`SecureStore`] keeps entries in the OS keyring and falls back to files in
//! the platform app data directory when the keyring is unavailable:
//!
//! **Keyring (Primary):**
//! - Service: configurable (default `option-activation`)
//! - User: the entry name (e.g. `activation`, `license_key`)
//!
//! **File Fallback (Secondary):**
//! - Windows: `%APPDATA%\{app_dir}\{name}.dat`
//! - macOS: `~/Library/Application Support/{app_dir}/{name}.dat`
//! - Linux: `~/.local/share/{app_dir}/{name}.dat`
//!
//! [`MemoryStore`] holds entries in process memory.

use crate::errors::{LicenseError, LicenseResult};

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// Read/write access to named persisted strings.
///
/// Reads report absence as `None`; a store that hits an I/O fault while
/// reading logs it and reports the entry as absent.
pub trait PersistedStore {
    fn read_persisted_string(&self, name: &str) -> Option<String>;

    fn write_persisted_string(&self, name: &str, value: &str) -> LicenseResult<()>;

    /// Remove an entry. Removing an absent entry is not an error.
    fn clear_persisted_string(&self, name: &str) -> LicenseResult<()>;
}

impl<T: PersistedStore + ?Sized> PersistedStore for &T {
    fn read_persisted_string(&self, name: &str) -> Option<String> {
        (**self).read_persisted_string(name)
    }

    fn write_persisted_string(&self, name: &str, value: &str) -> LicenseResult<()> {
        (**self).write_persisted_string(name, value)
    }

    fn clear_persisted_string(&self, name: &str) -> LicenseResult<()> {
        (**self).clear_persisted_string(name)
    }
}

/// Names of the persisted entries used by the activation client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntries {
    /// Encoded activation record
    pub activation: String,
    /// License key used for reactivation
    pub license_key: String,
}

impl Default for StorageEntries {
    fn default() -> Self {
        Self {
            activation: "activation".to_string(),
            license_key: "license_key".to_string(),
        }
    }
}

/// OS keyring storage with a file fallback.
#[derive(Debug, Clone)]
pub struct SecureStore {
    service: String,
    dir: Option<PathBuf>,
    use_keyring: bool,
}

impl SecureStore {
    /// Keyring under `service`, falling back to `{data_dir}/{app_dir}`.
    pub fn new(service: impl Into<String>, app_dir: &str) -> Self {
        Self {
            service: service.into(),
            dir: dirs::data_dir().map(|p| p.join(app_dir)),
            use_keyring: true,
        }
    }

    /// File storage only, rooted at `dir`.
    pub fn file_only(dir: impl Into<PathBuf>) -> Self {
        Self {
            service: String::new(),
            dir: Some(dir.into()),
            use_keyring: false,
        }
    }

    /// Path of the fallback file for `name`, if a data directory is known.
    pub fn file_path(&self, name: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(format!("{name}.dat")))
    }

    // === Keyring Operations ===

    fn keyring_entry(&self, name: &str) -> Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(&self.service, name)
    }

    fn save_to_keyring(&self, name: &str, data: &str) -> Result<(), keyring::Error> {
        self.keyring_entry(name)?.set_password(data)
    }

    fn load_from_keyring(&self, name: &str) -> Result<String, keyring::Error> {
        self.keyring_entry(name)?.get_password()
    }

    fn clear_from_keyring(&self, name: &str) -> Result<(), keyring::Error> {
        self.keyring_entry(name)?.delete_credential()
    }

    // === File Operations ===

    fn require_path(&self, name: &str) -> LicenseResult<PathBuf> {
        self.file_path(name).ok_or_else(|| {
            LicenseError::StorageError(std::io::Error::new(
                ErrorKind::NotFound,
                "Could not determine app data directory",
            ))
        })
    }

    fn save_to_file(&self, name: &str, data: &str) -> LicenseResult<()> {
        let path = self.require_path(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(())
    }

    fn load_from_file(&self, name: &str) -> LicenseResult<Option<String>> {
        let path = self.require_path(name)?;
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LicenseError::StorageError(e)),
        }
    }

    fn clear_from_file(&self, name: &str) -> LicenseResult<()> {
        let Some(path) = self.file_path(name) else {
            return Ok(());
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LicenseError::StorageError(e)),
        }
    }
}

impl PersistedStore for SecureStore {
    /// Checks the keyring first, then the app data directory file.
    fn read_persisted_string(&self, name: &str) -> Option<String> {
        if self.use_keyring {
            match self.load_from_keyring(name) {
                Ok(data) => {
                    log::debug!("Loaded {name:?} from keyring");
                    return Some(data);
                }
                Err(keyring::Error::NoEntry) => {}
                Err(e) => log::debug!("Keyring load failed for {name:?}: {e}"),
            }
        }

        match self.load_from_file(name) {
            Ok(Some(data)) => {
                log::debug!("Loaded {name:?} from app data directory");
                Some(data)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Reading {name:?} from app data directory failed: {e}");
                None
            }
        }
    }

    /// Tries the keyring first, falls back to file storage if the keyring
    /// fails or does not read back what was written.
    fn write_persisted_string(&self, name: &str, value: &str) -> LicenseResult<()> {
        if self.use_keyring {
            match self.save_to_keyring(name, value) {
                Ok(()) => {
                    if matches!(self.load_from_keyring(name), Ok(ref stored) if stored == value) {
                        log::debug!("Saved {name:?} to keyring");
                        return Ok(());
                    }
                    log::debug!("Keyring save verification failed for {name:?}, falling back to file");
                }
                Err(e) => {
                    log::debug!("Keyring save failed for {name:?}: {e}, falling back to file");
                }
            }
        }

        self.save_to_file(name, value)?;
        log::debug!("Saved {name:?} to app data directory");
        Ok(())
    }

    /// Clears both the keyring entry and the fallback file.
    ///
    /// Fails if the keyring entry could not be removed and is still readable.
    fn clear_persisted_string(&self, name: &str) -> LicenseResult<()> {
        let file_cleared = self.clear_from_file(name);

        if self.use_keyring {
            keyring_clear_outcome(name, self.clear_from_keyring(name), || {
                self.load_from_keyring(name).is_ok()
            })?;
        }

        file_cleared
    }
}

/// Interpret a keyring delete: a failure only matters while the entry is
/// still there.
fn keyring_clear_outcome(
    name: &str,
    cleared: Result<(), keyring::Error>,
    still_present: impl FnOnce() -> bool,
) -> LicenseResult<()> {
    match cleared {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) if still_present() => {
            log::warn!("Failed to clear {name:?} from keyring: {e}");
            Err(LicenseError::KeyringError(e))
        }
        Err(e) => {
            log::debug!("Keyring clear for {name:?} reported {e}, entry is gone");
            Ok(())
        }
    }
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper that seeds one entry.
    pub fn with_entry(self, name: &str, value: &str) -> Self {
        self.lock().insert(name.to_string(), value.to_string());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PersistedStore for MemoryStore {
    fn read_persisted_string(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    fn write_persisted_string(&self, name: &str, value: &str) -> LicenseResult<()> {
        self.lock().insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn clear_persisted_string(&self, name: &str) -> LicenseResult<()> {
        self.lock().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SecureStore::file_only(dir.path());

        store
            .write_persisted_string("activation", "stored-data")
            .expect("write should succeed");
        assert_eq!(
            store.read_persisted_string("activation").as_deref(),
            Some("stored-data")
        );

        store
            .clear_persisted_string("activation")
            .expect("clear should succeed");
        assert!(store.read_persisted_string("activation").is_none());
    }

    #[test]
    fn file_store_missing_entry_is_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SecureStore::file_only(dir.path());
        assert!(store.read_persisted_string("license_key").is_none());
    }

    #[test]
    fn file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SecureStore::file_only(dir.path().join("nested").join("app"));

        store.write_persisted_string("license_key", "LIC-KEY").unwrap();
        assert!(store.file_path("license_key").unwrap().exists());
    }

    #[test]
    fn clearing_absent_entry_is_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SecureStore::file_only(dir.path());
        assert!(store.clear_persisted_string("never-written").is_ok());
    }

    #[test]
    fn file_path_uses_entry_name() {
        let store = SecureStore::file_only("/tmp/option-activation");
        let path = store.file_path("activation").unwrap();
        assert!(path.ends_with("activation.dat"));
    }

    fn platform_failure() -> keyring::Error {
        keyring::Error::PlatformFailure(Box::new(std::io::Error::other("keychain locked")))
    }

    #[test]
    fn keyring_clear_failure_with_entry_left_is_an_error() {
        let result = keyring_clear_outcome("activation", Err(platform_failure()), || true);
        assert!(matches!(result, Err(LicenseError::KeyringError(_))));
    }

    #[test]
    fn keyring_clear_failure_without_entry_is_ok() {
        assert!(keyring_clear_outcome("activation", Err(platform_failure()), || false).is_ok());
    }

    #[test]
    fn keyring_clear_success_or_missing_is_ok() {
        let mut reread = false;
        assert!(keyring_clear_outcome("activation", Ok(()), || {
            reread = true;
            true
        })
        .is_ok());
        assert!(!reread, "entry is not re-read after a successful clear");
        assert!(keyring_clear_outcome("activation", Err(keyring::Error::NoEntry), || true).is_ok());
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new().with_entry("license_key", "LIC-1");
        assert_eq!(store.read_persisted_string("license_key").as_deref(), Some("LIC-1"));

        store.write_persisted_string("license_key", "LIC-2").unwrap();
        assert_eq!(store.read_persisted_string("license_key").as_deref(), Some("LIC-2"));

        store.clear_persisted_string("license_key").unwrap();
        assert!(store.read_persisted_string("license_key").is_none());
    }

    #[test]
    fn borrowed_store_delegates() {
        fn read_via<S: PersistedStore>(store: S) -> Option<String> {
            store.read_persisted_string("k")
        }

        let store = MemoryStore::new().with_entry("k", "v");
        assert_eq!(read_via(&store).as_deref(), Some("v"));
    }
}
