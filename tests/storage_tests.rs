mod common;

use activation::client::codec::StoreCodec;
use activation::client::format::JsonActivationFormat;
use activation::client::server::OfflineServer;
use activation::client::storage::{PersistedStore, SecureStore};
use activation::client::ActivationResolver;
use activation::{Fallible, LicenseErrorKind};

use common::*;

/// Activation persisted by one process is picked up by the next.
#[test]
fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let issued = fresh_activation();

    {
        let store = SecureStore::file_only(dir.path());
        store
            .write_persisted_string("license_key", LICENSE_KEY)
            .expect("store key");
        let server = ScriptedServer::replying(server_body(&issued));
        let resolver = ActivationResolver::new(
            &store,
            StoreCodec::from_config(false, ""),
            JsonActivationFormat,
            &server,
        );
        assert_eq!(resolver.get_activation_at(now()), Fallible::success(issued.clone()));
    }

    // New store and an offline server: only the file can satisfy this.
    let store = SecureStore::file_only(dir.path());
    let resolver = ActivationResolver::new(
        &store,
        StoreCodec::from_config(false, ""),
        JsonActivationFormat,
        OfflineServer,
    );
    assert_eq!(resolver.get_activation_at(now()), Fallible::success(issued));
}

/// Encrypted activations are not readable as plain text on disk.
#[test]
fn test_encrypted_file_contents_are_opaque() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SecureStore::file_only(dir.path());
    let codec = StoreCodec::from_config(true, "install-seed");
    let resolver = ActivationResolver::new(&store, codec, JsonActivationFormat, OfflineServer);

    resolver.persist_activation(&fresh_activation());

    let path = store.file_path("activation").expect("file path");
    let on_disk = std::fs::read_to_string(path).expect("activation file");
    assert!(!on_disk.contains("Example Corp"));
    assert_ne!(on_disk, stored_text(&fresh_activation()));

    assert_eq!(resolver.read_stored_activation(), Fallible::success(fresh_activation()));
}

/// Clearing the activation forces the next resolution online.
#[test]
fn test_clear_forces_reactivation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SecureStore::file_only(dir.path());
    store
        .write_persisted_string("activation", &stored_text(&fresh_activation()))
        .expect("seed activation");

    let resolver = ActivationResolver::new(
        &store,
        StoreCodec::from_config(false, ""),
        JsonActivationFormat,
        OfflineServer,
    );
    assert!(resolver.get_activation_at(now()).has_value());

    resolver.clear_stored_activation().expect("clear");
    assert_eq!(
        resolver.get_activation_at(now()),
        Fallible::failure(LicenseErrorKind::NoLicenseKey)
    );
}

/// Hand-edited activation files are a decode failure, not a panic.
#[test]
fn test_hand_edited_file_is_decode_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SecureStore::file_only(dir.path());
    std::fs::write(dir.path().join("activation.dat"), "{\"valid\": true}").expect("write file");

    let resolver = ActivationResolver::new(
        &store,
        StoreCodec::from_config(false, ""),
        JsonActivationFormat,
        OfflineServer,
    );
    assert_eq!(
        resolver.read_stored_activation(),
        Fallible::failure(LicenseErrorKind::DecodeFailed)
    );
}
