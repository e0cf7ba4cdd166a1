//! Provider discovery from a providers directory
//!
//! Covers manifest resolution against the catalog, load order, namespacing of
//! registered checks and shutdown hooks.

use std::path::Path;
use std::sync::{Arc, Mutex};
use vigil_checks::provider::{StdProvider, STD_PROVIDER_KIND};
use vigil_core::application::{load_providers, run_shutdown, setup_all, RegistryBuilder};
use vigil_core::port::check::mocks::{passing_descriptor, CallLog};
use vigil_core::port::id_provider::mocks::SequentialIds;
use vigil_core::port::provider::mocks::StubProvider;
use vigil_core::port::LoadError;
use vigil_infra_fs::{DirectoryProviderSource, ProviderCatalog, ProviderManifest, MANIFEST_FILE};

fn write_manifest(root: &Path, dir: &str, contents: &str) {
    let dir = root.join(dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(MANIFEST_FILE), contents).unwrap();
}

fn catalog(shutdowns: Arc<Mutex<Vec<String>>>) -> ProviderCatalog {
    ProviderCatalog::new()
        .with_kind(STD_PROVIDER_KIND, |m: &ProviderManifest| {
            StdProvider::named(m.name.clone())
        })
        .with_kind("extra", move |m: &ProviderManifest| {
            StubProvider::new(
                m.name.clone(),
                vec![
                    passing_descriptor("http", CallLog::new()),
                    passing_descriptor("ping", CallLog::new()),
                ],
            )
            .with_shutdown_log(Arc::clone(&shutdowns))
        })
}

#[test]
fn test_directory_order_decides_conflicts() {
    let root = tempfile::tempdir().unwrap();
    write_manifest(root.path(), "10-std", "name: Standard\nkind: std\n");
    write_manifest(root.path(), "20-extra", "name: Extra\nkind: extra\n");

    let source = DirectoryProviderSource::new(root.path(), catalog(Arc::default()));
    let providers = load_providers(&source, &SequentialIds::new()).unwrap();
    let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["Standard", "Extra"]);

    let mut builder = RegistryBuilder::new();
    setup_all(&providers, &mut builder).unwrap();
    let registry = builder.seal();

    // std registered http first; extra only contributes ping
    assert_eq!(registry.keys(), vec!["dns", "http", "ping", "ssl"]);
    assert_eq!(registry.namespace_of("http"), Some("provider-1"));
    assert_eq!(registry.namespace_of("ping"), Some("provider-2"));
    assert_eq!(
        registry.lookup("http").map(|d| d.display_name()),
        Some("Http Check")
    );
}

#[test]
fn test_reordering_directories_flips_the_winner() {
    let root = tempfile::tempdir().unwrap();
    write_manifest(root.path(), "10-extra", "name: Extra\nkind: extra\n");
    write_manifest(root.path(), "20-std", "name: Standard\nkind: std\n");

    let source = DirectoryProviderSource::new(root.path(), catalog(Arc::default()));
    let providers = load_providers(&source, &SequentialIds::new()).unwrap();
    let mut builder = RegistryBuilder::new();
    setup_all(&providers, &mut builder).unwrap();
    let registry = builder.seal();

    assert_eq!(
        registry.lookup("http").map(|d| d.display_name()),
        Some("http check")
    );
    assert_eq!(registry.namespace_of("ssl"), Some("provider-2"));
}

#[test]
fn test_one_bad_manifest_aborts_loading() {
    let root = tempfile::tempdir().unwrap();
    write_manifest(root.path(), "10-std", "name: Standard\nkind: std\n");
    write_manifest(root.path(), "20-broken", "name: 42\nkind: std\n");

    let source = DirectoryProviderSource::new(root.path(), catalog(Arc::default()));
    let err = load_providers(&source, &SequentialIds::new()).unwrap_err();
    assert!(matches!(err, LoadError::InvalidName { .. }));
}

#[test]
fn test_shutdown_hooks_run_once_in_load_order() {
    let shutdowns = Arc::new(Mutex::new(Vec::new()));
    let root = tempfile::tempdir().unwrap();
    write_manifest(root.path(), "a", "name: first\nkind: extra\n");
    write_manifest(root.path(), "b", "name: std\nkind: std\n");
    write_manifest(root.path(), "c", "name: second\nkind: extra\n");

    let source = DirectoryProviderSource::new(root.path(), catalog(Arc::clone(&shutdowns)));
    let providers = load_providers(&source, &SequentialIds::new()).unwrap();

    assert_eq!(run_shutdown(&providers), 0);
    assert_eq!(*shutdowns.lock().unwrap(), vec!["first", "second"]);
}
