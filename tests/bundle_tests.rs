//! Bundle loading, member extraction and the unload cascade.

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use atomic_assets::cldb::CompressionKind;
use atomic_assets::AssetsManager;

use common::{assets_bytes, write_bundle_file};

#[test]
fn test_member_extraction_is_memoized() {
    let dir = TempDir::new().unwrap();
    let astf = assets_bytes(&[]);
    let path = write_bundle_file(
        dir.path(),
        "level.bundle",
        &[("a.assets", &astf), ("b.assets", &astf)],
        CompressionKind::None,
    );

    let manager = AssetsManager::new();
    let bundle = manager.load_bundle_file_path(&path, true).unwrap();

    let first = manager
        .load_assets_file_from_bundle(&bundle, 0, false)
        .unwrap()
        .unwrap();
    let second = manager
        .load_assets_file_from_bundle(&bundle, 0, false)
        .unwrap()
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    // One discovery-log entry per member, not per extraction.
    assert_eq!(bundle.loaded_assets.len(), 1);

    let by_name = manager
        .load_assets_file_from_bundle_by_name(&bundle, "a.assets", false)
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&first, &by_name));

    assert!(Arc::ptr_eq(&bundle, first.parent_bundle().unwrap()));
}

#[test]
fn test_non_container_member_yields_none() {
    let dir = TempDir::new().unwrap();
    let path = write_bundle_file(
        dir.path(),
        "mixed.bundle",
        &[("noise.bin", b"just some resource bytes")],
        CompressionKind::None,
    );

    let manager = AssetsManager::new();
    let bundle = manager.load_bundle_file_path(&path, true).unwrap();

    assert!(manager
        .load_assets_file_from_bundle(&bundle, 0, false)
        .unwrap()
        .is_none());
    // Out-of-range index likewise.
    assert!(manager
        .load_assets_file_from_bundle(&bundle, 5, false)
        .unwrap()
        .is_none());
    assert!(bundle.loaded_assets.is_empty());
}

#[test]
fn test_compressed_bundle_unpacks_on_load() {
    let dir = TempDir::new().unwrap();
    let astf = assets_bytes(&[]);
    for (name, kind) in [
        ("lz4.bundle", CompressionKind::Lz4),
        ("lzma.bundle", CompressionKind::Lzma),
    ] {
        let path = write_bundle_file(dir.path(), name, &[("a.assets", &astf)], kind);

        let manager = AssetsManager::new();
        let bundle = manager.load_bundle_file_path(&path, true).unwrap();
        let member = manager
            .load_assets_file_from_bundle(&bundle, 0, false)
            .unwrap();
        assert!(member.is_some());
    }
}

#[test]
fn test_packed_bundle_refuses_extraction() {
    let dir = TempDir::new().unwrap();
    let astf = assets_bytes(&[]);
    let path = write_bundle_file(
        dir.path(),
        "packed.bundle",
        &[("a.assets", &astf)],
        CompressionKind::Lz4,
    );

    let manager = AssetsManager::new();
    let bundle = manager.load_bundle_file_path(&path, false).unwrap();
    assert!(bundle.with_file(|f| f.data_is_compressed()).unwrap());
    assert!(manager
        .load_assets_file_from_bundle(&bundle, 0, false)
        .is_err());
}

#[test]
fn test_unload_bundle_cascades_over_members() {
    let dir = TempDir::new().unwrap();
    let astf = assets_bytes(&[]);
    let path = write_bundle_file(
        dir.path(),
        "level.bundle",
        &[("a.assets", &astf), ("b.assets", &astf)],
        CompressionKind::None,
    );

    let manager = AssetsManager::new();
    let bundle = manager.load_bundle_file_path(&path, true).unwrap();
    let a = manager
        .load_assets_file_from_bundle(&bundle, 0, false)
        .unwrap()
        .unwrap();
    let b = manager
        .load_assets_file_from_bundle(&bundle, 1, false)
        .unwrap()
        .unwrap();
    assert_eq!(manager.loaded_assets_files().len(), 2);

    assert!(manager.unload_bundle_file(&path));
    assert!(bundle.is_closed());
    assert!(a.is_closed());
    assert!(b.is_closed());
    assert!(manager.loaded_assets_files().is_empty());
    assert!(manager.lookup_bundle_file(&path).is_none());
    assert!(manager.lookup_assets_file(a.path()).is_none());
}

#[test]
fn test_member_path_collides_with_disk_spelling() {
    let dir = TempDir::new().unwrap();
    let astf = assets_bytes(&[]);
    let path = write_bundle_file(
        dir.path(),
        "level.bundle",
        &[("shared.assets", &astf)],
        CompressionKind::None,
    );

    let manager = AssetsManager::new();
    let bundle = manager.load_bundle_file_path(&path, true).unwrap();
    let member = manager
        .load_assets_file_from_bundle(&bundle, 0, false)
        .unwrap()
        .unwrap();

    // The synthetic member path is <bundle path>/<member name>; a load
    // by that spelling is a registry hit, never a disk access.
    let spelled = path.join("shared.assets");
    let again = manager.load_assets_file_path(&spelled, false).unwrap();
    assert!(Arc::ptr_eq(&member, &again));
    assert_eq!(manager.loaded_assets_files().len(), 1);
}

#[test]
fn test_dependency_resolves_to_parent_bundle_member() {
    let dir = TempDir::new().unwrap();
    let shared = assets_bytes(&[]);
    let level = assets_bytes(&["shared.assets"]);
    let path = write_bundle_file(
        dir.path(),
        "level.bundle",
        &[("level.assets", &level), ("shared.assets", &shared)],
        CompressionKind::None,
    );

    let manager = AssetsManager::new();
    let bundle = manager.load_bundle_file_path(&path, true).unwrap();
    let inst = manager
        .load_assets_file_from_bundle(&bundle, 0, true)
        .unwrap()
        .unwrap();

    // Nothing on disk matches, so the slot resolves through the bundle.
    let dep = inst.dependency(&manager, 0).unwrap().unwrap();
    assert_eq!(dep.name(), "shared.assets");
    assert!(Arc::ptr_eq(&bundle, dep.parent_bundle().unwrap()));
    assert_eq!(bundle.loaded_assets.len(), 2);
}

#[test]
fn test_bundle_dedups_path_spellings() {
    let dir = TempDir::new().unwrap();
    let path = write_bundle_file(dir.path(), "level.bundle", &[], CompressionKind::None);

    let manager = AssetsManager::new();
    let a = manager.load_bundle_file_path(&path, true).unwrap();
    let b = manager
        .load_bundle_file_path(dir.path().join(".").join("level.bundle"), true)
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(manager.loaded_bundles().len(), 1);
}
