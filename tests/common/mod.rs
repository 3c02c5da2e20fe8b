//! Shared fixture builders for the integration suites.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use atomic_assets::cldb::{
    ClassDatabase, ClassDatabaseHeader, ClassRecord, CompressionKind, SchemaVariants, StringTable,
    TypeNode, LEGACY_SCRIPT_CLASS_ID,
};
use atomic_assets::format::{
    AssetsFile, BundleFile, External, ObjectInfo, ASSETS_FORMAT_VERSION,
};
use atomic_assets::util::{AssetWriter, EngineVersion};

/// Encoded assets file with the given dependency table and no objects.
pub fn assets_bytes(externals: &[&str]) -> Vec<u8> {
    assets_bytes_with_objects(externals, &[])
}

/// Encoded assets file with dependencies and `(path_id, class_id,
/// type_id)` object entries.
pub fn assets_bytes_with_objects(externals: &[&str], objects: &[(i64, i32, u16)]) -> Vec<u8> {
    let file = AssetsFile {
        format_version: ASSETS_FORMAT_VERSION,
        engine_version: EngineVersion::new(2021, 3, 0),
        externals: externals
            .iter()
            .map(|p| External { path: (*p).into() })
            .collect(),
        objects: objects
            .iter()
            .map(|&(path_id, class_id, type_id)| ObjectInfo {
                path_id,
                class_id,
                type_id,
                byte_start: 0,
                byte_size: 0,
            })
            .collect(),
    };
    let mut w = AssetWriter::new(Vec::new());
    file.write(&mut w).unwrap();
    w.into_inner()
}

/// Write an assets file into `dir` and return its path.
pub fn write_assets_file(dir: &Path, name: &str, externals: &[&str]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, assets_bytes(externals)).unwrap();
    path
}

/// Encoded bundle holding the given `(name, bytes)` members.
pub fn bundle_bytes(members: &[(&str, &[u8])], kind: CompressionKind) -> Vec<u8> {
    let mut w = AssetWriter::new(Vec::new());
    BundleFile::write(&mut w, members, kind).unwrap();
    w.into_inner()
}

/// Write a bundle file into `dir` and return its path.
pub fn write_bundle_file(
    dir: &Path,
    name: &str,
    members: &[(&str, &[u8])],
    kind: CompressionKind,
) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bundle_bytes(members, kind)).unwrap();
    path
}

fn leaf(strings: &mut StringTable, type_name: &str, field_name: &str) -> TypeNode {
    TypeNode {
        type_name: strings.add(type_name),
        field_name: strings.add(field_name),
        byte_size: 4,
        version: 1,
        type_flags: 0,
        meta_flag: 0,
        children: vec![],
    }
}

/// Small database: GameObject (1), Transform (4) and the legacy script
/// class (0x72), each with a release tree.
pub fn sample_database() -> ClassDatabase {
    let mut strings = StringTable::new();

    let game_object = leaf(&mut strings, "GameObject", "Base");
    let transform = leaf(&mut strings, "Transform", "Base");
    let script = leaf(&mut strings, "MonoBehaviour", "Base");
    let n_object = strings.add("Object");

    let record = |class_id, node: &TypeNode| ClassRecord {
        class_id,
        name: node.type_name,
        base_name: n_object,
        variants: SchemaVariants::ReleaseOnly(node.clone()),
    };

    ClassDatabase {
        header: ClassDatabaseHeader {
            file_version: 1,
            engine_version: EngineVersion::new(2021, 3, 0),
            compression: CompressionKind::None,
            compressed_size: 0,
            decompressed_size: 0,
        },
        classes: vec![
            record(1, &game_object),
            record(4, &transform),
            record(LEGACY_SCRIPT_CLASS_ID, &script),
        ],
        string_table: strings,
        common_string_indices: vec![],
    }
}

/// Encoded form of [`sample_database`].
pub fn database_bytes(kind: CompressionKind) -> Vec<u8> {
    let mut w = AssetWriter::new(Vec::new());
    sample_database().write(&mut w, kind).unwrap();
    w.into_inner()
}
