//! The container registry.
//!
//! [`AssetsManager`] is the session-wide registry of open containers
//! and bundles, keyed by canonical path, plus the derived-schema caches
//! and the active class database. All registries and caches are
//! internally synchronized; contention is per structure, never global.

mod assets;
mod bundle;
mod catalog;
mod template;

pub use template::{RefTypeLookup, TemplateField, TypeReference, TYPE_FLAG_ARRAY};

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::cldb::{ClassDatabase, ClassPackage};
use crate::instance::{AssetsFileInstance, BundleFileInstance};
use crate::sync::{SyncList, SyncMap};

type PerInstanceCache<K> = SyncMap<String, Arc<SyncMap<K, Option<Arc<TemplateField>>>>>;

/// Registry of open container and bundle instances.
///
/// Invariants:
/// - at most one live instance per canonical path, per registry;
/// - every instance-keyed derived-cache entry references a currently
///   registered instance — unloading purges its entries.
pub struct AssetsManager {
    pub(crate) files: SyncList<Arc<AssetsFileInstance>>,
    pub(crate) file_lookup: SyncMap<String, Arc<AssetsFileInstance>>,
    pub(crate) bundles: SyncList<Arc<BundleFileInstance>>,
    pub(crate) bundle_lookup: SyncMap<String, Arc<BundleFileInstance>>,

    // Global derived caches, keyed by class id / reference type. Safe
    // to keep warm across reloads of different files.
    pub(crate) template_cache: SyncMap<i32, Arc<TemplateField>>,
    pub(crate) script_template_cache: SyncMap<TypeReference, Option<Arc<TemplateField>>>,

    // Instance-keyed derived caches, keyed by canonical path (the
    // registry invariant makes path <-> live instance one-to-one).
    pub(crate) type_tree_template_cache: PerInstanceCache<u16>,
    pub(crate) script_id_template_cache: PerInstanceCache<i64>,
    pub(crate) ref_type_cache: SyncMap<String, Arc<RefTypeLookup>>,

    pub(crate) class_database: RwLock<Option<Arc<ClassDatabase>>>,
    pub(crate) class_package: RwLock<Option<Arc<ClassPackage>>>,
}

impl AssetsManager {
    pub fn new() -> Self {
        Self {
            files: SyncList::new(),
            file_lookup: SyncMap::new(),
            bundles: SyncList::new(),
            bundle_lookup: SyncMap::new(),
            template_cache: SyncMap::new(),
            script_template_cache: SyncMap::new(),
            type_tree_template_cache: SyncMap::new(),
            script_id_template_cache: SyncMap::new(),
            ref_type_cache: SyncMap::new(),
            class_database: RwLock::new(None),
            class_package: RwLock::new(None),
        }
    }

    /// Canonical absolute form of a path, case preserved. Synthetic
    /// paths (bundle members, stream loads) normalize lexically.
    pub(crate) fn canonical_path(path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        std::path::absolute(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .into_owned()
    }

    /// Deduplication key for a path: canonical absolute form,
    /// case-folded. Two spellings of one file collide to one key.
    pub fn lookup_key(path: impl AsRef<Path>) -> String {
        Self::canonical_path(path).to_lowercase()
    }

    /// Snapshot of all registered container instances, in load order.
    pub fn loaded_assets_files(&self) -> Vec<Arc<AssetsFileInstance>> {
        self.files.snapshot()
    }

    /// Snapshot of all registered bundle instances, in load order.
    pub fn loaded_bundles(&self) -> Vec<Arc<BundleFileInstance>> {
        self.bundles.snapshot()
    }

    /// Unload every container and bundle.
    ///
    /// Instance-keyed caches are always cleared. When
    /// `unload_class_data` is set, the global template caches and the
    /// active class database/package are dropped as well; leaving them
    /// warm is safe across reloads of different files.
    pub fn unload_all(&self, unload_class_data: bool) -> bool {
        let had_files = self.unload_all_assets_files(unload_class_data);
        let had_bundles = self.unload_all_bundle_files();

        if unload_class_data {
            *self.class_database.write() = None;
            *self.class_package.write() = None;
        }

        debug!(unload_class_data, "unloaded all instances");
        had_files || had_bundles
    }
}

impl Default for AssetsManager {
    fn default() -> Self {
        Self::new()
    }
}
