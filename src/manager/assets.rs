//! Standalone container loading and unloading.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::instance::{AssetsFileInstance, BundleFileInstance};
use crate::util::{Result, SharedStream};

use super::AssetsManager;

impl AssetsManager {
    /// Look up a registered container by any spelling of its path.
    pub fn lookup_assets_file(&self, path: impl AsRef<Path>) -> Option<Arc<AssetsFileInstance>> {
        self.file_lookup.get(&Self::lookup_key(path))
    }

    /// Load a container from an already-open stream, registered under
    /// `path`.
    ///
    /// If the canonical key is already registered the existing instance
    /// is returned; `load_deps` still triggers dependency resolution on
    /// it (resolution is idempotent). Parse failures register nothing.
    pub fn load_assets_file(
        &self,
        stream: SharedStream,
        path: impl AsRef<Path>,
        load_deps: bool,
    ) -> Result<Arc<AssetsFileInstance>> {
        let (inst, _created) = self.load_assets_file_tracked(stream, path, None)?;
        if load_deps {
            inst.resolve_all_dependencies(self)?;
        }
        Ok(inst)
    }

    /// Load a container from disk by path.
    ///
    /// A registry hit returns the existing instance without touching
    /// its dependencies; this entry point is what dependency resolution
    /// itself recurses through, and a hit there means the instance is
    /// either resolved already or currently resolving.
    pub fn load_assets_file_path(
        &self,
        path: impl AsRef<Path>,
        load_deps: bool,
    ) -> Result<Arc<AssetsFileInstance>> {
        let path = path.as_ref();
        if let Some(inst) = self.lookup_assets_file(path) {
            return Ok(inst);
        }
        let stream = SharedStream::new(File::open(path)?);
        let (inst, created) = self.load_assets_file_tracked(stream, path, None)?;
        if load_deps && created {
            inst.resolve_all_dependencies(self)?;
        }
        Ok(inst)
    }

    /// Parse-and-register without dependency loading; also reports
    /// whether this call materialized the instance. Registration
    /// happens at most once per canonical key; parse failures register
    /// nothing.
    pub(crate) fn load_assets_file_tracked(
        &self,
        stream: SharedStream,
        path: impl AsRef<Path>,
        parent_bundle: Option<Arc<BundleFileInstance>>,
    ) -> Result<(Arc<AssetsFileInstance>, bool)> {
        let canonical = Self::canonical_path(path);
        let key = canonical.to_lowercase();

        let mut created = false;
        let inst = self
            .file_lookup
            .get_or_try_insert_with(key, || -> Result<Arc<AssetsFileInstance>> {
                let inst = Arc::new(AssetsFileInstance::new(
                    stream,
                    canonical.clone(),
                    parent_bundle,
                )?);
                self.files.push(Arc::clone(&inst));
                created = true;
                debug!(path = %canonical, "assets file registered");
                Ok(inst)
            })?;
        Ok((inst, created))
    }

    /// Unload a container by path. Purges its entries from the
    /// instance-keyed caches and the registry, then closes it. `false`
    /// when no instance is registered under the path.
    pub fn unload_assets_file(&self, path: impl AsRef<Path>) -> bool {
        let key = Self::lookup_key(path);
        match self.file_lookup.get(&key) {
            Some(inst) => {
                self.purge_instance_caches(&key);
                self.files.remove_item(&inst);
                self.file_lookup.remove(&key);
                inst.close();
                debug!(path = %inst.path(), "assets file unloaded");
                true
            }
            None => false,
        }
    }

    /// Unload a container instance. Closes it either way; `false` when
    /// it was not registered.
    pub fn unload_assets_file_instance(&self, inst: &Arc<AssetsFileInstance>) -> bool {
        inst.close();

        if self.files.contains(inst) {
            let key = Self::lookup_key(inst.path());
            self.purge_instance_caches(&key);
            self.file_lookup.remove(&key);
            self.files.remove_item(inst);
            debug!(path = %inst.path(), "assets file unloaded");
            true
        } else {
            false
        }
    }

    /// Unload every container. Instance-keyed caches are always
    /// cleared; `clear_cache` also clears the global template caches.
    /// `false` when no containers were loaded.
    pub fn unload_all_assets_files(&self, clear_cache: bool) -> bool {
        if clear_cache {
            self.template_cache.clear();
            self.script_template_cache.clear();
        }

        self.type_tree_template_cache.clear();
        self.script_id_template_cache.clear();
        self.ref_type_cache.clear();

        if self.files.is_empty() {
            return false;
        }
        for inst in self.files.snapshot() {
            inst.close();
        }
        self.files.clear();
        self.file_lookup.clear();
        true
    }

    /// Drop the three instance-keyed cache rows for one canonical key.
    fn purge_instance_caches(&self, key: &String) {
        self.type_tree_template_cache.remove(key);
        self.script_id_template_cache.remove(key);
        self.ref_type_cache.remove(key);
    }
}
