//! Bundle loading, member extraction and unloading.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::instance::{AssetsFileInstance, BundleFileInstance};
use crate::util::{Result, SegmentStream, SharedStream};

use super::AssetsManager;

impl AssetsManager {
    /// Look up a registered bundle by any spelling of its path.
    pub fn lookup_bundle_file(&self, path: impl AsRef<Path>) -> Option<Arc<BundleFileInstance>> {
        self.bundle_lookup.get(&Self::lookup_key(path))
    }

    /// Load a bundle from an already-open stream, registered under
    /// `path`.
    ///
    /// When the payload is compressed and `unpack_if_packed` is set,
    /// it is decompressed eagerly; pass `false` for large bundles you
    /// plan to decompress externally — member extraction requires an
    /// unpacked bundle.
    pub fn load_bundle_file(
        &self,
        stream: SharedStream,
        path: impl AsRef<Path>,
        unpack_if_packed: bool,
    ) -> Result<Arc<BundleFileInstance>> {
        let canonical = Self::canonical_path(path);
        let key = canonical.to_lowercase();

        self.bundle_lookup.get_or_try_insert_with(key, || {
            let inst = Arc::new(BundleFileInstance::new(
                stream,
                canonical.clone(),
                unpack_if_packed,
            )?);
            self.bundles.push(Arc::clone(&inst));
            debug!(path = %canonical, "bundle registered");
            Ok(inst)
        })
    }

    /// Load a bundle from disk by path.
    pub fn load_bundle_file_path(
        &self,
        path: impl AsRef<Path>,
        unpack_if_packed: bool,
    ) -> Result<Arc<BundleFileInstance>> {
        let path = path.as_ref();
        if let Some(inst) = self.lookup_bundle_file(path) {
            return Ok(inst);
        }
        let stream = SharedStream::new(File::open(path)?);
        self.load_bundle_file(stream, path, unpack_if_packed)
    }

    /// Materialize the bundle member at `index` as a container
    /// instance.
    ///
    /// The member's canonical path is `<bundle path>/<member name>`, so
    /// it deduplicates against containers loaded from disk under the
    /// same path. On a registry miss the member is validated by probing
    /// its magic before a full parse; members that are not containers
    /// yield `None`. Newly materialized members are appended to the
    /// bundle's discovery log.
    pub fn load_assets_file_from_bundle(
        &self,
        bundle: &Arc<BundleFileInstance>,
        index: usize,
        load_deps: bool,
    ) -> Result<Option<Arc<AssetsFileInstance>>> {
        let member_name = match bundle.with_file(|f| f.entry_name(index))?? {
            Some(name) => name,
            None => return Ok(None),
        };
        let member_path = Path::new(bundle.path()).join(&member_name);

        if let Some(inst) = self.lookup_assets_file(&member_path) {
            return Ok(Some(inst));
        }

        if !bundle.with_file(|f| f.is_assets_file(index))?? {
            return Ok(None);
        }

        let (offset, size) = match bundle.with_file(|f| f.entry_range(index))?? {
            Some(range) => range,
            None => return Ok(None),
        };
        let data_stream = bundle.with_data_stream(SharedStream::clone)?;
        let member_stream =
            SharedStream::new(SegmentStream::new(data_stream, offset, size));

        let (inst, created) = self.load_assets_file_tracked(
            member_stream,
            &member_path,
            Some(Arc::clone(bundle)),
        )?;
        if created {
            bundle.loaded_assets.push(Arc::clone(&inst));
            debug!(bundle = %bundle.path(), member = %member_name, "bundle member materialized");
            if load_deps {
                inst.resolve_all_dependencies(self)?;
            }
        }
        Ok(Some(inst))
    }

    /// Materialize a bundle member by name. `None` when no member has
    /// that name or it is not a container.
    pub fn load_assets_file_from_bundle_by_name(
        &self,
        bundle: &Arc<BundleFileInstance>,
        name: &str,
        load_deps: bool,
    ) -> Result<Option<Arc<AssetsFileInstance>>> {
        match bundle.with_file(|f| f.entry_index(name))?? {
            Some(index) => self.load_assets_file_from_bundle(bundle, index, load_deps),
            None => Ok(None),
        }
    }

    /// Unload a bundle by path, cascading over its materialized
    /// members. `false` when no bundle is registered under the path.
    pub fn unload_bundle_file(&self, path: impl AsRef<Path>) -> bool {
        let key = Self::lookup_key(path);
        match self.bundle_lookup.get(&key) {
            Some(inst) => {
                self.unload_bundle_instance_inner(&inst, &key);
                true
            }
            None => false,
        }
    }

    /// Unload a bundle instance, cascading over its materialized
    /// members. Closes it either way; `false` when not registered.
    pub fn unload_bundle_file_instance(&self, inst: &Arc<BundleFileInstance>) -> bool {
        if self.bundles.contains(inst) {
            let key = Self::lookup_key(inst.path());
            self.unload_bundle_instance_inner(inst, &key);
            true
        } else {
            inst.close();
            for member in inst.loaded_assets.snapshot() {
                self.unload_assets_file_instance(&member);
            }
            inst.loaded_assets.clear();
            false
        }
    }

    fn unload_bundle_instance_inner(&self, inst: &Arc<BundleFileInstance>, key: &String) {
        inst.close();
        for member in inst.loaded_assets.snapshot() {
            self.unload_assets_file_instance(&member);
        }
        inst.loaded_assets.clear();

        self.bundles.remove_item(inst);
        self.bundle_lookup.remove(key);
        debug!(path = %inst.path(), "bundle unloaded");
    }

    /// Unload every bundle, cascading over materialized members.
    /// `false` when no bundles were loaded.
    pub fn unload_all_bundle_files(&self) -> bool {
        if self.bundles.is_empty() {
            return false;
        }
        for inst in self.bundles.snapshot() {
            inst.close();
            for member in inst.loaded_assets.snapshot() {
                self.unload_assets_file_instance(&member);
            }
            inst.loaded_assets.clear();
        }
        self.bundles.clear();
        self.bundle_lookup.clear();
        true
    }
}
