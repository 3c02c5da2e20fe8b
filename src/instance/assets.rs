//! Guarded standalone-container instances.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::format::AssetsFile;
use crate::manager::AssetsManager;
use crate::sync::SyncMap;
use crate::util::{AssetReader, Error, Result, SegmentStream, SharedStream};

use super::bundle::BundleFileInstance;

struct Guarded {
    file: AssetsFile,
    stream: SharedStream,
}

/// One open standalone assets file.
///
/// Owns its parsed structure and backing stream behind a single lock;
/// all access goes through closure-running guards, so the instance can
/// be read, re-seeked or mutated from any thread at the cost of
/// serializing access per instance.
///
/// At most one live instance exists per canonical path within a
/// manager.
pub struct AssetsFileInstance {
    /// Canonical absolute path. Can be synthetic when the file came
    /// from a bundle member or a raw stream.
    path: String,
    /// File-name component of the path.
    name: String,
    /// The bundle this file was extracted from, if any.
    parent_bundle: Option<Arc<BundleFileInstance>>,
    guarded: Mutex<Option<Guarded>>,
    /// Memoized dependency resolutions, slot index → instance. Negative
    /// results are memoized too: a slot that resolved to nothing will
    /// not re-probe the disk.
    dependency_cache: SyncMap<usize, Option<Arc<AssetsFileInstance>>>,
}

impl AssetsFileInstance {
    /// Parse an instance from a shared stream.
    pub fn new(
        stream: SharedStream,
        path: impl Into<String>,
        parent_bundle: Option<Arc<BundleFileInstance>>,
    ) -> Result<Self> {
        let path = path.into();
        let name = Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());

        let len = stream.len()?;
        let mut reader = AssetReader::new(SegmentStream::new(stream.clone(), 0, len));
        let file = AssetsFile::read(&mut reader)?;

        debug!(path = %path, externals = file.externals.len(), "assets file parsed");

        Ok(Self {
            path,
            name,
            parent_bundle,
            guarded: Mutex::new(Some(Guarded { file, stream })),
            dependency_cache: SyncMap::new(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bundle this instance was extracted from, if any.
    pub fn parent_bundle(&self) -> Option<&Arc<BundleFileInstance>> {
        self.parent_bundle.as_ref()
    }

    /// Run a closure against the parsed structure with the instance
    /// lock held. Fails with [`Error::InstanceClosed`] after `close`.
    pub fn with_file<T>(&self, f: impl FnOnce(&mut AssetsFile) -> T) -> Result<T> {
        let mut guard = self.guarded.lock();
        match guard.as_mut() {
            Some(inner) => Ok(f(&mut inner.file)),
            None => Err(Error::InstanceClosed),
        }
    }

    /// Run a closure against the backing stream with the instance lock
    /// held.
    pub fn with_stream<T>(&self, f: impl FnOnce(&SharedStream) -> T) -> Result<T> {
        let guard = self.guarded.lock();
        match guard.as_ref() {
            Some(inner) => Ok(f(&inner.stream)),
            None => Err(Error::InstanceClosed),
        }
    }

    /// Release the backing stream. Idempotent.
    pub fn close(&self) {
        let mut guard = self.guarded.lock();
        if guard.take().is_some() {
            trace!(path = %self.path, "assets instance closed");
        }
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.guarded.lock().is_none()
    }

    /// Resolve dependency slot `index` against the manager, memoized.
    ///
    /// Resolution order on first call: the manager's registry, then a
    /// sibling file using the dependency's full relative path, then a
    /// sibling using only its file name, then a same-named member of
    /// the parent bundle. A slot that resolves nowhere yields `None`,
    /// permanently. Each slot resolves at most once even under
    /// concurrent callers.
    pub fn dependency(
        self: &Arc<Self>,
        manager: &AssetsManager,
        index: usize,
    ) -> Result<Option<Arc<AssetsFileInstance>>> {
        let this = Arc::clone(self);
        self.dependency_cache
            .get_or_try_insert_with(index, move || this.resolve_dependency(manager, index))
    }

    fn resolve_dependency(
        &self,
        manager: &AssetsManager,
        index: usize,
    ) -> Result<Option<Arc<AssetsFileInstance>>> {
        let dep_path = self.with_file(|f| f.external_path(index).map(str::to_owned))?;
        let dep_path = match dep_path {
            Some(p) if !p.is_empty() => p,
            // No such slot, or an intentionally empty reference.
            _ => return Ok(None),
        };

        trace!(path = %self.path, slot = index, dep = %dep_path, "resolving dependency");

        if let Some(inst) = manager.lookup_assets_file(&dep_path) {
            return Ok(Some(inst));
        }

        let parent_dir = Path::new(&self.path).parent().unwrap_or(Path::new(""));
        let abs_path = parent_dir.join(&dep_path);
        let local_path = Path::new(&dep_path)
            .file_name()
            .map(|n| parent_dir.join(n));

        if abs_path.exists() {
            return manager
                .load_assets_file_path(&abs_path, true)
                .map(Some);
        }
        if let Some(local) = local_path {
            if local.exists() {
                return manager.load_assets_file_path(&local, true).map(Some);
            }
        }
        if let Some(bundle) = &self.parent_bundle {
            return manager.load_assets_file_from_bundle_by_name(bundle, &dep_path, true);
        }

        // Missing dependencies are expected and tolerated.
        Ok(None)
    }

    /// Resolve every dependency slot of this instance.
    pub fn resolve_all_dependencies(self: &Arc<Self>, manager: &AssetsManager) -> Result<()> {
        let count = self.with_file(|f| f.externals.len())?;
        for index in 0..count {
            self.dependency(manager, index)?;
        }
        Ok(())
    }

    /// Number of memoized dependency slots (positive or negative).
    pub fn cached_dependency_count(&self) -> usize {
        self.dependency_cache.len()
    }
}

/// Identity follows the registry invariant: one live instance per
/// canonical path.
impl PartialEq for AssetsFileInstance {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for AssetsFileInstance {}
