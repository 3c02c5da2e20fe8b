//! Guarded bundle instances.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::format::BundleFile;
use crate::sync::SyncList;
use crate::util::{Error, Result, SharedStream};

use super::assets::AssetsFileInstance;

/// One open bundle (archive) file.
///
/// Owns the parsed directory and its streams behind a single lock and
/// keeps a discovery log of the member containers materialized from it
/// so far. The log is append-only and never pre-populated: members show
/// up when the manager extracts them, not eagerly.
pub struct BundleFileInstance {
    path: String,
    name: String,
    guarded: Mutex<Option<BundleFile>>,
    /// Members loaded from this bundle so far. Not every member of the
    /// bundle — only the ones that have been materialized.
    pub loaded_assets: SyncList<Arc<AssetsFileInstance>>,
}

impl BundleFileInstance {
    /// Parse a bundle instance from a shared stream.
    ///
    /// When `unpack_if_packed` is set and the payload is compressed,
    /// the bundle is decompressed eagerly so the directory is
    /// addressable; otherwise the caller must arrange unpacking before
    /// member extraction.
    pub fn new(
        stream: SharedStream,
        path: impl Into<String>,
        unpack_if_packed: bool,
    ) -> Result<Self> {
        let path = path.into();
        let name = Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());

        let mut file = BundleFile::read(stream)?;
        if file.data_is_compressed() && unpack_if_packed {
            file = file.unpack()?;
        }

        debug!(path = %path, packed = file.data_is_compressed(), "bundle parsed");

        Ok(Self {
            path,
            name,
            guarded: Mutex::new(Some(file)),
            loaded_assets: SyncList::new(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run a closure against the parsed bundle structure with the
    /// instance lock held.
    pub fn with_file<T>(&self, f: impl FnOnce(&mut BundleFile) -> T) -> Result<T> {
        let mut guard = self.guarded.lock();
        match guard.as_mut() {
            Some(file) => Ok(f(file)),
            None => Err(Error::InstanceClosed),
        }
    }

    /// Run a closure against the stream underlying the bundle
    /// structure.
    pub fn with_stream<T>(&self, f: impl FnOnce(&SharedStream) -> T) -> Result<T> {
        let guard = self.guarded.lock();
        match guard.as_ref() {
            Some(file) => Ok(f(&file.stream())),
            None => Err(Error::InstanceClosed),
        }
    }

    /// Run a closure against the stream underlying the decompressed
    /// data region. This is the same stream as [`Self::with_stream`]
    /// unless unpacking produced a separate buffer.
    pub fn with_data_stream<T>(&self, f: impl FnOnce(&SharedStream) -> T) -> Result<T> {
        let guard = self.guarded.lock();
        match guard.as_ref() {
            Some(file) => Ok(f(&file.data_stream()?)),
            None => Err(Error::InstanceClosed),
        }
    }

    /// Release the backing streams. Idempotent. Does not close
    /// materialized members; the manager's unload cascade does that.
    pub fn close(&self) {
        let mut guard = self.guarded.lock();
        if guard.take().is_some() {
            trace!(path = %self.path, "bundle instance closed");
        }
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.guarded.lock().is_none()
    }
}

/// Identity follows the registry invariant: one live instance per
/// canonical path.
impl PartialEq for BundleFileInstance {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for BundleFileInstance {}
