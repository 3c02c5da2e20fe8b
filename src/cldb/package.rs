//! Class database packages.
//!
//! A package bundles several class databases, each tagged with the
//! inclusive engine-version range it describes, so one file can serve
//! many engine releases. Embedded databases are decoded lazily on first
//! selection.
//!
//! ```text
//! "CLPK" | fileVersion:u8 | count:i32
//!        | count * (firstVersion:u64 | lastVersion:u64
//!                   | byteLen:i32 | embedded CLDB bytes)
//! ```

use std::io::Cursor;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::util::{AssetReader, AssetWriter, EngineVersion, Error, ReadSeek, Result};

use super::file::ClassDatabase;
use super::header::CompressionKind;

/// Magic tag at the start of a class package file.
pub const CLPK_MAGIC: &[u8; 4] = b"CLPK";

/// Legacy lowercase tag; recognized but rejected.
pub const CLPK_LEGACY_MAGIC: &[u8; 4] = b"clpk";

/// Highest supported package file version.
pub const CLPK_MAX_VERSION: u8 = 1;

/// One package entry: a version range plus the raw database bytes,
/// decoded at most once.
struct PackageEntry {
    first: EngineVersion,
    last: EngineVersion,
    blob: Vec<u8>,
    decoded: Mutex<Option<Arc<ClassDatabase>>>,
}

impl PackageEntry {
    fn contains(&self, version: EngineVersion) -> bool {
        self.first <= version && version <= self.last
    }

    fn database(&self) -> Result<Arc<ClassDatabase>> {
        let mut guard = self.decoded.lock();
        if let Some(db) = guard.as_ref() {
            return Ok(Arc::clone(db));
        }
        let db = Arc::new(ClassDatabase::read(&mut AssetReader::new(Cursor::new(
            self.blob.clone(),
        )))?);
        *guard = Some(Arc::clone(&db));
        Ok(db)
    }
}

/// A decoded class database package.
pub struct ClassPackage {
    pub file_version: u8,
    entries: Vec<PackageEntry>,
}

impl ClassPackage {
    /// Decode a package from a stream. Embedded databases are kept as
    /// raw bytes until first selected.
    pub fn read<R: ReadSeek>(reader: &mut AssetReader<R>) -> Result<Self> {
        let magic = reader.read_tag()?;
        if &magic != CLPK_MAGIC {
            if &magic == CLPK_LEGACY_MAGIC {
                return Err(Error::LegacyFormat("clpk"));
            }
            return Err(Error::InvalidMagic {
                expected: "CLPK",
                found: magic,
            });
        }

        let file_version = reader.read_u8()?;
        if file_version > CLPK_MAX_VERSION {
            return Err(Error::UnsupportedVersion(file_version));
        }

        let count = reader.read_i32()?.max(0) as usize;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let first = EngineVersion::from_u64(reader.read_u64()?);
            let last = EngineVersion::from_u64(reader.read_u64()?);
            let len = reader.read_i32()?.max(0) as usize;
            let blob = reader.read_bytes(len)?;
            entries.push(PackageEntry {
                first,
                last,
                blob,
                decoded: Mutex::new(None),
            });
        }

        debug!(entries = entries.len(), "class package decoded");
        Ok(Self {
            file_version,
            entries,
        })
    }

    /// Encode a package from already-built databases, one entry per
    /// `(first, last, database)` triple.
    pub fn write<W: std::io::Write>(
        writer: &mut AssetWriter<W>,
        entries: &[(EngineVersion, EngineVersion, &ClassDatabase)],
        kind: CompressionKind,
    ) -> Result<()> {
        writer.write_bytes(CLPK_MAGIC)?;
        writer.write_u8(CLPK_MAX_VERSION)?;
        writer.write_i32(entries.len() as i32)?;
        for (first, last, db) in entries {
            let mut blob_writer = AssetWriter::new(Vec::new());
            db.write(&mut blob_writer, kind)?;
            let blob = blob_writer.into_inner();

            writer.write_u64(first.as_u64())?;
            writer.write_u64(last.as_u64())?;
            writer.write_i32(blob.len() as i32)?;
            writer.write_bytes(&blob)?;
        }
        Ok(())
    }

    /// Number of databases in the package.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Select the database for an engine version: the first entry whose
    /// inclusive range contains it. `None` when no range matches.
    pub fn database_for(&self, version: EngineVersion) -> Result<Option<Arc<ClassDatabase>>> {
        for entry in &self.entries {
            if entry.contains(version) {
                return entry.database().map(Some);
            }
        }
        Ok(None)
    }
}
