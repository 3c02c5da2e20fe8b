//! Standalone assets-file structure.
//!
//! A compact container holding an external-reference (dependency) table
//! and an object-info table.
//!
//! ```text
//! "ASTF" | formatVersion:u32 | engineVersion:u64
//!        | externalCount:i32 | externalCount * (path: string)
//!        | objectCount:i32   | objectCount * ObjectInfo
//! ObjectInfo = pathId:i64 | classId:i32 | typeId:u16
//!            | byteStart:u64 | byteSize:u32
//! ```

use crate::util::{AssetReader, AssetWriter, EngineVersion, Error, ReadSeek, Result};

/// Magic tag at the start of an assets file.
pub const ASSETS_MAGIC: &[u8; 4] = b"ASTF";

/// Current assets-file format version.
pub const ASSETS_FORMAT_VERSION: u32 = 1;

/// One external reference: a path to another container this file
/// depends on. The slot index of a dependency is its table index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct External {
    pub path: String,
}

/// One serialized object entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub path_id: i64,
    pub class_id: i32,
    pub type_id: u16,
    pub byte_start: u64,
    pub byte_size: u32,
}

impl ObjectInfo {
    fn read<R: ReadSeek>(reader: &mut AssetReader<R>) -> Result<Self> {
        Ok(Self {
            path_id: reader.read_i64()?,
            class_id: reader.read_i32()?,
            type_id: reader.read_u16()?,
            byte_start: reader.read_u64()?,
            byte_size: reader.read_u32()?,
        })
    }

    fn write<W: std::io::Write>(&self, writer: &mut AssetWriter<W>) -> Result<()> {
        writer.write_i64(self.path_id)?;
        writer.write_i32(self.class_id)?;
        writer.write_u16(self.type_id)?;
        writer.write_u64(self.byte_start)?;
        writer.write_u32(self.byte_size)
    }
}

/// A parsed standalone assets file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetsFile {
    pub format_version: u32,
    pub engine_version: EngineVersion,
    pub externals: Vec<External>,
    pub objects: Vec<ObjectInfo>,
}

impl AssetsFile {
    /// Parse an assets file from the start of `reader`.
    pub fn read<R: ReadSeek>(reader: &mut AssetReader<R>) -> Result<Self> {
        let magic = reader.read_tag()?;
        if &magic != ASSETS_MAGIC {
            return Err(Error::InvalidMagic {
                expected: "ASTF",
                found: magic,
            });
        }

        let format_version = reader.read_u32()?;
        let engine_version = EngineVersion::from_u64(reader.read_u64()?);

        let external_count = reader.read_i32()?.max(0) as usize;
        let mut externals = Vec::with_capacity(external_count);
        for _ in 0..external_count {
            externals.push(External {
                path: reader.read_string()?,
            });
        }

        let object_count = reader.read_i32()?.max(0) as usize;
        let mut objects = Vec::with_capacity(object_count);
        for _ in 0..object_count {
            objects.push(ObjectInfo::read(reader)?);
        }

        Ok(Self {
            format_version,
            engine_version,
            externals,
            objects,
        })
    }

    /// Write the file structure.
    pub fn write<W: std::io::Write>(&self, writer: &mut AssetWriter<W>) -> Result<()> {
        writer.write_bytes(ASSETS_MAGIC)?;
        writer.write_u32(self.format_version)?;
        writer.write_u64(self.engine_version.as_u64())?;
        writer.write_i32(self.externals.len() as i32)?;
        for ext in &self.externals {
            writer.write_string(&ext.path)?;
        }
        writer.write_i32(self.objects.len() as i32)?;
        for obj in &self.objects {
            obj.write(writer)?;
        }
        Ok(())
    }

    /// Check whether `reader` begins with an assets-file magic.
    ///
    /// Never errors: truncated or foreign bytes answer `false`. The
    /// stream position afterwards is unspecified.
    pub fn probe<R: ReadSeek>(reader: &mut AssetReader<R>) -> bool {
        if reader.seek_to(0).is_err() {
            return false;
        }
        matches!(reader.read_tag(), Ok(tag) if &tag == ASSETS_MAGIC)
    }

    /// Dependency path for slot `index`, if the table has that slot.
    pub fn external_path(&self, index: usize) -> Option<&str> {
        self.externals.get(index).map(|e| e.path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> AssetsFile {
        AssetsFile {
            format_version: ASSETS_FORMAT_VERSION,
            engine_version: EngineVersion::new(2021, 1, 0),
            externals: vec![
                External {
                    path: "shared.assets".into(),
                },
                External { path: "".into() },
            ],
            objects: vec![ObjectInfo {
                path_id: 1,
                class_id: 28,
                type_id: 0,
                byte_start: 0,
                byte_size: 64,
            }],
        }
    }

    #[test]
    fn test_round_trip() {
        let file = sample();
        let mut w = AssetWriter::new(Vec::new());
        file.write(&mut w).unwrap();
        let read = AssetsFile::read(&mut AssetReader::new(Cursor::new(w.into_inner()))).unwrap();
        assert_eq!(read, file);
    }

    #[test]
    fn test_probe() {
        let mut w = AssetWriter::new(Vec::new());
        sample().write(&mut w).unwrap();
        let mut good = AssetReader::new(Cursor::new(w.into_inner()));
        assert!(AssetsFile::probe(&mut good));

        let mut bad = AssetReader::new(Cursor::new(b"BNDL....".to_vec()));
        assert!(!AssetsFile::probe(&mut bad));

        let mut short = AssetReader::new(Cursor::new(b"AS".to_vec()));
        assert!(!AssetsFile::probe(&mut short));
    }

    #[test]
    fn test_external_path() {
        let file = sample();
        assert_eq!(file.external_path(0), Some("shared.assets"));
        assert_eq!(file.external_path(1), Some(""));
        assert_eq!(file.external_path(9), None);
    }
}
