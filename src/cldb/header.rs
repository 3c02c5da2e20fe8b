//! Class database file header.

use crate::util::{AssetReader, AssetWriter, EngineVersion, Error, ReadSeek, Result};

/// Magic tag at the start of a class database file.
pub const CLDB_MAGIC: &[u8; 4] = b"CLDB";

/// Legacy lowercase tag; recognized but rejected.
pub const CLDB_LEGACY_MAGIC: &[u8; 4] = b"cldb";

/// Highest supported file version.
pub const CLDB_MAX_VERSION: u8 = 1;

/// Compression kind of the class database payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
    None,
    Lz4,
    Lzma,
}

impl CompressionKind {
    /// Decode the header byte. Unknown values are a fatal format error.
    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            0 => Ok(Self::None),
            1 => Ok(Self::Lz4),
            2 => Ok(Self::Lzma),
            other => Err(Error::UnsupportedCompression(other)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Lz4 => 1,
            Self::Lzma => 2,
        }
    }
}

/// Decoded class database header.
///
/// ```text
/// "CLDB" | fileVersion:u8 | engineVersion:u64 | compressionType:u8
///        | compressedSize:i32 | decompressedSize:i32
/// ```
#[derive(Debug, Clone)]
pub struct ClassDatabaseHeader {
    pub file_version: u8,
    pub engine_version: EngineVersion,
    pub compression: CompressionKind,
    pub compressed_size: i32,
    pub decompressed_size: i32,
}

impl ClassDatabaseHeader {
    /// Read and validate the header.
    ///
    /// The lowercase `cldb` tag names a retired format and is rejected as
    /// [`Error::LegacyFormat`]; any other non-`CLDB` tag means the input
    /// is not a class database at all.
    pub fn read<R: ReadSeek>(reader: &mut AssetReader<R>) -> Result<Self> {
        let magic = reader.read_tag()?;
        if &magic != CLDB_MAGIC {
            if &magic == CLDB_LEGACY_MAGIC {
                return Err(Error::LegacyFormat("cldb"));
            }
            return Err(Error::InvalidMagic {
                expected: "CLDB",
                found: magic,
            });
        }

        let file_version = reader.read_u8()?;
        if file_version > CLDB_MAX_VERSION {
            return Err(Error::UnsupportedVersion(file_version));
        }

        let engine_version = EngineVersion::from_u64(reader.read_u64()?);
        let compression = CompressionKind::from_u8(reader.read_u8()?)?;
        let compressed_size = reader.read_i32()?;
        let decompressed_size = reader.read_i32()?;

        Ok(Self {
            file_version,
            engine_version,
            compression,
            compressed_size,
            decompressed_size,
        })
    }

    /// Write the header.
    pub fn write<W: std::io::Write>(&self, writer: &mut AssetWriter<W>) -> Result<()> {
        writer.write_bytes(CLDB_MAGIC)?;
        writer.write_u8(self.file_version)?;
        writer.write_u64(self.engine_version.as_u64())?;
        writer.write_u8(self.compression.as_u8())?;
        writer.write_i32(self.compressed_size)?;
        writer.write_i32(self.decompressed_size)?;
        Ok(())
    }
}
