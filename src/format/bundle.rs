//! Bundle (archive) file structure.
//!
//! A bundle is a directory of named byte ranges over a data region. The
//! directory and data together form the payload, which may be LZ4- or
//! LZMA-compressed as a whole.
//!
//! ```text
//! "BNDL" | formatVersion:u32 | compression:u8
//!        | decompressedSize:u64 | compressedSize:u64 | payload
//! payload = entryCount:i32
//!         | entryCount * (name: string | offset:u64 | size:u64)
//!         | data bytes...
//! ```
//!
//! Entry offsets are relative to the start of the data region.

use std::io::Cursor;

use tracing::debug;

use crate::cldb::CompressionKind;
use crate::format::assets::AssetsFile;
use crate::util::{
    AssetReader, AssetWriter, Error, ReadSeek, Result, SegmentStream, SharedStream,
};

/// Magic tag at the start of a bundle file.
pub const BUNDLE_MAGIC: &[u8; 4] = b"BNDL";

/// Current bundle format version.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Byte length of the fixed bundle header.
pub const BUNDLE_HEADER_SIZE: u64 = 4 + 4 + 1 + 8 + 8;

/// Decoded bundle header.
#[derive(Debug, Clone)]
pub struct BundleHeader {
    pub format_version: u32,
    pub compression: CompressionKind,
    pub decompressed_size: u64,
    pub compressed_size: u64,
}

/// One directory entry: a named byte range in the data region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    pub name: String,
    pub offset: u64,
    pub size: u64,
}

/// Addressable payload: a directory plus the stream and absolute offset
/// of the data region. Absent while the payload is still compressed.
struct BundlePayload {
    directory: Vec<BundleEntry>,
    data_stream: SharedStream,
    data_offset: u64,
}

/// A parsed bundle file.
///
/// The backing stream stays shared so member sub-streams can be carved
/// out of it; all raw reads go through the [`SharedStream`] lock.
pub struct BundleFile {
    pub header: BundleHeader,
    stream: SharedStream,
    payload: Option<BundlePayload>,
}

impl BundleFile {
    /// Parse a bundle from a shared stream.
    ///
    /// When the payload is uncompressed the directory is decoded
    /// immediately and the data region addresses into the same stream.
    /// When compressed, directory access requires [`BundleFile::unpack`]
    /// first.
    pub fn read(stream: SharedStream) -> Result<Self> {
        let len = stream.len()?;
        let mut reader = AssetReader::new(SegmentStream::new(stream.clone(), 0, len));

        let magic = reader.read_tag()?;
        if &magic != BUNDLE_MAGIC {
            return Err(Error::InvalidMagic {
                expected: "BNDL",
                found: magic,
            });
        }
        let header = BundleHeader {
            format_version: reader.read_u32()?,
            compression: CompressionKind::from_u8(reader.read_u8()?)?,
            decompressed_size: reader.read_u64()?,
            compressed_size: reader.read_u64()?,
        };

        let payload = match header.compression {
            CompressionKind::None => {
                let directory = Self::read_directory(&mut reader)?;
                let data_offset = reader.position()?;
                Some(BundlePayload {
                    directory,
                    data_stream: stream.clone(),
                    data_offset,
                })
            }
            _ => None,
        };

        Ok(Self {
            header,
            stream,
            payload,
        })
    }

    fn read_directory<R: ReadSeek>(reader: &mut AssetReader<R>) -> Result<Vec<BundleEntry>> {
        let count = reader.read_i32()?.max(0) as usize;
        let mut directory = Vec::with_capacity(count);
        for _ in 0..count {
            directory.push(BundleEntry {
                name: reader.read_string()?,
                offset: reader.read_u64()?,
                size: reader.read_u64()?,
            });
        }
        Ok(directory)
    }

    /// Whether the payload is still compressed (directory unavailable).
    pub fn data_is_compressed(&self) -> bool {
        self.payload.is_none()
    }

    /// Decompress the payload into memory and return an addressable
    /// bundle over it. No-op clone of behavior for uncompressed input.
    pub fn unpack(&self) -> Result<BundleFile> {
        if let Some(payload) = &self.payload {
            // Already addressable; rebuild over the same streams. The
            // source stream must not be re-read here: after a previous
            // unpack it still holds the compressed file bytes.
            return Ok(BundleFile {
                header: self.header.clone(),
                stream: self.stream.clone(),
                payload: Some(BundlePayload {
                    directory: payload.directory.clone(),
                    data_stream: payload.data_stream.clone(),
                    data_offset: payload.data_offset,
                }),
            });
        }

        let compressed_len = self.header.compressed_size as usize;
        let mut compressed = vec![0u8; compressed_len];
        let n = self.stream.read_at(BUNDLE_HEADER_SIZE, &mut compressed)?;
        if n < compressed_len {
            return Err(Error::UnexpectedEof(BUNDLE_HEADER_SIZE + n as u64));
        }

        let payload = match self.header.compression {
            CompressionKind::None => compressed,
            CompressionKind::Lz4 => {
                lz4_flex::block::decompress(&compressed, self.header.decompressed_size as usize)
                    .map_err(|e| Error::Decompress(e.to_string()))?
            }
            CompressionKind::Lzma => {
                let mut out = Vec::new();
                lzma_rs::lzma_decompress(&mut &compressed[..], &mut out)
                    .map_err(|e| Error::Decompress(format!("{e:?}")))?;
                out
            }
        };

        let mut reader = AssetReader::new(Cursor::new(payload));
        let directory = Self::read_directory(&mut reader)?;
        let data_offset = reader.position()?;
        let data_stream = SharedStream::new(reader.into_inner());

        debug!(
            entries = directory.len(),
            bytes = self.header.decompressed_size,
            "bundle unpacked"
        );

        Ok(BundleFile {
            header: BundleHeader {
                compression: CompressionKind::None,
                ..self.header.clone()
            },
            stream: self.stream.clone(),
            payload: Some(BundlePayload {
                directory,
                data_stream,
                data_offset,
            }),
        })
    }

    fn payload(&self) -> Result<&BundlePayload> {
        self.payload.as_ref().ok_or_else(|| {
            Error::invalid("bundle payload is compressed; unpack before directory access")
        })
    }

    /// Number of directory entries.
    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.payload()?.directory.len())
    }

    /// Name of the entry at `index`.
    pub fn entry_name(&self, index: usize) -> Result<Option<String>> {
        Ok(self.payload()?.directory.get(index).map(|e| e.name.clone()))
    }

    /// Index of the entry named `name`.
    pub fn entry_index(&self, name: &str) -> Result<Option<usize>> {
        Ok(self.payload()?.directory.iter().position(|e| e.name == name))
    }

    /// Absolute `(offset, size)` of an entry's bytes in the data stream.
    pub fn entry_range(&self, index: usize) -> Result<Option<(u64, u64)>> {
        let payload = self.payload()?;
        Ok(payload
            .directory
            .get(index)
            .map(|e| (payload.data_offset + e.offset, e.size)))
    }

    /// The stream holding the bundle structure itself.
    pub fn stream(&self) -> SharedStream {
        self.stream.clone()
    }

    /// The stream holding the decompressed data region. Same as
    /// [`BundleFile::stream`] unless unpacking produced a new buffer.
    pub fn data_stream(&self) -> Result<SharedStream> {
        Ok(self.payload()?.data_stream.clone())
    }

    /// Bounded view over one entry's bytes.
    pub fn entry_stream(&self, index: usize) -> Result<Option<SegmentStream>> {
        let payload = self.payload()?;
        Ok(payload.directory.get(index).map(|e| {
            SegmentStream::new(
                payload.data_stream.clone(),
                payload.data_offset + e.offset,
                e.size,
            )
        }))
    }

    /// Whether the entry at `index` looks like a standalone assets file.
    pub fn is_assets_file(&self, index: usize) -> Result<bool> {
        match self.entry_stream(index)? {
            Some(seg) => Ok(AssetsFile::probe(&mut AssetReader::new(seg))),
            None => Ok(false),
        }
    }

    /// Encode a bundle from `(name, bytes)` members, compressing the
    /// payload per `kind`.
    pub fn write<W: std::io::Write>(
        writer: &mut AssetWriter<W>,
        members: &[(&str, &[u8])],
        kind: CompressionKind,
    ) -> Result<()> {
        let mut payload_writer = AssetWriter::new(Vec::new());
        payload_writer.write_i32(members.len() as i32)?;
        let mut offset = 0u64;
        for (name, bytes) in members {
            payload_writer.write_string(name)?;
            payload_writer.write_u64(offset)?;
            payload_writer.write_u64(bytes.len() as u64)?;
            offset += bytes.len() as u64;
        }
        for (_, bytes) in members {
            payload_writer.write_bytes(bytes)?;
        }
        let payload = payload_writer.into_inner();

        let compressed = match kind {
            CompressionKind::None => payload.clone(),
            CompressionKind::Lz4 => lz4_flex::block::compress(&payload),
            CompressionKind::Lzma => {
                let mut out = Vec::new();
                lzma_rs::lzma_compress(&mut &payload[..], &mut out)
                    .map_err(|e| Error::Decompress(format!("{e:?}")))?;
                out
            }
        };

        writer.write_bytes(BUNDLE_MAGIC)?;
        writer.write_u32(BUNDLE_FORMAT_VERSION)?;
        writer.write_u8(kind.as_u8())?;
        writer.write_u64(payload.len() as u64)?;
        writer.write_u64(compressed.len() as u64)?;
        writer.write_bytes(&compressed)
    }
}
