//! Class database decode/encode and lookups.

use std::io::Cursor;

use tracing::debug;

use crate::util::{AssetReader, AssetWriter, Error, ReadSeek, Result};

use super::header::{ClassDatabaseHeader, CompressionKind};
use super::strings::StringTable;
use super::types::ClassRecord;

/// Class id that negative lookups are remapped to (pre-5.4 databases
/// stored script classes under negative ids).
pub const LEGACY_SCRIPT_CLASS_ID: i32 = 0x72;

/// A decoded class database: the schema catalog mapping class ids to
/// field-layout trees.
///
/// ```text
/// header | classCount:i32 | classCount * ClassRecord
///        | StringTable | commonIndexCount:i32 | commonIndexCount * u16
/// ```
///
/// The region after the header may be LZ4- or LZMA-compressed per the
/// header's compression kind.
#[derive(Debug, Clone)]
pub struct ClassDatabase {
    pub header: ClassDatabaseHeader,
    pub classes: Vec<ClassRecord>,
    pub string_table: StringTable,
    /// Indices into the string table for the common-string buffer.
    pub common_string_indices: Vec<u16>,
}

impl ClassDatabase {
    /// Decode a class database from a stream.
    pub fn read<R: ReadSeek>(reader: &mut AssetReader<R>) -> Result<Self> {
        let header = ClassDatabaseHeader::read(reader)?;

        let payload = match header.compression {
            CompressionKind::None => reader.read_bytes(header.compressed_size.max(0) as usize)?,
            CompressionKind::Lz4 => {
                let compressed = reader.read_bytes(header.compressed_size.max(0) as usize)?;
                lz4_flex::block::decompress(&compressed, header.decompressed_size.max(0) as usize)
                    .map_err(|e| Error::Decompress(e.to_string()))?
            }
            CompressionKind::Lzma => {
                let compressed = reader.read_bytes(header.compressed_size.max(0) as usize)?;
                let mut decompressed = Vec::new();
                lzma_rs::lzma_decompress(&mut &compressed[..], &mut decompressed)
                    .map_err(|e| Error::Decompress(format!("{e:?}")))?;
                decompressed
            }
        };

        let mut payload_reader = AssetReader::new(Cursor::new(payload));

        let class_count = payload_reader.read_i32()?.max(0) as usize;
        let mut classes = Vec::with_capacity(class_count);
        for _ in 0..class_count {
            classes.push(ClassRecord::read(&mut payload_reader)?);
        }

        let string_table = StringTable::read(&mut payload_reader)?;

        let index_count = payload_reader.read_i32()?.max(0) as usize;
        let mut common_string_indices = Vec::with_capacity(index_count);
        for _ in 0..index_count {
            common_string_indices.push(payload_reader.read_u16()?);
        }

        debug!(
            classes = classes.len(),
            strings = string_table.len(),
            version = %header.engine_version,
            "class database decoded"
        );

        Ok(Self {
            header,
            classes,
            string_table,
            common_string_indices,
        })
    }

    /// Encode the database, compressing the payload per `kind`. The
    /// written header carries `kind` and the recomputed sizes.
    pub fn write<W: std::io::Write>(
        &self,
        writer: &mut AssetWriter<W>,
        kind: CompressionKind,
    ) -> Result<()> {
        let mut payload_writer = AssetWriter::new(Vec::new());
        payload_writer.write_i32(self.classes.len() as i32)?;
        for class in &self.classes {
            class.write(&mut payload_writer)?;
        }
        self.string_table.write(&mut payload_writer)?;
        payload_writer.write_i32(self.common_string_indices.len() as i32)?;
        for idx in &self.common_string_indices {
            payload_writer.write_u16(*idx)?;
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

        let header = ClassDatabaseHeader {
            compression: kind,
            compressed_size: compressed.len() as i32,
            decompressed_size: payload.len() as i32,
            ..self.header.clone()
        };
        header.write(writer)?;
        writer.write_bytes(&compressed)
    }

    /// Find a class record by numeric id.
    ///
    /// Negative ids are remapped to [`LEGACY_SCRIPT_CLASS_ID`] before the
    /// scan. A missing id is a miss, not an error.
    pub fn find_class_by_id(&self, id: i32) -> Option<&ClassRecord> {
        let id = if id < 0 { LEGACY_SCRIPT_CLASS_ID } else { id };
        self.classes.iter().find(|c| c.class_id == id)
    }

    /// Find a class record by resolved name.
    pub fn find_class_by_name(&self, name: &str) -> Option<&ClassRecord> {
        self.classes
            .iter()
            .find(|c| self.string_table.get(c.name) == Some(name))
    }

    /// Get a string from the string table.
    pub fn get_string(&self, index: u16) -> Option<&str> {
        self.string_table.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cldb::types::{SchemaVariants, TypeNode};
    use crate::util::EngineVersion;

    fn node(type_name: u16, field_name: u16, children: Vec<TypeNode>) -> TypeNode {
        TypeNode {
            type_name,
            field_name,
            byte_size: -1,
            version: 1,
            type_flags: 0,
            meta_flag: 0,
            children,
        }
    }

    fn sample_database() -> ClassDatabase {
        let mut strings = StringTable::new();
        let n_game_object = strings.add("GameObject");
        let n_object = strings.add("Object");
        let n_base = strings.add("Base");
        let n_int = strings.add("int");
        let n_script = strings.add("MonoBehaviour");

        ClassDatabase {
            header: ClassDatabaseHeader {
                file_version: 1,
                engine_version: EngineVersion::new(2021, 2, 0),
                compression: CompressionKind::None,
                compressed_size: 0,
                decompressed_size: 0,
            },
            classes: vec![
                ClassRecord {
                    class_id: 1,
                    name: n_game_object,
                    base_name: n_object,
                    variants: SchemaVariants::ReleaseOnly(node(
                        n_game_object,
                        n_base,
                        vec![node(n_int, n_base, vec![])],
                    )),
                },
                ClassRecord {
                    class_id: LEGACY_SCRIPT_CLASS_ID,
                    name: n_script,
                    base_name: n_object,
                    variants: SchemaVariants::Both {
                        editor: node(n_script, n_base, vec![]),
                        release: node(n_script, n_base, vec![]),
                    },
                },
            ],
            string_table: strings,
            common_string_indices: vec![0, 3],
        }
    }

    fn round_trip(db: &ClassDatabase, kind: CompressionKind) -> ClassDatabase {
        let mut w = AssetWriter::new(Vec::new());
        db.write(&mut w, kind).unwrap();
        ClassDatabase::read(&mut AssetReader::new(Cursor::new(w.into_inner()))).unwrap()
    }

    #[test]
    fn test_round_trip_uncompressed() {
        let db = sample_database();
        let read = round_trip(&db, CompressionKind::None);
        assert_eq!(read.classes, db.classes);
        assert_eq!(read.string_table, db.string_table);
        assert_eq!(read.common_string_indices, db.common_string_indices);
        assert_eq!(read.header.compressed_size, read.header.decompressed_size);
    }

    #[test]
    fn test_round_trip_lz4() {
        let db = sample_database();
        let read = round_trip(&db, CompressionKind::Lz4);
        assert_eq!(read.classes, db.classes);
        assert_eq!(read.string_table, db.string_table);
        assert_eq!(read.common_string_indices, db.common_string_indices);
    }

    #[test]
    fn test_round_trip_lzma() {
        let db = sample_database();
        let read = round_trip(&db, CompressionKind::Lzma);
        assert_eq!(read.classes, db.classes);
        assert_eq!(read.string_table, db.string_table);
        assert_eq!(read.common_string_indices, db.common_string_indices);
    }

    #[test]
    fn test_find_by_id_negative_remaps() {
        let db = sample_database();
        let by_negative = db.find_class_by_id(-5).unwrap();
        let by_sentinel = db.find_class_by_id(LEGACY_SCRIPT_CLASS_ID).unwrap();
        assert_eq!(by_negative.class_id, by_sentinel.class_id);
        assert_eq!(by_negative.name, by_sentinel.name);
    }

    #[test]
    fn test_find_by_name() {
        let db = sample_database();
        assert!(db.find_class_by_name("GameObject").is_some());
        assert!(db.find_class_by_name("DoesNotExist").is_none());
    }
}
