//! Class database ("CLDB") codec.
//!
//! The class database is the schema catalog: a compressed binary table
//! mapping numeric class ids to recursive field-layout trees, plus a
//! shared string table. Databases come standalone or embedded in a
//! package ([`ClassPackage`]) keyed by engine-version ranges.
//!
//! ## File structure
//!
//! ```text
//! +--------------------------+
//! | Magic: "CLDB"            |  4 bytes
//! +--------------------------+
//! | File version             |  1 byte (<= 1)
//! +--------------------------+
//! | Engine version           |  8 bytes (u64 LE)
//! +--------------------------+
//! | Compression kind         |  1 byte (0 none, 1 lz4, 2 lzma)
//! +--------------------------+
//! | Compressed size          |  4 bytes (i32 LE)
//! +--------------------------+
//! | Decompressed size        |  4 bytes (i32 LE)
//! +--------------------------+
//! | Payload (maybe packed):  |
//! |   classes, string table, |
//! |   common string indices  |
//! +--------------------------+
//! ```

mod file;
mod header;
mod package;
mod strings;
mod types;

pub use file::{ClassDatabase, LEGACY_SCRIPT_CLASS_ID};
pub use header::{
    ClassDatabaseHeader, CompressionKind, CLDB_LEGACY_MAGIC, CLDB_MAGIC, CLDB_MAX_VERSION,
};
pub use package::{ClassPackage, CLPK_LEGACY_MAGIC, CLPK_MAGIC, CLPK_MAX_VERSION};
pub use strings::StringTable;
pub use types::{
    ClassRecord, SchemaVariants, TypeNode, FLAG_HAS_EDITOR_NODE, FLAG_HAS_RELEASE_NODE,
};
