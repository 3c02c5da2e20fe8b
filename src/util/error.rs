//! Error types for the atomic-assets library.

use thiserror::Error;

/// Main error type for container and class database operations.
///
/// Resolution misses (a dependency path that exists nowhere, a class id
/// absent from the database) are *not* errors — those surface as `None`
/// from the lookup in question. Only format violations, IO failures and
/// use-after-close conditions travel through this type.
#[derive(Error, Debug)]
pub enum Error {
    /// Magic bytes at the start of a file were not recognized at all.
    #[error("Invalid magic: expected {expected}, found {found:?}")]
    InvalidMagic {
        expected: &'static str,
        found: [u8; 4],
    },

    /// Magic bytes belong to a recognized legacy format that is no
    /// longer supported. Distinct from [`Error::InvalidMagic`].
    #[error("{0} format is no longer supported")]
    LegacyFormat(&'static str),

    /// Unsupported file format version.
    #[error("Unsupported or invalid file version {0}")]
    UnsupportedVersion(u8),

    /// Unknown compression kind byte in a header.
    #[error("Unsupported compression type {0}")]
    UnsupportedCompression(u8),

    /// File is truncated or structurally corrupted.
    #[error("Unexpected end of stream at position {0}")]
    UnexpectedEof(u64),

    /// Invalid data structure in file.
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// Decompression of a payload failed.
    #[error("Decompression failed: {0}")]
    Decompress(String),

    /// Operation attempted on an instance after `close()`.
    #[error("Instance has been closed")]
    InstanceClosed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }
}

/// Result type alias for atomic-assets operations.
pub type Result<T> = std::result::Result<T, Error>;
