//! Little-endian typed readers and writers for container files.
//!
//! Every multi-byte integer in the formats handled by this crate is
//! little-endian. [`AssetReader`] wraps any `Read + Seek` source and adds
//! the typed reads the codecs need: fixed integers, exact byte runs,
//! fixed-length ASCII tags and length-prefixed UTF-8 strings.
//! [`AssetWriter`] mirrors it for encoding.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{Error, Result};

/// Typed little-endian reader over any seekable byte source.
pub struct AssetReader<R> {
    inner: R,
}

impl<R: Read + Seek> AssetReader<R> {
    /// Wrap a seekable source.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Unwrap back into the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current stream position.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek to an absolute position.
    pub fn seek_to(&mut self, pos: u64) -> Result<u64> {
        Ok(self.inner.seek(SeekFrom::Start(pos))?)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.inner.read_u16::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.inner.read_i32::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.inner.read_i64::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(self.inner.read_u64::<LittleEndian>()?)
    }

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::UnexpectedEof(self.inner.stream_position().unwrap_or(0))
            } else {
                Error::Io(e)
            }
        })?;
        Ok(buf)
    }

    /// Read a fixed 4-byte tag (magic).
    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        let mut tag = [0u8; 4];
        self.inner.read_exact(&mut tag).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::UnexpectedEof(self.inner.stream_position().unwrap_or(0))
            } else {
                Error::Io(e)
            }
        })?;
        Ok(tag)
    }

    /// Read a u32-length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// Typed little-endian writer, mirror of [`AssetReader`].
pub struct AssetWriter<W> {
    inner: W,
}

impl<W: Write> AssetWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        Ok(self.inner.write_u8(v)?)
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        Ok(self.inner.write_u16::<LittleEndian>(v)?)
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        Ok(self.inner.write_i32::<LittleEndian>(v)?)
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        Ok(self.inner.write_u32::<LittleEndian>(v)?)
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        Ok(self.inner.write_i64::<LittleEndian>(v)?)
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        Ok(self.inner.write_u64::<LittleEndian>(v)?)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        Ok(self.inner.write_all(bytes)?)
    }

    /// Write a u32-length-prefixed UTF-8 string.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_u32(s.len() as u32)?;
        self.write_bytes(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_typed_round_trip() {
        let mut w = AssetWriter::new(Vec::new());
        w.write_u8(0xAB).unwrap();
        w.write_u16(0x1234).unwrap();
        w.write_i32(-5).unwrap();
        w.write_u64(0xDEAD_BEEF_CAFE).unwrap();
        w.write_string("hello").unwrap();
        let buf = w.into_inner();

        let mut r = AssetReader::new(Cursor::new(buf));
        assert_eq!(r.read_u8().unwrap(), 0xAB);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.read_i32().unwrap(), -5);
        assert_eq!(r.read_u64().unwrap(), 0xDEAD_BEEF_CAFE);
        assert_eq!(r.read_string().unwrap(), "hello");
    }

    #[test]
    fn test_short_read_is_eof() {
        let mut r = AssetReader::new(Cursor::new(vec![1u8, 2]));
        let err = r.read_i32().unwrap_err();
        assert!(matches!(err, Error::Io(_) | Error::UnexpectedEof(_)));
    }

    #[test]
    fn test_tag() {
        let mut r = AssetReader::new(Cursor::new(b"CLDB\x01".to_vec()));
        assert_eq!(&r.read_tag().unwrap(), b"CLDB");
        assert_eq!(r.read_u8().unwrap(), 1);
    }
}
