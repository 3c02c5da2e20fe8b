//! Shared and bounded stream views.
//!
//! A container extracted from a bundle reads through a window over the
//! bundle's own data stream. Both sides can be used from different
//! threads, so the underlying byte source lives behind a lock and every
//! read re-seeks under that lock. [`SharedStream`] is the lockable
//! source; [`SegmentStream`] is a `Read + Seek` view clamped to one
//! member's byte range.

use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use parking_lot::Mutex;

/// Object-safe alias for the byte sources this crate reads from.
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// A cheaply-cloneable, lock-guarded byte source.
///
/// Every read through a derived [`SegmentStream`] seeks and reads while
/// holding the lock, so interleaved access from bundle-level and
/// member-level readers cannot tear each other's position.
#[derive(Clone)]
pub struct SharedStream {
    inner: Arc<Mutex<Box<dyn ReadSeek>>>,
}

impl SharedStream {
    /// Wrap a byte source.
    pub fn new<R: ReadSeek + 'static>(source: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(source))),
        }
    }

    /// Run a closure with exclusive access to the raw source.
    pub fn with<T>(&self, f: impl FnOnce(&mut dyn ReadSeek) -> T) -> T {
        let mut guard = self.inner.lock();
        f(guard.as_mut())
    }

    /// Seek to `pos` and read up to `buf.len()` bytes, atomically.
    pub fn read_at(&self, pos: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut guard = self.inner.lock();
        guard.seek(SeekFrom::Start(pos))?;
        guard.read(buf)
    }

    /// Total length of the source, restoring the prior position.
    pub fn len(&self) -> std::io::Result<u64> {
        let mut guard = self.inner.lock();
        let pos = guard.stream_position()?;
        let end = guard.seek(SeekFrom::End(0))?;
        guard.seek(SeekFrom::Start(pos))?;
        Ok(end)
    }

    pub fn is_empty(&self) -> std::io::Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// A bounded `Read + Seek` view over a [`SharedStream`].
///
/// Covers exactly `[offset, offset + len)` of the underlying source and
/// keeps its own cursor. Like `File`, seeking past the end is allowed;
/// reads there return 0 bytes.
pub struct SegmentStream {
    source: SharedStream,
    offset: u64,
    len: u64,
    cursor: u64,
}

impl SegmentStream {
    /// Create a view spanning `len` bytes starting at `offset`.
    pub fn new(source: SharedStream, offset: u64, len: u64) -> Self {
        Self {
            source,
            offset,
            len,
            cursor: 0,
        }
    }

    /// Length of the window.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset of the window in the underlying source.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Read for SegmentStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.cursor >= self.len {
            return Ok(0);
        }
        let remaining = (self.len - self.cursor) as usize;
        let take = buf.len().min(remaining);
        let n = self
            .source
            .read_at(self.offset + self.cursor, &mut buf[..take])?;
        self.cursor += n as u64;
        Ok(n)
    }
}

impl Seek for SegmentStream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => p as i64,
            SeekFrom::End(delta) => self.len as i64 + delta,
            SeekFrom::Current(delta) => self.cursor as i64 + delta,
        };
        if target < 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start of segment",
            ));
        }
        self.cursor = target as u64;
        Ok(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn source() -> SharedStream {
        SharedStream::new(Cursor::new((0u8..64).collect::<Vec<u8>>()))
    }

    #[test]
    fn test_segment_reads_window() {
        let mut seg = SegmentStream::new(source(), 10, 5);
        let mut buf = Vec::new();
        seg.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_segment_seek() {
        let mut seg = SegmentStream::new(source(), 10, 5);
        seg.seek(SeekFrom::Start(3)).unwrap();
        let mut buf = [0u8; 8];
        let n = seg.read(&mut buf).unwrap();
        assert_eq!(n, 2);
        assert_eq!(&buf[..2], &[13, 14]);

        // past-end seek is allowed, read yields nothing
        seg.seek(SeekFrom::Start(100)).unwrap();
        assert_eq!(seg.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_two_segments_interleave() {
        let shared = source();
        let mut a = SegmentStream::new(shared.clone(), 0, 4);
        let mut b = SegmentStream::new(shared, 32, 4);
        let mut ba = [0u8; 2];
        let mut bb = [0u8; 2];
        a.read_exact(&mut ba).unwrap();
        b.read_exact(&mut bb).unwrap();
        a.read_exact(&mut ba).unwrap();
        b.read_exact(&mut bb).unwrap();
        assert_eq!(ba, [2, 3]);
        assert_eq!(bb, [34, 35]);
    }

    #[test]
    fn test_shared_len() {
        assert_eq!(source().len().unwrap(), 64);
    }
}
