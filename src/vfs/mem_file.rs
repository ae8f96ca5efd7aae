//! This module provides a file handle whose whole content lives in a memory buffer.

use std::io;
use std::time::SystemTime;

use log::{debug, trace};

use crate::core::{
    FileClose, FileRead, FileReadAt, FileSeek, FileStat, FileWrite, FileWriteAt, FileWriteTo,
    FsError, Result, Whence,
};
use crate::FileInfo;

/// An in-memory substitute for an open disk-backed file.
///
/// `MemFile` owns a growable byte buffer, a cursor used by the sequential operations
/// (`read()`, `write_to()`, `seek()`), and a closed flag.
///
/// ### Internal state
///
/// * `data` - the entire file content. `write()` appends to it and `write_at()` may grow it,
///   neither of them moves the cursor.
/// * `pos` - the cursor. After every cursor-based read `0 <= pos <= data.len()` holds;
///   `seek()` clamps positions past the end down to `data.len()`.
/// * `closed` - once `true` it never becomes `false` again. Every operation except `stat()`
///   and `as_bytes()` fails with [`FsError::Closed`] after that. The content stays in memory and
///   the cursor is not reset.
/// * `name`, `mod_time` - descriptive metadata fixed when the handle is created.
///   Writes do not touch `mod_time`.
///
/// ### Thread Safety
///
/// There is no internal locking. Concurrent `write()`/`write_at()`/`close()` calls on the same
/// handle must be serialized by the caller (e.g. `Mutex<MemFile>`).
///
/// ### Example
///
/// ```
/// use memfs_kit::{MemFile, Whence};
///
/// let mut file = MemFile::new("note.txt", b"Hello".to_vec());
/// file.write(b", World").unwrap();
///
/// let mut buf = [0u8; 32];
/// let n = file.read(&mut buf).unwrap();
/// assert_eq!(&buf[..n], b"Hello, World");
///
/// file.seek(0, Whence::Start).unwrap();
/// file.close().unwrap();
/// assert!(file.close().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MemFile {
    data: Vec<u8>,
    name: String,
    pos: usize,
    mod_time: SystemTime,
    closed: bool,
}

impl MemFile {
    /// Creates an open handle over `content` with the cursor at zero.
    /// The modification time is the current time.
    pub fn new<S: Into<String>, C: Into<Vec<u8>>>(name: S, content: C) -> Self {
        Self::with_mod_time(name, content, SystemTime::now())
    }

    pub fn with_mod_time<S: Into<String>, C: Into<Vec<u8>>>(
        name: S,
        content: C,
        mod_time: SystemTime,
    ) -> Self {
        Self {
            data: content.into(),
            name: name.into(),
            pos: 0,
            mod_time,
            closed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cursor position.
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the live content without copying. Works on a closed handle too.
    ///
    /// The slice borrows the handle, so it cannot be held across a subsequent write.
    /// Not named `bytes()`: with `std::io::Read` in scope that call would resolve to
    /// `Read::bytes` and consume the handle.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the handle and returns its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Describes the file. Performs no closed check: the size is the buffer length
    /// at call time even after `close()`.
    pub fn stat(&self) -> FileInfo {
        FileInfo::new(self.name.as_str(), self.data.len() as u64, self.mod_time)
    }

    /// Copies up to `buf.len()` bytes from the cursor into `buf` and advances the cursor.
    ///
    /// # Returns
    /// * `Ok(n)` - number of bytes copied.
    /// * `Err(FsError::EndOfData)` - the cursor is at (or past) the end; nothing was copied.
    /// * `Err(FsError::Closed)` - the handle is closed.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check_open()?;
        if self.pos >= self.data.len() {
            return Err(FsError::EndOfData);
        }
        let n = copy_from(&self.data[self.pos..], buf);
        self.pos += n;
        trace!("{}: read {} bytes, position {}", self.name, n, self.pos);
        Ok(n)
    }

    /// Copies up to `buf.len()` bytes starting at `offset` into `buf`.
    /// The cursor is not moved.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.check_open()?;
        if offset >= self.data.len() as u64 {
            return Err(FsError::EndOfData);
        }
        // offset < data.len(), so it fits into usize
        let n = copy_from(&self.data[offset as usize..], buf);
        trace!("{}: read {} bytes at offset {}", self.name, n, offset);
        Ok(n)
    }

    /// Appends `buf` to the end of the content, regardless of the cursor.
    /// Always reports the whole input as written.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.check_open()?;
        self.data.extend_from_slice(buf);
        trace!("{}: appended {} bytes, size {}", self.name, buf.len(), self.data.len());
        Ok(buf.len())
    }

    /// Writes `buf` at `offset`, overwriting existing content in range.
    ///
    /// If the write ends past the current end, the buffer grows to fit it and the gap between
    /// the old end and `offset` is zero-filled. The cursor is not moved.
    /// A size that cannot be allocated fails with [`FsError::InvalidPosition`] and leaves
    /// the content unchanged.
    pub fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        self.check_open()?;
        let start = usize::try_from(offset).map_err(|_| FsError::InvalidPosition {
            position: offset as i128,
        })?;
        let end = start
            .checked_add(buf.len())
            .ok_or(FsError::InvalidPosition {
                position: offset as i128 + buf.len() as i128,
            })?;
        if end > self.data.len() {
            self.data
                .try_reserve(end - self.data.len())
                .map_err(|_| FsError::InvalidPosition {
                    position: end as i128,
                })?;
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
        trace!("{}: wrote {} bytes at offset {}", self.name, buf.len(), offset);
        Ok(buf.len())
    }

    /// Writes the unread remainder (`cursor..end`) to `sink`.
    ///
    /// The cursor advances by every byte `sink` accepts. An error from `sink` is returned
    /// as [`FsError::Sink`] unchanged and stops the transfer; bytes accepted before the
    /// failure stay consumed and are visible through `position()`.
    pub fn write_to<W: io::Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64> {
        self.check_open()?;
        let mut written = 0u64;
        while self.pos < self.data.len() {
            match sink.write(&self.data[self.pos..]) {
                Ok(0) => return Err(FsError::Sink(io::ErrorKind::WriteZero.into())),
                Ok(n) => {
                    self.pos += n;
                    written += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FsError::Sink(e)),
            }
        }
        trace!("{}: wrote {} bytes to sink", self.name, written);
        Ok(written)
    }

    /// Moves the cursor relative to `whence` and returns the new position.
    ///
    /// A negative result fails with [`FsError::InvalidPosition`] and leaves the cursor as is.
    /// A result past the end is clamped to the content length; the buffer never grows.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.check_open()?;
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => self.pos as i128,
            Whence::End => self.data.len() as i128,
        };
        let position = base + offset as i128;
        if position < 0 {
            return Err(FsError::InvalidPosition { position });
        }
        self.pos = position.min(self.data.len() as i128) as usize;
        trace!("{}: seek to {}", self.name, self.pos);
        Ok(self.pos as u64)
    }

    /// Like [`seek()`](Self::seek), but takes the conventional numeric origin
    /// (0 - start, 1 - current, 2 - end). The closed check comes first.
    pub fn seek_raw(&mut self, offset: i64, whence: i32) -> Result<u64> {
        self.check_open()?;
        self.seek(offset, Whence::try_from(whence)?)
    }

    /// Closes the handle. The first call succeeds, every later one fails with
    /// [`FsError::Closed`].
    pub fn close(&mut self) -> Result<()> {
        self.check_open()?;
        self.closed = true;
        debug!("{}: closed", self.name);
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(FsError::Closed {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

fn copy_from(src: &[u8], dst: &mut [u8]) -> usize {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}

impl FileStat for MemFile {
    fn stat(&self) -> FileInfo {
        MemFile::stat(self)
    }
}

impl FileRead for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        MemFile::read(self, buf)
    }
}

impl FileReadAt for MemFile {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        MemFile::read_at(self, buf, offset)
    }
}

impl FileWrite for MemFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        MemFile::write(self, buf)
    }
}

impl FileWriteAt for MemFile {
    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        MemFile::write_at(self, buf, offset)
    }
}

impl FileWriteTo for MemFile {
    fn write_to<W: io::Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64> {
        MemFile::write_to(self, sink)
    }
}

impl FileSeek for MemFile {
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        MemFile::seek(self, offset, whence)
    }
}

impl FileClose for MemFile {
    fn close(&mut self) -> Result<()> {
        MemFile::close(self)
    }
}

/// End of data is reported as `Ok(0)`, as `std::io::Read` expects.
impl io::Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match MemFile::read(self, buf) {
            Err(FsError::EndOfData) => Ok(0),
            other => other.map_err(io::Error::from),
        }
    }
}

impl io::Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(MemFile::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.check_open()?)
    }
}

impl io::Seek for MemFile {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, whence) = match pos {
            io::SeekFrom::Start(n) => {
                let offset = i64::try_from(n).map_err(|_| FsError::InvalidPosition {
                    position: n as i128,
                })?;
                (offset, Whence::Start)
            }
            io::SeekFrom::Current(n) => (n, Whence::Current),
            io::SeekFrom::End(n) => (n, Whence::End),
        };
        Ok(MemFile::seek(self, offset, whence)?)
    }
}
