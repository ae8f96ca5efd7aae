use std::io;

use thiserror::Error;

use crate::FileInfo;

/// Errors produced by in-memory handles and the path registry.
///
/// Every failure is returned to the immediate caller; nothing is retried or swallowed.
#[derive(Debug, Error)]
pub enum FsError {
    /// An operation was attempted on a handle that was already closed.
    #[error("file is closed: {name}")]
    Closed { name: String },

    /// The read position is at or past the end of the buffer.
    #[error("end of data")]
    EndOfData,

    /// The seek origin is not one of `Start`, `Current` or `End`.
    #[error("wrong whence: {0}")]
    InvalidWhence(i32),

    /// The requested position is negative or cannot be addressed.
    #[error("wrong position: {position}")]
    InvalidPosition { position: i128 },

    /// The path is empty, rooted, or has empty, `.` or `..` elements.
    #[error("invalid path: '{path}'")]
    InvalidPath { path: String },

    /// Nothing is registered under the path.
    #[error("{path} does not exist")]
    NotFound { path: String },

    /// The path is already registered.
    #[error("{path} already exists")]
    AlreadyExists { path: String },

    /// The destination of `write_to` reported an error.
    #[error(transparent)]
    Sink(#[from] io::Error),
}

impl FsError {
    pub fn is_closed(&self) -> bool {
        matches!(self, FsError::Closed { .. })
    }

    pub fn is_end_of_data(&self) -> bool {
        matches!(self, FsError::EndOfData)
    }
}

impl From<FsError> for io::Error {
    fn from(err: FsError) -> Self {
        let kind = match &err {
            FsError::Sink(e) => e.kind(),
            FsError::Closed { .. } => io::ErrorKind::Other,
            FsError::EndOfData => io::ErrorKind::UnexpectedEof,
            FsError::InvalidWhence(_) | FsError::InvalidPosition { .. } => {
                io::ErrorKind::InvalidInput
            }
            FsError::InvalidPath { .. } => io::ErrorKind::InvalidInput,
            FsError::NotFound { .. } => io::ErrorKind::NotFound,
            FsError::AlreadyExists { .. } => io::ErrorKind::AlreadyExists,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, FsError>;

/// Origin for [`FileSeek::seek`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

impl TryFrom<i32> for Whence {
    type Error = FsError;

    /// Maps the conventional numeric origins: 0 - start, 1 - current, 2 - end.
    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            other => Err(FsError::InvalidWhence(other)),
        }
    }
}

impl From<Whence> for i32 {
    fn from(whence: Whence) -> Self {
        match whence {
            Whence::Start => 0,
            Whence::Current => 1,
            Whence::End => 2,
        }
    }
}

pub trait FileStat {
    fn stat(&self) -> FileInfo;
}

pub trait FileRead {
    /// Reads from the current position into `buf` and advances the position.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

pub trait FileReadAt {
    /// Reads from `offset` into `buf` without moving the current position.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize>;
}

pub trait FileWrite {
    fn write(&mut self, buf: &[u8]) -> Result<usize>;
}

pub trait FileWriteAt {
    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize>;
}

pub trait FileWriteTo {
    /// Writes the unread remainder to `sink`, returning the number of bytes accepted.
    ///
    /// On a sink error the count is not part of the result: the bytes accepted before the
    /// failure are already consumed, so the caller recovers the count from the cursor
    /// (position before the call vs. after it).
    fn write_to<W: io::Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64>;
}

pub trait FileSeek {
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64>;
}

pub trait FileClose {
    fn close(&mut self) -> Result<()>;
}

/// The minimal set a type must support to be usable as a generic read-only file.
pub trait File: FileStat + FileRead + FileSeek + FileClose {}

impl<T: FileStat + FileRead + FileSeek + FileClose> File for T {}

/// "Open by path" capability of a file system backend.
pub trait FsOpen {
    type Handle: File;

    fn open(&self, path: &str) -> Result<Self::Handle>;
}

pub mod utils {
    /// Checks the path-validity rule: a non-empty, slash-separated, unrooted path
    /// without empty, `.` or `..` elements. The single path `.` is valid.
    pub fn is_valid_path(path: &str) -> bool {
        if path == "." {
            return true;
        }
        !path.is_empty()
            && path
                .split('/')
                .all(|elem| !elem.is_empty() && elem != "." && elem != "..")
    }

}
