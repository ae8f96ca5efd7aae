//! In-memory files for code written against "open, read/write, close".
//! Lets such code run against fixtures or test data without touching real storage.
//!
//! ### Overview
//!
//! `memfs-kit` provides two pieces:
//! - [`MemFile`] - a handle that behaves like an open file (sequential and positional reads and
//!   writes, seeking, `stat()`, `close()`) while keeping its content in a byte buffer.
//! - [`MemFS`] - a registry that resolves slash-separated paths to such handles.
//!
//! **Key ideas**:
//! - **Capabilities**: the file contract is split into small traits (`FileRead`, `FileWriteAt`,
//!   `FileSeek`, ...) so other backends may implement only what they support.
//! - **Interop**: `MemFile` also implements `std::io::{Read, Write, Seek}`.
//! - **Isolation**: `MemFS::open()` copies the stored content; handles never alias each other.
//! - **Typed errors**: every failure is an [`FsError`] variant carrying its context.
//!
//! Directories, permissions and persistence are not modelled: `is_dir()` is always `false` and
//! the mode is always [`FILE_MODE`].

mod core;
mod vfs;

pub use crate::core::{
    File, FileClose, FileRead, FileReadAt, FileSeek, FileStat, FileWrite, FileWriteAt,
    FileWriteTo, FsError, FsOpen, Result, Whence, utils,
};
pub use crate::vfs::{FILE_MODE, FileInfo, MemFS, MemFile};
