use std::time::SystemTime;

/// Permission bits reported for every in-memory file (`rw-r--r--`).
pub const FILE_MODE: u32 = 0o644;

/// Descriptor returned by `stat()`.
///
/// In-memory files have no directory semantics: `is_dir()` is always `false`
/// and `mode()` is always [`FILE_MODE`].
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    name: String,
    size: u64,
    mod_time: SystemTime,
}

impl FileInfo {
    pub fn new<S: Into<String>>(name: S, size: u64, mod_time: SystemTime) -> FileInfo {
        FileInfo {
            name: name.into(),
            size,
            mod_time,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content length in bytes at the moment `stat()` was called.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mode(&self) -> u32 {
        FILE_MODE
    }

    pub fn mod_time(&self) -> SystemTime {
        self.mod_time
    }

    pub fn is_file(&self) -> bool {
        true
    }

    pub fn is_dir(&self) -> bool {
        false
    }
}
