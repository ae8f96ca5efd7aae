//! This module provides a registry that resolves slash-separated paths to in-memory files.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, anyhow};
use log::debug;

use crate::MemFile;
use crate::core::{FsError, FsOpen, Result, utils};

/// A flat, in-memory file registry.
///
/// `MemFS` maps validated paths (`docs/note.txt`, no leading `/`, no `.`/`..` elements)
/// to file contents and hands out [`MemFile`] handles on `open()`.
///
/// ### Internal state
///
/// * `entries` - path to content. Keys always pass the path-validity rule and are unique.
///   Uses `BTreeMap` for deterministic iteration.
/// * `fixed_mod_time` - when set, every opened handle reports this modification time
///   instead of the time of opening.
///
/// ### Ownership
///
/// `open()` copies the stored content into the new handle. Writes through a handle are never
/// visible through the registry (or through other handles) until the caller stores them back
/// with `insert()`.
///
/// ### Thread Safety
///
/// Not thread-safe by itself. Wrap it in `RwLock<MemFS>` if `open()` may race with
/// `insert()`/`remove()`.
///
/// ### Example
///
/// ```
/// use memfs_kit::MemFS;
///
/// let mut fs = MemFS::new();
/// fs.insert("docs/note.txt", b"Hello".to_vec()).unwrap();
///
/// let mut file = fs.open("docs/note.txt").unwrap();
/// assert_eq!(file.stat().size(), 5);
/// file.close().unwrap();
///
/// assert!(fs.open("/docs/note.txt").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemFS {
    entries: BTreeMap<String, Vec<u8>>,
    fixed_mod_time: Option<SystemTime>,
}

impl MemFS {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            fixed_mod_time: None,
        }
    }

    /// Creates a registry from `(path, content)` pairs.
    /// Fails on the first invalid path. A repeated path keeps the last content.
    pub fn with_files<I, P, C>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Vec<u8>>,
    {
        let mut fs = Self::new();
        for (path, content) in files {
            fs.insert(path, content)?;
        }
        Ok(fs)
    }

    /// Loads every regular file below the host directory `dir`.
    ///
    /// Keys are the slash-separated paths relative to `dir`. Directories only contribute
    /// their files; symbolic links are skipped.
    pub fn from_host_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(anyhow!("{} is not a directory", dir.display()));
        }
        let mut fs = Self::new();
        fs.load_dir(dir, "")?;
        debug!("loaded {} files from {}", fs.len(), dir.display());
        Ok(fs)
    }

    fn load_dir(&mut self, host_dir: &Path, prefix: &str) -> anyhow::Result<()> {
        let read_dir = std::fs::read_dir(host_dir)
            .with_context(|| format!("failed to read directory {}", host_dir.display()))?;
        for entry in read_dir {
            let entry = entry?;
            let host_path = entry.path();
            let name = entry
                .file_name()
                .into_string()
                .map_err(|name| anyhow!("non UTF-8 file name: {:?}", name))?;
            let inner = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.load_dir(&host_path, &inner)?;
            } else if file_type.is_file() {
                let content = std::fs::read(&host_path)
                    .with_context(|| format!("failed to read {}", host_path.display()))?;
                self.insert(inner, content)?;
            } else {
                debug!("skipping {}: not a regular file", host_path.display());
            }
        }
        Ok(())
    }

    /// Makes every handle opened from now on report `mod_time`.
    /// `None` restores the default (the time of opening).
    pub fn set_fixed_mod_time(&mut self, mod_time: Option<SystemTime>) {
        self.fixed_mod_time = mod_time;
    }

    /// Stores `content` under `path`, replacing existing content.
    /// Returns the replaced content, if any.
    pub fn insert<P: Into<String>, C: Into<Vec<u8>>>(
        &mut self,
        path: P,
        content: C,
    ) -> Result<Option<Vec<u8>>> {
        let path = Self::validate(path.into())?;
        let content = content.into();
        debug!("insert {} ({} bytes)", path, content.len());
        Ok(self.entries.insert(path, content))
    }

    /// Stores `content` under a new `path`.
    /// An error is returned if `path` is already registered.
    pub fn add<P: Into<String>, C: Into<Vec<u8>>>(&mut self, path: P, content: C) -> Result<()> {
        let path = Self::validate(path.into())?;
        if self.entries.contains_key(&path) {
            return Err(FsError::AlreadyExists { path });
        }
        debug!("add {}", path);
        self.entries.insert(path, content.into());
        Ok(())
    }

    /// Removes `path` and returns its content.
    pub fn remove(&mut self, path: &str) -> Result<Vec<u8>> {
        let content = self.entries.remove(path).ok_or_else(|| FsError::NotFound {
            path: path.to_string(),
        })?;
        debug!("remove {}", path);
        Ok(content)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Returns a copy of the stored content.
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound {
                path: path.to_string(),
            })
    }

    /// Returns an iterator over registered paths in lexicographic order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Opens the file registered under `path`.
    ///
    /// # Returns
    /// * `Ok(MemFile)` - a new open handle over a copy of the content, cursor at zero.
    /// * `Err(FsError::InvalidPath)` - `path` violates the path-validity rule
    ///   (checked before the lookup, so `../x` is never reported as missing).
    /// * `Err(FsError::NotFound)` - nothing is registered under `path`.
    pub fn open(&self, path: &str) -> Result<MemFile> {
        if !utils::is_valid_path(path) {
            return Err(FsError::InvalidPath {
                path: path.to_string(),
            });
        }
        let content = self.entries.get(path).ok_or_else(|| FsError::NotFound {
            path: path.to_string(),
        })?;
        let mod_time = self.fixed_mod_time.unwrap_or_else(SystemTime::now);
        debug!("open {} ({} bytes)", path, content.len());
        Ok(MemFile::with_mod_time(path, content.clone(), mod_time))
    }

    fn validate(path: String) -> Result<String> {
        if !utils::is_valid_path(&path) {
            return Err(FsError::InvalidPath { path });
        }
        Ok(path)
    }
}

impl FsOpen for MemFS {
    type Handle = MemFile;

    fn open(&self, path: &str) -> Result<MemFile> {
        MemFS::open(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_fs() -> MemFS {
        MemFS::with_files([
            ("test.txt", b"".to_vec()),
            ("readme.md", b"Project docs".to_vec()),
            ("docs/note.txt", b"Avanpost Moscow".to_vec()),
        ])
        .unwrap()
    }

    mod creations {
        use super::*;

        #[test]
        fn test_new_mem_fs() {
            let fs = MemFS::new();
            assert!(fs.is_empty());
            assert_eq!(fs.len(), 0);
            assert_eq!(fs.paths().count(), 0);
        }

        #[test]
        fn test_with_files() {
            let fs = setup_test_fs();
            assert_eq!(fs.len(), 3);
            assert_eq!(
                fs.paths().collect::<Vec<_>>(),
                vec!["docs/note.txt", "readme.md", "test.txt"]
            );
        }

        #[test]
        fn test_with_files_invalid_path() {
            let result = MemFS::with_files([("/abs.txt", b"x".to_vec())]);
            assert!(matches!(result, Err(FsError::InvalidPath { .. })));
        }
    }

    mod open {
        use super::*;

        #[test]
        fn test_open_parent_dir_is_invalid() {
            let fs = setup_test_fs();
            let result = fs.open("../secret.txt");
            match result {
                Err(FsError::InvalidPath { path }) => assert_eq!(path, "../secret.txt"),
                other => panic!("unexpected result: {:?}", other),
            }
            assert!(matches!(
                fs.open("docs/../readme.md"),
                Err(FsError::InvalidPath { .. })
            ));
        }

        #[test]
        fn test_open_invalid_paths() {
            let fs = setup_test_fs();
            for path in ["", "/test.txt", "docs/", "docs//note.txt", "./test.txt"] {
                assert!(
                    matches!(fs.open(path), Err(FsError::InvalidPath { .. })),
                    "path '{}' must be rejected",
                    path
                );
            }
        }

        #[test]
        fn test_open_missing_file() {
            let fs = MemFS::new();
            let result = fs.open("missing.txt");
            match result {
                Err(FsError::NotFound { path }) => assert_eq!(path, "missing.txt"),
                other => panic!("unexpected result: {:?}", other),
            }
            assert!(matches!(fs.open("."), Err(FsError::NotFound { .. })));
        }

        #[test]
        fn test_open_empty_file() -> Result<()> {
            let fs = setup_test_fs();
            let file = fs.open("test.txt")?;
            assert_eq!(file.stat().size(), 0);
            assert_eq!(file.position(), 0);
            assert!(!file.is_closed());
            Ok(())
        }

        #[test]
        fn test_open_nested_file() -> Result<()> {
            let fs = setup_test_fs();
            let mut file = fs.open("docs/note.txt")?;
            assert_eq!(file.name(), "docs/note.txt");

            let mut buf = [0u8; 32];
            let n = file.read(&mut buf)?;
            assert_eq!(&buf[..n], b"Avanpost Moscow");
            Ok(())
        }

        #[test]
        fn test_open_copies_content() -> Result<()> {
            let fs = setup_test_fs();
            let mut first = fs.open("docs/note.txt")?;
            first.write_at(b"London", 9)?;
            first.write(b"!")?;

            assert_eq!(first.as_bytes(), b"Avanpost London!");
            assert_eq!(fs.read("docs/note.txt")?, b"Avanpost Moscow");
            let second = fs.open("docs/note.txt")?;
            assert_eq!(second.as_bytes(), b"Avanpost Moscow");
            Ok(())
        }

        #[test]
        fn test_open_fresh_handle_after_close() -> Result<()> {
            let fs = setup_test_fs();
            let mut file = fs.open("readme.md")?;
            file.close()?;
            let file = fs.open("readme.md")?;
            assert!(!file.is_closed());
            Ok(())
        }

        #[test]
        fn test_open_fixed_mod_time() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.set_fixed_mod_time(Some(SystemTime::UNIX_EPOCH));
            assert_eq!(fs.open("readme.md")?.stat().mod_time(), SystemTime::UNIX_EPOCH);

            fs.set_fixed_mod_time(None);
            assert!(fs.open("readme.md")?.stat().mod_time() > SystemTime::UNIX_EPOCH);
            Ok(())
        }

        #[test]
        fn test_open_through_trait() -> Result<()> {
            fn open_any<F: FsOpen>(fs: &F, path: &str) -> Result<F::Handle> {
                fs.open(path)
            }

            let fs = setup_test_fs();
            let file = open_any(&fs, "readme.md")?;
            assert_eq!(file.stat().size(), 12);
            Ok(())
        }
    }

    mod mutations {
        use super::*;

        #[test]
        fn test_insert_replaces_content() -> Result<()> {
            let mut fs = setup_test_fs();
            let old = fs.insert("readme.md", b"New docs".to_vec())?;
            assert_eq!(old.as_deref(), Some(&b"Project docs"[..]));
            assert_eq!(fs.read("readme.md")?, b"New docs");

            assert!(fs.insert("new.txt", "text")?.is_none());
            assert!(fs.contains("new.txt"));
            Ok(())
        }

        #[test]
        fn test_insert_invalid_path() {
            let mut fs = MemFS::new();
            let result = fs.insert("docs/../x", b"x".to_vec());
            assert!(matches!(result, Err(FsError::InvalidPath { .. })));
            assert!(fs.is_empty());
        }

        #[test]
        fn test_add_existing_path() {
            let mut fs = setup_test_fs();
            let result = fs.add("readme.md", b"x".to_vec());
            assert!(matches!(result, Err(FsError::AlreadyExists { .. })));
            assert!(fs.add("other.md", b"x".to_vec()).is_ok());
            assert_eq!(fs.len(), 4);
        }

        #[test]
        fn test_remove() -> Result<()> {
            let mut fs = setup_test_fs();
            assert_eq!(fs.remove("readme.md")?, b"Project docs");
            assert!(!fs.contains("readme.md"));
            assert!(matches!(
                fs.open("readme.md"),
                Err(FsError::NotFound { .. })
            ));
            assert!(matches!(
                fs.remove("readme.md"),
                Err(FsError::NotFound { .. })
            ));
            Ok(())
        }

        #[test]
        fn test_store_back_handle_content() -> Result<()> {
            let mut fs = setup_test_fs();
            let mut file = fs.open("docs/note.txt")?;
            file.write_at(b"London", 9)?;
            file.close()?;
            fs.insert("docs/note.txt", file.into_bytes())?;
            assert_eq!(fs.read("docs/note.txt")?, b"Avanpost London");
            Ok(())
        }
    }

    mod host_dir {
        use super::*;
        use tempdir::TempDir;

        #[test]
        fn test_from_host_dir() -> anyhow::Result<()> {
            let tmp = TempDir::new("memfs")?;
            std::fs::create_dir_all(tmp.path().join("docs/nested"))?;
            std::fs::write(tmp.path().join("readme.md"), b"Project docs")?;
            std::fs::write(tmp.path().join("docs/note.txt"), b"Hello")?;
            std::fs::write(tmp.path().join("docs/nested/empty.bin"), b"")?;

            let fs = MemFS::from_host_dir(tmp.path())?;
            assert_eq!(
                fs.paths().collect::<Vec<_>>(),
                vec!["docs/nested/empty.bin", "docs/note.txt", "readme.md"]
            );
            assert_eq!(fs.read("docs/note.txt")?, b"Hello");
            assert_eq!(fs.open("docs/nested/empty.bin")?.stat().size(), 0);
            Ok(())
        }

        #[test]
        fn test_from_host_dir_empty() -> anyhow::Result<()> {
            let tmp = TempDir::new("memfs")?;
            let fs = MemFS::from_host_dir(tmp.path())?;
            assert!(fs.is_empty());
            Ok(())
        }

        #[test]
        fn test_from_host_dir_not_a_directory() -> anyhow::Result<()> {
            let tmp = TempDir::new("memfs")?;
            let file = tmp.path().join("file.txt");
            std::fs::write(&file, b"x")?;

            let result = MemFS::from_host_dir(&file);
            assert!(result.unwrap_err().to_string().contains("is not a directory"));
            assert!(MemFS::from_host_dir(tmp.path().join("missing")).is_err());
            Ok(())
        }
    }
}
