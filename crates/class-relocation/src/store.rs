//! Byte stores keyed by relative class path.
//!
//! Paths are always `/`-separated and relative to the store root; only
//! `*.class` entries participate in listing.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::naming::CLASS_EXTENSION;

/// Storage seam used by every phase.
pub trait ClassStore {
    /// Relative paths of all class files, sorted.
    fn list_classes(&self) -> io::Result<Vec<String>>;

    fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Write `bytes` at `path`, replacing any existing entry and creating
    /// parent directories as needed.
    fn write(&mut self, path: &str, bytes: &[u8]) -> io::Result<()>;
}

/// A directory tree on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path under the root; empty, `.` and `..` segments are refused.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let mut full = self.root.clone();
        for segment in path.split('/') {
            if matches!(segment, "" | "." | "..") {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{path}: path escapes or is not relative to the store root"),
                ));
            }
            full.push(segment);
        }
        Ok(full)
    }

    fn walk(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> io::Result<()> {
        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(|e| with_path(e, dir))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| with_path(e, dir))?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            if path.is_dir() {
                self.walk(&path, &relative, out)?;
            } else if path.is_file() && relative.ends_with(CLASS_EXTENSION) {
                out.push(relative);
            }
        }
        Ok(())
    }
}

fn with_path(err: io::Error, path: &Path) -> io::Error {
    io::Error::new(err.kind(), format!("{}: {}", path.display(), err))
}

impl ClassStore for DirStore {
    fn list_classes(&self) -> io::Result<Vec<String>> {
        let mut out = Vec::new();
        self.walk(&self.root, "", &mut out)?;
        out.sort();
        Ok(out)
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full).map_err(|e| with_path(e, &full))
    }

    fn write(&mut self, path: &str, bytes: &[u8]) -> io::Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| with_path(e, parent))?;
        }
        fs::write(&full, bytes).map_err(|e| with_path(e, &full))
    }
}

/// In-memory store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Every stored path, class file or not.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ClassStore for MemoryStore {
    fn list_classes(&self) -> io::Result<Vec<String>> {
        Ok(self
            .files
            .keys()
            .filter(|p| p.ends_with(CLASS_EXTENSION))
            .cloned()
            .collect())
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path}: not in store")))
    }

    fn write(&mut self, path: &str, bytes: &[u8]) -> io::Result<()> {
        self.files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}
