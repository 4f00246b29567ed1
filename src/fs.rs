//! Filesystem access used by regeneration and reconciliation.
//!
//! The core never touches `std::fs` directly; it goes through [`Filesystem`]
//! so tests can inject missing files and failing deletes.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

pub trait Filesystem {
    /// Whether a regular file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Names of the regular files directly inside `dir` (not recursive).
    fn list_directory(&self, dir: &Path) -> io::Result<BTreeSet<String>>;

    /// Delete one file.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_directory(&self, dir: &Path) -> io::Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            // Non-UTF-8 names can't be produced by the naming convention.
            if let Some(name) = entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
        Ok(names)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}
