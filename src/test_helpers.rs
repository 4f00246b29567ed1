//! Shared test utilities for the regen-thumbs test suite.
//!
//! Provides an on-disk library fixture and scriptable stand-ins for the
//! collaborators the batch core talks to.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let lib = TestLibrary::new();
//! lib.touch("2024/05/photo.jpg");
//! lib.touch("2024/05/photo-999x999.jpg");
//!
//! let generator = MockGenerator::new();          // writes -150x150 and -300x200
//! let store = MemoryStore::default();
//! let meta = regenerate(&item_ref(1, "2024/05/photo.jpg"), lib.uploads(),
//!                       &generator, &store, &lib.fs(), &BTreeSet::new()).unwrap();
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use crate::fs::{Filesystem, LocalFs};
use crate::imaging::{BackendError, GenerateError, Generation, VariantGenerator};
use crate::library::{ItemSource, LibraryError, MetadataStore};
use crate::naming::{expected_name, split_file_name};
use crate::types::{ItemId, ItemMetadata, ItemRef, VariantDescriptor};

// =========================================================================
// Fixture setup
// =========================================================================

/// Temp directory acting as the uploads root of a library.
pub struct TestLibrary {
    _tmp: TempDir,
    uploads: PathBuf,
}

impl TestLibrary {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let uploads = tmp.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();
        Self { _tmp: tmp, uploads }
    }

    pub fn uploads(&self) -> &Path {
        &self.uploads
    }

    pub fn fs(&self) -> LocalFs {
        LocalFs
    }

    /// Create an empty file (and its parents) under the uploads root.
    pub fn touch(&self, relative: &str) {
        let path = self.uploads.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    /// Write a solid-color JPEG of the given size.
    pub fn write_jpeg(&self, relative: &str, width: u32, height: u32) {
        let path = self.uploads.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbImage::from_pixel(width, height, image::Rgb([90, 140, 200]))
            .save(path)
            .unwrap();
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.uploads.join(relative).exists()
    }

    /// Sorted file names directly inside `relative_dir`.
    pub fn files_in(&self, relative_dir: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.uploads.join(relative_dir))
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().unwrap().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn item_ref(id: u64, file: &str) -> ItemRef {
    ItemRef {
        id: ItemId(id),
        file: Some(file.to_string()),
    }
}

/// Build metadata for `file` with `(size name, variant file, width, height)` entries.
pub fn metadata_for(file: &str, sizes: &[(&str, &str, u32, u32)]) -> ItemMetadata {
    ItemMetadata {
        file: file.to_string(),
        width: 1200,
        height: 800,
        sizes: sizes
            .iter()
            .map(|(name, variant, w, h)| {
                (
                    name.to_string(),
                    VariantDescriptor {
                        file: variant.to_string(),
                        width: *w,
                        height: *h,
                        mime_type: "image/jpeg".to_string(),
                    },
                )
            })
            .collect(),
    }
}

// =========================================================================
// Collaborator doubles
// =========================================================================

enum Scripted {
    Fault(String),
    Empty,
    Reject(String),
    Return(ItemMetadata),
}

/// Generator that, by default, declares `thumb` (150x150) and `medium`
/// (300x200) variants and creates those files next to the source.
/// Individual files can be scripted to fault, come back empty, be
/// rejected, or return fixed metadata.
#[derive(Default)]
pub struct MockGenerator {
    scripted: BTreeMap<String, Scripted>,
    calls: Mutex<usize>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fault_on(mut self, relative: &str, message: &str) -> Self {
        self.scripted
            .insert(relative.to_string(), Scripted::Fault(message.to_string()));
        self
    }

    pub fn empty_on(mut self, relative: &str) -> Self {
        self.scripted.insert(relative.to_string(), Scripted::Empty);
        self
    }

    pub fn reject_on(mut self, relative: &str, message: &str) -> Self {
        self.scripted
            .insert(relative.to_string(), Scripted::Reject(message.to_string()));
        self
    }

    pub fn returning(mut self, relative: &str, metadata: ItemMetadata) -> Self {
        self.scripted
            .insert(relative.to_string(), Scripted::Return(metadata));
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl VariantGenerator for MockGenerator {
    fn generate(
        &self,
        source: &Path,
        relative_file: &str,
        _protected: &BTreeSet<PathBuf>,
    ) -> Result<Generation, GenerateError> {
        *self.calls.lock().unwrap() += 1;

        match self.scripted.get(relative_file) {
            Some(Scripted::Fault(m)) => {
                Err(GenerateError::Backend(BackendError::ProcessingFailed(m.clone())))
            }
            Some(Scripted::Empty) => Ok(Generation::Empty),
            Some(Scripted::Reject(m)) => Ok(Generation::Rejected(m.clone())),
            Some(Scripted::Return(meta)) => Ok(Generation::Metadata(meta.clone())),
            None => {
                let file_name = source.file_name().unwrap().to_str().unwrap();
                let (base, ext) = split_file_name(file_name);
                let dir = source.parent().unwrap();
                let mut sizes = Vec::new();
                for (name, w, h) in [("thumb", 150, 150), ("medium", 300, 200)] {
                    let variant = expected_name(base, ext, w, h);
                    std::fs::write(dir.join(&variant), "").map_err(BackendError::Io)?;
                    sizes.push((name, variant, w, h));
                }
                let borrowed: Vec<(&str, &str, u32, u32)> = sizes
                    .iter()
                    .map(|(n, v, w, h)| (*n, v.as_str(), *w, *h))
                    .collect();
                Ok(Generation::Metadata(metadata_for(relative_file, &borrowed)))
            }
        }
    }
}

/// In-memory metadata store; optionally fails every write.
#[derive(Default)]
pub struct MemoryStore {
    stored: Mutex<BTreeMap<ItemId, ItemMetadata>>,
    failure: Option<String>,
}

impl MemoryStore {
    pub fn failing(message: &str) -> Self {
        Self {
            stored: Mutex::default(),
            failure: Some(message.to_string()),
        }
    }

    pub fn get(&self, item: ItemId) -> Option<ItemMetadata> {
        self.stored.lock().unwrap().get(&item).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.stored.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.stored.lock().unwrap().len()
    }
}

impl MetadataStore for MemoryStore {
    fn persist(&self, item: ItemId, metadata: &ItemMetadata) -> Result<(), LibraryError> {
        if let Some(message) = &self.failure {
            return Err(LibraryError::Io {
                path: PathBuf::from("memory"),
                source: io::Error::other(message.clone()),
            });
        }
        self.stored.lock().unwrap().insert(item, metadata.clone());
        Ok(())
    }
}

/// Fixed list of items.
pub struct VecSource(pub Vec<ItemRef>);

impl ItemSource for VecSource {
    fn list_image_items(&self) -> Result<Vec<ItemRef>, LibraryError> {
        Ok(self.0.clone())
    }
}

/// Real filesystem with scripted misbehavior on delete and listing.
#[derive(Default)]
pub struct FlakyFs {
    /// File names whose removal fails with `PermissionDenied`.
    pub deny: BTreeSet<String>,
    /// File names deleted behind our back right before we remove them.
    pub vanish: BTreeSet<String>,
    /// Every listing fails.
    pub fail_listing: bool,
    pub removed: Mutex<Vec<PathBuf>>,
}

impl FlakyFs {
    pub fn denying(names: &[&str]) -> Self {
        Self {
            deny: names.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn vanishing(names: &[&str]) -> Self {
        Self {
            vanish: names.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn removed_names(&self) -> Vec<String> {
        self.removed
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }
}

impl Filesystem for FlakyFs {
    fn exists(&self, path: &Path) -> bool {
        LocalFs.exists(path)
    }

    fn list_directory(&self, dir: &Path) -> io::Result<BTreeSet<String>> {
        if self.fail_listing {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "listing denied"));
        }
        LocalFs.list_directory(dir)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if self.deny.contains(&name) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        if self.vanish.contains(&name) {
            std::fs::remove_file(path)?;
        }
        LocalFs.remove(path)?;
        self.removed.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}
