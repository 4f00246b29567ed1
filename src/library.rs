//! The media library: where items come from and where metadata goes.
//!
//! The batch core only sees [`ItemSource`] and [`MetadataStore`]. [`Catalog`]
//! implements both on top of a JSON file in the content root:
//!
//! ```json
//! {
//!   "version": 1,
//!   "items": [
//!     {
//!       "id": 42,
//!       "file": "2024/05/photo.jpg",
//!       "mime_type": "image/jpeg",
//!       "metadata": { "file": "2024/05/photo.jpg", "width": 1200, "height": 800,
//!                     "sizes": { "thumbnail": { "file": "photo-150x150.jpg", ... } } }
//!     }
//!   ]
//! }
//! ```
//!
//! Only items with an `image/*` MIME type are handed out, in ascending id
//! order. Every `persist` that changes an item rewrites the catalog through a
//! temp file and a rename, so an interrupted run leaves either the old or the
//! new catalog.
//!
//! ## Write Cost
//!
//! The whole file is serialized on each changing `persist`, so a batch over
//! `n` items writes `O(n)` bytes `n` times. That keeps every finished item
//! durable and is fine for catalogs of a few thousand items. Re-running over
//! an unchanged library writes nothing, since identical metadata is skipped.
//! Libraries much larger than that want a [`MetadataStore`] backed by
//! something with per-record updates.

use crate::types::{ItemId, ItemMetadata, ItemRef};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Version of the catalog format this build reads and writes.
const CATALOG_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unsupported catalog version {found} (expected {})", CATALOG_VERSION)]
    Version { found: u32 },
    #[error("item {0} is not in the catalog")]
    UnknownItem(ItemId),
    #[error("catalog lock poisoned")]
    Poisoned,
}

/// Enumerates the image items to regenerate.
pub trait ItemSource {
    /// All image items, in processing order. Queried once per batch.
    fn list_image_items(&self) -> Result<Vec<ItemRef>, LibraryError>;
}

/// Stores regenerated metadata.
pub trait MetadataStore {
    /// Replace the stored metadata of `item`.
    fn persist(&self, item: ItemId, metadata: &ItemMetadata) -> Result<(), LibraryError>;
}

/// One catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ItemMetadata>,
}

/// On-disk catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub version: u32,
    pub items: Vec<CatalogItem>,
}

/// JSON-file media catalog.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    data: Mutex<CatalogFile>,
}

impl Catalog {
    /// Load the catalog at `path`. Missing, unreadable, or unparsable
    /// catalogs are errors: without one there is nothing to regenerate.
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let content = std::fs::read_to_string(path).map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data: CatalogFile =
            serde_json::from_str(&content).map_err(|source| LibraryError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        if data.version != CATALOG_VERSION {
            return Err(LibraryError::Version {
                found: data.version,
            });
        }
        tracing::debug!(items = data.items.len(), "loaded catalog {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored metadata of one item, if any.
    pub fn metadata(&self, item: ItemId) -> Result<Option<ItemMetadata>, LibraryError> {
        let data = self.data.lock().map_err(|_| LibraryError::Poisoned)?;
        Ok(data
            .items
            .iter()
            .find(|i| i.id == item)
            .and_then(|i| i.metadata.clone()))
    }

    fn save(&self, data: &CatalogFile) -> Result<(), LibraryError> {
        let json = serde_json::to_string_pretty(data).map_err(|source| LibraryError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| LibraryError::Io {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl ItemSource for Catalog {
    fn list_image_items(&self) -> Result<Vec<ItemRef>, LibraryError> {
        let data = self.data.lock().map_err(|_| LibraryError::Poisoned)?;
        let mut items: Vec<ItemRef> = data
            .items
            .iter()
            .filter(|i| i.mime_type.starts_with("image/"))
            .map(|i| ItemRef {
                id: i.id,
                file: i.file.clone(),
            })
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }
}

impl MetadataStore for Catalog {
    fn persist(&self, item: ItemId, metadata: &ItemMetadata) -> Result<(), LibraryError> {
        let mut data = self.data.lock().map_err(|_| LibraryError::Poisoned)?;
        let entry = data
            .items
            .iter_mut()
            .find(|i| i.id == item)
            .ok_or(LibraryError::UnknownItem(item))?;
        if entry.metadata.as_ref() == Some(metadata) {
            tracing::trace!(%item, "metadata unchanged, catalog not rewritten");
            return Ok(());
        }
        entry.metadata = Some(metadata.clone());
        self.save(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn write_catalog(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("library.json");
        fs::write(&path, json).unwrap();
        path
    }

    const MIXED: &str = r#"{
        "version": 1,
        "items": [
            {"id": 7, "file": "2024/b.png", "mime_type": "image/png"},
            {"id": 3, "file": "2024/a.jpg", "mime_type": "image/jpeg"},
            {"id": 5, "file": "docs/manual.pdf", "mime_type": "application/pdf"},
            {"id": 9, "mime_type": "image/gif"}
        ]
    }"#;

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn missing_catalog_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = Catalog::load(&tmp.path().join("library.json"));
        assert!(matches!(result, Err(LibraryError::Io { .. })));
    }

    #[test]
    fn malformed_catalog_is_json_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_catalog(tmp.path(), "{ not json");
        assert!(matches!(Catalog::load(&path), Err(LibraryError::Json { .. })));
    }

    #[test]
    fn wrong_version_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_catalog(tmp.path(), r#"{"version": 2, "items": []}"#);
        assert!(matches!(
            Catalog::load(&path),
            Err(LibraryError::Version { found: 2 })
        ));
    }

    // =========================================================================
    // ItemSource
    // =========================================================================

    #[test]
    fn lists_only_images_sorted_by_id() {
        let tmp = TempDir::new().unwrap();
        let catalog = Catalog::load(&write_catalog(tmp.path(), MIXED)).unwrap();

        let items = catalog.list_image_items().unwrap();
        let ids: Vec<u64> = items.iter().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![3, 7, 9]);
        assert_eq!(items[0].file.as_deref(), Some("2024/a.jpg"));
        assert_eq!(items[2].file, None);
    }

    // =========================================================================
    // MetadataStore
    // =========================================================================

    fn sample_metadata() -> ItemMetadata {
        ItemMetadata {
            file: "2024/a.jpg".to_string(),
            width: 640,
            height: 480,
            sizes: BTreeMap::new(),
        }
    }

    #[test]
    fn persist_updates_memory_and_disk() {
        let tmp = TempDir::new().unwrap();
        let path = write_catalog(tmp.path(), MIXED);
        let catalog = Catalog::load(&path).unwrap();

        catalog.persist(ItemId(3), &sample_metadata()).unwrap();
        assert_eq!(catalog.metadata(ItemId(3)).unwrap(), Some(sample_metadata()));

        let reloaded = Catalog::load(&path).unwrap();
        assert_eq!(reloaded.metadata(ItemId(3)).unwrap(), Some(sample_metadata()));
        // Other entries survive the rewrite, including non-images.
        assert_eq!(reloaded.list_image_items().unwrap().len(), 3);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn persist_unknown_item_errors() {
        let tmp = TempDir::new().unwrap();
        let catalog = Catalog::load(&write_catalog(tmp.path(), MIXED)).unwrap();
        let result = catalog.persist(ItemId(100), &sample_metadata());
        assert!(matches!(result, Err(LibraryError::UnknownItem(ItemId(100)))));
    }

    #[test]
    fn persist_replaces_previous_metadata() {
        let tmp = TempDir::new().unwrap();
        let catalog = Catalog::load(&write_catalog(tmp.path(), MIXED)).unwrap();

        catalog.persist(ItemId(3), &sample_metadata()).unwrap();
        let newer = ItemMetadata {
            width: 320,
            height: 240,
            ..sample_metadata()
        };
        catalog.persist(ItemId(3), &newer).unwrap();
        assert_eq!(catalog.metadata(ItemId(3)).unwrap(), Some(newer));
    }

    #[test]
    fn persist_unchanged_metadata_skips_rewrite() {
        let tmp = TempDir::new().unwrap();
        let path = write_catalog(tmp.path(), MIXED);
        let catalog = Catalog::load(&path).unwrap();
        catalog.persist(ItemId(3), &sample_metadata()).unwrap();

        // Any write from here on would clobber this marker.
        fs::write(&path, "marker").unwrap();
        catalog.persist(ItemId(3), &sample_metadata()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "marker");

        let newer = ItemMetadata {
            width: 320,
            ..sample_metadata()
        };
        catalog.persist(ItemId(3), &newer).unwrap();
        assert_ne!(fs::read_to_string(&path).unwrap(), "marker");
    }
}
