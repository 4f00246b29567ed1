//! Stale thumbnail cleanup.
//!
//! After an item's metadata has been regenerated, its directory may still
//! hold variants for sizes that are no longer registered (or that now come
//! out at different dimensions). Reconciliation lists the directory, asks
//! [`crate::variants`] which files are stale, and removes them, or only
//! reports them in dry-run mode.
//!
//! Per-file problems never abort the item:
//!
//! - a file that vanished between the listing and the delete is recorded in
//!   [`ReconciliationResult::missing`]
//! - any other delete failure is recorded in [`ReconciliationResult::failures`]
//! - a stale-looking file that is the canonical file of some item in the
//!   batch is recorded in [`ReconciliationResult::protected`] and kept

use crate::fs::Filesystem;
use crate::naming::split_file_name;
use crate::types::ItemMetadata;
use crate::variants::{containing_directory, expected_files, stale_files};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("cannot list {path}: {source}")]
    Listing { path: PathBuf, source: io::Error },
    #[error("canonical file {0:?} has no usable file name")]
    FileName(String),
}

/// A stale file that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub file: String,
    pub message: String,
}

/// Outcome of reconciling one item's directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// Directory that was scanned (absolute).
    pub directory: PathBuf,
    pub expected: BTreeSet<String>,
    pub existing: BTreeSet<String>,
    pub stale: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    pub protected: BTreeSet<String>,
    pub failures: Vec<DeleteFailure>,
    pub dry_run: bool,
}

impl ReconciliationResult {
    /// Stale files that were only reported (dry run), excluding protected ones.
    pub fn reported(&self) -> impl Iterator<Item = &String> {
        self.stale
            .iter()
            .filter(|f| self.dry_run && !self.protected.contains(*f))
    }
}

/// Reconcile the directory of `metadata` against its declared variants.
///
/// `protected` holds absolute paths that must never be deleted, typically
/// the canonical files of every item in the batch.
pub fn reconcile(
    metadata: &ItemMetadata,
    uploads_root: &Path,
    fs: &dyn Filesystem,
    dry_run: bool,
    protected: &BTreeSet<PathBuf>,
) -> Result<ReconciliationResult, ReconcileError> {
    let canonical_name = Path::new(&metadata.file)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ReconcileError::FileName(metadata.file.clone()))?;
    let (base, ext) = split_file_name(canonical_name);

    let directory = uploads_root.join(containing_directory(metadata));
    let existing = fs
        .list_directory(&directory)
        .map_err(|source| ReconcileError::Listing {
            path: directory.clone(),
            source,
        })?;
    let expected = expected_files(metadata);
    let stale = stale_files(&existing, &expected, base, ext);

    let mut result = ReconciliationResult {
        directory: directory.clone(),
        expected,
        existing,
        dry_run,
        ..ReconciliationResult::default()
    };

    for file in &stale {
        let path = directory.join(file);
        if protected.contains(&path) {
            tracing::warn!("keeping {}: it is the original of another item", path.display());
            result.protected.insert(file.clone());
            continue;
        }
        if dry_run {
            tracing::debug!("dry run: would remove {}", path.display());
            continue;
        }
        match fs.remove(&path) {
            Ok(()) => {
                tracing::debug!("removed {}", path.display());
                result.deleted.insert(file.clone());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("stale file disappeared before removal: {}", path.display());
                result.missing.insert(file.clone());
            }
            Err(e) => {
                tracing::warn!("failed to remove {}: {}", path.display(), e);
                result.failures.push(DeleteFailure {
                    file: file.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    result.stale = stale;
    Ok(result)
}
