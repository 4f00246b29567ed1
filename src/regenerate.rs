//! Per-item metadata regeneration.
//!
//! `locate → generate → validate → persist`, stopping at the first failing
//! step. Each step maps to one [`Stage`]; the caller gets either the fresh
//! metadata or a [`BatchError`] naming the stage. Metadata is only persisted
//! once it has passed validation.

use crate::fs::Filesystem;
use crate::imaging::{Generation, VariantGenerator};
use crate::library::MetadataStore;
use crate::types::{BatchError, ItemMetadata, ItemRef, Stage};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Regenerate, validate, and persist the metadata of one item.
///
/// `protected` is passed on to the generator: absolute paths of canonical
/// files that no variant may overwrite.
pub fn regenerate(
    item: &ItemRef,
    uploads_root: &Path,
    generator: &dyn VariantGenerator,
    store: &dyn MetadataStore,
    fs: &dyn Filesystem,
    protected: &BTreeSet<PathBuf>,
) -> Result<ItemMetadata, BatchError> {
    let fail = |stage, message: String| BatchError::new(item.id, stage, message);

    let relative = match item.file.as_deref().map(str::trim) {
        Some(file) if !file.is_empty() => file,
        _ => {
            return Err(fail(
                Stage::LocateFile,
                "no file recorded for item".to_string(),
            ));
        }
    };
    let source = uploads_root.join(relative);
    if !fs.exists(&source) {
        return Err(fail(
            Stage::LocateFile,
            format!("file does not exist: {}", source.display()),
        ));
    }
    tracing::debug!(item = %item.id, "regenerating {}", source.display());

    let metadata = match generator.generate(&source, relative, protected) {
        Err(e) => return Err(fail(Stage::GenerateMetadata, e.to_string())),
        Ok(Generation::Empty) => {
            return Err(fail(
                Stage::GenerateMetadata,
                "generator produced no metadata".to_string(),
            ));
        }
        Ok(Generation::Rejected(message)) => return Err(fail(Stage::ValidateMetadata, message)),
        Ok(Generation::Metadata(metadata)) => metadata,
    };

    validate(&metadata, relative).map_err(|message| fail(Stage::ValidateMetadata, message))?;

    store
        .persist(item.id, &metadata)
        .map_err(|e| fail(Stage::PersistMetadata, e.to_string()))?;

    tracing::debug!(item = %item.id, sizes = metadata.sizes.len(), "metadata persisted");
    Ok(metadata)
}

/// Check generated metadata before it is persisted or used for cleanup.
///
/// Variant files must be bare names: reconciliation lists only the
/// canonical file's directory, and a variant elsewhere would never be
/// recognized as expected.
pub fn validate(metadata: &ItemMetadata, expected_file: &str) -> Result<(), String> {
    if metadata.file != expected_file {
        return Err(format!(
            "metadata names {:?}, expected {:?}",
            metadata.file, expected_file
        ));
    }
    if metadata.width == 0 || metadata.height == 0 {
        return Err(format!(
            "invalid original dimensions {}x{}",
            metadata.width, metadata.height
        ));
    }
    for (name, variant) in &metadata.sizes {
        if name.is_empty() {
            return Err("size with empty name".to_string());
        }
        if !is_bare_file_name(&variant.file) {
            return Err(format!(
                "size {name} points outside the item directory: {:?}",
                variant.file
            ));
        }
        if variant.width == 0 || variant.height == 0 {
            return Err(format!(
                "size {name} has invalid dimensions {}x{}",
                variant.width, variant.height
            ));
        }
    }
    Ok(())
}

fn is_bare_file_name(file: &str) -> bool {
    if file.is_empty() || file.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(file).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
