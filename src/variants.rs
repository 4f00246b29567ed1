//! Expected and stale file sets for one item.
//!
//! All sets hold bare file names relative to the directory of the item's
//! canonical file. Both functions are pure; [`crate::reconcile`] supplies the
//! directory listing and acts on the result.

use crate::naming::VariantPattern;
use crate::types::ItemMetadata;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Bare file name of a stored path (`2024/05/photo.jpg` → `photo.jpg`).
fn bare_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Directory holding the canonical file, relative to the uploads directory.
pub fn containing_directory(metadata: &ItemMetadata) -> PathBuf {
    Path::new(&metadata.file)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Files that are supposed to exist for this item: the canonical file plus
/// every declared variant. Never empty.
pub fn expected_files(metadata: &ItemMetadata) -> BTreeSet<String> {
    let mut expected = BTreeSet::new();
    expected.insert(bare_name(&metadata.file).to_string());
    for variant in metadata.sizes.values() {
        expected.insert(bare_name(&variant.file).to_string());
    }
    expected
}

/// Files in `existing` that look like variants of `base.ext` but are no
/// longer declared.
///
/// Anything that doesn't match the naming convention is left alone, even if
/// nothing references it.
pub fn stale_files(
    existing: &BTreeSet<String>,
    expected: &BTreeSet<String>,
    base: &str,
    ext: &str,
) -> BTreeSet<String> {
    let pattern = VariantPattern::new(base, ext);
    existing
        .iter()
        .filter(|name| pattern.matches(name) && !expected.contains(*name))
        .cloned()
        .collect()
}
