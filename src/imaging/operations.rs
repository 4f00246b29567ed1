//! High-level image operations.
//!
//! These functions combine size planning with backend execution: they take
//! the size registry, compute what each variant should be, and call the
//! backend to write it.

use super::backend::{BackendError, ImageBackend};
use super::calculations::plan_size;
use super::params::{Quality, ResizeParams};
use crate::config::SizeSpec;
use crate::naming::{expected_name, split_file_name};
use crate::types::{ItemMetadata, VariantDescriptor};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// MIME type for a file extension the backend can read and write.
///
/// `None` means the file is not an image this tool generates variants for.
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Write every applicable size of `source` next to it and describe the result.
///
/// `relative_file` is recorded verbatim as the canonical path. Sizes that
/// resolve to the same dimensions share one file, written once.
///
/// `protected` holds absolute paths that must never be written, the
/// canonical files of other items. All sizes are planned before anything is
/// written, so a collision leaves the directory untouched.
pub fn generate_variants(
    backend: &impl ImageBackend,
    source: &Path,
    relative_file: &str,
    sizes: &BTreeMap<String, SizeSpec>,
    quality: Quality,
    mime_type: &str,
    protected: &BTreeSet<PathBuf>,
) -> Result<ItemMetadata> {
    let (width, height) = get_dimensions(backend, source)?;

    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "Source path has no UTF-8 file name: {}",
                source.display()
            ))
        })?;
    let (base, ext) = split_file_name(file_name);
    let output_dir = source.parent().unwrap_or_else(|| Path::new(""));

    let mut planned = Vec::new();
    for (name, spec) in sizes {
        let Some((w, h)) = plan_size((width, height), spec) else {
            tracing::debug!(size = %name, "size skipped for {}x{} original", width, height);
            continue;
        };
        let variant_name = expected_name(base, ext, w, h);
        let output = output_dir.join(&variant_name);
        if protected.contains(&output) {
            return Err(BackendError::ProtectedOutput(output));
        }
        planned.push((name, spec.crop, variant_name, output, w, h));
    }

    let mut written = BTreeSet::new();
    let mut variants = BTreeMap::new();

    for (name, crop, variant_name, output, w, h) in planned {
        if written.insert(variant_name.clone()) {
            backend.resize(&ResizeParams {
                source: source.to_path_buf(),
                output,
                width: w,
                height: h,
                crop,
                quality,
            })?;
        }

        variants.insert(
            name.clone(),
            VariantDescriptor {
                file: variant_name,
                width: w,
                height: h,
                mime_type: mime_type.to_string(),
            },
        );
    }

    Ok(ItemMetadata {
        file: relative_file.to_string(),
        width,
        height,
        sizes: variants,
    })
}
