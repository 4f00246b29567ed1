//! Filename convention for generated size variants.
//!
//! Every variant lives next to its canonical file and is named
//! `<base>-<width>x<height>.<ext>`:
//!
//! ```text
//! uploads/2024/05/
//! ├── photo.jpg              # canonical
//! ├── photo-150x150.jpg      # thumbnail
//! └── photo-300x200.jpg      # medium
//! ```
//!
//! The matcher is the inverse. It decides which files reconciliation is
//! allowed to delete, so the base name and extension are always escaped
//! before the pattern is built: a `.` or `+` in a file name must match
//! itself and nothing else.

use regex::Regex;
use std::path::Path;

/// File name of a variant of `base.ext` at the given dimensions.
///
/// - `("photo", "jpg", 150, 150)` → `"photo-150x150.jpg"`
/// - `("scan", "", 64, 48)` → `"scan-64x48"`
pub fn expected_name(base: &str, ext: &str, width: u32, height: u32) -> String {
    if ext.is_empty() {
        format!("{base}-{width}x{height}")
    } else {
        format!("{base}-{width}x{height}.{ext}")
    }
}

/// Whether `candidate` looks like a generated variant of `base.ext`.
pub fn matches(candidate: &str, base: &str, ext: &str) -> bool {
    VariantPattern::new(base, ext).matches(candidate)
}

/// Split a file name into `(stem, extension)` the way [`Path`] does.
///
/// `"photo.jpg"` → `("photo", "jpg")`, `"archive.tar.gz"` → `("archive.tar", "gz")`,
/// `"README"` → `("README", "")`.
pub fn split_file_name(file_name: &str) -> (&str, &str) {
    let path = Path::new(file_name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    (stem, ext)
}

/// Compiled matcher for the variants of one canonical file.
#[derive(Debug, Clone)]
pub struct VariantPattern {
    regex: Regex,
}

impl VariantPattern {
    pub fn new(base: &str, ext: &str) -> Self {
        // `\d` is Unicode-aware in the regex crate; variant sizes are ASCII.
        let suffix = if ext.is_empty() {
            String::new()
        } else {
            format!(r"\.{}", regex::escape(ext))
        };
        let pattern = format!(
            r"^{}-([0-9]+)x([0-9]+){}$",
            regex::escape(base),
            suffix
        );
        // Both user-supplied parts are escaped, so the pattern always compiles.
        let regex = Regex::new(&pattern).unwrap_or_else(|e| {
            unreachable!("escaped variant pattern {pattern:?} failed to compile: {e}")
        });
        Self { regex }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// The `(width, height)` encoded in a matching name.
    ///
    /// `None` if the name doesn't match or a dimension overflows `u32`.
    pub fn dimensions(&self, candidate: &str) -> Option<(u32, u32)> {
        let caps = self.regex.captures(candidate)?;
        let width = caps.get(1)?.as_str().parse().ok()?;
        let height = caps.get(2)?.as_str().parse().ok()?;
        Some((width, height))
    }
}
