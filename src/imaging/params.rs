//! Parameter types for image operations.
//!
//! These describe *what* to produce. [`operations`](super::operations)
//! decides which variants an image gets; the [`backend`](super::backend)
//! does the pixel work.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(82)
    }
}

/// One variant to write.
///
/// With `crop` the source is scaled to cover `width x height` and
/// center-cropped; otherwise it is scaled to exactly those dimensions, which
/// the planner has already computed to preserve the aspect ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub crop: bool,
    pub quality: Quality,
}
