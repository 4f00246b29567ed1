//! Variant generation as seen by the regenerator.
//!
//! [`VariantGenerator`] is the seam between the batch core and pixel work.
//! A generator reports three distinct outcomes besides success, which the
//! regenerator maps onto different failure stages:
//!
//! - `Err(GenerateError)`: the generator faulted (I/O, decode failure).
//! - [`Generation::Empty`]: it ran but produced no metadata.
//! - [`Generation::Rejected`]: it refused the file, with its own message.

use super::backend::{BackendError, ImageBackend};
use super::operations::{generate_variants, mime_type_for_extension};
use super::params::Quality;
use crate::config::{RegenConfig, SizeSpec};
use crate::naming::split_file_name;
use crate::types::ItemMetadata;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Outcome of a generator run that did not fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Metadata(ItemMetadata),
    Empty,
    Rejected(String),
}

pub trait VariantGenerator {
    /// Regenerate all variants of the file at `source`.
    ///
    /// `relative_file` is the canonical path as stored in the library and
    /// must come back unchanged in the produced metadata. Nothing may be
    /// written to a path in `protected`.
    fn generate(
        &self,
        source: &Path,
        relative_file: &str,
        protected: &BTreeSet<PathBuf>,
    ) -> Result<Generation, GenerateError>;
}

/// Generator backed by an [`ImageBackend`] and the configured size registry.
pub struct BackendGenerator<B> {
    backend: B,
    sizes: BTreeMap<String, SizeSpec>,
    quality: Quality,
}

impl<B: ImageBackend> BackendGenerator<B> {
    pub fn new(backend: B, sizes: BTreeMap<String, SizeSpec>, quality: Quality) -> Self {
        Self {
            backend,
            sizes,
            quality,
        }
    }

    pub fn from_config(backend: B, config: &RegenConfig) -> Self {
        Self::new(
            backend,
            config.sizes.clone(),
            Quality::new(config.images.quality),
        )
    }
}

impl<B: ImageBackend> VariantGenerator for BackendGenerator<B> {
    fn generate(
        &self,
        source: &Path,
        relative_file: &str,
        protected: &BTreeSet<PathBuf>,
    ) -> Result<Generation, GenerateError> {
        let file_name = source.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let (_, ext) = split_file_name(file_name);
        let Some(mime_type) = mime_type_for_extension(ext) else {
            return Ok(Generation::Rejected(format!(
                "File is not an image this tool can resize: {file_name}"
            )));
        };

        let metadata = generate_variants(
            &self.backend,
            source,
            relative_file,
            &self.sizes,
            self.quality,
            mime_type,
            protected,
        )?;

        if metadata.width == 0 || metadata.height == 0 {
            return Ok(Generation::Empty);
        }
        Ok(Generation::Metadata(metadata))
    }
}
