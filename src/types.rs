//! Shared types passed between the batch stages.
//!
//! [`ItemMetadata`] is also the on-disk shape stored in the media catalog,
//! so it derives serde and must stay stable across releases.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of an item in the media library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An image record as handed out by the item source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub id: ItemId,
    /// Canonical file, relative to the uploads directory (`2024/05/photo.jpg`).
    /// `None` when the library has no file recorded for the item.
    pub file: Option<String>,
}

/// One generated size of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDescriptor {
    /// Bare file name, always in the same directory as the canonical file.
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

/// Size metadata for one item, produced fresh on every regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    /// Canonical file, relative to the uploads directory.
    pub file: String,
    pub width: u32,
    pub height: u32,
    /// Variants keyed by size name (`thumbnail`, `medium`, ...).
    #[serde(default)]
    pub sizes: BTreeMap<String, VariantDescriptor>,
}

/// Step of the per-item pipeline at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    LocateFile,
    GenerateMetadata,
    ValidateMetadata,
    PersistMetadata,
    Reconcile,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::LocateFile => "locate-file",
            Stage::GenerateMetadata => "generate-metadata",
            Stage::ValidateMetadata => "validate-metadata",
            Stage::PersistMetadata => "persist-metadata",
            Stage::Reconcile => "reconcile",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded per-item failure. Collected, never propagated across items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    pub item: ItemId,
    pub stage: Stage,
    pub message: String,
}

impl BatchError {
    pub fn new(item: ItemId, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            item,
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.item, self.stage, self.message)
    }
}
