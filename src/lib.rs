//! # regen-thumbs
//!
//! Batch regeneration of image thumbnails for a media library. For every
//! image item the library knows about, the canonical file is re-read, every
//! registered size is generated again, and the fresh size metadata is stored
//! back. Optionally, variants that no size produces any more are removed.
//!
//! # Pipeline
//!
//! ```text
//! catalog ─→ items ─→ regenerate ─→ validate ─→ persist ─→ reconcile
//!                        │                                     │
//!                   image backend                     list dir, delete stale
//! ```
//!
//! Items are processed one at a time. A failing item is recorded with the
//! step it failed at and the batch moves on; the report at the end decides
//! the exit code.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Orchestrates the run across all items, emits progress events, collects errors |
//! | [`regenerate`] | Per-item locate → generate → validate → persist |
//! | [`reconcile`] | Lists an item's directory and deletes (or reports) stale variants |
//! | [`variants`] | Pure expected/stale file set computation |
//! | [`naming`] | `base-WxH.ext` variant naming convention and its escaped matcher |
//! | [`imaging`] | Size planning and pure-Rust resizing behind the [`imaging::VariantGenerator`] seam |
//! | [`library`] | The JSON media catalog: item listing and metadata storage |
//! | [`fs`] | Filesystem seam used for existence checks, listings, and deletes |
//! | [`config`] | `regen.toml` loading, stock defaults, and validation |
//! | [`types`] | Shared types: item ids, metadata, stages, batch errors |
//! | [`output`] | CLI output formatting: progress bar, summary, error report |
//!
//! # Design Decisions
//!
//! ## Injected Collaborators
//!
//! The batch core never reaches for globals. The item source, the variant
//! generator, the metadata store, and the filesystem are traits handed to
//! [`batch::BatchOrchestrator::new`]. The binary wires the catalog, the
//! `image`-crate backend, and the local filesystem; tests wire doubles.
//!
//! ## Two Error Channels
//!
//! Startup failures (bad root, bad config, unreadable catalog) are ordinary
//! `Result` errors that abort before any item is touched. Per-item failures
//! are [`types::BatchError`] values collected into the report, so one broken
//! image never hides the rest.
//!
//! ## Cleanup Is Opt-In
//!
//! Deleting files is only done with `--remove`. `--debug` runs the same
//! reconciliation but only reports what would go. Matching is restricted to
//! the exact `base-WxH.ext` shape of the item's own canonical file, with the
//! base name escaped, and the canonical files of all items are never deleted.

pub mod batch;
pub mod config;
pub mod fs;
pub mod imaging;
pub mod library;
pub mod naming;
pub mod output;
pub mod reconcile;
pub mod regenerate;
pub mod types;
pub mod variants;

#[cfg(test)]
pub(crate) mod test_helpers;
