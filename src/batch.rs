//! Batch orchestration: every image item, one at a time.
//!
//! ```text
//! list items ─→ for each item ─→ regenerate ─→ reconcile (when enabled)
//!                    │                │               │
//!                    └── cancelled?   └── BatchError  └── BatchError per file
//! ```
//!
//! A failing item never stops the batch. Errors are collected into the
//! [`BatchReport`] and the next item is processed; nothing is retried.
//! Only the initial item listing can fail the whole run.
//!
//! Progress is reported through an optional [`BatchEvent`] channel so the
//! caller can render it on another thread. The orchestrator itself never
//! prints.

use crate::fs::Filesystem;
use crate::imaging::VariantGenerator;
use crate::library::{ItemSource, LibraryError, MetadataStore};
use crate::reconcile::{ReconciliationResult, reconcile};
use crate::regenerate::regenerate;
use crate::types::{BatchError, ItemId, ItemRef, Stage};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

/// Shared flag that stops a batch before its next item.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Remove stale variants after each successful regeneration.
    pub cleanup: bool,
    /// Report stale variants without removing them. Implies reconciliation.
    pub dry_run: bool,
}

impl BatchOptions {
    fn reconciles(&self) -> bool {
        self.cleanup || self.dry_run
    }
}

/// What happened to one stale file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleAction {
    Removed,
    WouldRemove,
    /// Gone before we got to it.
    Missing,
    /// Named like a variant but it is the original of an item.
    Protected,
}

/// Progress events emitted during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    ItemFailed {
        index: usize,
        total: usize,
        error: BatchError,
    },
    StaleFile {
        item: ItemId,
        file: PathBuf,
        action: StaleAction,
    },
    /// Sent for every item, failed or not. `index` is 1-based.
    ItemFinished {
        index: usize,
        total: usize,
        item: ItemId,
    },
    Cancelled {
        processed: usize,
        total: usize,
    },
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub processed: usize,
    pub errors: Vec<BatchError>,
    /// Stale files deleted.
    pub removed: usize,
    /// Stale files only reported (dry run).
    pub reported: usize,
    /// Stale files that vanished before deletion.
    pub missing: usize,
    /// Stale-looking originals that were kept.
    pub protected: usize,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Runs regeneration and cleanup across the whole library.
pub struct BatchOrchestrator<'a> {
    source: &'a dyn ItemSource,
    generator: &'a dyn VariantGenerator,
    store: &'a dyn MetadataStore,
    fs: &'a dyn Filesystem,
    uploads_root: PathBuf,
    options: BatchOptions,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        source: &'a dyn ItemSource,
        generator: &'a dyn VariantGenerator,
        store: &'a dyn MetadataStore,
        fs: &'a dyn Filesystem,
        uploads_root: &Path,
        options: BatchOptions,
    ) -> Self {
        Self {
            source,
            generator,
            store,
            fs,
            uploads_root: uploads_root.to_path_buf(),
            options,
        }
    }

    /// Process every image item in source order.
    ///
    /// Returns `Err` only when the items cannot be listed.
    pub fn run(
        &self,
        cancel: &CancellationToken,
        events: Option<Sender<BatchEvent>>,
    ) -> Result<BatchReport, LibraryError> {
        let items = self.source.list_image_items()?;
        let total = items.len();
        let protected = self.protected_files(&items);
        let emit = |event: BatchEvent| {
            if let Some(tx) = &events {
                tx.send(event).ok();
            }
        };

        tracing::info!(
            total,
            cleanup = self.options.cleanup,
            dry_run = self.options.dry_run,
            "starting batch"
        );
        emit(BatchEvent::Started { total });

        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };

        for (i, item) in items.iter().enumerate() {
            let index = i + 1;
            if cancel.is_cancelled() {
                tracing::info!(processed = report.processed, total, "batch cancelled");
                report.cancelled = true;
                emit(BatchEvent::Cancelled {
                    processed: report.processed,
                    total,
                });
                break;
            }

            let mut failures = Vec::new();
            match regenerate(
                item,
                &self.uploads_root,
                self.generator,
                self.store,
                self.fs,
                &protected,
            ) {
                Ok(metadata) if self.options.reconciles() => {
                    match reconcile(
                        &metadata,
                        &self.uploads_root,
                        self.fs,
                        self.options.dry_run,
                        &protected,
                    ) {
                        Ok(result) => {
                            self.record_reconciliation(item.id, &result, &mut report, &emit);
                            failures.extend(result.failures.iter().map(|f| {
                                BatchError::new(
                                    item.id,
                                    Stage::Reconcile,
                                    format!("cannot remove {}: {}", f.file, f.message),
                                )
                            }));
                        }
                        Err(e) => {
                            failures.push(BatchError::new(item.id, Stage::Reconcile, e.to_string()))
                        }
                    }
                }
                Ok(_) => {}
                Err(error) => failures.push(error),
            }

            for error in failures {
                tracing::warn!("{error}");
                emit(BatchEvent::ItemFailed {
                    index,
                    total,
                    error: error.clone(),
                });
                report.errors.push(error);
            }

            report.processed = index;
            emit(BatchEvent::ItemFinished {
                index,
                total,
                item: item.id,
            });
        }

        tracing::info!(
            processed = report.processed,
            errors = report.errors.len(),
            removed = report.removed,
            "batch finished"
        );
        Ok(report)
    }

    /// Absolute paths of every item's canonical file.
    fn protected_files(&self, items: &[ItemRef]) -> BTreeSet<PathBuf> {
        items
            .iter()
            .filter_map(|item| item.file.as_deref().map(str::trim))
            .filter(|file| !file.is_empty())
            .map(|file| self.uploads_root.join(file))
            .collect()
    }

    fn record_reconciliation(
        &self,
        item: ItemId,
        result: &ReconciliationResult,
        report: &mut BatchReport,
        emit: &impl Fn(BatchEvent),
    ) {
        let send = |files: &BTreeSet<String>, action| {
            for file in files {
                emit(BatchEvent::StaleFile {
                    item,
                    file: result.directory.join(file),
                    action,
                });
            }
        };
        send(&result.deleted, StaleAction::Removed);
        send(&result.missing, StaleAction::Missing);
        send(&result.protected, StaleAction::Protected);

        let reported: BTreeSet<String> = result.reported().cloned().collect();
        send(&reported, StaleAction::WouldRemove);

        report.removed += result.deleted.len();
        report.missing += result.missing.len();
        report.protected += result.protected.len();
        report.reported += reported.len();
    }
}
