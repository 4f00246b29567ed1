//! CLI output formatting for a regeneration batch.
//!
//! # Output Format
//!
//! ```text
//! Using path: /srv/library
//! would remove 2024/05/photo-999x999.jpg
//! #42 generate-metadata: generator produced no metadata
//! [####################--------------------] 50% (2/4)
//! Processed 4 of 4 items: 1 failed, 1 stale file reported
//! ```
//!
//! Failure notices and stale-file lines are printed above the progress bar
//! as events arrive. The error report (one `#id stage: message` line per
//! error) goes to stderr after the batch, even in silent mode.
//!
//! # Architecture
//!
//! Each piece of output has a `format_*` function (returns `Vec<String>` or
//! `String`) for testability and a `print_*` wrapper that does the I/O.
//! Format functions are pure.

use crate::batch::{BatchEvent, BatchReport, StaleAction};
use crate::types::BatchError;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::sync::mpsc::Receiver;

const BAR_TEMPLATE: &str = "[{bar:40}] {percent}% ({pos}/{len})";

// ============================================================================
// Events
// ============================================================================

/// Lines to print above the progress bar for one event.
///
/// `Started` and `ItemFinished` only move the bar and produce no lines.
/// Stale file paths are shown relative to `uploads_root` when possible.
pub fn format_batch_event(event: &BatchEvent, uploads_root: &Path) -> Vec<String> {
    match event {
        BatchEvent::Started { .. } | BatchEvent::ItemFinished { .. } => Vec::new(),
        BatchEvent::ItemFailed { error, .. } => vec![error.to_string()],
        BatchEvent::StaleFile { file, action, .. } => {
            let shown = file.strip_prefix(uploads_root).unwrap_or(file).display();
            let line = match action {
                StaleAction::Removed => format!("removed {shown}"),
                StaleAction::WouldRemove => format!("would remove {shown}"),
                StaleAction::Missing => format!("already gone {shown}"),
                StaleAction::Protected => format!("kept {shown} (original of another item)"),
            };
            vec![line]
        }
        BatchEvent::Cancelled { processed, total } => {
            vec![format!("Cancelled after {processed} of {total} items")]
        }
    }
}

/// Bar drawn on stdout, next to the event lines and the summary. Stderr is
/// kept for the error report and logs.
fn progress_bar() -> ProgressBar {
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#-");
    ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stdout()).with_style(style)
}

/// Drain batch events until the sender is dropped, drawing a progress bar
/// and printing event lines above it.
///
/// With `show_progress` off, events are consumed silently.
pub fn print_batch_events(events: Receiver<BatchEvent>, uploads_root: &Path, show_progress: bool) {
    if !show_progress {
        events.into_iter().for_each(drop);
        return;
    }

    let bar = progress_bar();
    for event in events {
        for line in format_batch_event(&event, uploads_root) {
            bar.suspend(|| println!("{line}"));
        }
        match event {
            BatchEvent::Started { total } => bar.set_length(total as u64),
            BatchEvent::ItemFinished { index, .. } => bar.set_position(index as u64),
            _ => {}
        }
    }
    bar.finish();
}

// ============================================================================
// Summary and error report
// ============================================================================

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

/// One-line batch summary.
///
/// ```text
/// Processed 4 of 4 items: 1 failed, 2 stale files removed
/// ```
pub fn format_summary(report: &BatchReport) -> String {
    let mut parts = vec![format!("{} failed", report.errors.len())];
    if report.removed > 0 {
        parts.push(format!(
            "{} removed",
            plural(report.removed, "stale file", "stale files")
        ));
    }
    if report.reported > 0 {
        parts.push(format!(
            "{} reported",
            plural(report.reported, "stale file", "stale files")
        ));
    }
    if report.missing > 0 {
        parts.push(format!("{} already gone", report.missing));
    }
    if report.protected > 0 {
        parts.push(format!(
            "{} kept",
            plural(report.protected, "protected original", "protected originals")
        ));
    }

    let verb = if report.cancelled {
        "Cancelled after"
    } else {
        "Processed"
    };
    format!(
        "{verb} {} of {}: {}",
        report.processed,
        plural(report.total, "item", "items"),
        parts.join(", ")
    )
}

pub fn print_summary(report: &BatchReport) {
    println!("{}", format_summary(report));
}

/// One line per error, in the order they were recorded.
pub fn format_error_report(errors: &[BatchError]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}

/// Print the error report to stderr. Prints nothing when there are no errors.
pub fn print_error_report(errors: &[BatchError]) {
    for line in format_error_report(errors) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
