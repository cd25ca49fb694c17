//! Batch extraction over a set of saved pages.
//!
//! Each document is extracted on its own; a failure only drops that
//! document. Skipped documents are logged and kept in the [`BatchReport`]
//! so callers can summarize them.

use std::sync::Arc;

use futures::StreamExt as _;
use propscrape_listing_models::{PropertyRecord, RawDocument};

use crate::progress::ProgressCallback;
use crate::{ExtractError, extract_document};

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Extracted records, in input order.
    pub records: Vec<PropertyRecord>,
    /// Documents that produced no record, with the reason.
    pub skipped: Vec<ExtractError>,
}

impl BatchReport {
    /// One-line summary such as `"12 records, 3 skipped"`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} records, {} skipped", self.records.len(), self.skipped.len())
    }

    fn absorb(
        &mut self,
        filename: &str,
        outcome: Result<PropertyRecord, ExtractError>,
        progress: &dyn ProgressCallback,
    ) {
        match outcome {
            Ok(record) => {
                log::debug!("Extracted listing from {filename}");
                self.records.push(record);
            }
            Err(e) if e.is_expected() => {
                log::info!("No listing extracted: {e}");
                self.skipped.push(e);
            }
            Err(e) => {
                log::error!("{e}");
                self.skipped.push(e);
            }
        }
        progress.inc(1);
    }
}

fn total(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Extracts every document in order on the current thread.
#[must_use]
pub fn extract_all(documents: &[RawDocument], progress: &dyn ProgressCallback) -> BatchReport {
    progress.set_total(total(documents.len()));

    let mut report = BatchReport::default();
    for document in documents {
        progress.set_message(document.filename.clone());
        report.absorb(&document.filename, extract_document(document), progress);
    }

    progress.finish(report.summary());
    report
}

/// Extracts documents on the blocking thread pool with at most `jobs`
/// documents in flight. Records keep the input order.
pub async fn extract_all_concurrent(
    documents: Vec<RawDocument>,
    jobs: usize,
    progress: Arc<dyn ProgressCallback>,
) -> BatchReport {
    progress.set_total(total(documents.len()));

    let outcomes = futures::stream::iter(documents)
        .map(|document| async move {
            let filename = document.filename.clone();
            let outcome = tokio::task::spawn_blocking(move || extract_document(&document))
                .await
                .unwrap_or_else(|e| {
                    Err(ExtractError::Task {
                        filename: filename.clone(),
                        message: e.to_string(),
                    })
                });
            (filename, outcome)
        })
        .buffered(jobs.max(1));
    let mut outcomes = std::pin::pin!(outcomes);

    let mut report = BatchReport::default();
    while let Some((filename, outcome)) = outcomes.next().await {
        progress.set_message(filename.clone());
        report.absorb(&filename, outcome, progress.as_ref());
    }

    progress.finish(report.summary());
    report
}
