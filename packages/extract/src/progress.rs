//! Progress reporting for batch extraction.
//!
//! The batch runner reports through [`ProgressCallback`] so it stays
//! independent of how (or whether) progress is rendered. The binary plugs in
//! an `indicatif` bar; tests and library callers use [`NullProgress`].

/// Receives progress updates from a batch run.
///
/// Implementations must be `Send + Sync` so they can be shared with the
/// blocking tasks that parse documents.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of documents in the batch.
    fn set_total(&self, total: u64);

    /// Advances progress by `delta` documents.
    fn inc(&self, delta: u64);

    /// Updates the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Marks the batch as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every progress update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
