//! Upload submission and reconciliation with the server's balance.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::admission::admit;
use crate::api::{RemoteFileRecord, SwiftShareApi};
use crate::credits::CreditStore;
use crate::error::{Error, Result};
use crate::staging::StagedBatch;

/// Shown when an upload fails and the server gave no reason.
pub const GENERIC_UPLOAD_FAILURE: &str = "Error uploading files. Please try again.";

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    /// Builds the error notice for a failed submission.
    #[must_use]
    pub fn upload_failed(error: &Error) -> Self {
        Self::error(error.user_message(GENERIC_UPLOAD_FAILURE))
    }
}

/// How the balance was brought back in line after an upload or a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The server response carried the new balance.
    Reported,
    /// The balance was re-read from the server.
    Refreshed,
    /// Neither worked; the cached balance may be stale until the next refresh.
    Stale,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// Number of files sent.
    pub uploaded: usize,
    /// Records the server created, if it returned them.
    pub files: Vec<RemoteFileRecord>,
    /// Balance after reconciliation.
    pub balance: u64,
    pub reconciliation: Reconciliation,
}

impl UploadReceipt {
    /// The success notice shown after the upload.
    #[must_use]
    pub fn notice(&self) -> Notice {
        let plural = if self.uploaded == 1 { "" } else { "s" };
        Notice::success(format!(
            "{} file{plural} uploaded successfully!",
            self.uploaded
        ))
    }
}

/// Trait for receiving submission lifecycle updates.
///
/// All methods have default no-op implementations for convenience.
pub trait UploadProgress: Send + Sync {
    /// Called once admission passed and the request is about to be sent.
    fn on_start(&self, _files: usize, _bytes: u64) {}

    /// Called after the server accepted the batch.
    fn on_complete(&self, _receipt: &UploadReceipt) {}

    /// Called when admission or the request failed.
    fn on_error(&self, _notice: &Notice) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl UploadProgress for NoProgress {}

/// Resets the in-flight flag when a submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::UploadInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sends admitted batches and reconciles the credit balance afterwards.
pub struct Uploader {
    api: Arc<dyn SwiftShareApi>,
    credits: CreditStore,
    uploading: AtomicBool,
}

impl Uploader {
    #[must_use]
    pub fn new(api: Arc<dyn SwiftShareApi>, credits: CreditStore) -> Self {
        Self {
            api,
            credits,
            uploading: AtomicBool::new(false),
        }
    }

    /// Returns true while a submission is in flight.
    #[must_use]
    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    /// The credit store this uploader reconciles.
    #[must_use]
    pub const fn credits(&self) -> &CreditStore {
        &self.credits
    }

    /// Validates and sends `batch` as one request.
    ///
    /// On success the batch is emptied and the balance is replaced with the
    /// server's figure (or refreshed when the response has none). On failure
    /// the batch is left exactly as it was so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UploadInProgress`] if another submission is running,
    /// [`Error::Admission`] if the batch fails validation, or the transport or
    /// server error from the upload request.
    pub async fn submit(
        &self,
        batch: &mut StagedBatch,
        progress: &dyn UploadProgress,
    ) -> Result<UploadReceipt> {
        let _guard = InFlight::acquire(&self.uploading)?;

        let result = self.send(batch, progress).await;
        match &result {
            Ok(receipt) => progress.on_complete(receipt),
            Err(e) => {
                log::error!("Upload failed: {e}");
                progress.on_error(&Notice::upload_failed(e));
            }
        }
        result
    }

    async fn send(
        &self,
        batch: &mut StagedBatch,
        progress: &dyn UploadProgress,
    ) -> Result<UploadReceipt> {
        // Advisory: the balance can still change before the server sees the batch
        admit(batch, self.credits.read())?;

        progress.on_start(batch.len(), batch.total_size());
        let response = self.api.upload(batch.files()).await?;

        let uploaded = batch.len();
        batch.clear();
        log::info!("Uploaded {uploaded} file(s)");

        let reconciliation = if let Some(remaining) = response.remaining_credits {
            self.credits.set(remaining);
            Reconciliation::Reported
        } else if self.credits.refresh().await.is_ok() {
            Reconciliation::Refreshed
        } else {
            Reconciliation::Stale
        };

        Ok(UploadReceipt {
            uploaded,
            files: response.files,
            balance: self.credits.read(),
            reconciliation,
        })
    }
}
