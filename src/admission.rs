//! Client-side admission control for upload batches.
//!
//! The checks here are advisory. The server enforces its own credit limit and
//! may still reject a batch that passed, for instance when the balance changed
//! in another session between the check and the submission.

use thiserror::Error;

use crate::staging::StagedBatch;

/// Why a batch was not admitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing is staged.
    #[error("Please select at least one file to upload")]
    Empty,

    /// The batch holds more files than the surface allows.
    #[error("You can upload a maximum of {max} files at a time")]
    TooManyFiles {
        /// The batch limit.
        max: usize,
    },

    /// Each file costs one credit and the balance does not cover the batch.
    #[error("You need {needed} credits but only have {available} credits")]
    InsufficientCredits {
        /// Credits the batch would consume.
        needed: u64,
        /// Credits currently available.
        available: u64,
    },
}

/// Checks a batch against its size limit and the available credits.
///
/// Checks run in order (empty, size, credits) and stop at the first failure.
///
/// # Errors
///
/// Returns the first [`Rejection`] that applies.
pub fn admit(batch: &StagedBatch, balance: u64) -> Result<(), Rejection> {
    if batch.is_empty() {
        return Err(Rejection::Empty);
    }
    if batch.len() > batch.max_batch() {
        return Err(Rejection::TooManyFiles {
            max: batch.max_batch(),
        });
    }
    let needed = batch.len() as u64;
    if needed > balance {
        return Err(Rejection::InsufficientCredits {
            needed,
            available: balance,
        });
    }
    Ok(())
}

/// Whether the submit control should be enabled.
#[must_use]
pub fn can_submit(batch: &StagedBatch, balance: u64, uploading: bool) -> bool {
    !uploading && balance > 0 && admit(batch, balance).is_ok()
}
