//! swiftshare - A client library for the SwiftShare file-sharing service.
//!
//! Covers the credit-gated upload flow (credit balance, batch staging,
//! admission control, submission with balance reconciliation), file
//! listing and sharing controls, and plan purchases.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swiftshare::{AppConfig, CreditStore, HttpApi, NoProgress, StagedBatch, StagedFile, StaticToken, Uploader};
//!
//! # async fn example() -> swiftshare::Result<()> {
//! let config = AppConfig::load(&AppConfig::default_path())?;
//! let tokens = Arc::new(StaticToken::new(config.api.token.clone()));
//! let api = Arc::new(HttpApi::new(&config.api, tokens)?);
//!
//! let credits = CreditStore::new(api.clone());
//! credits.refresh().await?;
//!
//! let mut batch = StagedBatch::new(config.upload.max_batch);
//! batch.add_files(vec![StagedFile::from_bytes("hello.txt", "hello")])?;
//!
//! let uploader = Uploader::new(api, credits);
//! let receipt = uploader.submit(&mut batch, &NoProgress).await?;
//! println!("{} credits left", receipt.balance);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod admission;
pub mod api;
pub mod auth;
pub mod config;
pub mod credits;
pub mod error;
pub mod files;
pub mod format;
pub mod fs;
pub mod payments;
pub mod staging;
pub mod upload;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export main types for convenience
pub use admission::{Rejection, admit, can_submit};
pub use api::{HttpApi, RemoteFileRecord, SwiftShareApi, Transaction};
pub use auth::{StaticToken, TokenProvider};
pub use config::AppConfig;
pub use credits::CreditStore;
pub use error::{Error, Result};
pub use files::{FileLibrary, LibrarySummary, share_link};
pub use format::{format_amount, format_size, format_timestamp};
pub use fs::{FileSystem, TokioFileSystem};
pub use payments::{Checkout, PLANS, PaymentConfirmation, Plan};
pub use staging::{BatchLimit, FileSource, StagedBatch, StagedFile};
pub use upload::{
    NoProgress, Notice, NoticeKind, Reconciliation, UploadProgress, UploadReceipt, Uploader,
};
