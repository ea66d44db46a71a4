//! Error types for the swiftshare library.

use thiserror::Error;

use crate::admission::Rejection;

/// Errors that can occur while talking to the SwiftShare service.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure (connection refused, timeout, bad TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server rejected request ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        /// HTTP status code returned by the server.
        status: u16,
        /// The `error` or `message` field of the response body, if any.
        message: Option<String>,
    },

    /// A batch failed client-side validation before any request was sent.
    #[error("{0}")]
    Admission(#[from] Rejection),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be read or written.
    #[error("configuration error: {0}")]
    Config(String),

    /// No plan with the given identifier exists in the catalog.
    #[error("unknown plan: {0}")]
    UnknownPlan(String),

    /// The server refused to confirm a payment.
    #[error("payment verification failed: {0}")]
    PaymentNotVerified(String),

    /// A submission was attempted while another one is still in flight.
    #[error("an upload is already in progress")]
    UploadInProgress,

    /// The requested file is not known locally.
    #[error("file not found: {0}")]
    NotFound(String),

    /// An authenticated call was attempted without a bearer token.
    #[error("not signed in: set SWIFTSHARE_TOKEN or api.token in the config file")]
    Unauthenticated,
}

impl Error {
    /// Returns the message to show a user, preferring the server's own wording.
    ///
    /// `fallback` is used for transport and server errors that carry no text.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Api { message: None, .. } | Self::Http(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

/// A specialized `Result` type for swiftshare operations.
pub type Result<T> = std::result::Result<T, Error>;
