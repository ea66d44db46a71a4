//! The signed-in user's credit balance, shared by every view.
//!
//! The balance only ever changes to a value the server reported: either a
//! refresh, or an authoritative figure returned by an upload or a payment.
//! It is never decremented locally.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::api::SwiftShareApi;
use crate::error::Result;

#[derive(Debug, Default)]
struct Balance {
    credits: AtomicU64,
    /// Number of refreshes in flight.
    in_flight: AtomicUsize,
}

/// Counts a refresh as in flight until dropped.
struct Loading<'a>(&'a AtomicUsize);

impl<'a> Loading<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Cloneable handle to the credit balance.
///
/// Clones share the same balance. Concurrent refreshes are not sequenced:
/// whichever response resolves last is the value that sticks.
#[derive(Clone)]
pub struct CreditStore {
    api: Arc<dyn SwiftShareApi>,
    balance: Arc<Balance>,
}

impl std::fmt::Debug for CreditStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditStore")
            .field("credits", &self.read())
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

impl CreditStore {
    /// Creates a store with a zero balance. Call [`refresh`](Self::refresh)
    /// after sign-in to load the real value.
    #[must_use]
    pub fn new(api: Arc<dyn SwiftShareApi>) -> Self {
        Self {
            api,
            balance: Arc::new(Balance::default()),
        }
    }

    /// Returns the cached balance without touching the network.
    #[must_use]
    pub fn read(&self) -> u64 {
        self.balance.credits.load(Ordering::SeqCst)
    }

    /// Returns true while any refresh is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.balance.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Replaces the balance with a server-reported value.
    pub fn set(&self, credits: u64) {
        log::debug!("Credit balance set to {credits}");
        self.balance.credits.store(credits, Ordering::SeqCst);
    }

    /// Reloads the balance from the server.
    ///
    /// On failure the previous balance is kept and the error is logged and
    /// returned; callers may ignore it.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error from the balance endpoint.
    pub async fn refresh(&self) -> Result<u64> {
        let result = {
            let _loading = Loading::start(&self.balance.in_flight);
            self.api.credits().await
        };

        match result {
            Ok(credits) => {
                self.set(credits);
                Ok(credits)
            }
            Err(e) => {
                log::warn!("Failed to refresh credits, keeping {}: {e}", self.read());
                Err(e)
            }
        }
    }
}
