//! Bearer tokens from the identity provider.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Supplies a bearer token for each authenticated request.
///
/// Implementations may refresh tokens behind the scenes; callers ask again
/// for every request and never cache the value.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns the current token.
    async fn token(&self) -> Result<String>;
}

/// A fixed token, typically pasted from the identity provider's session.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    /// Wraps an optional token. `None` means signed out.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.trim().is_empty()))
    }

    /// Returns true if a token is present.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.0.is_some()
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String> {
        self.0.clone().ok_or(Error::Unauthenticated)
    }
}
