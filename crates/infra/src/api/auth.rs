//! Credential providers
//!
//! The API client never looks up credentials on its own; a
//! [`CredentialProvider`] is injected at construction time and asked for a
//! bearer token once per logical operation.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Failure to obtain a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// No session exists (user signed out, embedded app not bootstrapped)
    #[error("no active session: {0}")]
    Unavailable(String),

    /// A session exists but the token could not be issued or refreshed
    #[error("token rejected: {0}")]
    Rejected(String),
}

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Get a valid bearer token for the next operation
    async fn access_token(&self) -> Result<String, CredentialError>;
}

#[async_trait]
impl<T> CredentialProvider for Arc<T>
where
    T: CredentialProvider + ?Sized,
{
    async fn access_token(&self) -> Result<String, CredentialError> {
        (**self).access_token().await
    }
}

/// Provider returning a fixed token; for tools, scripts and tests
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Provider that always returns `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider").field("token", &"[REDACTED]").finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, CredentialError> {
        if self.token.is_empty() {
            return Err(CredentialError::Unavailable("static token is empty".to_string()));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_returns_token() {
        let provider = StaticTokenProvider::new("test-token");
        assert_eq!(provider.access_token().await.unwrap(), "test-token");
    }

    #[tokio::test]
    async fn empty_static_token_is_unavailable() {
        let provider = StaticTokenProvider::new("");
        assert!(matches!(provider.access_token().await, Err(CredentialError::Unavailable(_))));
    }

    #[tokio::test]
    async fn arc_wrapped_provider_delegates() {
        let provider: Arc<dyn CredentialProvider> = Arc::new(StaticTokenProvider::new("abc"));
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", StaticTokenProvider::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
