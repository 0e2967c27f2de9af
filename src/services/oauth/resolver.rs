//! Token resolver interface used by the authenticator.
use async_trait::async_trait;
use axum::http::StatusCode;
use thiserror::Error;

use crate::services::oauth::types::AccessToken;

/// Result type for token lookups.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Token lookup errors.
///
/// Note:
/// - Kept independent from `AppError`. The authenticator decides which ones
///   collapse into an anonymous request (`NotFound`) and which ones abort it.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No usable response (transport failure, timeout, unusable URL).
    #[error("oauth service: invalid parameters ({0})")]
    InvalidParameters(String),
    /// The authorization service does not know the token (HTTP 404).
    #[error("oauth service: access token not found")]
    NotFound,
    /// The body did not match the expected record.
    #[error("oauth service: could not parse oauth response")]
    Decode(#[source] serde_json::Error),
    /// The authorization service rejected the token.
    #[error("oauth service: {message}")]
    Rejected { status: StatusCode, message: String },
}

/// Resolves an access token id into the identity it was issued for.
///
/// Implementations must be cheap to share (`Arc<dyn TokenResolver>`), and
/// every call is an independent attempt (no retries, no caching).
#[async_trait]
pub trait TokenResolver: Send + Sync + 'static {
    // Returns the resolver backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn resolve(&self, token_id: &str) -> ResolveResult<AccessToken>;
}
