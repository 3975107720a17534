//! Provider types and traits

use std::future::Future;

use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while fetching a tile.
///
/// These are always absorbed by the executor as per-tile failures;
/// they never terminate a session on their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The request failed at the transport level (connect, timeout, read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

/// Trait for HTTP tile fetches.
///
/// This abstraction allows dependency injection: the executor is
/// generic over the client so tests can script responses without a
/// network.
pub trait HttpClient: Send + Sync + 'static {
    /// Performs an HTTP GET for a tile URL.
    ///
    /// A success is a 2xx response; the body is returned as raw bytes.
    fn get(&self, url: &str) -> impl Future<Output = Result<Bytes, ProviderError>> + Send;
}

impl<C: HttpClient> HttpClient for std::sync::Arc<C> {
    fn get(&self, url: &str) -> impl Future<Output = Result<Bytes, ProviderError>> + Send {
        (**self).get(url)
    }
}
