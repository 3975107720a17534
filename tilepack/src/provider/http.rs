//! HTTP client implementation and test doubles.

use bytes::Bytes;

use super::types::{HttpClient, ProviderError};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new client with the default 30-second timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Bytes, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| ProviderError::Http(format!("Failed to read response: {}", e)))
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Mock HTTP client returning the same response for every request.
    pub struct MockHttpClient {
        response: Result<Bytes, ProviderError>,
        calls: AtomicUsize,
    }

    impl MockHttpClient {
        pub fn new(response: Result<Bytes, ProviderError>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
            }
        }

        /// Number of GET requests made so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpClient for MockHttpClient {
        async fn get(&self, _url: &str) -> Result<Bytes, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    /// Mock HTTP client that plays back a scripted response sequence.
    ///
    /// Once the script runs out, every further request succeeds with a
    /// small placeholder body.
    pub struct ScriptedHttpClient {
        script: Mutex<VecDeque<Result<Bytes, ProviderError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedHttpClient {
        pub fn new(script: Vec<Result<Bytes, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpClient for ScriptedHttpClient {
        async fn get(&self, _url: &str) -> Result<Bytes, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Bytes::from_static(b"tile")))
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockHttpClient::new(Ok(Bytes::from_static(&[1, 2, 3, 4])));

        let result = mock.get("http://example.com").await;
        assert_eq!(result.unwrap().as_ref(), &[1, 2, 3, 4]);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_client_error() {
        let mock = MockHttpClient::new(Err(ProviderError::Http("Test error".to_string())));

        let result = mock.get("http://example.com").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_scripted_client_plays_back_in_order() {
        let client = ScriptedHttpClient::new(vec![
            Err(ProviderError::Http("boom".to_string())),
            Ok(Bytes::from_static(b"ok")),
        ]);

        assert!(client.get("u").await.is_err());
        assert_eq!(client.get("u").await.unwrap().as_ref(), b"ok");
        // Script exhausted: placeholder success
        assert!(client.get("u").await.is_ok());
        assert_eq!(client.calls(), 3);
    }
}
