use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::error::FeedError;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of raw feed bytes.
///
/// Methods return boxed futures for dyn-compatibility, so the client can hold
/// any transport behind an `Arc<dyn FeedTransport>`.
pub trait FeedTransport: Send + Sync {
    /// Performs one GET of the feed. Non-2xx statuses are errors.
    fn get(&self) -> BoxFuture<'_, Result<Vec<u8>, FeedError>>;

    fn endpoint(&self) -> &str;
}

/// Plain HTTP GET against a fixed URL.
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl FeedTransport for HttpTransport {
    fn get(&self) -> BoxFuture<'_, Result<Vec<u8>, FeedError>> {
        Box::pin(async move {
            debug!("GET {}", self.url);
            let resp = self
                .client
                .get(&self.url)
                .send()
                .await
                .map_err(|e| FeedError::Network(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FeedError::Status {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("").to_string(),
                });
            }

            let bytes = resp
                .bytes()
                .await
                .map_err(|e| FeedError::Body(e.to_string()))?;
            Ok(bytes.to_vec())
        })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
