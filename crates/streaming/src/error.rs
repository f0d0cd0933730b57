/// Why a feed fetch failed.
///
/// Cloneable so every caller joined on one in-flight request receives the
/// same outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("Fetch failed: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("failed to read response body: {0}")]
    Body(String),

    /// The body was not a decodable feature collection.
    #[error("malformed feed: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Decode(e.to_string())
    }
}
