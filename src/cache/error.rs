use std::fmt;

/// The network could not produce a response.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout...
    Transport(String),
    /// The request could not be built (bad URL, bad header...).
    InvalidRequest(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "network error: {}", e),
            FetchError::InvalidRequest(e) => write!(f, "invalid request: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}

/// Failures of the offline cache layer.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Network failed and nothing was cached for the request.
    Network(FetchError),
    /// A navigation failed and no offline page is available.
    Offline,
    /// A precache manifest entry could not be fetched.
    Precache { path: String, reason: String },
    /// The analytics flush did not reach the server.
    Sync(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Network(e) => write!(f, "{}", e),
            CacheError::Offline => write!(f, "offline and no fallback page cached"),
            CacheError::Precache { path, reason } => {
                write!(f, "failed to precache '{}': {}", path, reason)
            }
            CacheError::Sync(e) => write!(f, "background sync failed: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<FetchError> for CacheError {
    fn from(e: FetchError) -> Self {
        CacheError::Network(e)
    }
}
