use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::cache::CacheError;

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
#[derive(Debug)]
pub struct HTTPError {
    status: StatusCode,
    message: String,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Converts our `HTTPError` into a JSON response.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        let body = axum::Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

/// Cache failures surface at the edge as gateway errors.
impl From<CacheError> for HTTPError {
    fn from(e: CacheError) -> Self {
        let status = match e {
            CacheError::Network(_) | CacheError::Precache { .. } => StatusCode::BAD_GATEWAY,
            CacheError::Offline => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Sync(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        HTTPError::new(status, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FetchError;

    #[test]
    fn test_cache_errors_map_to_gateway_statuses() {
        let err: HTTPError = CacheError::Network(FetchError::Transport("down".into())).into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        let err: HTTPError = CacheError::Offline.into();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        let err: HTTPError = CacheError::Sync("503".into()).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
