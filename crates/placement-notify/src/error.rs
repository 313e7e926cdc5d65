//! Notifier error types.

use thiserror::Error;

/// Errors that can occur when calling an external notification endpoint.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The endpoint returned an error response.
    #[error("HTTP {status} from {endpoint}: {message}")]
    Http {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl NotifyError {
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_secs: u64) -> Self {
        if e.is_timeout() {
            NotifyError::Timeout(timeout_secs)
        } else {
            NotifyError::Network(e.to_string())
        }
    }
}

/// Build a client with a fixed request timeout.
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, NotifyError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| NotifyError::Client(e.to_string()))
}

/// Turn a non-success response into [`NotifyError::Http`].
pub(crate) async fn check_status(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<reqwest::Response, NotifyError> {
    let status = response.status().as_u16();
    if status >= 400 {
        let message = response.text().await.unwrap_or_default();
        return Err(NotifyError::Http {
            endpoint: endpoint.to_string(),
            status,
            message,
        });
    }
    Ok(response)
}
