//! Shared HTTP plumbing for providers.

use reqwest::{Response, StatusCode};
use std::time::Duration;

use super::ProviderError;

/// Build the HTTP client shared by every provider.
///
/// `timeout` bounds each request end to end.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::HttpError(e.to_string()))
}

pub(crate) fn send_error(e: reqwest::Error) -> ProviderError {
    ProviderError::HttpError(e.to_string())
}

/// Read a response body for diagnostics, never failing.
pub(crate) async fn body_text(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {}>", e))
}

/// Pass successful responses through; turn the rest into provider errors
/// carrying the response body.
pub(crate) async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(ProviderError::RateLimited {
            retry_after,
            message: body_text(response).await,
        });
    }

    if !status.is_success() {
        return Err(ProviderError::ApiError {
            status: status.as_u16(),
            message: body_text(response).await,
        });
    }

    Ok(response)
}
