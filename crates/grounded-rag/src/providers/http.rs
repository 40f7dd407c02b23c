//! Shared HTTP plumbing for the model clients

use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Build an HTTP client with the configured request timeout
pub(crate) fn build_client(config: &LlmConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(config.timeout())
        .pool_max_idle_per_host(5)
        .build()?)
}

/// Retry a request with exponential backoff (1s, 2s, 4s, ...)
pub(crate) async fn retry_request<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt < max_retries {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::internal("retry loop ran zero times")))
}

/// Turn a non-success response into an error carrying the body
pub(crate) async fn check_status(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::llm(format!("{} failed: HTTP {} - {}", what, status, body)))
}
