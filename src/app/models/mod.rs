//! Action models: the things that pick an agent's move.
//!
//! [`AlwaysSkipModel`] is the scripted baseline; [`OpenAiModel`] and
//! [`GeminiModel`] ask a hosted LLM for a structured [`Decision`] given the
//! agent's transcript.
//!
//! [`Decision`]: crate::domain::action::Decision

pub mod always_skip;
pub mod gemini;
pub mod openai;
pub mod schema;

pub use always_skip::AlwaysSkipModel;
pub use gemini::GeminiModel;
pub use openai::OpenAiModel;

use crate::config::ProviderConfig;
use crate::utils::error::{BenchError, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::future::Future;

pub(crate) fn http_client(config: &ProviderConfig) -> Result<Client> {
    let client = Client::builder().timeout(config.timeout()).build()?;
    Ok(client)
}

/// Runs `call` until it succeeds, fails with a non-retryable error, or the
/// configured number of retries is used up.
pub(crate) async fn with_retries<T, F, Fut>(
    provider: &str,
    config: &ProviderConfig,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.retry_attempts => {
                attempt += 1;
                tracing::warn!(
                    "{} call failed ({}), retry {}/{}",
                    provider,
                    e,
                    attempt,
                    config.retry_attempts
                );
                tokio::time::sleep(config.retry_delay()).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Turns a non-2xx response into a [`BenchError::ProviderError`], pulling the
/// provider's `error.message` out of the body when there is one.
pub(crate) async fn ensure_success(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    Err(BenchError::ProviderError {
        provider: provider.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// Decodes a successful response body. A body that is not the expected
/// envelope counts as unusable model output, not as a transport failure.
pub(crate) async fn read_json<T: DeserializeOwned>(provider: &str, response: Response) -> Result<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| BenchError::ModelOutputError {
        provider: provider.to_string(),
        message: format!("unexpected response body: {}", e),
    })
}
