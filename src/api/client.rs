use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

use super::http::send_with_retry;

/// Default request timeout in seconds
pub(super) const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn build_user_agent() -> String {
    std::env::var("SEEDSCOPE_USER_AGENT")
        .unwrap_or_else(|_| format!("seedscope.cli/{}", env!("CARGO_PKG_VERSION")))
}

/// HTTP client for the classification backend.
///
/// One shared `reqwest::Client` underlies every request so connections to
/// the backend are pooled; endpoint wrappers live in their own files as
/// `impl ApiClient` blocks.
pub struct ApiClient {
    client: Client,
    user_agent: String,
}

impl ApiClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            user_agent: build_user_agent(),
        }
    }

    fn endpoint_url(base_url: &str, endpoint: &str) -> Result<Url> {
        let base =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
        base.join(endpoint)
            .with_context(|| format!("Failed to build URL for endpoint: {}", endpoint))
    }

    /// POST a JSON body to an endpoint and decode the JSON response.
    ///
    /// Every request carries a fresh `x-request-id` so backend logs can be
    /// correlated with client-side failures.
    pub(super) async fn call_api_with_timeout<T, R>(
        &self,
        endpoint: &str,
        base_url: &str,
        body: &T,
        timeout_secs: u64,
    ) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let url = Self::endpoint_url(base_url, endpoint)?;
        let request_id = Uuid::new_v4().to_string();
        let timeout = Duration::from_secs(timeout_secs);

        debug!("POST {} (timeout {}s)", url, timeout_secs);

        let response = send_with_retry(|| {
            self.client
                .post(url.clone())
                .timeout(timeout)
                .header("Content-Type", "application/json")
                .header("User-Agent", &self.user_agent)
                .header("x-request-id", &request_id)
                .json(body)
        })
        .await
        .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        debug!("{} responded with status {}", endpoint, status);

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("{} failed with status {}: {}", endpoint, status, detail);
            anyhow::bail!("API request failed with status {}: {}", status, detail);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to decode {} response", endpoint))
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_user_agent() {
        let ua = build_user_agent();
        assert!(ua.starts_with("seedscope.cli/"));
    }

    #[test]
    fn test_endpoint_url_joins_with_and_without_slash() {
        let url = ApiClient::endpoint_url("https://backend.example.com/", "batch-init").unwrap();
        assert_eq!(url.as_str(), "https://backend.example.com/batch-init");

        let url = ApiClient::endpoint_url("https://backend.example.com", "batch-init").unwrap();
        assert_eq!(url.as_str(), "https://backend.example.com/batch-init");
    }

    #[test]
    fn test_endpoint_url_rejects_invalid_base() {
        assert!(ApiClient::endpoint_url("not a url", "batch-init").is_err());
    }
}
