use anyhow::{Context, Result};
use rand::Rng;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Retry schedule: 3 retries with exponential backoff from 500ms, plus jitter.
const BACKOFF_BASE_MS: u64 = 500;
const MAX_RETRIES: usize = 3;

fn is_retriable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retriable_send_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_body()
}

/// Backoff for the given attempt: base * 2^attempt + up to 25% jitter.
fn backoff_delay(attempt: usize) -> Duration {
    let multiplier = 1u64.checked_shl(attempt as u32).unwrap_or(u64::MAX);
    let base_ms = BACKOFF_BASE_MS.saturating_mul(multiplier);
    let jitter_ms = rand::thread_rng().gen_range(0..=base_ms / 4);
    Duration::from_millis(base_ms.saturating_add(jitter_ms))
}

/// Send a request, retrying transient failures on the retry schedule.
///
/// Non-retriable error responses are returned as-is for the caller to turn
/// into API errors; only send-level failures become an `Err` here.
pub(super) async fn send_with_retry(
    mut make_request: impl FnMut() -> reqwest::RequestBuilder,
) -> Result<reqwest::Response> {
    let mut attempt = 0;

    loop {
        match make_request().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                if !is_retriable_status(response.status()) || attempt == MAX_RETRIES {
                    return Ok(response);
                }
                debug!("Request failed with status {}", response.status());
                // Drain the body so the connection can be reused.
                let _ = response.bytes().await;
            }
            Err(err) => {
                if !is_retriable_send_error(&err) || attempt == MAX_RETRIES {
                    return Err(anyhow::Error::new(err)).with_context(|| {
                        format!("HTTP request failed after {} attempt(s)", attempt + 1)
                    });
                }
                debug!("Request error: {}", err);
            }
        }

        let delay = backoff_delay(attempt);
        attempt += 1;
        debug!(
            "Retrying in {:?} (attempt {}/{})",
            delay,
            attempt + 1,
            MAX_RETRIES + 1
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_statuses() {
        assert!(is_retriable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retriable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retriable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retriable_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_backoff_grows_with_attempts() {
        let first = backoff_delay(0);
        assert!(first >= Duration::from_millis(BACKOFF_BASE_MS));

        // Attempt 2 starts at 4x the base even before jitter.
        let third = backoff_delay(2);
        assert!(third >= Duration::from_millis(BACKOFF_BASE_MS * 4));
    }
}
