//! Class-list endpoint for fetching the labels the backend knows.

use anyhow::Result;

use super::client::ApiClient;
use super::types::ClassListResponse;

/// Timeout for class-list requests (short, the list is small)
const CLASS_LIST_TIMEOUT_SECS: u64 = 10;

impl ApiClient {
    /// Fetch the ordered list of classification labels.
    pub async fn class_list(&self, backend_url: &str) -> Result<ClassListResponse> {
        // class-list uses an empty object as request body
        let request_body = serde_json::json!({});

        self.call_api_with_timeout(
            "class-list",
            backend_url,
            &request_body,
            CLASS_LIST_TIMEOUT_SECS,
        )
        .await
    }
}
