//! Batch session endpoints: open a session, then upload files against it.

use anyhow::Result;

use super::client::ApiClient;
use super::types::{BatchInitRequest, BatchInitResponse, UploadMetadata};

/// Timeout for batch image uploads (120 seconds, payloads carry full images)
const BATCH_UPLOAD_TIMEOUT_SECS: u64 = 120;

impl ApiClient {
    /// Open a batch upload session and obtain its server-assigned token.
    pub async fn batch_init(
        &self,
        backend_url: &str,
        owner_id: &str,
        folder_name: &str,
        container_name: &str,
        file_count: usize,
    ) -> Result<BatchInitResponse> {
        let request_body = BatchInitRequest {
            uuid: owner_id.to_string(),
            folder_name: folder_name.to_string(),
            container_name: container_name.to_string(),
            file_count,
        };

        self.call_api_with_timeout(
            "batch-init",
            backend_url,
            &request_body,
            super::client::DEFAULT_TIMEOUT_SECS,
        )
        .await
    }

    /// Upload one image under an open batch session.
    ///
    /// Returns the backend's boolean acknowledgment.
    pub async fn batch_upload_image(
        &self,
        backend_url: &str,
        metadata: &UploadMetadata,
    ) -> Result<bool> {
        self.call_api_with_timeout(
            "batch-upload",
            backend_url,
            metadata,
            BATCH_UPLOAD_TIMEOUT_SECS,
        )
        .await
    }
}
