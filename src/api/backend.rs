//! Backend handle with a stored base URL.
//!
//! `Backend` wraps `ApiClient` with the configured backend URL so callers
//! don't pass it to every request, and the shared `reqwest::Client` keeps
//! connection reuse across requests to the same host.

use std::sync::Arc;

use anyhow::Result;

use super::client::ApiClient;
use super::types::{ClassListResponse, UploadMetadata};

/// Remote operations the upload orchestrator depends on.
///
/// Implemented by [`Backend`] for the real service; tests substitute
/// in-memory fakes.
#[allow(async_fn_in_trait)]
pub trait ClassifierBackend {
    /// Fetch the ordered list of classification labels.
    async fn request_class_list(&self) -> Result<ClassListResponse>;

    /// Open a batch session; returns the server-assigned session token.
    async fn init_batch_session(
        &self,
        owner_id: &str,
        folder_name: &str,
        container_name: &str,
        file_count: usize,
    ) -> Result<String>;

    /// Upload one image under an open session; returns the acknowledgment.
    async fn upload_batch_image(&self, metadata: &UploadMetadata) -> Result<bool>;
}

/// Classification backend reachable at a fixed base URL.
#[derive(Clone)]
pub struct Backend {
    inner: Arc<ApiClient>,
    backend_url: String,
}

impl Backend {
    pub fn new(backend_url: String) -> Self {
        Self {
            inner: Arc::new(ApiClient::new()),
            backend_url,
        }
    }
}

impl ClassifierBackend for Backend {
    async fn request_class_list(&self) -> Result<ClassListResponse> {
        self.inner.class_list(&self.backend_url).await
    }

    async fn init_batch_session(
        &self,
        owner_id: &str,
        folder_name: &str,
        container_name: &str,
        file_count: usize,
    ) -> Result<String> {
        let response = self
            .inner
            .batch_init(
                &self.backend_url,
                owner_id,
                folder_name,
                container_name,
                file_count,
            )
            .await?;
        Ok(response.session_id)
    }

    async fn upload_batch_image(&self, metadata: &UploadMetadata) -> Result<bool> {
        self.inner
            .batch_upload_image(&self.backend_url, metadata)
            .await
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("backend_url", &self.backend_url)
            .finish()
    }
}
