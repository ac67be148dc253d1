//! Request and response types for the classification backend.

use serde::{Deserialize, Serialize};

/// One classification label known to the backend
#[derive(Debug, Clone, Deserialize)]
pub struct ClassEntry {
    pub seed_id: String,
    pub seed_name: String,
}

/// Response of the class-list endpoint
#[derive(Debug, Deserialize)]
pub struct ClassListResponse {
    pub seeds: Vec<ClassEntry>,
}

/// Request body for opening a batch upload session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BatchInitRequest {
    pub uuid: String,
    pub folder_name: String,
    pub container_name: String,
    pub file_count: usize,
}

/// Response of the batch-init endpoint
#[derive(Debug, Deserialize)]
pub struct BatchInitResponse {
    #[serde(alias = "sessionId")]
    pub session_id: String,
}

/// Per-file payload for the batch-upload endpoint.
///
/// All fields except `image_data_url` are shared across one session; the
/// image content travels as a base64 data URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub container_name: String,
    pub uuid: String,
    pub seed_id: String,
    pub seed_name: String,
    pub zoom: u32,
    pub seed_count: u32,
    pub image_data_url: String,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_metadata_wire_format() {
        let metadata = UploadMetadata {
            container_name: "container-1".to_string(),
            uuid: "owner-1".to_string(),
            seed_id: "s1".to_string(),
            seed_name: "fescue".to_string(),
            zoom: 5,
            seed_count: 10,
            image_data_url: "data:image/png;base64,AAAA".to_string(),
            session_id: "abc".to_string(),
        };

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["containerName"], "container-1");
        assert_eq!(json["seedId"], "s1");
        assert_eq!(json["seedName"], "fescue");
        assert_eq!(json["seedCount"], 10);
        assert_eq!(json["imageDataUrl"], "data:image/png;base64,AAAA");
        assert_eq!(json["sessionId"], "abc");
    }

    #[test]
    fn test_batch_init_response_aliases() {
        let snake: BatchInitResponse = serde_json::from_str(r#"{"session_id":"abc"}"#).unwrap();
        assert_eq!(snake.session_id, "abc");

        let camel: BatchInitResponse = serde_json::from_str(r#"{"sessionId":"abc"}"#).unwrap();
        assert_eq!(camel.session_id, "abc");
    }
}
