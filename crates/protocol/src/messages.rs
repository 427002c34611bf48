use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Upload exchange
// ---------------------------------------------------------------------------

/// Server reply to one chunk upload.
///
/// A non-2xx status or `success == false` is a failed chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUploadResponse {
    pub success: bool,
    #[serde(default)]
    pub chunk_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChunkUploadResponse {
    /// Acknowledgment for chunk `index` of `upload_id`.
    pub fn ack(upload_id: &str, index: u64) -> Self {
        Self {
            success: true,
            chunk_id: format!("{upload_id}-{index}"),
            message: None,
        }
    }
}

/// Asks the server to reassemble all received chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub upload_id: String,
    pub original_filename: String,
}

/// Storage name of the reassembled file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub filename: String,
}

/// Error body of the upload endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Media exchange
// ---------------------------------------------------------------------------

/// Error body of the media endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
