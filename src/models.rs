use serde::{Deserialize, Serialize};

// JSON wire types. Field names stay camelCase to match the gallery client.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    // optional so the handler can answer 400 with rate limit headers
    // instead of letting the extractor reject the body
    pub file_name: Option<String>,
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlResponse {
    pub presigned_url: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPinRequest {
    pub pin: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPinResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub continuation_token: Option<String>,
    pub limit: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    pub key: String,
    pub url: String,
    pub last_modified: String,
    pub size: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListImagesResponse {
    pub items: Vec<ImageItem>,
    pub next_continuation_token: Option<String>,
    pub is_truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteImagesRequest {
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteErrorItem {
    pub key: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteImagesResponse {
    pub success: bool,
    pub deleted: u64,
    pub errors: Vec<DeleteErrorItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
