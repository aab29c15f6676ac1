use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gallery::ImageRecord;

/// One image in API responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageResponse {
    /// Catalog identifier (UUIDv4).
    #[schema(example = "9f0c2f5e-97a4-4c38-8a3e-1d0a4f2b7c1d")]
    pub id: String,
    /// Original upload filename.
    #[schema(example = "cat.png")]
    pub name: String,
    /// Path resolving to the stored file.
    #[schema(example = "/uploads/9f0c2f5e-97a4-4c38-8a3e-1d0a4f2b7c1d.png")]
    pub url: String,
    /// Generated on-disk filename.
    pub filename: String,
    /// Size in bytes.
    #[schema(example = 1024)]
    pub size: u64,
    /// MIME content type.
    #[schema(example = "image/png")]
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: DateTime<Utc>,
}

impl From<ImageRecord> for ImageResponse {
    fn from(record: ImageRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.display_name,
            url: format!("/uploads/{}", record.stored_filename),
            filename: record.stored_filename,
            size: record.size_bytes,
            content_type: record.content_type,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Response for `GET /images`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ListImagesResponse {
    pub success: bool,
    pub images: Vec<ImageResponse>,
    /// Present and true when the storage scan failed and the listing
    /// reflects last-known state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for `POST /images`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadImageResponse {
    pub success: bool,
    pub message: String,
    pub image: ImageResponse,
}

/// Request body for `DELETE /images`.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct DeleteImageRequest {
    /// Catalog identifier of the image to delete.
    pub id: Option<String>,
}

/// Response for `DELETE /images`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteImageResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "deletedImage")]
    pub deleted_image: ImageResponse,
}
