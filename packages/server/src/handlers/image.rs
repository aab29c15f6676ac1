use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use axum::{Json, body::Body};
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use common::media;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::image::{
    DeleteImageRequest, DeleteImageResponse, ImageResponse, ListImagesResponse,
    UploadImageResponse,
};
use crate::state::AppState;
use crate::utils::filename::validate_flat_filename;

/// Body limit for image uploads: the configured image cap plus multipart
/// framing overhead, so the service's own size check decides (in the
/// structured error shape) rather than the framework's 413.
pub fn upload_body_limit(max_image_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_image_size as usize + 1024 * 1024)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Images",
    operation_id = "listImages",
    summary = "List all images",
    description = "Returns every known image, newest upload first. The upload \
        directory is reconciled into the catalog first, so files added or \
        removed outside the API are reflected. If the directory scan fails, \
        the last-known listing is returned with `partial: true`.",
    responses(
        (status = 200, description = "Image listing", body = ListImagesResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_images(State(state): State<AppState>) -> Json<ListImagesResponse> {
    let listing = state.gallery.list_images().await;
    let partial = listing.partial;

    Json(ListImagesResponse {
        success: true,
        images: listing.images.into_iter().map(ImageResponse::from).collect(),
        partial: partial.then_some(true),
        message: partial.then(|| "Listing may be incomplete: storage scan failed".to_string()),
    })
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Uploads a file from the `image` multipart field. The part's \
        content type must be a recognized image MIME type and the payload must \
        not exceed the configured size limit; both are checked before anything \
        is written.",
    request_body(content_type = "multipart/form-data", description = "Image file upload"),
    responses(
        (status = 200, description = "Image stored", body = UploadImageResponse),
        (status = 400, description = "Missing field or failed validation \
            (VALIDATION_ERROR, INVALID_CONTENT_TYPE, PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Storage failure (WRITE_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadImageResponse>, AppError> {
    let mut file: Option<(axum::body::Bytes, Option<String>, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("image") => {
                let name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
                file = Some((data, name, content_type));
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let (data, name, content_type) =
        file.ok_or_else(|| AppError::Validation("No image file provided".into()))?;

    let record = state
        .gallery
        .upload_image(&data, content_type.as_deref(), name.as_deref())
        .await?;

    Ok(Json(UploadImageResponse {
        success: true,
        message: "Image uploaded successfully".into(),
        image: record.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/",
    tag = "Images",
    operation_id = "deleteImage",
    summary = "Delete an image",
    description = "Deletes the image named by the `id` field of the JSON body, \
        removing both the catalog entry and the stored file. A file already \
        missing from disk still counts as deleted.",
    request_body = DeleteImageRequest,
    responses(
        (status = 200, description = "Image deleted", body = DeleteImageResponse),
        (status = 400, description = "Missing or malformed id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown id (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, body))]
pub async fn delete_image(
    State(state): State<AppState>,
    AppJson(body): AppJson<DeleteImageRequest>,
) -> Result<Json<DeleteImageResponse>, AppError> {
    let id = body
        .id
        .ok_or_else(|| AppError::Validation("Image ID is required".into()))?;
    let id =
        Uuid::parse_str(&id).map_err(|_| AppError::Validation("Invalid image ID".into()))?;

    let record = state.gallery.delete_image(&id).await?;

    Ok(Json(DeleteImageResponse {
        success: true,
        message: "Image deleted successfully".into(),
        deleted_image: record.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/uploads/{filename}",
    tag = "Images",
    operation_id = "serveImage",
    summary = "Fetch stored image bytes",
    description = "Streams the stored file named by every record's `url` field.",
    params(("filename" = String, Path, description = "Stored filename")),
    responses(
        (status = 200, description = "Image content"),
        (status = 404, description = "No such file (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn serve_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let filename = validate_flat_filename(&filename)
        .map_err(|_| AppError::NotFound("Image not found".into()))?;

    let (reader, size) = state.gallery.open_image(filename).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media::mime_for_filename(filename))
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(filename),
        )
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

/// Build a safe inline `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    format!("inline; filename=\"{name}\"")
}
