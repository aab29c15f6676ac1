//! Recognized image formats: the extension set used to filter storage scans
//! and the MIME allowlist enforced at upload.

/// File extensions treated as images, lowercase.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// MIME types accepted for upload. `image/jpg` is non-standard but common
/// enough in the wild to allow.
pub const IMAGE_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Whether `ext` (without the dot) names a recognized image extension.
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e))
}

/// Whether `mime` is an accepted image content type.
pub fn is_allowed_mime(mime: &str) -> bool {
    IMAGE_MIME_TYPES.iter().any(|m| mime.eq_ignore_ascii_case(m))
}

/// Infer a MIME type from a filename's extension.
pub fn mime_for_filename(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}
