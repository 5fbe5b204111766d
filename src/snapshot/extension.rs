//! MIME type to file extension mapping

/// Preferred extension per MIME type, following the usual system tables
const EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/pjpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/bmp", ".bmp"),
    ("image/x-ms-bmp", ".bmp"),
    ("image/webp", ".webp"),
    ("image/tiff", ".tiff"),
    ("image/avif", ".avif"),
    ("image/heic", ".heic"),
    ("image/svg+xml", ".svg"),
    ("image/x-icon", ".ico"),
    ("image/vnd.microsoft.icon", ".ico"),
    ("video/mp4", ".mp4"),
    ("video/webm", ".webm"),
    ("application/octet-stream", ".bin"),
];

/// Extension (with leading dot) for a `Content-Type` header value.
///
/// Parameters such as `; charset=...` are ignored and matching is
/// case-insensitive.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_image_types() {
        assert_eq!(extension_for("image/jpeg"), Some(".jpg"));
        assert_eq!(extension_for("image/png"), Some(".png"));
        assert_eq!(extension_for("image/webp"), Some(".webp"));
    }

    #[test]
    fn test_parameters_and_case_are_ignored() {
        assert_eq!(extension_for("Image/JPEG; charset=binary"), Some(".jpg"));
        assert_eq!(extension_for("  image/png  "), Some(".png"));
    }

    #[test]
    fn test_unknown_types() {
        assert_eq!(extension_for(""), None);
        assert_eq!(extension_for("multipart/x-mixed-replace; boundary=frame"), None);
        assert_eq!(extension_for("image/x-made-up"), None);
    }
}
