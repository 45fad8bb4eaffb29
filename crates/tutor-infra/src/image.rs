//! Image file ingestion.
//!
//! Reads an image from disk into an [`ImageAttachment`]. The size is checked
//! from file metadata before any bytes are read, so an oversized file is
//! rejected without loading it.

use std::path::Path;

use tutor_types::image::{ImageAttachment, ImageError, MAX_IMAGE_BYTES};

/// Load `path` as a data-URI attachment, rejecting files above `limit` bytes
/// (capped at [`MAX_IMAGE_BYTES`]).
pub async fn load_image(path: &Path, limit: u64) -> Result<ImageAttachment, ImageError> {
    let limit = limit.min(MAX_IMAGE_BYTES);

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ImageError::Io(format!("{}: {e}", path.display())))?;
    if !metadata.is_file() {
        return Err(ImageError::Io(format!("{} is not a file", path.display())));
    }
    if metadata.len() > limit {
        return Err(ImageError::TooLarge {
            size: metadata.len(),
            max: limit,
        });
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ImageError::Io(format!("{}: {e}", path.display())))?;
    // The file may have grown between the two calls.
    if bytes.len() as u64 > limit {
        return Err(ImageError::TooLarge {
            size: bytes.len() as u64,
            max: limit,
        });
    }

    let mime = mime_from_extension(path)
        .or_else(|| sniff_mime(&bytes))
        .unwrap_or("application/octet-stream");

    tracing::debug!(path = %path.display(), mime, size = bytes.len(), "Loaded image");
    ImageAttachment::from_bytes(mime, &bytes)
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"%PDF-") {
        Some("application/pdf")
    } else {
        None
    }
}
