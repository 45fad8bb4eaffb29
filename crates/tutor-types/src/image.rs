//! Image attachments carried as `data:` URIs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Largest image accepted for a turn (5 MiB). Exactly this size is allowed.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Errors from building or decoding an image attachment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("image is {size} bytes, larger than the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    #[error("malformed image data: {0}")]
    Malformed(String),

    #[error("could not read image: {0}")]
    Io(String),
}

/// A validated `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    uri: String,
    /// Byte offset of the payload within `uri`.
    payload_start: usize,
}

impl ImageAttachment {
    /// Encode raw image bytes, enforcing [`MAX_IMAGE_BYTES`].
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Result<Self, ImageError> {
        check_size(bytes.len() as u64)?;
        if mime_type.trim().is_empty() {
            return Err(ImageError::Malformed("missing mime type".to_string()));
        }
        let prefix = format!("data:{mime_type};base64,");
        let payload_start = prefix.len();
        let uri = prefix + &STANDARD.encode(bytes);
        Ok(Self { uri, payload_start })
    }

    /// Validate the shape of an existing data URI. The payload is not
    /// decoded here; [`ImageAttachment::decode`] does that.
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| ImageError::Malformed("missing 'data:' prefix".to_string()))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| ImageError::Malformed("missing ';base64,' marker".to_string()))?;
        if mime.is_empty() || mime.contains(',') {
            return Err(ImageError::Malformed(format!("bad mime type '{mime}'")));
        }
        check_size(decoded_len(payload))?;

        Ok(Self {
            uri: uri.to_string(),
            payload_start: "data:".len() + mime.len() + ";base64,".len(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.uri["data:".len()..self.payload_start - ";base64,".len()]
    }

    pub fn payload(&self) -> &str {
        &self.uri[self.payload_start..]
    }

    pub fn as_data_uri(&self) -> &str {
        &self.uri
    }

    /// Decoded size in bytes.
    pub fn size(&self) -> u64 {
        decoded_len(self.payload())
    }

    /// Decode the payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, ImageError> {
        STANDARD
            .decode(self.payload())
            .map_err(|e| ImageError::Malformed(format!("invalid base64: {e}")))
    }
}

fn check_size(size: u64) -> Result<(), ImageError> {
    if size > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

fn decoded_len(payload: &str) -> u64 {
    let padding = payload.bytes().rev().take_while(|b| *b == b'=').count() as u64;
    ((payload.len() as u64) / 4 * 3).saturating_sub(padding)
}
