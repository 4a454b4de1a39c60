//! Image encoding: PNG bytes → base64 `data:` URI.
//!
//! Chat-completion APIs accept images inline as `data:` URIs inside the
//! `image_url` content part. The file bytes are embedded unchanged; the
//! base64 payload is not percent-encoded.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// MIME type of every page image.
pub const PNG_MIME: &str = "image/png";

/// Wrap raw image bytes in a `data:{mime};base64,...` URI.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64", b64.len());
    format!("data:{};base64,{}", mime_type, b64)
}

/// Split a `data:` URI back into MIME type and decoded bytes.
///
/// Returns `None` for anything that is not a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime_type, payload) = rest.split_once(";base64,")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime_type.to_string(), bytes))
}
