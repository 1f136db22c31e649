//! Base64 data URIs for self-contained glTF buffers

use base64::prelude::BASE64_STANDARD;
use base64::Engine;

/// Prefix used for buffers written by this crate
pub const OCTET_STREAM_PREFIX: &str = "data:application/octet-stream;base64,";

/// Check whether a buffer URI embeds its data
pub fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Encode bytes as an `application/octet-stream` data URI
pub fn encode_data_uri(bytes: &[u8]) -> String {
    format!("{}{}", OCTET_STREAM_PREFIX, BASE64_STANDARD.encode(bytes))
}

/// Decode a base64 data URI of any media type
///
/// Returns `None` for non-data URIs and for URIs that are not base64 encoded.
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (_, encoded) = rest.split_once(";base64,")?;
    BASE64_STANDARD.decode(encoded).ok()
}
