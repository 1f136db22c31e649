//! 8-byte alignment for container sections
//!
//! Offsets are measured from wherever the section will start, so a section
//! written right after a 28-byte header can be padded to end on an 8-byte
//! boundary of the whole file.

use crate::error::Result;
use serde::Serialize;

/// Section alignment in bytes
pub const ALIGNMENT: usize = 8;

/// Number of padding bytes needed so that `byte_offset + len` is aligned
pub fn padding_for(len: usize, byte_offset: usize) -> usize {
    let remainder = (byte_offset + len) % ALIGNMENT;
    if remainder == 0 {
        0
    } else {
        ALIGNMENT - remainder
    }
}

/// Copy `buffer` and append zero bytes up to the next 8-byte boundary
///
/// A missing buffer yields an empty section.
pub fn pad_bytes(buffer: Option<&[u8]>, byte_offset: usize) -> Vec<u8> {
    let Some(buffer) = buffer else {
        return Vec::new();
    };

    let padding = padding_for(buffer.len(), byte_offset);
    let mut padded = Vec::with_capacity(buffer.len() + padding);
    padded.extend_from_slice(buffer);
    padded.extend(std::iter::repeat_n(0u8, padding));
    padded
}

/// Serialize `value` to compact JSON and pad with spaces to the next 8-byte boundary
///
/// A missing value yields an empty section.
pub fn pad_json<T: Serialize + ?Sized>(value: Option<&T>, byte_offset: usize) -> Result<Vec<u8>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    let mut bytes = serde_json::to_vec(value)?;
    let padding = padding_for(bytes.len(), byte_offset);
    bytes.extend(std::iter::repeat_n(b' ', padding));
    Ok(bytes)
}
