//! Binary glTF (GLB) container assembly
//!
//! # Layout
//! ```text
//! 0x00: magic "glTF" u32
//! 0x04: version u32 (2)
//! 0x08: length u32 (whole file)
//! 0x0C: JSON chunk length u32
//! 0x10: JSON chunk type u32 ("JSON")
//! 0x14: JSON text, space padded to 8 bytes
//! var:  BIN chunk length u32
//! var:  BIN chunk type u32 ("BIN\0")
//! var:  binary payload, zero padded to 8 bytes
//! ```

use crate::error::{to_u32, Result};
use crate::padding::{pad_bytes, pad_json};
use serde::Serialize;

/// "glTF"
pub const GLB_MAGIC: u32 = 0x46546C67;
pub const GLB_VERSION: u32 = 2;
/// "JSON"
pub const CHUNK_TYPE_JSON: u32 = 0x4E4F534A;
/// "BIN\0"
pub const CHUNK_TYPE_BIN: u32 = 0x004E4942;

const CHUNK_HEADER_SIZE: usize = 8;

/// GLB file header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbHeader {
    pub magic: u32,
    pub version: u32,
    pub length: u32,
}

impl GlbHeader {
    pub const SIZE: usize = 12;

    pub fn new(length: u32) -> Self {
        Self {
            magic: GLB_MAGIC,
            version: GLB_VERSION,
            length,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.length.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            magic: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            version: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            length: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.magic == GLB_MAGIC
    }
}

/// Assemble a GLB from a glTF document and its binary payload
///
/// When the document's first buffer carries a `uri` its data already lives
/// outside the BIN chunk, so `binary` is ignored and the chunk is empty.
pub fn pack_glb<T: Serialize + ?Sized>(document: &T, binary: &[u8]) -> Result<Vec<u8>> {
    let document = serde_json::to_value(document)?;
    let embedded = document
        .pointer("/buffers/0/uri")
        .is_some_and(|uri| !uri.is_null());
    let binary = if embedded { &[][..] } else { binary };

    let json_chunk = pad_json(Some(&document), 0)?;
    let bin_chunk = pad_bytes(Some(binary), 0);

    let total_length = GlbHeader::SIZE
        + CHUNK_HEADER_SIZE
        + json_chunk.len()
        + CHUNK_HEADER_SIZE
        + bin_chunk.len();
    let header = GlbHeader::new(to_u32("GLB length", total_length)?);
    let json_chunk_length = to_u32("GLB JSON chunk length", json_chunk.len())?;
    let bin_chunk_length = to_u32("GLB BIN chunk length", bin_chunk.len())?;

    let mut glb = Vec::with_capacity(total_length);
    glb.extend_from_slice(&header.to_bytes());

    // JSON chunk
    glb.extend_from_slice(&json_chunk_length.to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
    glb.extend_from_slice(&json_chunk);

    // BIN chunk
    glb.extend_from_slice(&bin_chunk_length.to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());
    glb.extend_from_slice(&bin_chunk);

    tracing::debug!(
        "Packed GLB: {} bytes (json {}, bin {})",
        total_length,
        json_chunk.len(),
        bin_chunk.len()
    );

    Ok(glb)
}
