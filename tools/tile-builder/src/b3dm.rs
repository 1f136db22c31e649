//! Batched 3D Model (b3dm) tile assembly
//!
//! # Layout
//! ```text
//! 0x00: magic "b3dm"
//! 0x04: version u32 (1)
//! 0x08: byte_length u32 (whole tile)
//! 0x0C: feature_table_json_byte_length u32
//! 0x10: feature_table_binary_byte_length u32
//! 0x14: batch_table_json_byte_length u32
//! 0x18: batch_table_binary_byte_length u32
//! 0x1C: feature table JSON, feature table binary,
//!       batch table JSON, batch table binary, GLB
//! ```
//!
//! Only the feature table JSON is padded relative to its position in the
//! tile. The other three sections are padded relative to their own start;
//! because the feature table JSON already ends on an 8-byte boundary of the
//! tile, every later section (and the GLB) still starts aligned.

use crate::error::{to_u32, Result};
use crate::padding::{pad_bytes, pad_json};
use serde_json::{json, Value};

pub const B3DM_MAGIC: [u8; 4] = *b"b3dm";
pub const B3DM_VERSION: u32 = 1;

/// b3dm tile header (28 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct B3dmHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub byte_length: u32,
    pub feature_table_json_byte_length: u32,
    pub feature_table_binary_byte_length: u32,
    pub batch_table_json_byte_length: u32,
    pub batch_table_binary_byte_length: u32,
}

impl B3dmHeader {
    pub const SIZE: usize = 28;

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.byte_length.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.feature_table_json_byte_length.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.feature_table_binary_byte_length.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.batch_table_json_byte_length.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.batch_table_binary_byte_length.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let field = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };
        Some(Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: field(4),
            byte_length: field(8),
            feature_table_json_byte_length: field(12),
            feature_table_binary_byte_length: field(16),
            batch_table_json_byte_length: field(20),
            batch_table_binary_byte_length: field(24),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.magic == B3DM_MAGIC
    }

    /// Offset of the GLB payload from the start of the tile
    pub fn glb_offset(&self) -> usize {
        Self::SIZE
            + self.feature_table_json_byte_length as usize
            + self.feature_table_binary_byte_length as usize
            + self.batch_table_json_byte_length as usize
            + self.batch_table_binary_byte_length as usize
    }
}

/// Inputs for a b3dm tile
#[derive(Debug, Clone, Copy)]
pub struct B3dmOptions<'a> {
    pub glb: &'a [u8],
    /// Defaults to `{"BATCH_LENGTH": 0}`
    pub feature_table_json: Option<&'a Value>,
    pub feature_table_binary: Option<&'a [u8]>,
    pub batch_table_json: Option<&'a Value>,
    pub batch_table_binary: Option<&'a [u8]>,
}

impl<'a> B3dmOptions<'a> {
    pub fn new(glb: &'a [u8]) -> Self {
        Self {
            glb,
            feature_table_json: None,
            feature_table_binary: None,
            batch_table_json: None,
            batch_table_binary: None,
        }
    }

    pub fn feature_table_json(mut self, json: &'a Value) -> Self {
        self.feature_table_json = Some(json);
        self
    }

    pub fn feature_table_binary(mut self, binary: &'a [u8]) -> Self {
        self.feature_table_binary = Some(binary);
        self
    }

    pub fn batch_table_json(mut self, json: &'a Value) -> Self {
        self.batch_table_json = Some(json);
        self
    }

    pub fn batch_table_binary(mut self, binary: &'a [u8]) -> Self {
        self.batch_table_binary = Some(binary);
        self
    }
}

/// Feature table declaring `batch_length` distinct batch ids
pub fn feature_table(batch_length: usize) -> Value {
    json!({ "BATCH_LENGTH": batch_length })
}

/// Assemble a b3dm tile
pub fn pack_b3dm(options: &B3dmOptions) -> Result<Vec<u8>> {
    let default_feature_table = feature_table(0);
    let feature_table_json = options.feature_table_json.unwrap_or(&default_feature_table);

    let feature_table_json = pad_json(Some(feature_table_json), B3dmHeader::SIZE)?;
    let feature_table_binary = pad_bytes(options.feature_table_binary, 0);
    let batch_table_json = pad_json(options.batch_table_json, 0)?;
    let batch_table_binary = pad_bytes(options.batch_table_binary, 0);

    let byte_length = B3dmHeader::SIZE
        + feature_table_json.len()
        + feature_table_binary.len()
        + batch_table_json.len()
        + batch_table_binary.len()
        + options.glb.len();

    let header = B3dmHeader {
        magic: B3DM_MAGIC,
        version: B3DM_VERSION,
        byte_length: to_u32("b3dm length", byte_length)?,
        feature_table_json_byte_length: to_u32("feature table JSON length", feature_table_json.len())?,
        feature_table_binary_byte_length: to_u32(
            "feature table binary length",
            feature_table_binary.len(),
        )?,
        batch_table_json_byte_length: to_u32("batch table JSON length", batch_table_json.len())?,
        batch_table_binary_byte_length: to_u32(
            "batch table binary length",
            batch_table_binary.len(),
        )?,
    };

    let mut tile = Vec::with_capacity(byte_length);
    tile.extend_from_slice(&header.to_bytes());
    tile.extend_from_slice(&feature_table_json);
    tile.extend_from_slice(&feature_table_binary);
    tile.extend_from_slice(&batch_table_json);
    tile.extend_from_slice(&batch_table_binary);
    tile.extend_from_slice(options.glb);

    tracing::debug!(
        "Packed b3dm: {} bytes (glb {} at offset {})",
        byte_length,
        options.glb.len(),
        header.glb_offset()
    );

    Ok(tile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glb::pack_glb;

    #[test]
    fn test_default_feature_table() {
        let glb = pack_glb(&json!({"asset": {"version": "2.0"}}), &[]).unwrap();
        let tile = pack_b3dm(&B3dmOptions::new(&glb)).unwrap();

        let header = B3dmHeader::from_bytes(&tile).unwrap();
        assert!(header.is_valid());
        assert_eq!(&tile[0..4], b"b3dm");
        assert_eq!(header.version, 1);

        // {"BATCH_LENGTH":0} is 18 bytes; 28 + 18 = 46, padded to 48
        assert_eq!(header.feature_table_json_byte_length, 20);
        assert_eq!(header.feature_table_binary_byte_length, 0);
        assert_eq!(header.batch_table_json_byte_length, 0);
        assert_eq!(header.batch_table_binary_byte_length, 0);
        assert_eq!(header.byte_length as usize, 28 + 20 + glb.len());
        assert_eq!(header.byte_length as usize, tile.len());

        assert_eq!(&tile[28..46], br#"{"BATCH_LENGTH":0}"#);
        assert_eq!(&tile[46..48], b"  ");
        assert_eq!(&tile[tile.len() - glb.len()..], &glb[..]);
        assert_eq!(header.glb_offset(), 48);
    }

    #[test]
    fn test_all_sections() {
        let glb = vec![0xAB; 40];
        let feature_table = feature_table(3);
        let batch_table = json!({"name": ["a", "b", "c"]});
        let options = B3dmOptions::new(&glb)
            .feature_table_json(&feature_table)
            .feature_table_binary(&[1, 2, 3])
            .batch_table_json(&batch_table)
            .batch_table_binary(&[4; 9]);
        let tile = pack_b3dm(&options).unwrap();

        let header = B3dmHeader::from_bytes(&tile).unwrap();
        // Binary sections are padded relative to their own start
        assert_eq!(header.feature_table_binary_byte_length, 8);
        assert_eq!(header.batch_table_binary_byte_length, 16);
        assert_eq!(header.feature_table_json_byte_length % 8, 4);
        assert_eq!(header.batch_table_json_byte_length % 8, 0);
        assert_eq!(header.byte_length as usize, tile.len());

        let ft_binary_start = 28 + header.feature_table_json_byte_length as usize;
        assert_eq!(
            &tile[ft_binary_start..ft_binary_start + 8],
            &[1, 2, 3, 0, 0, 0, 0, 0]
        );

        let bt_json_start = ft_binary_start + 8;
        let bt_json_end = bt_json_start + header.batch_table_json_byte_length as usize;
        let text = std::str::from_utf8(&tile[bt_json_start..bt_json_end]).unwrap();
        assert_eq!(serde_json::from_str::<Value>(text.trim_end()).unwrap(), batch_table);

        assert_eq!(header.glb_offset(), tile.len() - glb.len());
        assert_eq!(&tile[header.glb_offset()..], &glb[..]);
    }

    #[test]
    fn test_sections_start_aligned() {
        let glb = [0u8; 12];
        let batch_table = json!({"id":[1,2,3]});
        assert_eq!(serde_json::to_vec(&batch_table).unwrap().len(), 14);

        for batch_length in [0, 7, 12345] {
            let feature_table = feature_table(batch_length);
            let options = B3dmOptions::new(&glb)
                .feature_table_json(&feature_table)
                .feature_table_binary(&[0; 5])
                .batch_table_json(&batch_table)
                .batch_table_binary(&[0; 3]);
            let tile = pack_b3dm(&options).unwrap();

            let header = B3dmHeader::from_bytes(&tile).unwrap();
            assert_eq!(
                (B3dmHeader::SIZE + header.feature_table_json_byte_length as usize) % 8,
                0
            );
            assert_eq!(header.batch_table_json_byte_length, 16);
            assert_eq!(header.glb_offset() % 8, 0);
            assert_eq!(header.byte_length as usize, tile.len());
        }
    }

    #[test]
    fn test_header_round_trip() {
        let header = B3dmHeader {
            magic: B3DM_MAGIC,
            version: B3DM_VERSION,
            byte_length: 100,
            feature_table_json_byte_length: 20,
            feature_table_binary_byte_length: 8,
            batch_table_json_byte_length: 16,
            batch_table_binary_byte_length: 0,
        };
        assert_eq!(B3dmHeader::from_bytes(&header.to_bytes()), Some(header));
        assert_eq!(header.glb_offset(), 72);
        assert!(B3dmHeader::from_bytes(&[0u8; 27]).is_none());
    }
}
