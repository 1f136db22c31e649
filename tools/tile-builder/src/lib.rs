//! GLB and b3dm tile packaging for streamed 3D tiles
//!
//! This library turns an in-memory glTF document into the binary containers
//! consumed by 3D tile renderers:
//! - `inject_batch_ids`: Tag every vertex with the batch id of its mesh
//! - `pack_glb`: Binary glTF container with JSON and BIN chunks
//! - `pack_b3dm`: Batched 3D Model tile wrapping a GLB
//! - `pad_bytes` / `pad_json`: 8-byte section alignment
//!
//! # Example
//!
//! ```no_run
//! use tile_builder::*;
//!
//! # fn run(mut root: json::Root) -> tile_builder::Result<()> {
//! let batches = inject_batch_ids(&mut root)?;
//! let glb = pack_glb(&root, &[])?;
//!
//! let feature_table = feature_table(batches.len());
//! let tile = pack_b3dm(&B3dmOptions::new(&glb).feature_table_json(&feature_table))?;
//! # Ok(())
//! # }
//! ```

pub mod b3dm;
pub mod batch_id;
pub mod error;
pub mod glb;
pub mod padding;
pub mod uri;

pub use b3dm::{feature_table, pack_b3dm, B3dmHeader, B3dmOptions};
pub use batch_id::{
    batch_id_semantic, inject_batch_ids, AccessorIndex, BatchIdAssignment, BATCH_ID_SEMANTIC,
};
pub use error::{Result, TileError};
pub use glb::{pack_glb, GlbHeader};
pub use padding::{pad_bytes, pad_json, padding_for, ALIGNMENT};
pub use uri::{decode_data_uri, encode_data_uri, is_data_uri};

// Re-export commonly used gltf-json types
pub use gltf_json as json;
pub use gltf_json::validation::Checked::Valid;
