//! Per-mesh `_BATCHID` vertex attribute injection
//!
//! Every mesh of a document is given a sequential batch id (0, 1, 2, ... in
//! mesh order). The ids are written into one new buffer, exposed through one
//! new buffer view, and sliced into one accessor per mesh so each vertex can
//! be traced back to the mesh it came from after batching.

use crate::error::{Result, TileError};
use crate::uri::{encode_data_uri, OCTET_STREAM_PREFIX};
use gltf_json as json;
use gltf_json::mesh::Semantic;
use gltf_json::validation::Checked::{self, Valid};

/// Attribute name written into primitives
pub const BATCH_ID_SEMANTIC: &str = "_BATCHID";

/// Largest number of meshes addressable by an unsigned short batch id
pub const MAX_BATCH_COUNT: usize = u16::MAX as usize + 1;

/// Largest batch id buffer whose base64 data URI still fits in a GLB JSON chunk
pub const MAX_BATCH_ID_BYTES: u64 = (u32::MAX as u64 - OCTET_STREAM_PREFIX.len() as u64) / 4 * 3;

const SIZE_OF_U16: u64 = 2;

/// Accessor index returned by batch id injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorIndex(pub u32);

impl AccessorIndex {
    pub fn as_json_index(&self) -> json::Index<json::Accessor> {
        json::Index::new(self.0)
    }
}

/// Batch id given to one mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchIdAssignment {
    /// Index of the mesh in `root.meshes`
    pub mesh: usize,
    pub batch_id: u16,
    /// `count` of the mesh's POSITION accessor
    pub vertex_count: u64,
    /// Offset of this mesh's slice within the batch id buffer view
    pub byte_offset: u64,
    /// The accessor now bound to `_BATCHID` on the mesh's primitives
    pub accessor: AccessorIndex,
}

/// The `_BATCHID` attribute semantic
pub fn batch_id_semantic() -> Checked<Semantic> {
    Valid(Semantic::Extras(BATCH_ID_SEMANTIC[1..].to_string()))
}

/// Vertex count of a mesh, taken from the first primitive with a POSITION accessor
fn mesh_vertex_count(accessors: &[json::Accessor], mesh_idx: usize, mesh: &json::Mesh) -> Result<u64> {
    let positions = Valid(Semantic::Positions);
    mesh.primitives
        .iter()
        .find_map(|primitive| primitive.attributes.get(&positions))
        .and_then(|index| accessors.get(index.value()))
        .map(|accessor| accessor.count.0)
        .ok_or(TileError::MissingAccessor { mesh: mesh_idx })
}

/// Add a `_BATCHID` attribute to every primitive of every mesh
///
/// The document is validated before it is touched: on error nothing has been
/// appended or rewritten. A document that already carries `_BATCHID` is
/// rejected rather than given a second set of ids.
pub fn inject_batch_ids(root: &mut json::Root) -> Result<Vec<BatchIdAssignment>> {
    if root.meshes.len() > MAX_BATCH_COUNT {
        return Err(TileError::SizeLimitExceeded {
            what: "mesh count",
            value: root.meshes.len() as u64,
            limit: MAX_BATCH_COUNT as u64,
        });
    }

    let semantic = batch_id_semantic();
    let mut vertex_counts = Vec::with_capacity(root.meshes.len());
    for (mesh_idx, mesh) in root.meshes.iter().enumerate() {
        if mesh
            .primitives
            .iter()
            .any(|primitive| primitive.attributes.contains_key(&semantic))
        {
            return Err(TileError::DuplicateBatchId { mesh: mesh_idx });
        }
        vertex_counts.push(mesh_vertex_count(&root.accessors, mesh_idx, mesh)?);
    }

    if vertex_counts.is_empty() {
        return Ok(Vec::new());
    }

    // Counts come straight from the input document; saturate on overflow
    let total_bytes = vertex_counts
        .iter()
        .try_fold(0u64, |total, &count| {
            count
                .checked_mul(SIZE_OF_U16)
                .and_then(|bytes| total.checked_add(bytes))
        })
        .unwrap_or(u64::MAX);
    if total_bytes > MAX_BATCH_ID_BYTES {
        return Err(TileError::SizeLimitExceeded {
            what: "batch id buffer length",
            value: total_bytes,
            limit: MAX_BATCH_ID_BYTES,
        });
    }
    let total_vertices = total_bytes / SIZE_OF_U16;

    // One run of ids per mesh, in mesh order
    let mut data = Vec::with_capacity(total_bytes as usize);
    for (batch_id, &count) in vertex_counts.iter().enumerate() {
        let bytes = (batch_id as u16).to_le_bytes();
        for _ in 0..count {
            data.extend_from_slice(&bytes);
        }
    }

    let buffer_idx = root.buffers.len() as u32;
    root.buffers.push(json::Buffer {
        byte_length: data.len().into(),
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("buffer_batchId".to_string()),
        uri: Some(encode_data_uri(&data)),
    });

    let view_idx = root.buffer_views.len() as u32;
    root.buffer_views.push(json::buffer::View {
        buffer: json::Index::new(buffer_idx),
        byte_length: data.len().into(),
        byte_offset: Some(0u64.into()),
        byte_stride: None,
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("bufferViews_batchId".to_string()),
        target: Some(Valid(json::buffer::Target::ArrayBuffer)),
    });

    let mut assignments = Vec::with_capacity(vertex_counts.len());
    let mut byte_offset = 0u64;
    for (mesh_idx, &vertex_count) in vertex_counts.iter().enumerate() {
        let batch_id = mesh_idx as u16;
        let accessor = AccessorIndex(root.accessors.len() as u32);
        let label = root.meshes[mesh_idx]
            .name
            .clone()
            .unwrap_or_else(|| mesh_idx.to_string());

        root.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(view_idx)),
            byte_offset: Some(byte_offset.into()),
            count: vertex_count.into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::U16,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(json::accessor::Type::Scalar),
            min: Some(json::Value::Array(vec![json::Value::from(batch_id)])),
            max: Some(json::Value::Array(vec![json::Value::from(batch_id)])),
            name: Some(format!("accessor_buffer_batchId_{}", label)),
            normalized: false,
            sparse: None,
        });

        assignments.push(BatchIdAssignment {
            mesh: mesh_idx,
            batch_id,
            vertex_count,
            byte_offset,
            accessor,
        });
        byte_offset += vertex_count * SIZE_OF_U16;
    }

    for assignment in &assignments {
        for primitive in &mut root.meshes[assignment.mesh].primitives {
            primitive
                .attributes
                .insert(semantic.clone(), assignment.accessor.as_json_index());
        }
    }

    tracing::debug!(
        "Injected batch ids: {} meshes, {} vertices, {} bytes",
        assignments.len(),
        total_vertices,
        data.len()
    );

    Ok(assignments)
}
