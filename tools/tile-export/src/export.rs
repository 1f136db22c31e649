//! glTF → GLB → b3dm conversion pipeline

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tile_builder::{
    feature_table, inject_batch_ids, pack_b3dm, pack_glb, B3dmHeader, B3dmOptions,
    BatchIdAssignment, GlbHeader,
};

use crate::document::{load_document, resolve_embedded_uris};

/// Conversion settings for a single tile
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Inject a `_BATCHID` attribute per mesh
    pub batch_ids: bool,
    /// Feature table JSON (defaults to `BATCH_LENGTH` = number of batch ids)
    pub feature_table: Option<Value>,
    /// Batch table JSON
    pub batch_table: Option<Value>,
    /// Without an explicit batch table, write `{"name": [...]}` with the mesh names
    pub mesh_names: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            batch_ids: true,
            feature_table: None,
            batch_table: None,
            mesh_names: false,
        }
    }
}

/// GLB produced from a glTF input
#[derive(Debug)]
pub struct ConvertedGlb {
    pub glb: Vec<u8>,
    /// Empty when batch ids were not requested
    pub batches: Vec<BatchIdAssignment>,
    /// Mesh name per batch id
    pub batch_names: Vec<String>,
}

/// Convert a glTF/GLB file to an in-memory GLB
pub fn convert_to_glb(input: &Path, options: &ExportOptions) -> Result<ConvertedGlb> {
    let mut document = load_document(input)?;
    resolve_embedded_uris(&mut document)?;

    let batches = if options.batch_ids {
        inject_batch_ids(&mut document.root)
            .with_context(|| format!("Failed to inject batch ids into {:?}", input))?
    } else {
        Vec::new()
    };

    let batch_names = batches
        .iter()
        .map(|batch| {
            document.root.meshes[batch.mesh]
                .name
                .clone()
                .unwrap_or_else(|| batch.mesh.to_string())
        })
        .collect();

    let glb = pack_glb(&document.root, &document.binary)
        .with_context(|| format!("Failed to pack GLB for {:?}", input))?;

    Ok(ConvertedGlb {
        glb,
        batches,
        batch_names,
    })
}

/// Convert a glTF/GLB file to an in-memory b3dm tile
pub fn convert_to_b3dm(input: &Path, options: &ExportOptions) -> Result<Vec<u8>> {
    let converted = convert_to_glb(input, options)?;

    let feature_table = options
        .feature_table
        .clone()
        .unwrap_or_else(|| feature_table(converted.batches.len()));
    let batch_table = match &options.batch_table {
        Some(table) => Some(table.clone()),
        None if options.mesh_names && !converted.batch_names.is_empty() => {
            Some(json!({ "name": converted.batch_names }))
        }
        None => None,
    };

    let mut tile_options = B3dmOptions::new(&converted.glb).feature_table_json(&feature_table);
    if let Some(batch_table) = &batch_table {
        tile_options = tile_options.batch_table_json(batch_table);
    }

    pack_b3dm(&tile_options).with_context(|| format!("Failed to pack b3dm for {:?}", input))
}

/// Convert a glTF/GLB file and write a .glb
pub fn export_glb(input: &Path, output: &Path, options: &ExportOptions) -> Result<()> {
    let converted = convert_to_glb(input, options)?;
    write_output(output, &converted.glb)?;
    tracing::info!(
        "Exported GLB: {} bytes, {} batch ids",
        converted.glb.len(),
        converted.batches.len()
    );
    Ok(())
}

/// Convert a glTF/GLB file and write a .b3dm
pub fn export_b3dm(input: &Path, output: &Path, options: &ExportOptions) -> Result<()> {
    let tile = convert_to_b3dm(input, options)?;
    write_output(output, &tile)?;
    tracing::info!("Exported b3dm: {} bytes", tile.len());
    Ok(())
}

/// Read a feature or batch table from a JSON file
pub fn read_json_file(path: &Path) -> Result<Value> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON: {:?}", path))
}

fn write_output(output: &Path, bytes: &[u8]) -> Result<()> {
    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

/// Header summary of a packaged container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerInfo {
    Glb {
        header: GlbHeader,
        json_chunk_length: u32,
        bin_chunk_length: Option<u32>,
    },
    B3dm {
        header: B3dmHeader,
        glb: Option<Box<ContainerInfo>>,
    },
}

/// Read the headers of a .glb or .b3dm buffer
pub fn inspect(bytes: &[u8]) -> Result<ContainerInfo> {
    if bytes.starts_with(b"b3dm") {
        let header = B3dmHeader::from_bytes(bytes).context("Truncated b3dm header")?;
        let glb = bytes
            .get(header.glb_offset()..)
            .filter(|payload| !payload.is_empty())
            .map(inspect)
            .transpose()?
            .map(Box::new);
        return Ok(ContainerInfo::B3dm { header, glb });
    }

    let header = GlbHeader::from_bytes(bytes).context("Truncated GLB header")?;
    if !header.is_valid() {
        anyhow::bail!("Not a GLB or b3dm file (magic {:08x})", header.magic);
    }

    let read_u32 = |offset: usize| {
        bytes
            .get(offset..offset + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    };
    let json_chunk_length = read_u32(GlbHeader::SIZE).context("Truncated GLB JSON chunk")?;
    let bin_chunk_length = read_u32(GlbHeader::SIZE + 8 + json_chunk_length as usize);

    Ok(ContainerInfo::Glb {
        header,
        json_chunk_length,
        bin_chunk_length,
    })
}

/// Log the headers of a .glb or .b3dm file
pub fn print_info(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    log_info(&inspect(&bytes)?);
    Ok(())
}

fn log_info(info: &ContainerInfo) {
    match info {
        ContainerInfo::Glb {
            header,
            json_chunk_length,
            bin_chunk_length,
        } => {
            tracing::info!("GLB version {}, {} bytes", header.version, header.length);
            tracing::info!("  JSON chunk: {} bytes", json_chunk_length);
            match bin_chunk_length {
                Some(length) => tracing::info!("  BIN chunk: {} bytes", length),
                None => tracing::info!("  BIN chunk: none"),
            }
        }
        ContainerInfo::B3dm { header, glb } => {
            tracing::info!("b3dm version {}, {} bytes", header.version, header.byte_length);
            tracing::info!(
                "  Feature table: {} bytes JSON, {} bytes binary",
                header.feature_table_json_byte_length,
                header.feature_table_binary_byte_length
            );
            tracing::info!(
                "  Batch table: {} bytes JSON, {} bytes binary",
                header.batch_table_json_byte_length,
                header.batch_table_binary_byte_length
            );
            if let Some(glb) = glb {
                log_info(glb);
            }
        }
    }
}
