//! glTF/GLB document loading
//!
//! Produces a fully resolved in-memory document: every buffer either carries
//! a data URI or is backed by the GLB BIN payload.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tile_builder::{encode_data_uri, is_data_uri, json};

/// A parsed glTF document plus the data needed to package it
#[derive(Debug)]
pub struct LoadedDocument {
    pub root: json::Root,
    /// BIN chunk of a GLB input (empty for .gltf)
    pub binary: Vec<u8>,
    /// Directory external buffer URIs are relative to
    pub base_dir: PathBuf,
}

/// Load a .gltf or .glb file
///
/// The container is detected from the file's magic bytes, not its extension.
pub fn load_document(path: &Path) -> Result<LoadedDocument> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    if bytes.starts_with(b"glTF") {
        let glb = gltf::Glb::from_slice(&bytes)
            .with_context(|| format!("Failed to parse GLB: {:?}", path))?;
        let root = json::Root::from_slice(&glb.json)
            .with_context(|| format!("Failed to parse GLB JSON chunk: {:?}", path))?;
        let binary = glb.bin.map(|bin| bin.into_owned()).unwrap_or_default();
        tracing::debug!("Loaded GLB {:?}: {} byte BIN chunk", path, binary.len());
        return Ok(LoadedDocument {
            root,
            binary,
            base_dir,
        });
    }

    let root = json::Root::from_slice(&bytes)
        .with_context(|| format!("Failed to parse glTF: {:?}", path))?;
    Ok(LoadedDocument {
        root,
        binary: Vec::new(),
        base_dir,
    })
}

/// Inline every external buffer as a base64 data URI
///
/// Buffers that already embed their data, and the URI-less GLB buffer, are
/// left alone.
pub fn resolve_embedded_uris(document: &mut LoadedDocument) -> Result<()> {
    for (index, buffer) in document.root.buffers.iter_mut().enumerate() {
        let Some(uri) = buffer.uri.as_deref() else {
            continue;
        };
        if is_data_uri(uri) {
            continue;
        }

        // Buffer URIs are URI references, so `my%20mesh.bin` names `my mesh.bin`
        let relative = urlencoding::decode(uri)
            .with_context(|| format!("Buffer {} has a malformed URI {:?}", index, uri))?;
        let path = document.base_dir.join(relative.as_ref());
        let data = std::fs::read(&path)
            .with_context(|| format!("Failed to read buffer {} from {:?}", index, path))?;
        if (data.len() as u64) < buffer.byte_length.0 {
            bail!(
                "Buffer {} ({:?}) holds {} bytes, expected {}",
                index,
                path,
                data.len(),
                buffer.byte_length.0
            );
        }

        tracing::debug!("Embedding buffer {} from {:?} ({} bytes)", index, path, data.len());
        buffer.uri = Some(encode_data_uri(&data));
    }
    Ok(())
}
