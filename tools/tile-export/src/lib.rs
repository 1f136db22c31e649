//! tile-export library
//!
//! Loads glTF assets from disk and packages them with `tile-builder`.

pub mod document;
pub mod export;
pub mod manifest;

pub use document::{load_document, resolve_embedded_uris, LoadedDocument};
pub use export::{
    convert_to_b3dm, convert_to_glb, export_b3dm, export_glb, inspect, ContainerInfo,
    ConvertedGlb, ExportOptions,
};
