//! Manifest parsing and build orchestration
//!
//! Parses tiles.toml and converts each listed asset. Relative paths are
//! resolved against the manifest's directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::export::{export_b3dm, export_glb, read_json_file, ExportOptions};

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub tiles: BTreeMap<String, TileEntry>,
    /// Directory containing the manifest
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("tiles/")
}

/// Container written for a tile entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    #[default]
    B3dm,
    Glb,
}

impl TileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::B3dm => "b3dm",
            TileFormat::Glb => "glb",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TileEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        format: TileFormat,
        #[serde(default = "default_batch_ids")]
        batch_ids: bool,
        #[serde(default)]
        feature_table: Option<PathBuf>,
        #[serde(default)]
        batch_table: Option<PathBuf>,
        #[serde(default)]
        mesh_names: bool,
    },
}

fn default_batch_ids() -> bool {
    true
}

impl TileEntry {
    pub fn path(&self) -> &Path {
        match self {
            TileEntry::Simple(p) => p,
            TileEntry::Detailed { path, .. } => path,
        }
    }

    pub fn format(&self) -> TileFormat {
        match self {
            TileEntry::Simple(_) => TileFormat::default(),
            TileEntry::Detailed { format, .. } => *format,
        }
    }

    /// JSON side files referenced by this entry
    fn table_paths(&self) -> Vec<&Path> {
        match self {
            TileEntry::Simple(_) => Vec::new(),
            TileEntry::Detailed {
                feature_table,
                batch_table,
                ..
            } => feature_table
                .iter()
                .chain(batch_table.iter())
                .map(PathBuf::as_path)
                .collect(),
        }
    }

    /// Export options, reading any referenced table files
    pub fn export_options(&self, base_dir: &Path) -> Result<ExportOptions> {
        match self {
            TileEntry::Simple(_) => Ok(ExportOptions::default()),
            TileEntry::Detailed {
                batch_ids,
                feature_table,
                batch_table,
                mesh_names,
                ..
            } => Ok(ExportOptions {
                batch_ids: *batch_ids,
                feature_table: feature_table
                    .as_ref()
                    .map(|p| read_json_file(&base_dir.join(p)))
                    .transpose()?,
                batch_table: batch_table
                    .as_ref()
                    .map(|p| read_json_file(&base_dir.join(p)))
                    .transpose()?,
                mesh_names: *mesh_names,
            }),
        }
    }
}

/// Parse manifest text
pub fn parse_manifest(content: &str, base_dir: &Path) -> Result<Manifest> {
    let mut manifest: Manifest = toml::from_str(content)?;
    manifest.base_dir = base_dir.to_path_buf();
    Ok(manifest)
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    parse_manifest(&content, base_dir)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    // Check that all source files exist
    for (name, entry) in &manifest.tiles {
        let source = manifest.base_dir.join(entry.path());
        if !source.exists() {
            anyhow::bail!("Tile '{}' source not found: {:?}", name, source);
        }
        for table in entry.table_paths() {
            let table = manifest.base_dir.join(table);
            if !table.exists() {
                anyhow::bail!("Tile '{}' table not found: {:?}", name, table);
            }
        }
    }
    Ok(())
}

/// Build all tiles from a manifest, returning the written paths
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<Vec<PathBuf>> {
    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => manifest.base_dir.join(&manifest.output.dir),
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut written = Vec::with_capacity(manifest.tiles.len());
    for (name, entry) in &manifest.tiles {
        let input = manifest.base_dir.join(entry.path());
        let format = entry.format();
        let output = output_dir.join(format!("{}.{}", name, format.extension()));
        tracing::info!("Converting tile: {} -> {:?}", name, output);

        let options = entry.export_options(&manifest.base_dir)?;
        match format {
            TileFormat::B3dm => export_b3dm(&input, &output, &options)?,
            TileFormat::Glb => export_glb(&input, &output, &options)?,
        }
        written.push(output);
    }

    Ok(written)
}
