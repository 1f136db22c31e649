//! tile-export - 3D tile export tool
//!
//! Packages glTF assets (.gltf, .glb) into binary glTF and
//! Batched 3D Model (.b3dm) tiles with per-mesh batch ids.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tile_export::{export, manifest, ExportOptions};

#[derive(Parser)]
#[command(name = "tile-export")]
#[command(about = "3D tile export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build tiles from a manifest file
    Build {
        /// Path to tiles.toml manifest
        #[arg(default_value = "tiles.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to tiles.toml manifest
        #[arg(default_value = "tiles.toml")]
        manifest: PathBuf,
    },

    /// Package a single glTF file as GLB
    Glb {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output .glb file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not add _BATCHID attributes
        #[arg(long)]
        no_batch_ids: bool,
    },

    /// Package a single glTF file as a b3dm tile
    B3dm {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output .b3dm file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not add _BATCHID attributes
        #[arg(long)]
        no_batch_ids: bool,

        /// Feature table JSON file (default: BATCH_LENGTH from the mesh count)
        #[arg(long)]
        feature_table: Option<PathBuf>,

        /// Batch table JSON file
        #[arg(long)]
        batch_table: Option<PathBuf>,

        /// Write mesh names as the batch table when none is given
        #[arg(long)]
        mesh_names: bool,
    },

    /// Print the headers of a .glb or .b3dm file
    Info {
        /// Input file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { manifest, output } => {
            tracing::info!("Building tiles from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            let written = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} tiles written", written.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Glb {
            input,
            output,
            no_batch_ids,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("glb"));
            if output == input {
                anyhow::bail!("Output would overwrite input: {:?}", input);
            }
            tracing::info!("Converting {:?} -> {:?}", input, output);
            let options = ExportOptions {
                batch_ids: !no_batch_ids,
                ..Default::default()
            };
            export::export_glb(&input, &output, &options)?;
            tracing::info!("Done!");
        }

        Commands::B3dm {
            input,
            output,
            no_batch_ids,
            feature_table,
            batch_table,
            mesh_names,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("b3dm"));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            let options = ExportOptions {
                batch_ids: !no_batch_ids,
                feature_table: feature_table
                    .as_deref()
                    .map(export::read_json_file)
                    .transpose()?,
                batch_table: batch_table
                    .as_deref()
                    .map(export::read_json_file)
                    .transpose()?,
                mesh_names,
            };
            export::export_b3dm(&input, &output, &options)?;
            tracing::info!("Done!");
        }

        Commands::Info { input } => {
            export::print_info(&input)?;
        }
    }

    Ok(())
}
