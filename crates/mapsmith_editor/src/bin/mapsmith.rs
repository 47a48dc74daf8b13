//! Command line front end for mapsmith projects
//!
//! Run with: mapsmith export my_project.json --format json

use clap::{Parser, Subcommand};
use mapsmith_core::ItemType;
use mapsmith_editor::{load_project, EditorConfig, EditorSession, ProjectError};
use mapsmith_export::{ExportError, ExportFormat, FileImageSizes};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mapsmith")]
#[command(version, about, long_about = None)]
struct Args {
    /// Editor config file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export every map of a project
    Export {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Output directory (overrides the configured one)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Output format: lua or json
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Grid cells per chunk side
        #[arg(long, value_name = "N")]
        chunk_size: Option<u32>,
    },
    /// List the maps and layers of a project
    Info {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Config(#[from] mapsmith_editor::ConfigError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::load_or_default(),
    };

    match args.command {
        Command::Export {
            project,
            out,
            format,
            chunk_size,
        } => {
            if let Some(out) = out {
                config.export.directory = out;
            }
            if let Some(format) = format {
                config.export.format = format;
            }
            if let Some(chunk_size) = chunk_size {
                config.export.chunk_size = chunk_size;
            }
            export(&project, config)
        }
        Command::Info { project } => info(&project),
    }
}

fn project_root(project: &Path) -> PathBuf {
    project
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn export(project: &Path, config: EditorConfig) -> Result<(), CliError> {
    let document = load_project(project)?;
    let root = project_root(project);
    let session = EditorSession::new(document, config);
    let resolver = FileImageSizes::new(root.clone());
    for path in session.export(&root, &resolver)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn info(project: &Path) -> Result<(), CliError> {
    let document = load_project(project)?;
    println!("project: {}", document.project.name);
    for item in document.sidebar.of_type(ItemType::Map) {
        let Some(map) = document.canvas.map(item.id) else {
            continue;
        };
        println!(
            "map {}: {} tiles, {} nodes",
            item.name,
            map.tile_count(),
            map.node_count()
        );
        for (layer, settings) in document.sidebar.layers_by_z() {
            if !map.has_layer(layer.id) {
                continue;
            }
            println!(
                "  layer {} (z {}): {} tiles, {} nodes",
                layer.name,
                settings.z,
                map.tiles_on(layer.id).len(),
                map.nodes_on(layer.id).len()
            );
        }
    }
    Ok(())
}
