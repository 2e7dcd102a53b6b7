//! hf-project: network, boundary and run files, their validation and the
//! conversion into a vessel network.

pub mod build;
pub mod schema;
pub mod validate;

use std::path::Path;

pub use build::{apply_boundaries, assemble, build_graph};
pub use schema::*;
pub use validate::{ValidationError, validate_boundaries, validate_network, validate_run_config};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Graph error: {0}")]
    Graph(#[from] hf_graph::GraphError),

    #[error("Unknown file format: {path} (expected .json, .yaml or .yml)")]
    UnknownFormat { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

enum Format {
    Json,
    Yaml,
}

fn format_of(path: &Path) -> ProjectResult<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("yaml" | "yml") => Ok(Format::Yaml),
        _ => Err(ProjectError::UnknownFormat {
            path: path.display().to_string(),
        }),
    }
}

fn read<T: serde::de::DeserializeOwned>(path: &Path) -> ProjectResult<T> {
    let format = format_of(path)?;
    let content = std::fs::read_to_string(path)?;
    Ok(match format {
        Format::Json => serde_json::from_str(&content)?,
        Format::Yaml => serde_yaml::from_str(&content)?,
    })
}

fn write<T: serde::Serialize>(path: &Path, value: &T) -> ProjectResult<()> {
    let content = match format_of(path)? {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}

/// Read and validate a network file, JSON or YAML by extension.
pub fn load_network(path: &Path) -> ProjectResult<NetworkDef> {
    let network: NetworkDef = read(path)?;
    validate_network(&network)?;
    Ok(network)
}

pub fn save_network(path: &Path, network: &NetworkDef) -> ProjectResult<()> {
    validate_network(network)?;
    write(path, network)
}

/// Read a boundary file. It is validated against its network when applied.
pub fn load_boundaries(path: &Path) -> ProjectResult<BoundaryDocument> {
    read(path)
}

pub fn save_boundaries(path: &Path, boundaries: &BoundaryDocument) -> ProjectResult<()> {
    write(path, boundaries)
}

/// Read and validate a run file. Relative mesh and boundary paths are taken
/// relative to the run file.
pub fn load_run_config(path: &Path) -> ProjectResult<RunConfig> {
    let mut run: RunConfig = read(path)?;
    validate_run_config(&run)?;
    if let Some(base) = path.parent() {
        if run.mesh_file.is_relative() {
            run.mesh_file = base.join(&run.mesh_file);
        }
        if let Some(boundary) = run.boundary_file.as_mut().filter(|p| p.is_relative()) {
            *boundary = base.join(&*boundary);
        }
    }
    Ok(run)
}
