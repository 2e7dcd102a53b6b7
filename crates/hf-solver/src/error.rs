//! Error types for flux evaluation.

use hf_core::{EdgeId, VertexId};
use hf_graph::GraphError;
use hf_partition::{CommError, PartitionError};
use thiserror::Error;

/// Errors that can occur while evaluating fluxes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Flux cache was built for t={cached:?}, requested t={requested}")]
    StaleFluxCache { requested: f64, cached: Option<f64> },

    #[error("Size mismatch for {what}: expected {expected}, got {got}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Edge {edge} is not active on rank {rank}")]
    InactiveEdge { edge: EdgeId, rank: usize },

    #[error("Vertex {vertex} is not active on rank {rank}")]
    InactiveVertex { vertex: VertexId, rank: usize },

    #[error("Vertex {vertex} is not a leaf")]
    NotALeaf { vertex: VertexId },

    #[error("Vertex {vertex} has no lumped state")]
    MissingTipState { vertex: VertexId },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Partition error: {0}")]
    Partition(#[from] PartitionError),

    #[error("Communication error: {0}")]
    Comm(#[from] CommError),
}

pub type SolverResult<T> = Result<T, SolverError>;
