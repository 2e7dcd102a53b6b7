//! Graph-specific error types.

use hf_core::{EdgeId, HfError, VertexId};
use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction and boundary classification errors.
///
/// All of these are configuration errors: they are raised eagerly while the
/// network is assembled and never defaulted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Vertex {vertex} does not exist")]
    UnknownVertex { vertex: VertexId },

    #[error("Edge {edge} does not exist")]
    UnknownEdge { edge: EdgeId },

    #[error("Edge from vertex {vertex} to itself is not allowed")]
    SelfLoop { vertex: VertexId },

    #[error("Edge between {from} and {to} needs at least one micro-edge")]
    NoMicroEdges { from: VertexId, to: VertexId },

    #[error("Graph is finalized, cannot {what}")]
    Finalized { what: &'static str },

    #[error("Graph boundary conditions have not been finalized")]
    NotFinalized,

    #[error("Physical data already attached to edge {edge}")]
    PhysicalDataAlreadySet { edge: EdgeId },

    #[error("Embedding already attached to edge {edge}")]
    EmbeddingAlreadySet { edge: EdgeId },

    #[error("Edge {edge} has no physical data")]
    MissingPhysicalData { edge: EdgeId },

    #[error("Leaf vertex {vertex} ('{name}') has no boundary condition")]
    MissingBoundary { vertex: VertexId, name: String },

    #[error("Vertex {vertex} ('{name}') has {degree} incident edges but a boundary condition")]
    BoundaryOnInnerVertex {
        vertex: VertexId,
        name: String,
        degree: usize,
    },

    #[error("Vertex {vertex} ('{name}') has no incident edges")]
    IsolatedVertex { vertex: VertexId, name: String },

    #[error("Invalid boundary condition on vertex {vertex}: {what}")]
    InvalidBoundary { vertex: VertexId, what: String },

    #[error("Invalid embedding on edge {edge}: {what}")]
    InvalidEmbedding { edge: EdgeId, what: &'static str },

    #[error("Vertex name '{name}' not found")]
    NameNotFound { name: String },

    #[error(transparent)]
    Core(#[from] HfError),
}
