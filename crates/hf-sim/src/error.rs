//! Error types for simulation operations.

use hf_core::VertexId;
use hf_graph::GraphError;
use hf_partition::{CommError, PartitionError};
use hf_solver::SolverError;
use thiserror::Error;

/// Errors encountered during transient simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Vertex {vertex} is not a Windkessel or vessel-tree tip owned by this rank")]
    NotATip { vertex: VertexId },

    #[error("Tip pressure map has {got} entries, this rank owns {expected} tips")]
    TipCount { expected: usize, got: usize },

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Partition error: {0}")]
    Partition(#[from] PartitionError),

    #[error("Communication error: {0}")]
    Comm(#[from] CommError),
}

pub type SimResult<T> = Result<T, SimError>;
