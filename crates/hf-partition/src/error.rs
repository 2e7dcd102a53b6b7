//! Error types for partitioning, numbering and communication.

use hf_core::{EdgeId, HfError, Rank};
use hf_graph::GraphError;
use thiserror::Error;

pub type PartitionResult<T> = Result<T, PartitionError>;
pub type CommResult<T> = Result<T, CommError>;

/// Errors raised while distributing the network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PartitionError {
    #[error("Partition needs at least one worker")]
    NoWorkers,

    #[error("Edge assignment covers {got} edges, graph has {expected}")]
    AssignmentLength { expected: usize, got: usize },

    #[error("Edge {edge} assigned to rank {rank}, but there are only {worker_count} workers")]
    RankOutOfRange {
        edge: EdgeId,
        rank: Rank,
        worker_count: usize,
    },

    #[error("Degree must be at most {max}, got {degree}")]
    DegreeTooHigh { degree: usize, max: usize },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Core(#[from] HfError),
}

/// Errors of the blocking collectives between ranks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommError {
    #[error("Expected one outgoing buffer per rank ({expected}), got {got}")]
    OutgoingCount { expected: usize, got: usize },

    #[error("Rank {peer} disconnected during exchange")]
    Disconnected { peer: Rank },

    #[error("Rank {from} sent {got} values, expected {expected}")]
    SizeMismatch {
        from: Rank,
        expected: usize,
        got: usize,
    },

    #[error("Buffer of {len} values is too short for edge {edge} with stride {stride}")]
    BufferTooShort {
        edge: EdgeId,
        stride: usize,
        len: usize,
    },
}
