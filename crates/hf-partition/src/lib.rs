//! Ownership of the vessel network across cooperating workers.
//!
//! This crate provides:
//! - `Partition`: which rank owns which edge and vertex, plus the active
//!   (owned + ghost) sets each rank works on
//! - `DofMap`: the global numbering of unknowns, independent of ownership
//! - `Communicator`: blocking collectives between ranks, with a
//!   single-worker and an in-process thread-group implementation
//! - `EdgeBoundaryCommunicator`: the ghost-layer exchange of macro-edge
//!   boundary values

pub mod comm;
pub mod dof_map;
pub mod error;
pub mod ghost;
pub mod partition;

pub use comm::{Communicator, LocalCommunicator, ThreadCommunicator};
pub use dof_map::{DofMap, LocalEdgeDofMap, LocalVertexDofMap};
pub use error::{CommError, CommResult, PartitionError, PartitionResult};
pub use ghost::EdgeBoundaryCommunicator;
pub use partition::{Partition, naive_partition};
