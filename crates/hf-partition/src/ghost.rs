//! Ghost-layer exchange of per-edge boundary values.

use hf_core::{EdgeId, Rank};

use crate::comm::Communicator;
use crate::error::{CommError, CommResult};
use crate::partition::Partition;

/// Precomputed send/receive lists of the ghost exchange for one rank.
///
/// Both sides of every rank pair derive their lists from the same
/// partition, so a buffer is interpreted identically on both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeBoundaryCommunicator {
    rank: Rank,
    send_lists: Vec<Vec<EdgeId>>,
    recv_lists: Vec<Vec<EdgeId>>,
}

impl EdgeBoundaryCommunicator {
    pub fn new(partition: &Partition, rank: Rank) -> Self {
        let size = partition.worker_count();
        let mut send_lists = vec![Vec::new(); size];
        let mut recv_lists = vec![Vec::new(); size];

        for peer in (0..size).filter(|&peer| peer != rank) {
            send_lists[peer] = partition
                .ghost_edge_ids(peer)
                .filter(|&e| partition.edge_owner(e) == rank)
                .collect();
        }
        for e in partition.ghost_edge_ids(rank) {
            recv_lists[partition.edge_owner(e)].push(e);
        }

        Self {
            rank,
            send_lists,
            recv_lists,
        }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Edges whose values this rank sends to `peer`.
    pub fn send_list(&self, peer: Rank) -> &[EdgeId] {
        &self.send_lists[peer]
    }

    /// Edges whose values this rank receives from `peer`.
    pub fn recv_list(&self, peer: Rank) -> &[EdgeId] {
        &self.recv_lists[peer]
    }

    /// Overwrite the ghost entries of `values` with the owners' entries.
    ///
    /// Edge `e` occupies `values[stride * e .. stride * (e + 1)]`. Blocks
    /// until every rank of the group has entered the exchange.
    pub fn update_ghost_layer(
        &self,
        comm: &dyn Communicator,
        values: &mut [f64],
        stride: usize,
    ) -> CommResult<()> {
        let len = values.len();
        let block = |e: EdgeId| {
            let start = stride * e.slot();
            if start + stride > len {
                Err(CommError::BufferTooShort {
                    edge: e,
                    stride,
                    len,
                })
            } else {
                Ok(start..start + stride)
            }
        };

        let mut outgoing = Vec::with_capacity(self.send_lists.len());
        for list in &self.send_lists {
            let mut buffer = Vec::with_capacity(list.len() * stride);
            for &e in list {
                buffer.extend_from_slice(&values[block(e)?]);
            }
            outgoing.push(buffer);
        }

        let incoming = comm.exchange(outgoing)?;

        for (from, buffer) in incoming.into_iter().enumerate() {
            if from == self.rank {
                continue;
            }
            let list = &self.recv_lists[from];
            if buffer.len() != list.len() * stride {
                return Err(CommError::SizeMismatch {
                    from,
                    expected: list.len() * stride,
                    got: buffer.len(),
                });
            }
            for (&e, chunk) in list.iter().zip(buffer.chunks_exact(stride.max(1))) {
                let range = block(e)?;
                values[range].copy_from_slice(chunk);
            }
        }
        Ok(())
    }
}
