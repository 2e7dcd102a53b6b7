//! Blocking collectives between worker ranks.

use std::sync::mpsc::{Receiver, Sender, channel};

use hf_core::Rank;

use crate::error::{CommError, CommResult};

/// Group of cooperating ranks.
///
/// Every collective must be entered by all ranks of the group; a rank
/// blocks until the data of all its peers has arrived.
pub trait Communicator: Send {
    fn rank(&self) -> Rank;

    fn size(&self) -> usize;

    /// Send `outgoing[r]` to every rank `r` and return what every rank sent
    /// to this one, indexed by source rank. The entry for this rank is its
    /// own outgoing buffer.
    fn exchange(&self, outgoing: Vec<Vec<f64>>) -> CommResult<Vec<Vec<f64>>>;

    /// Send the same buffer to every rank.
    fn all_gather(&self, local: Vec<f64>) -> CommResult<Vec<Vec<f64>>> {
        let outgoing = vec![local; self.size()];
        self.exchange(outgoing)
    }

    /// Element-wise sum of equally sized buffers across all ranks.
    fn all_reduce_sum(&self, local: Vec<f64>) -> CommResult<Vec<f64>> {
        let len = local.len();
        let gathered = self.all_gather(local)?;
        let mut sum = vec![0.0; len];
        for (from, values) in gathered.into_iter().enumerate() {
            if values.len() != len {
                return Err(CommError::SizeMismatch {
                    from,
                    expected: len,
                    got: values.len(),
                });
            }
            for (s, v) in sum.iter_mut().zip(values) {
                *s += v;
            }
        }
        Ok(sum)
    }
}

fn check_outgoing(outgoing: &[Vec<f64>], size: usize) -> CommResult<()> {
    if outgoing.len() != size {
        return Err(CommError::OutgoingCount {
            expected: size,
            got: outgoing.len(),
        });
    }
    Ok(())
}

/// A group of exactly one rank.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCommunicator;

impl Communicator for LocalCommunicator {
    fn rank(&self) -> Rank {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn exchange(&self, outgoing: Vec<Vec<f64>>) -> CommResult<Vec<Vec<f64>>> {
        check_outgoing(&outgoing, 1)?;
        Ok(outgoing)
    }
}

/// One rank of an in-process group whose ranks run on separate threads.
///
/// Each ordered pair of ranks has its own channel, so messages between two
/// ranks arrive in the order they were sent even when one rank runs ahead
/// by a whole collective.
pub struct ThreadCommunicator {
    rank: Rank,
    size: usize,
    senders: Vec<Option<Sender<Vec<f64>>>>,
    receivers: Vec<Option<Receiver<Vec<f64>>>>,
}

impl ThreadCommunicator {
    /// Create the communicators of a group of `size` ranks, one per thread.
    pub fn group(size: usize) -> Vec<ThreadCommunicator> {
        let mut senders: Vec<Vec<Option<Sender<Vec<f64>>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut receivers: Vec<Vec<Option<Receiver<Vec<f64>>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for from in 0..size {
            for to in 0..size {
                if from != to {
                    let (tx, rx) = channel();
                    senders[from][to] = Some(tx);
                    receivers[to][from] = Some(rx);
                }
            }
        }

        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (senders, receivers))| ThreadCommunicator {
                rank,
                size,
                senders,
                receivers,
            })
            .collect()
    }
}

impl Communicator for ThreadCommunicator {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn exchange(&self, outgoing: Vec<Vec<f64>>) -> CommResult<Vec<Vec<f64>>> {
        check_outgoing(&outgoing, self.size)?;

        let mut own = Vec::new();
        for (to, buffer) in outgoing.into_iter().enumerate() {
            match &self.senders[to] {
                Some(tx) => tx
                    .send(buffer)
                    .map_err(|_| CommError::Disconnected { peer: to })?,
                None => own = buffer,
            }
        }

        let mut incoming = Vec::with_capacity(self.size);
        for from in 0..self.size {
            match &self.receivers[from] {
                Some(rx) => incoming.push(
                    rx.recv()
                        .map_err(|_| CommError::Disconnected { peer: from })?,
                ),
                None => incoming.push(std::mem::take(&mut own)),
            }
        }
        Ok(incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn local_exchange_returns_own_buffer() {
        let comm = LocalCommunicator;
        let incoming = comm.exchange(vec![vec![1.0, 2.0]]).unwrap();
        assert_eq!(incoming, vec![vec![1.0, 2.0]]);
        assert!(matches!(
            comm.exchange(vec![vec![], vec![]]),
            Err(CommError::OutgoingCount { .. })
        ));
    }

    #[test]
    fn thread_group_exchanges_in_order() {
        let group = ThreadCommunicator::group(3);
        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = group
                .into_iter()
                .map(|comm| {
                    s.spawn(move || {
                        let mut rounds = Vec::new();
                        for round in 0..3 {
                            let outgoing = (0..comm.size())
                                .map(|to| vec![(10 * comm.rank() + to) as f64 + 100.0 * round as f64])
                                .collect();
                            rounds.push(comm.exchange(outgoing).unwrap());
                        }
                        (comm.rank(), rounds)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (rank, rounds) in results {
            for (round, incoming) in rounds.into_iter().enumerate() {
                for (from, values) in incoming.into_iter().enumerate() {
                    assert_eq!(values, vec![(10 * from + rank) as f64 + 100.0 * round as f64]);
                }
            }
        }
    }

    #[test]
    fn all_reduce_sums_across_ranks() {
        let group = ThreadCommunicator::group(2);
        let sums: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = group
                .into_iter()
                .map(|comm| s.spawn(move || comm.all_reduce_sum(vec![1.0, comm.rank() as f64]).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(sums, vec![vec![2.0, 1.0], vec![2.0, 1.0]]);
    }
}
