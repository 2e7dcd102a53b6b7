//! Assignment of edges and vertices to worker ranks.

use std::collections::BTreeSet;

use hf_core::{EdgeId, Rank, VertexId};
use hf_graph::GraphStorage;

use crate::error::{PartitionError, PartitionResult};

/// Ownership metadata of a finalized graph.
///
/// Every edge and vertex has exactly one owner. A vertex is owned by the
/// owner of its smallest incident edge. Each rank resolves every vertex
/// touching one of its edges (its *active* vertices) and therefore needs
/// the boundary values of every edge around those vertices (its *active*
/// edges: owned plus ghosts).
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    worker_count: usize,
    edge_owner: Vec<Rank>,
    vertex_owner: Vec<Rank>,
    owned_edges: Vec<Vec<EdgeId>>,
    active_vertices: Vec<Vec<VertexId>>,
    active_edges: Vec<Vec<EdgeId>>,
}

impl Partition {
    /// Build a partition from an explicit edge-to-rank assignment.
    pub fn from_assignment(
        graph: &GraphStorage,
        worker_count: usize,
        edge_owner: Vec<Rank>,
    ) -> PartitionResult<Self> {
        graph.ensure_finalized()?;
        if worker_count == 0 {
            return Err(PartitionError::NoWorkers);
        }
        if edge_owner.len() != graph.num_edges() {
            return Err(PartitionError::AssignmentLength {
                expected: graph.num_edges(),
                got: edge_owner.len(),
            });
        }
        if let Some((slot, &rank)) = edge_owner
            .iter()
            .enumerate()
            .find(|&(_, &rank)| rank >= worker_count)
        {
            return Err(PartitionError::RankOutOfRange {
                edge: EdgeId::from_slot(slot),
                rank,
                worker_count,
            });
        }

        // finalized graphs have no isolated vertices
        let vertex_owner: Vec<Rank> = graph
            .vertices()
            .iter()
            .map(|v| {
                let canonical = v.edge_neighbors().iter().min().copied();
                canonical.map_or(0, |e| edge_owner[e.slot()])
            })
            .collect();

        let mut owned_edges = vec![Vec::new(); worker_count];
        for edge in graph.edge_ids() {
            owned_edges[edge_owner[edge.slot()]].push(edge);
        }

        let mut active_vertices = Vec::with_capacity(worker_count);
        let mut active_edges = Vec::with_capacity(worker_count);
        for owned in &owned_edges {
            let mut vertices = BTreeSet::new();
            for &e in owned {
                vertices.extend(graph.edge(e)?.vertices());
            }
            let mut edges: BTreeSet<EdgeId> = owned.iter().copied().collect();
            for &v in &vertices {
                edges.extend(graph.vertex(v)?.edge_neighbors().iter().copied());
            }
            active_vertices.push(vertices.into_iter().collect());
            active_edges.push(edges.into_iter().collect());
        }

        Ok(Self {
            worker_count,
            edge_owner,
            vertex_owner,
            owned_edges,
            active_vertices,
            active_edges,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn edge_owner(&self, edge: EdgeId) -> Rank {
        self.edge_owner[edge.slot()]
    }

    pub fn vertex_owner(&self, vertex: VertexId) -> Rank {
        self.vertex_owner[vertex.slot()]
    }

    pub fn owns_edge(&self, rank: Rank, edge: EdgeId) -> bool {
        self.edge_owner(edge) == rank
    }

    /// Edges owned by `rank`, sorted by id.
    pub fn owned_edge_ids(&self, rank: Rank) -> &[EdgeId] {
        &self.owned_edges[rank]
    }

    /// Vertices owned by `rank`, sorted by id.
    pub fn owned_vertex_ids(&self, rank: Rank) -> Vec<VertexId> {
        self.vertex_owner
            .iter()
            .enumerate()
            .filter(|&(_, &owner)| owner == rank)
            .map(|(slot, _)| VertexId::from_slot(slot))
            .collect()
    }

    /// Vertices incident to an edge owned by `rank`, sorted by id.
    pub fn active_vertex_ids(&self, rank: Rank) -> &[VertexId] {
        &self.active_vertices[rank]
    }

    /// Owned edges plus every edge incident to an active vertex, sorted by id.
    pub fn active_edge_ids(&self, rank: Rank) -> &[EdgeId] {
        &self.active_edges[rank]
    }

    /// Active edges owned by another rank.
    pub fn ghost_edge_ids(&self, rank: Rank) -> impl Iterator<Item = EdgeId> + '_ {
        self.active_edges[rank]
            .iter()
            .copied()
            .filter(move |&e| self.edge_owner(e) != rank)
    }
}

/// Split the edges into contiguous, balanced id ranges.
pub fn naive_partition(graph: &GraphStorage, worker_count: usize) -> PartitionResult<Partition> {
    if worker_count == 0 {
        return Err(PartitionError::NoWorkers);
    }
    let num_edges = graph.num_edges();
    let edge_owner = (0..num_edges)
        .map(|slot| slot * worker_count / num_edges.max(1))
        .collect();
    let partition = Partition::from_assignment(graph, worker_count, edge_owner)?;
    tracing::debug!(
        worker_count,
        num_edges,
        "partitioned network into contiguous edge ranges"
    );
    Ok(partition)
}
