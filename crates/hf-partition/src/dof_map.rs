//! Global numbering of the discrete unknowns.
//!
//! The numbering is a pure function of the graph: edges in id order, their
//! micro-edges in order, and inside a micro-edge one block of
//! `degree + 1` coefficients per variable. Vertex blocks for lumped tip
//! states follow after all edges, in vertex id order. Ownership never
//! influences an index.

use std::ops::Range;

use hf_core::{EdgeId, HfError, VertexId};
use hf_graph::GraphStorage;

use crate::error::{PartitionError, PartitionResult};

/// Highest supported polynomial degree of the edge basis.
pub const MAX_DEGREE: usize = 8;

/// Index block of one macro-edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalEdgeDofMap {
    first: usize,
    num_micro_edges: usize,
    num_components: usize,
    num_basis_functions: usize,
}

impl LocalEdgeDofMap {
    pub fn num_micro_edges(&self) -> usize {
        self.num_micro_edges
    }

    pub fn num_micro_vertices(&self) -> usize {
        self.num_micro_edges + 1
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    pub fn num_basis_functions(&self) -> usize {
        self.num_basis_functions
    }

    pub fn num_local_dof(&self) -> usize {
        self.num_micro_edges * self.num_components * self.num_basis_functions
    }

    /// Global index of one coefficient.
    pub fn dof_index(&self, micro_edge: usize, component: usize, basis: usize) -> usize {
        debug_assert!(micro_edge < self.num_micro_edges);
        debug_assert!(component < self.num_components);
        debug_assert!(basis < self.num_basis_functions);
        self.first
            + (micro_edge * self.num_components + component) * self.num_basis_functions
            + basis
    }

    /// Global indices of all coefficients of one variable on one micro-edge.
    pub fn dof_indices(&self, micro_edge: usize, component: usize) -> Range<usize> {
        let start = self.dof_index(micro_edge, component, 0);
        start..start + self.num_basis_functions
    }

    /// The whole block of the macro-edge.
    pub fn range(&self) -> Range<usize> {
        self.first..self.first + self.num_local_dof()
    }
}

/// Index block of the lumped state at a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalVertexDofMap {
    first: usize,
    count: usize,
}

impl LocalVertexDofMap {
    pub fn num_local_dof(&self) -> usize {
        self.count
    }

    pub fn dof_indices(&self) -> Range<usize> {
        self.first..self.first + self.count
    }
}

/// Global DOF map of a network.
#[derive(Debug, Clone, PartialEq)]
pub struct DofMap {
    edges: Vec<LocalEdgeDofMap>,
    vertices: Vec<LocalVertexDofMap>,
    num_dof: usize,
    degree: usize,
}

impl DofMap {
    /// Number all unknowns of a finalized graph.
    pub fn create(
        graph: &GraphStorage,
        variables_per_point: usize,
        polynomial_degree: usize,
    ) -> PartitionResult<Self> {
        graph.ensure_finalized()?;
        if polynomial_degree > MAX_DEGREE {
            return Err(PartitionError::DegreeTooHigh {
                degree: polynomial_degree,
                max: MAX_DEGREE,
            });
        }
        if variables_per_point == 0 {
            return Err(HfError::InvalidArg {
                what: "variables_per_point must be positive",
            }
            .into());
        }

        let num_basis_functions = polynomial_degree + 1;
        let mut next = 0;

        let edges = graph
            .edges()
            .iter()
            .map(|edge| {
                let map = LocalEdgeDofMap {
                    first: next,
                    num_micro_edges: edge.num_micro_edges(),
                    num_components: variables_per_point,
                    num_basis_functions,
                };
                next += map.num_local_dof();
                map
            })
            .collect();

        let vertices = graph
            .vertices()
            .iter()
            .map(|vertex| {
                let count = vertex.boundary().map_or(0, |bc| bc.num_state_dofs());
                let map = LocalVertexDofMap { first: next, count };
                next += count;
                map
            })
            .collect();

        tracing::debug!(num_dof = next, degree = polynomial_degree, "created dof map");

        Ok(Self {
            edges,
            vertices,
            num_dof: next,
            degree: polynomial_degree,
        })
    }

    pub fn num_dof(&self) -> usize {
        self.num_dof
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn edge(&self, id: EdgeId) -> PartitionResult<&LocalEdgeDofMap> {
        self.edges.get(id.slot()).ok_or_else(|| {
            HfError::IndexOob {
                what: "edge dof map",
                index: id.slot(),
                len: self.edges.len(),
            }
            .into()
        })
    }

    pub fn vertex(&self, id: VertexId) -> PartitionResult<&LocalVertexDofMap> {
        self.vertices.get(id.slot()).ok_or_else(|| {
            HfError::IndexOob {
                what: "vertex dof map",
                index: id.slot(),
                len: self.vertices.len(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_graph::{BoundaryCondition, InflowWaveform, PhysicalData, WindkesselParameters};

    fn graph() -> GraphStorage {
        let mut g = GraphStorage::new();
        let v0 = g.create_vertex().unwrap();
        let v1 = g.create_vertex().unwrap();
        let v2 = g.create_vertex().unwrap();
        let data = PhysicalData::set_from_data(4e5, 0.067, 1.028e-3, 9.0, 0.4, 10.0).unwrap();
        let e0 = g.connect(v0, v1, 3).unwrap();
        let e1 = g.connect(v1, v2, 2).unwrap();
        g.attach_physical_data(e0, data).unwrap();
        g.attach_physical_data(e1, data).unwrap();
        g.set_boundary(v0, BoundaryCondition::Inflow(InflowWaveform::Constant { value: 1.0 }))
            .unwrap();
        g.set_boundary(
            v2,
            BoundaryCondition::Windkessel(WindkesselParameters {
                peripheral_resistance: 10.0,
                capacitance: 1e-3,
                venous_pressure: 0.0,
            }),
        )
        .unwrap();
        g.finalize_boundary_conditions().unwrap();
        g
    }

    #[test]
    fn blocks_are_contiguous_and_disjoint() {
        let g = graph();
        let dofs = DofMap::create(&g, 2, 2).unwrap();

        let e0 = dofs.edge(EdgeId::from_index(0)).unwrap();
        let e1 = dofs.edge(EdgeId::from_index(1)).unwrap();
        assert_eq!(e0.range(), 0..18);
        assert_eq!(e1.range(), 18..30);
        assert_eq!(e0.dof_indices(1, 1), 9..12);
        assert_eq!(e1.dof_index(0, 0, 0), 18);

        let wk = dofs.vertex(VertexId::from_index(2)).unwrap();
        assert_eq!(wk.dof_indices(), 30..31);
        assert_eq!(dofs.vertex(VertexId::from_index(1)).unwrap().num_local_dof(), 0);
        assert_eq!(dofs.num_dof(), 31);
    }

    #[test]
    fn rejects_unknown_ids_and_bad_degree() {
        let g = graph();
        let dofs = DofMap::create(&g, 2, 1).unwrap();
        assert!(matches!(
            dofs.edge(EdgeId::from_index(7)),
            Err(PartitionError::Core(HfError::IndexOob { .. }))
        ));
        assert!(matches!(
            DofMap::create(&g, 2, 99),
            Err(PartitionError::DegreeTooHigh { .. })
        ));
    }
}
