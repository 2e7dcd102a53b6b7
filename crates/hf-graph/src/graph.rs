//! Arena storage for the vessel network.

use hf_core::{EdgeId, VertexId};

use crate::boundary::{BoundaryCondition, VertexKind};
use crate::error::{GraphError, GraphResult};
use crate::physical::PhysicalData;
use crate::validate;

/// Point of an edge embedding in 3D space.
pub type Point = [f64; 3];

/// A vertex of the vessel network.
///
/// Vertices reference their incident edges by id only; the arena owns
/// everything.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub(crate) id: VertexId,
    pub(crate) name: String,
    pub(crate) edge_neighbors: Vec<EdgeId>,
    pub(crate) kind: Option<VertexKind>,
}

impl Vertex {
    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Incident edges in the order they were connected.
    pub fn edge_neighbors(&self) -> &[EdgeId] {
        &self.edge_neighbors
    }

    pub fn degree(&self) -> usize {
        self.edge_neighbors.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.edge_neighbors.len() == 1
    }

    /// Classification; `None` only for inner vertices of an unfinalized graph.
    pub fn kind(&self) -> Option<&VertexKind> {
        self.kind.as_ref()
    }

    pub fn boundary(&self) -> Option<&BoundaryCondition> {
        match &self.kind {
            Some(VertexKind::Boundary(bc)) => Some(bc),
            _ => None,
        }
    }

    /// Junction of two or more vessels, resolved by the n-furcation solver.
    pub fn is_inner(&self) -> bool {
        matches!(self.kind, Some(VertexKind::Inner))
    }

    /// Junction of three or more vessels.
    pub fn is_bifurcation(&self) -> bool {
        self.is_inner() && self.degree() >= 3
    }

    pub fn is_inflow(&self) -> bool {
        matches!(self.boundary(), Some(BoundaryCondition::Inflow(_)))
    }

    pub fn is_free_outflow(&self) -> bool {
        matches!(self.boundary(), Some(BoundaryCondition::FreeOutflow(_)))
    }

    pub fn is_windkessel_outflow(&self) -> bool {
        matches!(self.boundary(), Some(BoundaryCondition::Windkessel(_)))
    }

    pub fn is_vessel_tree_outflow(&self) -> bool {
        matches!(self.boundary(), Some(BoundaryCondition::VesselTree(_)))
    }

    pub fn is_nonlinear_characteristic(&self) -> bool {
        matches!(self.boundary(), Some(BoundaryCondition::Characteristic(_)))
    }

    /// Tip with lumped pressure state exchanged with external solvers.
    pub fn is_vessel_tip(&self) -> bool {
        self.is_windkessel_outflow() || self.is_vessel_tree_outflow()
    }
}

/// A macro-edge: one vessel between two vertices, split into micro-edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) name: String,
    pub(crate) vertices: [VertexId; 2],
    pub(crate) num_micro_edges: usize,
    pub(crate) physical_data: Option<PhysicalData>,
    pub(crate) embedding: Option<Vec<Point>>,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoints `[from, to]`; the order defines the orientation.
    pub fn vertices(&self) -> [VertexId; 2] {
        self.vertices
    }

    pub fn left_vertex(&self) -> VertexId {
        self.vertices[0]
    }

    pub fn right_vertex(&self) -> VertexId {
        self.vertices[1]
    }

    /// Whether the edge ends in (points to) the given vertex.
    pub fn is_pointing_to(&self, vertex: VertexId) -> bool {
        self.vertices[1] == vertex
    }

    pub fn num_micro_edges(&self) -> usize {
        self.num_micro_edges
    }

    pub fn has_physical_data(&self) -> bool {
        self.physical_data.is_some()
    }

    pub fn physical_data(&self) -> GraphResult<&PhysicalData> {
        self.physical_data
            .as_ref()
            .ok_or(GraphError::MissingPhysicalData { edge: self.id })
    }

    pub fn embedding(&self) -> Option<&[Point]> {
        self.embedding.as_deref()
    }
}

/// Owner of all vertices and edges of a network.
///
/// Topology and boundary data may be changed until
/// [`GraphStorage::finalize_boundary_conditions`] succeeds; afterwards the
/// graph is read-only for the solver.
#[derive(Debug, Clone, Default)]
pub struct GraphStorage {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    finalized: bool,
}

impl GraphStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unnamed vertex; it is named after its id.
    pub fn create_vertex(&mut self) -> GraphResult<VertexId> {
        let name = format!("v{}", self.vertices.len());
        self.create_named_vertex(name)
    }

    pub fn create_named_vertex(&mut self, name: impl Into<String>) -> GraphResult<VertexId> {
        if self.finalized {
            return Err(GraphError::Finalized {
                what: "create vertices",
            });
        }
        let id = VertexId::from_slot(self.vertices.len());
        self.vertices.push(Vertex {
            id,
            name: name.into(),
            edge_neighbors: Vec::new(),
            kind: None,
        });
        Ok(id)
    }

    /// Connect two vertices with a new macro-edge pointing from `from` to `to`.
    pub fn connect(
        &mut self,
        from: VertexId,
        to: VertexId,
        num_micro_edges: usize,
    ) -> GraphResult<EdgeId> {
        if self.finalized {
            return Err(GraphError::Finalized {
                what: "connect vertices",
            });
        }
        self.vertex(from)?;
        self.vertex(to)?;
        if from == to {
            return Err(GraphError::SelfLoop { vertex: from });
        }
        if num_micro_edges == 0 {
            return Err(GraphError::NoMicroEdges { from, to });
        }

        let id = EdgeId::from_slot(self.edges.len());
        self.edges.push(Edge {
            id,
            name: format!("e{}", id),
            vertices: [from, to],
            num_micro_edges,
            physical_data: None,
            embedding: None,
        });
        self.vertices[from.slot()].edge_neighbors.push(id);
        self.vertices[to.slot()].edge_neighbors.push(id);
        Ok(id)
    }

    pub fn rename_edge(&mut self, edge: EdgeId, name: impl Into<String>) -> GraphResult<()> {
        self.edge_mut(edge)?.name = name.into();
        Ok(())
    }

    pub fn attach_physical_data(&mut self, edge: EdgeId, data: PhysicalData) -> GraphResult<()> {
        let e = self.edge_mut(edge)?;
        if e.physical_data.is_some() {
            return Err(GraphError::PhysicalDataAlreadySet { edge });
        }
        e.physical_data = Some(data);
        Ok(())
    }

    pub fn attach_embedding(&mut self, edge: EdgeId, polyline: Vec<Point>) -> GraphResult<()> {
        if polyline.len() < 2 {
            return Err(GraphError::InvalidEmbedding {
                edge,
                what: "a polyline needs at least two points",
            });
        }
        let e = self.edge_mut(edge)?;
        if e.embedding.is_some() {
            return Err(GraphError::EmbeddingAlreadySet { edge });
        }
        e.embedding = Some(polyline);
        Ok(())
    }

    /// Assign a boundary condition to a vertex, replacing any previous one.
    pub fn set_boundary(&mut self, vertex: VertexId, condition: BoundaryCondition) -> GraphResult<()> {
        if self.finalized {
            return Err(GraphError::Finalized {
                what: "change boundary conditions",
            });
        }
        condition
            .check()
            .map_err(|what| GraphError::InvalidBoundary { vertex, what })?;
        let v = self
            .vertices
            .get_mut(vertex.slot())
            .ok_or(GraphError::UnknownVertex { vertex })?;
        v.kind = Some(VertexKind::Boundary(condition));
        Ok(())
    }

    /// Validate the classification of every vertex and freeze the graph.
    pub fn finalize_boundary_conditions(&mut self) -> GraphResult<()> {
        if self.finalized {
            return Ok(());
        }
        validate::validate_classification(&self.vertices, &self.edges)?;
        for vertex in &mut self.vertices {
            if vertex.kind.is_none() {
                vertex.kind = Some(VertexKind::Inner);
            }
        }
        self.finalized = true;
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Fails unless the boundary conditions were finalized.
    pub fn ensure_finalized(&self) -> GraphResult<()> {
        if self.finalized {
            Ok(())
        } else {
            Err(GraphError::NotFinalized)
        }
    }

    pub fn vertex(&self, id: VertexId) -> GraphResult<&Vertex> {
        self.vertices
            .get(id.slot())
            .ok_or(GraphError::UnknownVertex { vertex: id })
    }

    pub fn edge(&self, id: EdgeId) -> GraphResult<&Edge> {
        self.edges
            .get(id.slot())
            .ok_or(GraphError::UnknownEdge { edge: id })
    }

    fn edge_mut(&mut self, id: EdgeId) -> GraphResult<&mut Edge> {
        self.edges
            .get_mut(id.slot())
            .ok_or(GraphError::UnknownEdge { edge: id })
    }

    pub fn find_vertex_by_name(&self, name: &str) -> GraphResult<VertexId> {
        self.vertices
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.id)
            .ok_or_else(|| GraphError::NameNotFound {
                name: name.to_string(),
            })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().map(|v| v.id)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().map(|e| e.id)
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::FreeOutflowParameters;

    fn data() -> PhysicalData {
        PhysicalData::set_from_data(4e5, 0.067, 1.028e-3, 9.0, 0.403, 42.2).unwrap()
    }

    #[test]
    fn connect_records_orientation_and_adjacency() {
        let mut g = GraphStorage::new();
        let v0 = g.create_vertex().unwrap();
        let v1 = g.create_vertex().unwrap();
        let e = g.connect(v0, v1, 4).unwrap();

        let edge = g.edge(e).unwrap();
        assert!(edge.is_pointing_to(v1));
        assert!(!edge.is_pointing_to(v0));
        assert_eq!(edge.num_micro_edges(), 4);
        assert_eq!(g.vertex(v0).unwrap().edge_neighbors(), &[e]);
        assert_eq!(g.vertex(v1).unwrap().edge_neighbors(), &[e]);
    }

    #[test]
    fn connect_rejects_bad_input() {
        let mut g = GraphStorage::new();
        let v0 = g.create_vertex().unwrap();
        let v1 = g.create_vertex().unwrap();
        assert!(matches!(g.connect(v0, v0, 1), Err(GraphError::SelfLoop { .. })));
        assert!(matches!(g.connect(v0, v1, 0), Err(GraphError::NoMicroEdges { .. })));
        let bogus = VertexId::from_index(99);
        assert!(matches!(g.connect(v0, bogus, 1), Err(GraphError::UnknownVertex { .. })));
    }

    #[test]
    fn physical_data_is_attached_once() {
        let mut g = GraphStorage::new();
        let v0 = g.create_vertex().unwrap();
        let v1 = g.create_vertex().unwrap();
        let e = g.connect(v0, v1, 1).unwrap();
        assert!(g.edge(e).unwrap().physical_data().is_err());
        g.attach_physical_data(e, data()).unwrap();
        assert_eq!(
            g.attach_physical_data(e, data()),
            Err(GraphError::PhysicalDataAlreadySet { edge: e })
        );
    }

    #[test]
    fn finalize_freezes_topology() {
        let mut g = GraphStorage::new();
        let v0 = g.create_vertex().unwrap();
        let v1 = g.create_vertex().unwrap();
        let e = g.connect(v0, v1, 1).unwrap();
        g.attach_physical_data(e, data()).unwrap();
        let outflow = BoundaryCondition::FreeOutflow(FreeOutflowParameters::default());
        g.set_boundary(v0, outflow.clone()).unwrap();
        g.set_boundary(v1, outflow.clone()).unwrap();
        g.finalize_boundary_conditions().unwrap();

        assert!(matches!(g.connect(v0, v1, 1), Err(GraphError::Finalized { .. })));
        assert!(matches!(g.set_boundary(v0, outflow), Err(GraphError::Finalized { .. })));
    }

    #[test]
    fn find_vertex_by_name() {
        let mut g = GraphStorage::new();
        let inlet = g.create_named_vertex("cw_in").unwrap();
        assert_eq!(g.find_vertex_by_name("cw_in").unwrap(), inlet);
        assert!(g.find_vertex_by_name("missing").is_err());
    }
}
