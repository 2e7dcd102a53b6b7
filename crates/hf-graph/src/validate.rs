//! Boundary classification checks run by `finalize_boundary_conditions`.

use crate::boundary::VertexKind;
use crate::error::{GraphError, GraphResult};
use crate::graph::{Edge, Vertex};

/// Every leaf carries a boundary condition, no inner vertex carries one,
/// no vertex is isolated and every edge has physical data.
pub(crate) fn validate_classification(vertices: &[Vertex], edges: &[Edge]) -> GraphResult<()> {
    for vertex in vertices {
        match (vertex.degree(), &vertex.kind) {
            (0, _) => {
                return Err(GraphError::IsolatedVertex {
                    vertex: vertex.id,
                    name: vertex.name.clone(),
                });
            }
            (1, Some(VertexKind::Boundary(_))) => {}
            (1, _) => {
                return Err(GraphError::MissingBoundary {
                    vertex: vertex.id,
                    name: vertex.name.clone(),
                });
            }
            (degree, Some(VertexKind::Boundary(_))) => {
                return Err(GraphError::BoundaryOnInnerVertex {
                    vertex: vertex.id,
                    name: vertex.name.clone(),
                    degree,
                });
            }
            (_, _) => {}
        }
    }

    for edge in edges {
        edge.physical_data()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryCondition, FreeOutflowParameters};
    use hf_core::Id;

    fn vertex(index: u32, edges: &[u32], kind: Option<VertexKind>) -> Vertex {
        Vertex {
            id: Id::from_index(index),
            name: format!("v{index}"),
            edge_neighbors: edges.iter().map(|&e| Id::from_index(e)).collect(),
            kind,
        }
    }

    fn outflow() -> Option<VertexKind> {
        Some(VertexKind::Boundary(BoundaryCondition::FreeOutflow(
            FreeOutflowParameters::default(),
        )))
    }

    #[test]
    fn empty_graph_is_valid() {
        assert!(validate_classification(&[], &[]).is_ok());
    }

    #[test]
    fn unclassified_leaf_is_rejected() {
        let vertices = vec![vertex(0, &[0], None)];
        let err = validate_classification(&vertices, &[]).unwrap_err();
        assert!(matches!(err, GraphError::MissingBoundary { .. }));
        assert!(err.to_string().contains("no boundary condition"));
    }

    #[test]
    fn boundary_on_junction_is_rejected() {
        let vertices = vec![vertex(0, &[0, 1, 2], outflow())];
        assert!(matches!(
            validate_classification(&vertices, &[]),
            Err(GraphError::BoundaryOnInnerVertex { degree: 3, .. })
        ));
    }

    #[test]
    fn isolated_vertex_is_rejected() {
        let vertices = vec![vertex(0, &[], outflow())];
        assert!(matches!(
            validate_classification(&vertices, &[]),
            Err(GraphError::IsolatedVertex { .. })
        ));
    }
}
