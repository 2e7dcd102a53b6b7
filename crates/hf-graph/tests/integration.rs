//! Integration tests for hf-graph.

use hf_graph::{
    BoundaryCondition, FreeOutflowParameters, GraphError, GraphStorage, InflowWaveform,
    PhysicalData, VertexKind, WindkesselParameters,
};

fn data() -> PhysicalData {
    PhysicalData::set_from_data(4e5, 0.067, 1.028e-3, 9.0, 0.403, 42.2).unwrap()
}

#[test]
fn bifurcation_network_classifies_every_vertex() {
    // in -> [e0] -> mid -> [e1] -> out1
    //                  \-> [e2] -> out2
    let mut g = GraphStorage::new();
    let v_in = g.create_named_vertex("in").unwrap();
    let mid = g.create_named_vertex("mid").unwrap();
    let out1 = g.create_named_vertex("out1").unwrap();
    let out2 = g.create_named_vertex("out2").unwrap();
    for (a, b) in [(v_in, mid), (mid, out1), (mid, out2)] {
        let e = g.connect(a, b, 3).unwrap();
        g.attach_physical_data(e, data()).unwrap();
    }

    g.set_boundary(v_in, BoundaryCondition::Inflow(InflowWaveform::heart_beat(485.0)))
        .unwrap();
    g.set_boundary(
        out1,
        BoundaryCondition::FreeOutflow(FreeOutflowParameters::default()),
    )
    .unwrap();
    g.set_boundary(
        out2,
        BoundaryCondition::Windkessel(WindkesselParameters {
            peripheral_resistance: 100.0,
            capacitance: 1e-3,
            venous_pressure: 0.0,
        }),
    )
    .unwrap();
    g.finalize_boundary_conditions().unwrap();

    let mid_vertex = g.vertex(mid).unwrap();
    assert!(mid_vertex.is_inner());
    assert!(mid_vertex.is_bifurcation());
    assert_eq!(mid_vertex.kind(), Some(&VertexKind::Inner));
    assert!(g.vertex(v_in).unwrap().is_inflow());
    assert!(g.vertex(out1).unwrap().is_free_outflow());
    assert!(g.vertex(out2).unwrap().is_windkessel_outflow());
    assert!(g.vertex(out2).unwrap().is_vessel_tip());

    for v in g.vertices() {
        assert!(v.kind().is_some(), "vertex {} unclassified", v.id());
    }
}

#[test]
fn finalize_reports_unclassified_leaf_by_name() {
    let mut g = GraphStorage::new();
    let v0 = g.create_named_vertex("aorta_in").unwrap();
    let v1 = g.create_named_vertex("femoral_out").unwrap();
    let e = g.connect(v0, v1, 2).unwrap();
    g.attach_physical_data(e, data()).unwrap();
    g.set_boundary(v0, BoundaryCondition::Inflow(InflowWaveform::Constant { value: 1.0 }))
        .unwrap();

    let err = g.finalize_boundary_conditions().unwrap_err();
    assert!(matches!(err, GraphError::MissingBoundary { vertex, .. } if vertex == v1));
    assert!(err.to_string().contains("femoral_out"));
    assert!(!g.is_finalized());
}

#[test]
fn finalize_requires_physical_data() {
    let mut g = GraphStorage::new();
    let v0 = g.create_vertex().unwrap();
    let v1 = g.create_vertex().unwrap();
    let e = g.connect(v0, v1, 2).unwrap();
    let outflow = BoundaryCondition::FreeOutflow(FreeOutflowParameters::default());
    g.set_boundary(v0, outflow.clone()).unwrap();
    g.set_boundary(v1, outflow).unwrap();

    assert_eq!(
        g.finalize_boundary_conditions(),
        Err(GraphError::MissingPhysicalData { edge: e })
    );
}

#[test]
fn degree_two_vertex_is_inner_but_not_bifurcation() {
    let mut g = GraphStorage::new();
    let a = g.create_vertex().unwrap();
    let b = g.create_vertex().unwrap();
    let c = g.create_vertex().unwrap();
    for (x, y) in [(a, b), (b, c)] {
        let e = g.connect(x, y, 1).unwrap();
        g.attach_physical_data(e, data()).unwrap();
    }
    let outflow = BoundaryCondition::FreeOutflow(FreeOutflowParameters::default());
    g.set_boundary(a, outflow.clone()).unwrap();
    g.set_boundary(c, outflow).unwrap();
    g.finalize_boundary_conditions().unwrap();

    let inner = g.vertex(b).unwrap();
    assert!(inner.is_inner());
    assert!(!inner.is_bifurcation());
    assert!(!inner.is_leaf());
}

#[test]
fn invalid_boundary_parameters_are_rejected_eagerly() {
    let mut g = GraphStorage::new();
    let v0 = g.create_vertex().unwrap();
    let err = g
        .set_boundary(
            v0,
            BoundaryCondition::Windkessel(WindkesselParameters {
                peripheral_resistance: 1.0,
                capacitance: 0.0,
                venous_pressure: 0.0,
            }),
        )
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidBoundary { .. }));
}

#[test]
fn embedding_attaches_once() {
    let mut g = GraphStorage::new();
    let v0 = g.create_vertex().unwrap();
    let v1 = g.create_vertex().unwrap();
    let e = g.connect(v0, v1, 1).unwrap();
    assert!(g.attach_embedding(e, vec![[0.0; 3]]).is_err());
    g.attach_embedding(e, vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]])
        .unwrap();
    assert_eq!(g.edge(e).unwrap().embedding().map(|p| p.len()), Some(2));
    assert_eq!(
        g.attach_embedding(e, vec![[0.0; 3], [1.0; 3]]),
        Err(GraphError::EmbeddingAlreadySet { edge: e })
    );
}

#[test]
fn finalized_graph_rejects_new_vertices() {
    let mut g = GraphStorage::new();
    let v0 = g.create_named_vertex("in").unwrap();
    let v1 = g.create_named_vertex("out").unwrap();
    let e = g.connect(v0, v1, 2).unwrap();
    g.attach_physical_data(e, data()).unwrap();
    g.set_boundary(v0, BoundaryCondition::Inflow(InflowWaveform::Constant { value: 1.0 }))
        .unwrap();
    g.set_boundary(
        v1,
        BoundaryCondition::FreeOutflow(FreeOutflowParameters::default()),
    )
    .unwrap();
    g.finalize_boundary_conditions().unwrap();

    assert!(matches!(
        g.create_named_vertex("late"),
        Err(GraphError::Finalized { .. })
    ));
    assert!(matches!(g.create_vertex(), Err(GraphError::Finalized { .. })));
    assert_eq!(g.num_vertices(), 2);
    assert!(g.find_vertex_by_name("late").is_err());
    assert!(g.vertices().iter().all(|v| v.kind().is_some()));
}
