use std::path::PathBuf;

use hf_graph::BoundaryCondition;
use hf_project::{assemble, build_graph, load_network, load_run_config};

fn demos_dir() -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("demos/networks")
}

#[test]
fn demo_run_assembles_a_finalized_network() {
    let run = load_run_config(&demos_dir().join("aortic_bifurcation_run.yaml")).unwrap();
    assert_eq!(run.mesh_file, demos_dir().join("aortic_bifurcation.json"));
    assert_eq!(run.workers, 3);
    assert_eq!(run.output_interval(), 20);

    let graph = assemble(&run).unwrap();
    assert!(graph.is_finalized());
    assert_eq!(graph.num_vertices(), 4);
    assert_eq!(graph.num_edges(), 3);

    let inlet = graph.find_vertex_by_name("cw_in").unwrap();
    // the run's amplitude replaces the boundary file's
    match graph.vertex(inlet).unwrap().boundary() {
        Some(BoundaryCondition::Inflow(waveform)) => {
            assert!((waveform.value(0.15) - 100.0).abs() < 1e-12);
        }
        other => panic!("unexpected inlet condition {other:?}"),
    }

    let tree = graph.find_vertex_by_name("right_iliac_out").unwrap();
    assert!(graph.vertex(tree).unwrap().is_vessel_tree_outflow());
    let junction = graph.find_vertex_by_name("aortic_bifurcation").unwrap();
    assert!(graph.vertex(junction).unwrap().is_bifurcation());

    let right_iliac = graph.edges().iter().find(|e| e.name() == "right_iliac").unwrap();
    assert!(right_iliac.is_pointing_to(junction));
    assert_eq!(graph.edges()[0].embedding().map(|p| p.len()), Some(2));
}

#[test]
fn mesh_without_boundaries_cannot_be_finalized() {
    let network = load_network(&demos_dir().join("aortic_bifurcation.json")).unwrap();
    let mut graph = build_graph(&network).unwrap();
    assert!(graph.finalize_boundary_conditions().is_err());
}
