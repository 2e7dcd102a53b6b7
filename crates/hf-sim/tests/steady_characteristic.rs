//! A single vessel between two characteristic boundaries settles at the
//! imposed pressure and flow.

use std::sync::Arc;

use hf_graph::{BoundaryCondition, CharacteristicParameters, GraphStorage, PhysicalData};
use hf_partition::{DofMap, LocalCommunicator, naive_partition};
use hf_sim::ExplicitNonlinearFlowSolver;
use hf_solver::FlowUpwindEvaluator;
use hf_solver::upwind::NUM_COMPONENTS;

const P_IN: f64 = 5.0;
const Q_IN: f64 = 4.0;

#[test]
fn steady_characteristic_state_is_reached() {
    let mut g = GraphStorage::new();
    let v0 = g.create_named_vertex("left").unwrap();
    let v1 = g.create_named_vertex("right").unwrap();
    let e = g.connect(v0, v1, 20).unwrap();
    let data = PhysicalData::set_from_data(4e5, 0.067, 1.028e-3, 9.0, 0.403, 42.2)
        .unwrap()
        .with_viscosity(0.0)
        .unwrap();
    g.attach_physical_data(e, data).unwrap();
    g.set_boundary(
        v0,
        BoundaryCondition::Characteristic(CharacteristicParameters {
            pressure: P_IN,
            flow: Q_IN,
            inflow: true,
        }),
    )
    .unwrap();
    g.set_boundary(
        v1,
        BoundaryCondition::Characteristic(CharacteristicParameters {
            pressure: P_IN,
            flow: Q_IN,
            inflow: false,
        }),
    )
    .unwrap();
    g.finalize_boundary_conditions().unwrap();
    let g = Arc::new(g);

    let partition = Arc::new(naive_partition(&g, 1).unwrap());
    let dofs = Arc::new(DofMap::create(&g, NUM_COMPONENTS, 2).unwrap());
    let evaluator =
        FlowUpwindEvaluator::new(Box::new(LocalCommunicator), Arc::clone(&g), partition, dofs)
            .unwrap();
    let mut solver = ExplicitNonlinearFlowSolver::new(evaluator).unwrap();

    // many wave transits of the vessel
    let tau = 5e-5;
    let mut t = 0.0;
    for _ in 0..10_000 {
        solver.solve(tau, t).unwrap();
        t += tau;
    }

    for s in [0.0, 0.5, 1.0] {
        let (p, q) = solver.evaluate_1d_pq_values(e, s).unwrap();
        assert!((p - P_IN).abs() < 1e-3, "p = {p} at s = {s}");
        assert!((q - Q_IN).abs() < 1e-3, "q = {q} at s = {s}");
    }
}
