//! A network split over three worker threads follows the single-worker run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use hf_core::VertexId;
use hf_graph::{
    BoundaryCondition, GraphStorage, InflowWaveform, PhysicalData, VesselTreeParameters,
    WindkesselParameters,
};
use hf_partition::{Communicator, DofMap, LocalCommunicator, Partition, ThreadCommunicator};
use hf_sim::{ExplicitNonlinearFlowSolver, FlowIntegrator, SimOptions, run_sim};
use hf_solver::FlowUpwindEvaluator;
use hf_solver::upwind::NUM_COMPONENTS;

const DEGREE: usize = 2;

/// inlet -> j0 -> j1 -> (windkessel, vessel tree)
fn network() -> Arc<GraphStorage> {
    let mut g = GraphStorage::new();
    let inlet = g.create_named_vertex("inlet").unwrap();
    let j0 = g.create_named_vertex("j0").unwrap();
    let j1 = g.create_named_vertex("j1").unwrap();
    let wk = g.create_named_vertex("wk").unwrap();
    let tree = g.create_named_vertex("tree").unwrap();

    let data = PhysicalData::set_from_data(4e5, 0.05, 1.028e-3, 9.0, 0.3, 10.0).unwrap();
    for (from, to) in [(inlet, j0), (j0, j1), (j1, wk), (j1, tree)] {
        let e = g.connect(from, to, 5).unwrap();
        g.attach_physical_data(e, data).unwrap();
    }

    g.set_boundary(inlet, BoundaryCondition::Inflow(InflowWaveform::heart_beat(5.0)))
        .unwrap();
    g.set_boundary(
        wk,
        BoundaryCondition::Windkessel(WindkesselParameters {
            peripheral_resistance: 100.0,
            capacitance: 1e-3,
            venous_pressure: 0.0,
        }),
    )
    .unwrap();
    g.set_boundary(
        tree,
        BoundaryCondition::VesselTree(VesselTreeParameters {
            resistances: vec![50.0, 80.0],
            capacitances: vec![1e-4, 1e-4],
            furcation_number: 2,
            venous_pressure: 0.0,
        }),
    )
    .unwrap();
    g.finalize_boundary_conditions().unwrap();
    Arc::new(g)
}

struct RankResult {
    /// Owned coefficient ranges and their values.
    owned: Vec<(std::ops::Range<usize>, Vec<f64>)>,
    final_tip_pressures: BTreeMap<VertexId, f64>,
    tip_volumes: BTreeMap<VertexId, f64>,
    total_volume: f64,
}

fn run_rank(
    comm: Box<dyn Communicator>,
    graph: Arc<GraphStorage>,
    partition: Arc<Partition>,
    dofs: Arc<DofMap>,
) -> RankResult {
    let evaluator =
        FlowUpwindEvaluator::new(comm, graph, Arc::clone(&partition), Arc::clone(&dofs)).unwrap();
    let mut solver = ExplicitNonlinearFlowSolver::new(evaluator).unwrap();

    let opts = SimOptions {
        dt: 5e-5,
        t_end: 0.01,
        record_every: 50,
        ..SimOptions::default()
    };
    let record = run_sim(&mut solver, &opts).unwrap();

    // a few more steps while integrating the outflow
    let mut volumes = FlowIntegrator::new(0.0);
    let mut t = *record.t.last().unwrap();
    for _ in 0..20 {
        volumes.update_flow(&mut solver, t, opts.dt).unwrap();
        solver.solve(opts.dt, t).unwrap();
        t += opts.dt;
    }

    let rank = solver.evaluator().rank();
    let owned = partition
        .owned_edge_ids(rank)
        .iter()
        .map(|&e| {
            let range = dofs.edge(e).unwrap().range();
            (range.clone(), solver.solution()[range].to_vec())
        })
        .collect();
    RankResult {
        owned,
        final_tip_pressures: solver.get_vessel_tip_pressures().unwrap(),
        tip_volumes: volumes.volumes().clone(),
        total_volume: volumes.total_volume(&solver).unwrap(),
    }
}

fn assert_close(a: f64, b: f64, what: &str) {
    assert!((a - b).abs() <= 1e-10 * (1.0 + a.abs()), "{what}: {a} vs {b}");
}

#[test]
fn three_workers_reproduce_the_single_worker_run() {
    let graph = network();
    let dofs = Arc::new(DofMap::create(&graph, NUM_COMPONENTS, DEGREE).unwrap());

    let serial_partition = Arc::new(Partition::from_assignment(&graph, 1, vec![0; 4]).unwrap());
    let serial = run_rank(
        Box::new(LocalCommunicator),
        Arc::clone(&graph),
        serial_partition,
        Arc::clone(&dofs),
    );

    // one junction on each rank boundary
    let partition = Arc::new(Partition::from_assignment(&graph, 3, vec![0, 1, 2, 2]).unwrap());
    let handles: Vec<_> = ThreadCommunicator::group(3)
        .into_iter()
        .map(|comm| {
            let graph = Arc::clone(&graph);
            let partition = Arc::clone(&partition);
            let dofs = Arc::clone(&dofs);
            thread::spawn(move || run_rank(Box::new(comm), graph, partition, dofs))
        })
        .collect();
    let parallel: Vec<RankResult> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let serial_u: Vec<f64> = {
        let mut u = vec![0.0; dofs.num_dof()];
        for (range, values) in &serial.owned {
            u[range.clone()].copy_from_slice(values);
        }
        u
    };

    let mut covered = 0;
    for result in &parallel {
        for (range, values) in &result.owned {
            for (i, &v) in range.clone().zip(values) {
                assert_close(serial_u[i], v, &format!("coefficient {i}"));
            }
            covered += range.len();
        }
    }
    let serial_len: usize = serial.owned.iter().map(|(r, _)| r.len()).sum();
    assert_eq!(covered, serial_len);

    let merged_pressures: BTreeMap<VertexId, f64> = parallel
        .iter()
        .flat_map(|r| r.final_tip_pressures.clone())
        .collect();
    let merged_volumes: BTreeMap<VertexId, f64> =
        parallel.iter().flat_map(|r| r.tip_volumes.clone()).collect();
    assert_eq!(merged_pressures.len(), 2);
    assert_eq!(merged_pressures.len(), serial.final_tip_pressures.len());
    for (v, p) in &serial.final_tip_pressures {
        assert_close(*p, merged_pressures[v], &format!("tip pressure at {v}"));
        assert_close(serial.tip_volumes[v], merged_volumes[v], &format!("tip volume at {v}"));
    }

    let serial_total: f64 = serial.tip_volumes.values().sum();
    assert_close(serial.total_volume, serial_total, "serial total volume");
    for result in &parallel {
        assert_close(serial_total, result.total_volume, "total volume");
    }

    // blood has reached the tips
    assert!(serial.tip_volumes.values().all(|&vol| vol > 0.0));
    assert!(serial.final_tip_pressures.values().all(|&p| p > 0.0));
}
