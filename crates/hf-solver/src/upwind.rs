//! Upwind flux evaluator of the explicit network scheme.
//!
//! One evaluation per time stage:
//! 1. extract `(Q, A)` at both ends of every owned macro-edge,
//! 2. exchange these values with the neighbouring ranks,
//! 3. resolve every active n-furcation,
//! 4. resolve every active leaf through its boundary condition.
//!
//! The results are cached per edge and stamped with the stage time.

use std::sync::Arc;

use hf_core::{EdgeId, VertexId};
use hf_graph::{BoundaryCondition, Edge, GraphError, GraphStorage, VertexKind};
use hf_partition::{Communicator, DofMap, EdgeBoundaryCommunicator, Partition};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::coupling::{
    NfurcationSolution, characteristic_boundary, free_outflow, inflow_area, interior_upwind,
    solve_at_nfurcation, windkessel_outflow,
};
use crate::error::{SolverError, SolverResult};
use crate::fe::FeTypeNetwork;
use crate::newton::{NewtonConfig, ScalarNewtonConfig};

/// Component index of the flow `Q` inside a micro-edge block.
pub const FLOW: usize = 0;
/// Component index of the area `A` inside a micro-edge block.
pub const AREA: usize = 1;
/// Number of variables per point.
pub const NUM_COMPONENTS: usize = 2;

/// Per-edge layout of the boundary buffers: `[Q_l, Q_r, A_l, A_r]`.
const STRIDE: usize = 4;
const Q_LEFT: usize = 0;
const Q_RIGHT: usize = 1;
const A_LEFT: usize = 2;
const A_RIGHT: usize = 3;

/// Upwinded state handed to one edge end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpwindState {
    pub q: f64,
    pub a: f64,
}

/// Read `(Q, A)` of `edge` at the end touching `vertex`.
fn near_end(values: &[f64], edge: &Edge, vertex: VertexId) -> (f64, f64, bool) {
    let base = STRIDE * edge.id().slot();
    if edge.is_pointing_to(vertex) {
        (values[base + Q_RIGHT], values[base + A_RIGHT], true)
    } else {
        (values[base + Q_LEFT], values[base + A_LEFT], false)
    }
}

fn write_end(values: &mut [f64], edge: EdgeId, pointing_in: bool, q: f64, a: f64) {
    let base = STRIDE * edge.slot();
    if pointing_in {
        values[base + Q_RIGHT] = q;
        values[base + A_RIGHT] = a;
    } else {
        values[base + Q_LEFT] = q;
        values[base + A_LEFT] = a;
    }
}

/// Computes numerical fluxes at every micro-vertex of the owned edges.
pub struct FlowUpwindEvaluator {
    comm: Box<dyn Communicator>,
    graph: Arc<GraphStorage>,
    partition: Arc<Partition>,
    dof_map: Arc<DofMap>,
    ghost: EdgeBoundaryCommunicator,
    fe: FeTypeNetwork,
    nfurcation_config: NewtonConfig,
    windkessel_config: ScalarNewtonConfig,
    inflow_config: ScalarNewtonConfig,
    /// Measured boundary values, `STRIDE` entries per edge.
    boundary_values: Vec<f64>,
    /// Upwinded boundary values, `STRIDE` entries per edge.
    upwinded: Vec<f64>,
    current_t: Option<f64>,
}

impl FlowUpwindEvaluator {
    pub fn new(
        comm: Box<dyn Communicator>,
        graph: Arc<GraphStorage>,
        partition: Arc<Partition>,
        dof_map: Arc<DofMap>,
    ) -> SolverResult<Self> {
        graph.ensure_finalized()?;
        if comm.size() != partition.worker_count() {
            return Err(SolverError::SizeMismatch {
                what: "communicator size vs. partition workers",
                expected: partition.worker_count(),
                got: comm.size(),
            });
        }

        let ghost = EdgeBoundaryCommunicator::new(&partition, comm.rank());
        let fe = FeTypeNetwork::new(dof_map.degree());
        let len = STRIDE * graph.num_edges();

        Ok(Self {
            comm,
            graph,
            partition,
            dof_map,
            ghost,
            fe,
            nfurcation_config: NewtonConfig::default(),
            windkessel_config: ScalarNewtonConfig::WINDKESSEL,
            inflow_config: ScalarNewtonConfig::INFLOW,
            boundary_values: vec![f64::NAN; len],
            upwinded: vec![f64::NAN; len],
            current_t: None,
        })
    }

    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    pub fn communicator(&self) -> &dyn Communicator {
        self.comm.as_ref()
    }

    pub fn graph(&self) -> &Arc<GraphStorage> {
        &self.graph
    }

    pub fn partition(&self) -> &Arc<Partition> {
        &self.partition
    }

    pub fn dof_map(&self) -> &Arc<DofMap> {
        &self.dof_map
    }

    pub fn fe(&self) -> &FeTypeNetwork {
        &self.fe
    }

    /// Time the cache was built for, if any.
    pub fn flux_time(&self) -> Option<f64> {
        self.current_t
    }

    /// Rebuild the flux cache for time `t` from the solution `u_prev`.
    ///
    /// Collective: every rank of the group has to call it for the same
    /// stage. Only the entries owned by this rank are read from `u_prev`.
    pub fn init(&mut self, t: f64, u_prev: &[f64]) -> SolverResult<()> {
        if u_prev.len() != self.dof_map.num_dof() {
            return Err(SolverError::SizeMismatch {
                what: "solution vector",
                expected: self.dof_map.num_dof(),
                got: u_prev.len(),
            });
        }

        self.current_t = None;
        self.boundary_values.fill(f64::NAN);
        self.upwinded.fill(f64::NAN);

        self.evaluate_macro_edge_boundary_values(u_prev)?;
        self.ghost
            .update_ghost_layer(self.comm.as_ref(), &mut self.boundary_values, STRIDE)?;
        self.calculate_nfurcation_fluxes()?;
        self.calculate_inout_fluxes(t, u_prev)?;

        self.current_t = Some(t);
        Ok(())
    }

    fn evaluate_macro_edge_boundary_values(&mut self, u_prev: &[f64]) -> SolverResult<()> {
        let rank = self.comm.rank();
        for &e in self.partition.owned_edge_ids(rank) {
            let local = self.dof_map.edge(e)?;
            let last = local.num_micro_edges() - 1;

            let q_left = self
                .fe
                .evaluate_dof_at_boundary_points(&u_prev[local.dof_indices(0, FLOW)]);
            let a_left = self
                .fe
                .evaluate_dof_at_boundary_points(&u_prev[local.dof_indices(0, AREA)]);
            let q_right = self
                .fe
                .evaluate_dof_at_boundary_points(&u_prev[local.dof_indices(last, FLOW)]);
            let a_right = self
                .fe
                .evaluate_dof_at_boundary_points(&u_prev[local.dof_indices(last, AREA)]);

            let base = STRIDE * e.slot();
            self.boundary_values[base + Q_LEFT] = q_left.left;
            self.boundary_values[base + Q_RIGHT] = q_right.right;
            self.boundary_values[base + A_LEFT] = a_left.left;
            self.boundary_values[base + A_RIGHT] = a_right.right;
        }
        Ok(())
    }

    fn calculate_nfurcation_fluxes(&mut self) -> SolverResult<()> {
        let rank = self.comm.rank();
        let graph = &*self.graph;
        let values = &self.boundary_values;
        let config = &self.nfurcation_config;

        let inner: Vec<VertexId> = self
            .partition
            .active_vertex_ids(rank)
            .iter()
            .copied()
            .filter(|&v| graph.vertex(v).is_ok_and(|vertex| vertex.is_inner()))
            .collect();

        let solutions: Vec<SolverResult<(VertexId, NfurcationSolution)>> = inner
            .par_iter()
            .map(|&v| {
                let vertex = graph.vertex(v)?;
                let n = vertex.degree();
                let mut q = Vec::with_capacity(n);
                let mut a = Vec::with_capacity(n);
                let mut data = Vec::with_capacity(n);
                let mut pointing_in = Vec::with_capacity(n);
                for &e in vertex.edge_neighbors() {
                    let edge = graph.edge(e)?;
                    let (qe, ae, inward) = near_end(values, edge, v);
                    q.push(qe);
                    a.push(ae);
                    data.push(*edge.physical_data()?);
                    pointing_in.push(inward);
                }
                let solution = solve_at_nfurcation(&q, &a, &data, &pointing_in, config)?;
                Ok((v, solution))
            })
            .collect();

        for result in solutions {
            let (v, solution) = result?;
            let vertex = self.graph.vertex(v)?;
            if !solution.converged {
                warn!(
                    vertex = %v,
                    name = vertex.name(),
                    iterations = solution.iterations,
                    residual = solution.residual_norm,
                    "n-furcation Newton did not converge, using last iterate"
                );
            }
            for (i, &e) in vertex.edge_neighbors().iter().enumerate() {
                let inward = self.graph.edge(e)?.is_pointing_to(v);
                write_end(
                    &mut self.upwinded,
                    e,
                    inward,
                    solution.q_up[i],
                    solution.a_up[i],
                );
            }
        }
        debug!(rank, count = inner.len(), "resolved n-furcations");
        Ok(())
    }

    fn calculate_inout_fluxes(&mut self, t: f64, u_prev: &[f64]) -> SolverResult<()> {
        let rank = self.comm.rank();
        for &v in self.partition.active_vertex_ids(rank) {
            let vertex = self.graph.vertex(v)?;
            let condition = match vertex.kind() {
                Some(VertexKind::Inner) => continue,
                Some(VertexKind::Boundary(condition)) => condition,
                None => return Err(GraphError::NotFinalized.into()),
            };

            let e = vertex.edge_neighbors()[0];
            let edge = self.graph.edge(e)?;
            let data = edge.physical_data()?;
            let (q, a, inward) = near_end(&self.boundary_values, edge, v);

            let (q_up, a_up) = match condition {
                BoundaryCondition::Inflow(waveform) => {
                    let sign = if inward { -1.0 } else { 1.0 };
                    let q_star = sign * waveform.value(t);
                    let outcome = inflow_area(q, a, inward, q_star, data, &self.inflow_config);
                    if !outcome.converged {
                        warn!(
                            vertex = %v,
                            name = vertex.name(),
                            iterations = outcome.iterations,
                            residual = outcome.residual,
                            "inflow area Newton did not converge, using last iterate"
                        );
                    }
                    (q_star, outcome.value)
                }
                BoundaryCondition::FreeOutflow(params) => free_outflow(q, a, inward, params, data),
                BoundaryCondition::Windkessel(_) | BoundaryCondition::VesselTree(_) => {
                    let p_c = self.lumped_pressure(v, u_prev)?;
                    let outflow =
                        windkessel_outflow(q, a, inward, p_c, data, &self.windkessel_config);
                    if !outflow.outcome.converged {
                        warn!(
                            vertex = %v,
                            name = vertex.name(),
                            kind = condition.kind_name(),
                            iterations = outflow.outcome.iterations,
                            residual = outflow.outcome.residual,
                            "Windkessel Newton did not converge, using last iterate"
                        );
                    }
                    (outflow.q_up, outflow.a_up)
                }
                BoundaryCondition::Characteristic(params) => {
                    characteristic_boundary(q, a, inward, params, data)
                }
            };

            write_end(&mut self.upwinded, e, inward, q_up, a_up);
        }
        Ok(())
    }

    /// Pressure of the first lumped level at a Windkessel or vessel-tree tip.
    fn lumped_pressure(&self, vertex: VertexId, u_prev: &[f64]) -> SolverResult<f64> {
        let dofs = self.dof_map.vertex(vertex)?.dof_indices();
        u_prev
            .get(dofs.start)
            .copied()
            .filter(|_| !dofs.is_empty())
            .ok_or(SolverError::MissingTipState { vertex })
    }

    fn check_time(&self, t: f64) -> SolverResult<()> {
        match self.current_t {
            Some(cached) if cached == t => Ok(()),
            cached => Err(SolverError::StaleFluxCache {
                requested: t,
                cached,
            }),
        }
    }

    /// Upwinded `(Q, A)` at every micro-vertex of `edge`.
    ///
    /// The two ends come from the vertex resolution of the last `init`,
    /// interior micro-vertices are upwinded here from `u_prev`.
    pub fn get_fluxes_on_macro_edge(
        &self,
        t: f64,
        edge: EdgeId,
        u_prev: &[f64],
        q_up: &mut [f64],
        a_up: &mut [f64],
    ) -> SolverResult<()> {
        self.check_time(t)?;
        let rank = self.comm.rank();
        if !self.partition.owns_edge(rank, edge) {
            return Err(SolverError::InactiveEdge { edge, rank });
        }

        let local = self.dof_map.edge(edge)?;
        let n = local.num_micro_edges();
        for (what, got) in [("q_up", q_up.len()), ("a_up", a_up.len())] {
            if got != n + 1 {
                return Err(SolverError::SizeMismatch {
                    what,
                    expected: n + 1,
                    got,
                });
            }
        }
        let data = self.graph.edge(edge)?.physical_data()?;

        let base = STRIDE * edge.slot();
        q_up[0] = self.upwinded[base + Q_LEFT];
        a_up[0] = self.upwinded[base + A_LEFT];
        q_up[n] = self.upwinded[base + Q_RIGHT];
        a_up[n] = self.upwinded[base + A_RIGHT];

        for m in 1..n {
            let q_l = self
                .fe
                .evaluate_dof_at_boundary_points(&u_prev[local.dof_indices(m - 1, FLOW)]);
            let a_l = self
                .fe
                .evaluate_dof_at_boundary_points(&u_prev[local.dof_indices(m - 1, AREA)]);
            let q_r = self
                .fe
                .evaluate_dof_at_boundary_points(&u_prev[local.dof_indices(m, FLOW)]);
            let a_r = self
                .fe
                .evaluate_dof_at_boundary_points(&u_prev[local.dof_indices(m, AREA)]);
            let (q, a) = interior_upwind(q_l.right, a_l.right, q_r.left, a_r.left, data);
            q_up[m] = q;
            a_up[m] = a;
        }
        Ok(())
    }

    /// Upwinded states of the edges around `vertex`, in the vertex's
    /// neighbour order.
    pub fn get_fluxes_on_nfurcation(&self, t: f64, vertex: VertexId) -> SolverResult<Vec<UpwindState>> {
        self.check_time(t)?;
        let rank = self.comm.rank();
        if self.partition.active_vertex_ids(rank).binary_search(&vertex).is_err() {
            return Err(SolverError::InactiveVertex { vertex, rank });
        }
        let v = self.graph.vertex(vertex)?;
        v.edge_neighbors()
            .iter()
            .map(|&e| {
                let edge = self.graph.edge(e)?;
                let (q, a, _) = near_end(&self.upwinded, edge, vertex);
                Ok(UpwindState { q, a })
            })
            .collect()
    }

    /// Flow leaving the network through a leaf vertex.
    pub fn get_outflow_at_leaf(&self, t: f64, vertex: VertexId) -> SolverResult<f64> {
        let states = self.get_fluxes_on_nfurcation(t, vertex)?;
        let v = self.graph.vertex(vertex)?;
        if !v.is_leaf() {
            return Err(SolverError::NotALeaf { vertex });
        }
        let inward = self.graph.edge(v.edge_neighbors()[0])?.is_pointing_to(vertex);
        let q = states[0].q;
        Ok(if inward { q } else { -q })
    }
}
